use axum::{
    extract::{Path, State},
    routing::{get, on},
    Json, Router,
};
use model::jog::JogRecord;
use utility::id::Id;

use super::Outcome;
use crate::{
    common::{route_not_found, VecResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(get_jogs).post(upload_jog))
        .route("/:uid", get(get_recent_jogs))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_jogs(State(WebState { store, .. }): State<WebState>) -> Json<VecResponse<JogRecord>> {
    VecResponse::non_paginated(store.jogs().await).json()
}

/// The last ten jogs of a user, oldest first.
async fn get_recent_jogs(
    Path(uid): Path<u64>,
    State(WebState { store, .. }): State<WebState>,
) -> Json<VecResponse<JogRecord>> {
    VecResponse::non_paginated(store.recent_jogs(Id::new(uid)).await).json()
}

async fn upload_jog(
    State(WebState { store, .. }): State<WebState>,
    Json(record): Json<JogRecord>,
) -> Json<Outcome> {
    store.add_jog(record).await;
    Json(Outcome::Success)
}
