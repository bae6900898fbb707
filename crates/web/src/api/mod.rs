use axum::{
    extract::State,
    routing::{get, on},
    Json, Router,
};
use serde::Serialize;

pub mod v1;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

/// Absolute path of an api resource, for hateoas links.
macro_rules! resource {
    ($($arg:tt)*) => {
        format!("/api{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub fn routes(state: WebState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .nest_service("/v1", v1::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    live_sessions: usize,
}

async fn health(State(WebState { sessions, .. }): State<WebState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        live_sessions: sessions.len().await,
    })
}
