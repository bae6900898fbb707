use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode},
    routing::{get, on, post, put},
    Extension, Json, Router,
};
use jogging::{
    selector::Planned,
    session::{Finished, JogSession, PositionUpdate, SessionSnapshot},
    tracker::{JogState, ProgressState},
};
use model::{
    account::Account,
    jog::{JogMode, JogRecord},
};
use serde::{Deserialize, Serialize};
use utility::{geo::Coordinate, id::Id};

use crate::{
    common::{route_not_found, HateoasResult, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/sessions{}", format_args!($($arg)*))
    };
}

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(close_session))
        .route("/:id/distance", put(set_distance))
        .route("/:id/mode", put(set_mode))
        .route("/:id/destination", put(set_destination))
        .route("/:id/position", post(update_position))
        .route("/:id/start", post(start_jog))
        .route("/:id/end", post(end_jog))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    uid: Id<Account>,
    /// km
    distance: f64,
    mode: JogMode,
    start: Coordinate,
    #[serde(default)]
    destination: Option<Coordinate>,
}

#[derive(Debug, Deserialize)]
struct DistanceParams {
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct ModeParams {
    mode: JogMode,
}

#[derive(Debug, Deserialize)]
struct DestinationParams {
    destination: Coordinate,
}

#[derive(Debug, Deserialize)]
struct PositionParams {
    position: Coordinate,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionDto {
    #[serde(flatten)]
    session: SessionSnapshot,
    /// Why the last route planning fell back to the empty route.
    notice: Option<String>,
    /// Set once the jog ended.
    record: Option<JogRecord>,
    uploaded: Option<bool>,
}

fn session_response(
    session: SessionSnapshot,
    planned: Option<&Planned>,
    finished: Option<&Finished>,
    base_url: Arc<BaseUrl>,
) -> Json<hateoas::Response<SessionDto>> {
    let id = session.jog_id;
    let linear = session.mode == JogMode::Linear;
    let state = session.state;
    let following = session.following;
    let open = finished.is_none() && state != ProgressState::Completed;

    let dto = SessionDto {
        session,
        notice: planned
            .and_then(|planned| planned.notice.as_ref())
            .map(ToString::to_string),
        record: finished.map(|finished| finished.record.clone()),
        uploaded: finished.map(|finished| finished.upload.is_ok()),
    };

    hateoas::Response::builder(dto, base_url)
        .link_if(open, "self", resource!("/{}", id))
        .link_if(open, "distance", resource!("/{}/distance", id))
        .link_if(open, "mode", resource!("/{}/mode", id))
        .link_if(open && linear, "destination", resource!("/{}/destination", id))
        .link_if(open, "position", resource!("/{}/position", id))
        .link_if(open && !following, "start", resource!("/{}/start", id))
        .link_if(open && following, "end", resource!("/{}/end", id))
        .debug_info_option(
            "uploadError",
            finished.and_then(|finished| finished.upload.as_ref().err().map(ToString::to_string)),
        )
        .build()
        .json()
}

async fn find_session(
    state: &WebState,
    id: u64,
    method: &Method,
    uri: &str,
) -> RouteResult<Arc<JogSession>> {
    state.sessions.get(Id::new(id)).await.ok_or_else(|| {
        RouteErrorResponse::not_found(method, uri)
            .with_message(format!("There is no jog session with id {id}."))
    })
}

fn validate_distance(distance: f64, method: &Method, uri: &str) -> RouteResult<()> {
    if distance.is_finite() && distance > 0.0 {
        return Ok(());
    }
    Err(RouteErrorResponse::new(StatusCode::BAD_REQUEST)
        .with_method(method)
        .with_uri(uri)
        .with_message("The distance has to be a positive number of kilometers.")
        .with_detailed_information(format!("got {distance}")))
}

fn conflict(method: &Method, uri: &str, message: &str) -> RouteErrorResponse {
    RouteErrorResponse::new(StatusCode::CONFLICT)
        .with_method(method)
        .with_uri(uri)
        .with_message(message)
}

async fn create_session(
    OriginalUri(original_uri): OriginalUri,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(params): Json<NewSession>,
) -> HateoasResult<SessionDto> {
    validate_distance(params.distance, &Method::POST, original_uri.path())?;

    let mut jog = JogState::new(
        params.distance,
        params.mode,
        params.start,
        state.session_config.tracker,
    );
    if params.mode == JogMode::Linear {
        jog.set_destination(params.destination);
    }

    let session = Arc::new(JogSession::new(
        state.sessions.next_id(),
        params.uid,
        state.session_config,
        state.routing.clone(),
        state.store.clone(),
        jog,
    ));
    state.sessions.insert(session.clone()).await;
    log::info!(
        "jog session {} created for user {}",
        session.jog_id(),
        session.user_id()
    );

    let planned = session.regenerate().await;
    Ok(session_response(
        session.snapshot().await,
        Some(&planned),
        None,
        base_url,
    ))
}

async fn get_session(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::GET, original_uri.path()).await?;
    Ok(session_response(session.snapshot().await, None, None, base_url))
}

async fn set_distance(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(params): Json<DistanceParams>,
) -> HateoasResult<SessionDto> {
    validate_distance(params.distance, &Method::PUT, original_uri.path())?;
    let session = find_session(&state, id, &Method::PUT, original_uri.path()).await?;
    let planned = session.set_distance(params.distance).await;
    Ok(session_response(
        session.snapshot().await,
        Some(&planned),
        None,
        base_url,
    ))
}

async fn set_mode(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(params): Json<ModeParams>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::PUT, original_uri.path()).await?;
    let planned = session.set_mode(params.mode).await;
    Ok(session_response(
        session.snapshot().await,
        Some(&planned),
        None,
        base_url,
    ))
}

async fn set_destination(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(params): Json<DestinationParams>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::PUT, original_uri.path()).await?;
    let planned = session.set_destination(params.destination).await.ok_or_else(|| {
        conflict(
            &Method::PUT,
            original_uri.path(),
            "Only linear jogs have a destination.",
        )
    })?;
    Ok(session_response(
        session.snapshot().await,
        Some(&planned),
        None,
        base_url,
    ))
}

async fn update_position(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
    Json(params): Json<PositionParams>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::POST, original_uri.path()).await?;
    let update = session.update_position(params.position).await;

    let (planned, finished) = match &update {
        PositionUpdate::Ignored => (None, None),
        PositionUpdate::Replanned(planned) => (Some(planned), None),
        PositionUpdate::Progressed { finished, .. } => (None, finished.as_ref()),
    };
    if finished.is_some() {
        state.sessions.remove(session.jog_id()).await;
    }

    Ok(session_response(
        session.snapshot().await,
        planned,
        finished,
        base_url,
    ))
}

async fn start_jog(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::POST, original_uri.path()).await?;
    if !session.start_jog().await {
        return Err(conflict(
            &Method::POST,
            original_uri.path(),
            "The jog has already started.",
        ));
    }
    Ok(session_response(session.snapshot().await, None, None, base_url))
}

async fn end_jog(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::POST, original_uri.path()).await?;
    let finished = session.end_jog().await.ok_or_else(|| {
        conflict(
            &Method::POST,
            original_uri.path(),
            "The jog is not being followed.",
        )
    })?;
    state.sessions.remove(session.jog_id()).await;
    Ok(session_response(
        session.snapshot().await,
        None,
        Some(&finished),
        base_url,
    ))
}

/// Ends the session whether or not the route was followed. A followed jog is
/// recorded as if it had been ended.
async fn close_session(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<u64>,
    State(state): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<SessionDto> {
    let session = find_session(&state, id, &Method::DELETE, original_uri.path()).await?;
    let finished = session.close().await;
    state.sessions.remove(session.jog_id()).await;
    Ok(session_response(
        session.snapshot().await,
        None,
        finished.as_ref(),
        base_url,
    ))
}
