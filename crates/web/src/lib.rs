pub use crate::common::RouteResult;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{on, MethodRouter},
    Router,
};
use jogging::{routing::RoutingService, session::SessionConfig};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, set_status::SetStatus};

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    config::WebConfig,
    sessions::SessionRegistry,
    store::MemoryStore,
};

pub mod api;
pub mod common;
pub mod config;
pub mod hateoas;
pub mod middleware;
pub mod sessions;
pub mod store;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<SessionRegistry>,
    pub routing: Arc<dyn RoutingService>,
    pub session_config: SessionConfig,
}

impl WebState {
    pub fn new(routing: Arc<dyn RoutingService>, config: &WebConfig) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            sessions: Arc::new(SessionRegistry::new()),
            routing,
            session_config: config.session_config(),
        }
    }
}

pub async fn start_web_server(config: &WebConfig, state: WebState) -> std::io::Result<()> {
    let routes = Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(static_content(&config.static_dir));

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!(
        "serving on {} with static content from '{}'",
        config.bind_address,
        config.static_dir
    );
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

/// Serves the browser client; unknown paths get the JSON 404.
fn static_content(dir: &str) -> ServeDir<SetStatus<MethodRouter>> {
    ServeDir::new(dir).not_found_service(on(METHOD_FILTER_ALL, route_not_found))
}
