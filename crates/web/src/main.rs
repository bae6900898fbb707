use std::sync::Arc;

use mapbox::client::{MapboxClient, MapboxCredentials};
use web::{config::WebConfig, start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // routing service
    let credentials =
        MapboxCredentials::env().expect("expected MAPBOX_ACCESS_TOKEN in env.");
    let mapbox = MapboxClient::new(&credentials).expect("could not create mapbox client.");

    // web server
    let config = WebConfig::from_env();
    let state = WebState::new(Arc::new(mapbox), &config);

    if let Err(why) = start_web_server(&config, state).await {
        log::error!("web server stopped: {why}");
    }
}
