use std::env;

use jogging::{
    session::SessionConfig,
    tracker::{ProximityMetric, TrackerConfig, WAYPOINT_REACHED_THRESHOLD},
};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "./resources/www";

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: String,
    pub static_dir: String,
    /// Waypoint threshold in meters; positions are compared by great-circle
    /// distance on the server.
    pub waypoint_threshold_m: f64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            static_dir: DEFAULT_STATIC_DIR.to_owned(),
            waypoint_threshold_m: WAYPOINT_REACHED_THRESHOLD,
        }
    }
}

impl WebConfig {
    /// Reads `JOGGING_BIND_ADDRESS`, `JOGGING_STATIC_DIR` and
    /// `JOGGING_WAYPOINT_THRESHOLD_M`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let waypoint_threshold_m = match env::var("JOGGING_WAYPOINT_THRESHOLD_M") {
            Ok(value) => value.parse().unwrap_or_else(|why| {
                log::warn!(
                    "ignoring JOGGING_WAYPOINT_THRESHOLD_M='{value}': {why}, using {}",
                    defaults.waypoint_threshold_m
                );
                defaults.waypoint_threshold_m
            }),
            Err(_) => defaults.waypoint_threshold_m,
        };

        Self {
            bind_address: env::var("JOGGING_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            static_dir: env::var("JOGGING_STATIC_DIR").unwrap_or(defaults.static_dir),
            waypoint_threshold_m,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tracker: TrackerConfig {
                threshold: self.waypoint_threshold_m,
                metric: ProximityMetric::HaversineMeters,
            },
            ..SessionConfig::default()
        }
    }
}
