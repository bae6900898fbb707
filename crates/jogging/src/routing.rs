use std::error;
use std::fmt;

use async_trait::async_trait;
use model::route::RouteResult;
use utility::geo::Coordinate;

#[derive(Debug, Clone)]
pub enum RoutingError {
    /// The service answered with something other than a route, or could not
    /// be reached at all.
    Unavailable {
        status_code: Option<u16>,
        message: String,
    },
    /// The service answered successfully but without any route.
    NoRoute,
}

impl error::Error for RoutingError {}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoutingError::Unavailable {
                status_code: Some(status_code),
                message,
            } => write!(f, "Error: {} ({})", status_code, message),
            RoutingError::Unavailable {
                status_code: None,
                message,
            } => write!(f, "Error: {}", message),
            RoutingError::NoRoute => write!(f, "No route found."),
        }
    }
}

/// Turns an ordered list of waypoints into a walkable route.
///
/// Implementations request walking directions with full geometry and
/// turn-by-turn steps, and return only the first route of the response.
#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<RouteResult, RoutingError>;
}
