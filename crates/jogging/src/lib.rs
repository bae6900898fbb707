use std::error;
use std::fmt;

pub mod circle;
pub mod recorder;
pub mod routing;
pub mod selector;
pub mod session;
pub mod stopwatch;
pub mod tracker;

pub use routing::RoutingError;

/// Why a route could not be planned. Both kinds are recoverable: the session
/// falls back to the empty route and the user may retry by changing any
/// route parameter.
#[derive(Debug, Clone)]
pub enum PlanError {
    RoutingServiceUnavailable(RoutingError),
    NoCandidatesSucceeded,
}

impl error::Error for PlanError {}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlanError::RoutingServiceUnavailable(why) => {
                write!(f, "Routing service unavailable: {}", why)
            }
            PlanError::NoCandidatesSucceeded => write!(f, "No routes returned."),
        }
    }
}

impl From<RoutingError> for PlanError {
    fn from(why: RoutingError) -> Self {
        PlanError::RoutingServiceUnavailable(why)
    }
}

pub type PlanResult<O> = Result<O, PlanError>;
