use std::error;
use std::fmt;
use std::sync::Arc;

use jogging::RoutingError;

pub mod client;
pub mod directions;

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    RateLimitReached,
    NoRoute,
    Other(String),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response({}) {}", status_code, url),
            },
            ApiError::RateLimitReached => write!(f, "Rate limit reached."),
            ApiError::NoRoute => write!(f, "No route found."),
            ApiError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::JsonError(Arc::new(e))
    }
}

impl From<ApiError> for RoutingError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NoRoute => RoutingError::NoRoute,
            ApiError::InvalidResponse {
                status_code,
                response,
                ..
            } => RoutingError::Unavailable {
                status_code: Some(status_code.as_u16()),
                message: response.unwrap_or_else(|| {
                    status_code
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_owned()
                }),
            },
            ApiError::RequestError(ref why) => RoutingError::Unavailable {
                status_code: why.status().map(|status| status.as_u16()),
                message: e.to_string(),
            },
            other => RoutingError::Unavailable {
                status_code: None,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_responses_keep_their_status() {
        let error = RoutingError::from(ApiError::InvalidResponse {
            status_code: reqwest::StatusCode::UNAUTHORIZED,
            url: "https://api.mapbox.com/directions".to_owned(),
            response: None,
        });
        assert!(matches!(
            error,
            RoutingError::Unavailable {
                status_code: Some(401),
                ref message,
            } if message == "Unauthorized"
        ));
    }

    #[test]
    fn missing_routes_stay_missing() {
        assert!(matches!(
            RoutingError::from(ApiError::NoRoute),
            RoutingError::NoRoute
        ));
        assert!(matches!(
            RoutingError::from(ApiError::RateLimitReached),
            RoutingError::Unavailable {
                status_code: None,
                ..
            }
        ));
    }
}
