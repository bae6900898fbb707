use std::env;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;

use tokio::sync::RwLock;

use chrono::Local;

use crate::ApiError;

pub const MAPBOX_API_URL: &str = "https://api.mapbox.com";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapboxCredentials {
    pub access_token: String,
    pub api_url: Option<String>,
    pub rate_limit_per_minute: Option<u64>,
    pub proxy: Option<String>,
}

impl MapboxCredentials {
    pub fn new<S: Into<String>>(access_token: S) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: None,
            rate_limit_per_minute: None,
            proxy: None,
        }
    }

    /// Reads `MAPBOX_ACCESS_TOKEN` and the optional `MAPBOX_API_URL`,
    /// `MAPBOX_RATE_LIMIT_PER_MINUTE` and `MAPBOX_PROXY`.
    pub fn env() -> Option<Self> {
        let access_token = env::var("MAPBOX_ACCESS_TOKEN").ok()?;
        let api_url = env::var("MAPBOX_API_URL").ok();
        let rate_limit_per_minute = env::var("MAPBOX_RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|limit| limit.parse().ok());
        let proxy = env::var("MAPBOX_PROXY").ok();

        Some(Self {
            access_token,
            api_url,
            rate_limit_per_minute,
            proxy,
        })
    }

    pub fn base_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(MAPBOX_API_URL)
            .trim_end_matches('/')
    }
}

struct MapboxClientState {
    pub available_requests: u64,
    pub last_refill: chrono::DateTime<Local>,
}

pub struct MapboxClient {
    pub credentials: MapboxCredentials,
    http: reqwest::Client,
    state: RwLock<MapboxClientState>,
}

impl MapboxClient {
    pub fn new(credentials: &MapboxCredentials) -> Result<Self, ApiError> {
        /* build the http client with optional proxy */
        let http = if let Some(proxy_url) = &credentials.proxy {
            log::info!("Using proxy '{proxy_url}' for Mapbox requests.");
            reqwest::Client::builder()
                .proxy(reqwest::Proxy::all(proxy_url)?)
                .build()?
        } else {
            reqwest::Client::new()
        };

        Ok(Self {
            credentials: credentials.clone(),
            http,
            state: RwLock::new(MapboxClientState {
                available_requests: credentials.rate_limit_per_minute.unwrap_or(0),
                last_refill: chrono::offset::Local::now(),
            }),
        })
    }

    pub async fn available_requests(&self) -> u64 {
        self.state.read().await.available_requests
    }

    async fn try_decrement_available_requests(&self) -> Result<(), ApiError> {
        if let Some(rate_limit_minutes) = self.credentials.rate_limit_per_minute {
            let mut state = self.state.write().await;

            let minutes_since_last_request =
                (chrono::offset::Local::now() - state.last_refill).num_minutes();
            if minutes_since_last_request >= 1 {
                state.available_requests = rate_limit_minutes;
                state.last_refill = chrono::offset::Local::now();
            }

            if state.available_requests != 0 {
                state.available_requests -= 1;
            } else {
                return Err(ApiError::RateLimitReached);
            }
        }
        Ok(())
    }

    /// Fetch data from an endpoint using this client. The access token is
    /// appended to `query`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.try_decrement_available_requests().await?;

        log::debug!("Requesting Endpoint '{endpoint}'.");

        /* perform get-request */
        let url = format!("{}/{endpoint}", self.credentials.base_url());
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("access_token", self.credentials.access_token.as_str())])
            .send()
            .await?;

        /* parse response */
        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await?),
            other => match response.text().await {
                Ok(val) => Err(ApiError::InvalidResponse {
                    status_code: other,
                    url,
                    response: Some(val),
                }),
                Err(_) => Err(ApiError::InvalidResponse {
                    status_code: other,
                    url,
                    response: None,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rate_limit_is_enforced() {
        let credentials = MapboxCredentials {
            rate_limit_per_minute: Some(2),
            ..MapboxCredentials::new("token")
        };
        let client = MapboxClient::new(&credentials).unwrap();

        assert_eq!(client.available_requests().await, 2);
        assert!(client.try_decrement_available_requests().await.is_ok());
        assert!(client.try_decrement_available_requests().await.is_ok());
        assert!(matches!(
            client.try_decrement_available_requests().await,
            Err(ApiError::RateLimitReached)
        ));
    }

    #[tokio::test]
    async fn no_rate_limit_without_configuration() {
        let client = MapboxClient::new(&MapboxCredentials::new("token")).unwrap();
        for _ in 0..10 {
            assert!(client.try_decrement_available_requests().await.is_ok());
        }
    }

    #[test]
    fn base_url_defaults_to_mapbox() {
        let mut credentials = MapboxCredentials::new("token");
        assert_eq!(credentials.base_url(), MAPBOX_API_URL);
        credentials.api_url = Some("http://localhost:9000/".to_owned());
        assert_eq!(credentials.base_url(), "http://localhost:9000");
    }
}
