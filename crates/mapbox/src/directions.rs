use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;

use jogging::routing::{RoutingError, RoutingService};
use model::route::{Geometry, Leg, RouteResult, Step};
use utility::geo::Coordinate;

use crate::{client::MapboxClient, ApiError};

pub const WALKING_PROFILE: &str = "mapbox/walking";

const DIRECTIONS_QUERY: [(&str, &str); 4] = [
    ("alternatives", "true"),
    ("geometries", "geojson"),
    ("steps", "true"),
    ("walkway_bias", "1"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: Geometry,
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsLeg {
    pub distance: f64,
    #[serde(default)]
    pub steps: Vec<DirectionsStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsStep {
    pub distance: f64,
    pub geometry: Geometry,
}

impl From<DirectionsStep> for Step {
    fn from(value: DirectionsStep) -> Self {
        Step {
            distance: value.distance,
            geometry: value.geometry,
        }
    }
}

impl From<DirectionsLeg> for Leg {
    fn from(value: DirectionsLeg) -> Self {
        Leg {
            distance: value.distance,
            steps: value.steps.into_iter().map(Step::from).collect(),
        }
    }
}

impl From<DirectionsRoute> for RouteResult {
    fn from(value: DirectionsRoute) -> Self {
        RouteResult {
            distance: value.distance,
            duration: value.duration,
            geometry: value.geometry,
            legs: value.legs.into_iter().map(Leg::from).collect(),
        }
    }
}

impl DirectionsResponse {
    /// The first route is the one Mapbox recommends; alternatives are ignored.
    pub fn into_route(self) -> Result<RouteResult, ApiError> {
        if self.code != "Ok" {
            log::debug!(
                "directions answered '{}': {}",
                self.code,
                self.message.as_deref().unwrap_or("")
            );
        }
        self.routes
            .into_iter()
            .next()
            .map(RouteResult::from)
            .ok_or(ApiError::NoRoute)
    }
}

/// `directions/v5/mapbox/walking/{lon},{lat};{lon},{lat};...`
pub fn directions_endpoint(waypoints: &[Coordinate]) -> String {
    let waypoints = waypoints
        .iter()
        .map(|waypoint| format!("{},{}", waypoint.longitude, waypoint.latitude))
        .join(";");
    format!("directions/v5/{WALKING_PROFILE}/{waypoints}")
}

impl MapboxClient {
    pub async fn walking_directions(
        &self,
        waypoints: &[Coordinate],
    ) -> Result<RouteResult, ApiError> {
        if waypoints.len() < 2 {
            return Err(ApiError::Other(format!(
                "directions need at least two waypoints, got {}",
                waypoints.len()
            )));
        }

        let response: DirectionsResponse = self
            .get(&directions_endpoint(waypoints), &DIRECTIONS_QUERY)
            .await?;
        response.into_route()
    }
}

#[async_trait]
impl RoutingService for MapboxClient {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<RouteResult, RoutingError> {
        self.walking_directions(waypoints).await.map_err(|why| {
            log::error!("Mapbox directions request failed: {why}");
            RoutingError::from(why)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MapboxCredentials;

    const RESPONSE: &str = r#"{
        "code": "Ok",
        "uuid": "abc",
        "waypoints": [],
        "routes": [
            {
                "weight_name": "pedestrian",
                "weight": 900.1,
                "distance": 1234.5,
                "duration": 890.2,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-1.0522, 50.7980], [-1.0510, 50.7990], [-1.0500, 50.8000]]
                },
                "legs": [
                    {
                        "distance": 1234.5,
                        "duration": 890.2,
                        "summary": "Albert Road",
                        "steps": [
                            {
                                "distance": 600.0,
                                "duration": 400.0,
                                "name": "Albert Road",
                                "mode": "walking",
                                "geometry": {
                                    "type": "LineString",
                                    "coordinates": [[-1.0522, 50.7980], [-1.0510, 50.7990]]
                                }
                            },
                            {
                                "distance": 634.5,
                                "duration": 490.2,
                                "geometry": {
                                    "type": "LineString",
                                    "coordinates": [[-1.0510, 50.7990], [-1.0500, 50.8000]]
                                }
                            }
                        ]
                    }
                ]
            },
            {
                "distance": 1500.0,
                "duration": 1000.0,
                "geometry": { "type": "LineString", "coordinates": [] },
                "legs": []
            }
        ]
    }"#;

    #[test]
    fn first_route_is_used() {
        let response: DirectionsResponse = serde_json::from_str(RESPONSE).unwrap();
        let route = response.into_route().unwrap();

        assert_eq!(route.distance, 1234.5);
        assert_eq!(route.duration, 890.2);
        assert_eq!(route.geometry.coordinates.len(), 3);
        assert_eq!(route.geometry.first(), Some(Coordinate::new(-1.0522, 50.7980)));
        assert_eq!(route.legs.len(), 1);
        assert_eq!(route.legs[0].steps.len(), 2);

        let step = route.step(0, 1).unwrap();
        assert_eq!(step.distance, 634.5);
        assert_eq!(step.geometry.first(), Some(Coordinate::new(-1.0510, 50.7990)));
    }

    #[test]
    fn no_routes_is_no_route() {
        let response: DirectionsResponse = serde_json::from_str(
            r#"{ "code": "NoRoute", "message": "No route found", "routes": [] }"#,
        )
        .unwrap();
        assert!(matches!(response.into_route(), Err(ApiError::NoRoute)));

        let response: DirectionsResponse =
            serde_json::from_str(r#"{ "code": "NoSegment" }"#).unwrap();
        assert!(matches!(response.into_route(), Err(ApiError::NoRoute)));
    }

    #[test]
    fn endpoint_lists_longitude_first() {
        let endpoint = directions_endpoint(&[
            Coordinate::new(-1.05, 50.79),
            Coordinate::new(-1.04, 50.8),
        ]);
        assert_eq!(endpoint, "directions/v5/mapbox/walking/-1.05,50.79;-1.04,50.8");
    }

    #[tokio::test]
    async fn a_single_waypoint_is_rejected_before_any_request() {
        let client = MapboxClient::new(&MapboxCredentials::new("token")).unwrap();
        let result = client
            .walking_directions(&[Coordinate::new(-1.05, 50.79)])
            .await;
        assert!(matches!(result, Err(ApiError::Other(_))));
    }
}
