use serde::{Deserialize, Serialize};
use utility::geo::Coordinate;

/// GeoJSON `LineString`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "LineString")]
pub struct Geometry {
    pub coordinates: Vec<Coordinate>,
}

impl Geometry {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }

    pub fn first(&self) -> Option<Coordinate> {
        self.coordinates.first().copied()
    }

    /// Removes the first coordinate, if any.
    pub fn drop_first(&mut self) {
        if !self.coordinates.is_empty() {
            self.coordinates.remove(0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// meters
    pub distance: f64,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    /// meters
    pub distance: f64,
    pub steps: Vec<Step>,
}

/// A walkable route as produced by the routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Realized path length in meters.
    pub distance: f64,
    /// Expected duration in seconds.
    pub duration: f64,
    pub geometry: Geometry,
    pub legs: Vec<Leg>,
}

impl RouteResult {
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    pub fn step(&self, leg: usize, step: usize) -> Option<&Step> {
        self.legs.get(leg)?.steps.get(step)
    }
}

/// The route a session renders. `Empty` is the sentinel for "nothing to
/// show", distinct from a planned route that happens to have no coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Route {
    #[default]
    Empty,
    Planned(RouteResult),
}

impl Route {
    pub fn is_empty(&self) -> bool {
        matches!(self, Route::Empty)
    }

    pub fn planned(&self) -> Option<&RouteResult> {
        match self {
            Route::Empty => None,
            Route::Planned(route) => Some(route),
        }
    }

    pub fn planned_mut(&mut self) -> Option<&mut RouteResult> {
        match self {
            Route::Empty => None,
            Route::Planned(route) => Some(route),
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.planned().map(|route| &route.geometry)
    }
}

impl From<RouteResult> for Route {
    fn from(value: RouteResult) -> Self {
        Route::Planned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned_without_coordinates() -> Route {
        Route::Planned(RouteResult {
            distance: 0.0,
            duration: 0.0,
            geometry: Geometry::default(),
            legs: vec![],
        })
    }

    #[test]
    fn empty_route_is_not_an_empty_geometry() {
        let planned = planned_without_coordinates();
        assert!(!planned.is_empty());
        assert_ne!(planned, Route::Empty);
        assert!(Route::default().is_empty());
    }

    #[test]
    fn route_json_is_tagged() {
        let json = serde_json::to_value(Route::Empty).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "empty" }));

        let json = serde_json::to_value(planned_without_coordinates()).unwrap();
        assert_eq!(json["type"], "planned");
        assert_eq!(json["geometry"]["type"], "LineString");
    }

    #[test]
    fn drop_first_trims_one_coordinate() {
        let mut geometry = Geometry::new(vec![
            Coordinate::new(1.0, 1.0),
            Coordinate::new(2.0, 2.0),
        ]);
        geometry.drop_first();
        assert_eq!(geometry.coordinates, vec![Coordinate::new(2.0, 2.0)]);
        geometry.drop_first();
        geometry.drop_first();
        assert!(geometry.coordinates.is_empty());
    }
}
