use serde::{Deserialize, Serialize};

/// Earth radius used for destination-point projection.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// A geographic coordinate in degrees. Serialized as the GeoJSON pair
/// `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Quantizes both components to `places` decimal places.
    pub fn rounded(self, places: i32) -> Self {
        Self {
            longitude: round_to_places(self.longitude, places),
            latitude: round_to_places(self.latitude, places),
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.longitude, value.latitude]
    }
}

/// A planar offset from an implicit origin, `x` pointing east and `y` north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Distance and bearing relative to an implicit origin. The bearing is in
/// degrees, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBearing {
    pub distance: f64,
    pub bearing: f64,
}

impl DistanceBearing {
    pub fn new(distance: f64, bearing: f64) -> Self {
        Self { distance, bearing }
    }
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

fn normalize_bearing(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

/// Turns a distance-bearing pair clockwise by `90 * times` degrees.
pub fn rotate_bearing_90(pair: DistanceBearing, times: u32) -> DistanceBearing {
    let turn = 90.0 * f64::from(times % 4);
    DistanceBearing {
        distance: pair.distance,
        bearing: normalize_bearing(pair.bearing + turn),
    }
}

/// Rotates a planar point counter-clockwise about the origin by `90 * times`
/// degrees.
pub fn rotate_cartesian_90(point: Point, times: u32) -> Point {
    let angle = degrees_to_radians(90.0 * f64::from(times % 4));
    let (sin, cos) = angle.sin_cos();
    Point {
        x: point.x * cos - point.y * sin,
        y: point.x * sin + point.y * cos,
    }
}

/// Converts a planar offset into a distance and a bearing in `[0, 360)`.
///
/// The bearing is built from the quadrant the point lies in (0°, 90°, 180° or
/// 270°, zero counting as positive) plus the arctangent residual measured from
/// that quadrant's base axis.
pub fn point_to_distance_bearing(point: Point) -> DistanceBearing {
    let east = point.x >= 0.0;
    let north = point.y >= 0.0;
    let x = point.x.abs();
    let y = point.y.abs();
    let distance = x.hypot(y);

    // points on the north-south axis have no residual
    if x == 0.0 {
        let base = if north { 0.0 } else { 180.0 };
        return DistanceBearing::new(distance, base);
    }

    let (base, residual) = match (east, north) {
        (true, true) => (0.0, (x / y).atan()),
        (true, false) => (90.0, (y / x).atan()),
        (false, false) => (180.0, (x / y).atan()),
        (false, true) => (270.0, (y / x).atan()),
    };

    DistanceBearing::new(distance, normalize_bearing(base + radians_to_degrees(residual)))
}

/// Projects `pair` (distance in km, bearing in degrees) from `origin` along a
/// great circle.
pub fn destination_from_origin(origin: Coordinate, pair: DistanceBearing) -> Coordinate {
    let latitude = degrees_to_radians(origin.latitude);
    let longitude = degrees_to_radians(origin.longitude);
    let bearing = degrees_to_radians(pair.bearing);
    let angular_distance = pair.distance / EARTH_RADIUS_KM;

    let destination_latitude = (latitude.sin() * angular_distance.cos()
        + latitude.cos() * angular_distance.sin() * bearing.cos())
    .asin();
    let destination_longitude = longitude
        + (bearing.sin() * angular_distance.sin() * latitude.cos())
            .atan2(angular_distance.cos() - latitude.sin() * destination_latitude.sin());

    Coordinate {
        longitude: radians_to_degrees(destination_longitude),
        latitude: radians_to_degrees(destination_latitude),
    }
}

pub fn multi_translate(origin: Coordinate, pairs: &[DistanceBearing]) -> Vec<Coordinate> {
    pairs
        .iter()
        .map(|pair| destination_from_origin(origin, *pair))
        .collect()
}

/// Euclidean distance on the raw coordinate values. Only meaningful for short
/// ranges.
pub fn planar_distance(a: Coordinate, b: Coordinate) -> f64 {
    (b.longitude - a.longitude).hypot(b.latitude - a.latitude)
}

/// Rounds half away from zero.
pub fn round_to_places(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn haversine_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1_rad = degrees_to_radians(a.latitude);
    let lat2_rad = degrees_to_radians(b.latitude);

    let dlat = lat2_rad - lat1_rad;
    let dlon = degrees_to_radians(b.longitude - a.longitude);

    let h = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}
