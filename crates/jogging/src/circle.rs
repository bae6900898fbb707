//! Candidate loops for circular jogs.
//!
//! A loop is approximated by a regular octagon whose first vertex is the
//! start point (the bottom of the circle). Four copies of that octagon,
//! turned about the start point in steps of 90°, give the routing service
//! four different waypoint orders to work with.

use std::f64::consts::{FRAC_PI_4, PI};

use utility::geo::{
    multi_translate, point_to_distance_bearing, rotate_bearing_90, Coordinate,
    DistanceBearing, Point,
};

pub const CIRCLE_POINTS: usize = 8;
pub const CANDIDATES: usize = 4;

pub type Circle = [DistanceBearing; CIRCLE_POINTS];

/// Eight points on a circle of the given circumference, as distance-bearing
/// pairs from the first point.
pub fn generate_circle(circumference: f64) -> Circle {
    let r = circumference / (2.0 * PI);
    let (sin, cos) = FRAC_PI_4.sin_cos();

    [
        Point::new(0.0, 0.0),
        Point::new(-r * sin, r - r * cos),
        Point::new(-r, r),
        Point::new(-r * sin, r + r * cos),
        Point::new(0.0, 2.0 * r),
        Point::new(r * sin, r + r * cos),
        Point::new(r, r),
        Point::new(r * sin, r - r * cos),
    ]
    .map(point_to_distance_bearing)
}

/// The base circle followed by its copies turned by 90°, 180° and 270°.
pub fn generate_four_candidates(circumference: f64) -> [Circle; CANDIDATES] {
    let base = generate_circle(circumference);
    [0, 1, 2, 3].map(|times| base.map(|pair| rotate_bearing_90(pair, times)))
}

/// All four candidates projected onto the map with their first vertex at
/// `start`.
pub fn project_candidates(start: Coordinate, circumference: f64) -> Vec<Vec<Coordinate>> {
    generate_four_candidates(circumference)
        .iter()
        .map(|circle| multi_translate(start, circle))
        .collect()
}
