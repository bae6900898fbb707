use chrono::Duration;
use model::{jog::JogMode, route::Route};
use serde::{Deserialize, Serialize};
use utility::geo::{haversine_distance_m, planar_distance, Coordinate};

use crate::{selector::PlanRequest, stopwatch::Stopwatch};

/// How close the user has to get to a step's first coordinate for it to
/// count as reached.
pub const WAYPOINT_REACHED_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProximityMetric {
    /// Euclidean distance on the raw coordinate values.
    Planar,
    /// Great-circle distance in meters.
    HaversineMeters,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub threshold: f64,
    pub metric: ProximityMetric,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold: WAYPOINT_REACHED_THRESHOLD,
            metric: ProximityMetric::Planar,
        }
    }
}

impl TrackerConfig {
    fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        match self.metric {
            ProximityMetric::Planar => planar_distance(a, b),
            ProximityMetric::HaversineMeters => haversine_distance_m(a, b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressState {
    Idle,
    Following,
    Completed,
}

/// Distance and time of a jog that has just ended.
#[derive(Debug, Clone, PartialEq)]
pub struct JogSummary {
    /// meters
    pub distance: f64,
    pub time: Duration,
}

/// Result of one position tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub state: ProgressState,
    /// What to render now; the empty route once the jog is completed.
    pub route: Route,
    /// Set on the tick that completed the jog.
    pub summary: Option<JogSummary>,
}

/// The mutable state of one jog: its parameters while a route is being
/// planned and its progress once the route is followed.
#[derive(Debug, Clone)]
pub struct JogState {
    distance: f64,
    mode: JogMode,
    start_point: Coordinate,
    destination: Option<Coordinate>,
    position: Coordinate,

    route: Route,
    current_leg: usize,
    step: usize,
    distance_travelled: f64,

    following: bool,
    finished: bool,
    stopwatch: Stopwatch,
    config: TrackerConfig,
}

impl JogState {
    pub fn new(distance: f64, mode: JogMode, start_point: Coordinate, config: TrackerConfig) -> Self {
        Self {
            distance,
            mode,
            start_point,
            destination: None,
            position: start_point,
            route: Route::Empty,
            current_leg: 0,
            step: 0,
            distance_travelled: 0.0,
            following: false,
            finished: false,
            stopwatch: Stopwatch::new(),
            config,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn mode(&self) -> JogMode {
        self.mode
    }

    pub fn start_point(&self) -> Coordinate {
        self.start_point
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn current_leg(&self) -> usize {
        self.current_leg
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    pub fn set_mode(&mut self, mode: JogMode) {
        self.mode = mode;
    }

    pub fn set_destination(&mut self, destination: Option<Coordinate>) {
        self.destination = destination;
    }

    /// Moves the start point along with the user while no route is followed.
    pub fn set_start_point(&mut self, start_point: Coordinate) {
        self.start_point = start_point;
        self.position = start_point;
    }

    /// Adopts a freshly planned route and rewinds progress to its beginning.
    pub fn set_route(&mut self, route: Route) {
        self.route = route;
        self.current_leg = 0;
        self.step = 0;
    }

    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest {
            mode: self.mode,
            distance: self.distance,
            start: self.start_point,
            destination: self.destination,
        }
    }

    pub fn state(&self) -> ProgressState {
        if self.finished {
            ProgressState::Completed
        } else if self.following
            && self
                .route
                .planned()
                .and_then(|route| route.step(self.current_leg, self.step))
                .is_some()
        {
            ProgressState::Following
        } else {
            ProgressState::Idle
        }
    }

    /// Starts following the current route. Returns `false` if the jog is
    /// already being followed or has ended.
    pub fn start_jog(&mut self) -> bool {
        if self.following || self.finished {
            return false;
        }
        self.following = true;
        self.stopwatch.start();
        true
    }

    /// Stops following and finalizes the jog. Returns `None` if the jog was
    /// not being followed.
    pub fn end_jog(&mut self) -> Option<JogSummary> {
        if !self.following {
            return None;
        }
        self.following = false;
        self.finished = true;
        self.stopwatch.stop();
        Some(JogSummary {
            distance: self.distance_travelled,
            time: self.stopwatch.elapsed(),
        })
    }

    /// Marks the jog as ended without it ever having been followed.
    pub fn abandon(&mut self) {
        self.following = false;
        self.finished = true;
        self.stopwatch.stop();
    }

    /// Advances along the route if `position` has reached the first
    /// coordinate of the current step. Without a followed route, or with
    /// missing leg or step data, the tick changes nothing.
    pub fn advance(&mut self, position: Coordinate) -> Progress {
        self.position = position;
        if !self.following {
            return self.progress();
        }

        let Some(route) = self.route.planned_mut() else {
            return self.progress();
        };
        let leg_count = route.legs.len();
        let Some(leg) = route.legs.get(self.current_leg) else {
            return self.progress();
        };
        let step_count = leg.steps.len();
        let Some(step) = leg.steps.get(self.step) else {
            return self.progress();
        };
        let Some(waypoint) = step.geometry.first() else {
            return self.progress();
        };
        let step_distance = step.distance;

        if self.config.distance(position, waypoint) >= self.config.threshold {
            return self.progress();
        }

        self.distance_travelled += step_distance.max(0.0);
        route.geometry.drop_first();
        self.step += 1;

        if self.step == step_count {
            self.step = 0;
            self.current_leg += 1;

            if self.current_leg == leg_count {
                let summary = self.end_jog();
                self.route = Route::Empty;
                log::info!("route completed after {}m", self.distance_travelled);
                return Progress {
                    state: ProgressState::Completed,
                    route: Route::Empty,
                    summary,
                };
            }
        }

        self.progress()
    }

    fn progress(&self) -> Progress {
        Progress {
            state: self.state(),
            route: self.route.clone(),
            summary: None,
        }
    }
}
