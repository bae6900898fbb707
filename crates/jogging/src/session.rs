use std::sync::Arc;

use model::{
    account::Account,
    jog::{JogMode, JogRecord},
    route::Route,
};
use serde::Serialize;
use tokio::sync::Mutex;
use utility::{geo::Coordinate, id::Id};

use crate::{
    recorder::{JogRecorder, RecordError},
    routing::RoutingService,
    selector::{self, Planned},
    tracker::{JogState, JogSummary, Progress, ProgressState, TrackerConfig},
};

/// Positions are compared after rounding to this many decimal places.
pub const POSITION_DECIMAL_PLACES: i32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub tracker: TrackerConfig,
    pub position_places: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            position_places: POSITION_DECIMAL_PLACES,
        }
    }
}

/// A jog that ended, and whether the recorder accepted it.
#[derive(Debug, Clone)]
pub struct Finished {
    pub record: JogRecord,
    pub upload: Result<(), RecordError>,
}

#[derive(Debug, Clone)]
pub enum PositionUpdate {
    /// Rounds to the last known position, or the session has ended.
    Ignored,
    /// Not following: the start point moved and the route was planned again.
    Replanned(Planned),
    /// Following: the tracker advanced, possibly to completion.
    Progressed {
        progress: Progress,
        finished: Option<Finished>,
    },
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub jog_id: Id<JogRecord>,
    pub user_id: Id<Account>,
    pub distance: f64,
    pub mode: JogMode,
    pub start_point: Coordinate,
    pub destination: Option<Coordinate>,
    pub route: Route,
    pub state: ProgressState,
    /// Set once the jog started, even while there is no step to follow.
    pub following: bool,
    pub current_leg: usize,
    pub step: usize,
    pub distance_travelled: f64,
    pub elapsed: String,
}

struct SessionState {
    jog: JogState,
    /// Bumped whenever a route being planned becomes outdated.
    generation: u64,
    last_position: Option<Coordinate>,
}

/// One user's jog, from configuring a route to uploading the result.
///
/// The jog state has a single writer at a time. Route planning only happens
/// while the route is not followed, progress ticks only while it is, and a
/// planned route is only adopted if nothing changed while the routing
/// service was being asked.
pub struct JogSession {
    jog_id: Id<JogRecord>,
    user_id: Id<Account>,
    config: SessionConfig,
    routing: Arc<dyn RoutingService>,
    recorder: Arc<dyn JogRecorder>,
    state: Mutex<SessionState>,
}

impl JogSession {
    pub fn new(
        jog_id: Id<JogRecord>,
        user_id: Id<Account>,
        config: SessionConfig,
        routing: Arc<dyn RoutingService>,
        recorder: Arc<dyn JogRecorder>,
        mut jog: JogState,
    ) -> Self {
        let start_point = jog.start_point().rounded(config.position_places);
        jog.set_start_point(start_point);
        Self {
            jog_id,
            user_id,
            config,
            routing,
            recorder,
            state: Mutex::new(SessionState {
                jog,
                generation: 0,
                last_position: Some(start_point),
            }),
        }
    }

    pub fn jog_id(&self) -> Id<JogRecord> {
        self.jog_id
    }

    pub fn user_id(&self) -> Id<Account> {
        self.user_id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        let jog = &state.jog;
        SessionSnapshot {
            jog_id: self.jog_id,
            user_id: self.user_id,
            distance: jog.distance(),
            mode: jog.mode(),
            start_point: jog.start_point(),
            destination: jog.destination(),
            route: jog.route().clone(),
            state: jog.state(),
            following: jog.is_following(),
            current_leg: jog.current_leg(),
            step: jog.step(),
            distance_travelled: jog.distance_travelled(),
            elapsed: jog.stopwatch().display(),
        }
    }

    pub async fn is_finished(&self) -> bool {
        self.state.lock().await.jog.is_finished()
    }

    /// Plans the route for the current parameters and adopts it, unless the
    /// jog started, ended or changed in the meantime.
    pub async fn regenerate(&self) -> Planned {
        let (request, generation) = {
            let mut state = self.state.lock().await;
            if state.jog.is_following() || state.jog.is_finished() {
                return Planned::route(state.jog.route().clone());
            }
            state.generation += 1;
            (state.jog.plan_request(), state.generation)
        };

        let planned = selector::plan(self.routing.as_ref(), &request).await;

        let mut state = self.state.lock().await;
        if state.generation != generation
            || state.jog.is_following()
            || state.jog.is_finished()
        {
            log::debug!("jog {}: discarding outdated route", self.jog_id);
            return Planned::route(state.jog.route().clone());
        }
        state.jog.set_route(planned.route.clone());
        planned
    }

    pub async fn set_distance(&self, distance: f64) -> Planned {
        self.state.lock().await.jog.set_distance(distance);
        self.regenerate().await
    }

    pub async fn set_mode(&self, mode: JogMode) -> Planned {
        self.state.lock().await.jog.set_mode(mode);
        self.regenerate().await
    }

    /// Selects a destination on the map. Only linear jogs have one; for
    /// circular jogs the selection is ignored and `None` is returned.
    pub async fn set_destination(&self, destination: Coordinate) -> Option<Planned> {
        {
            let mut state = self.state.lock().await;
            if state.jog.mode() != JogMode::Linear {
                return None;
            }
            state.jog.set_destination(Some(destination));
        }
        Some(self.regenerate().await)
    }

    /// Handles a geolocation update. Updates that round to the last known
    /// position are ignored.
    pub async fn update_position(&self, position: Coordinate) -> PositionUpdate {
        let position = position.rounded(self.config.position_places);

        let progress = {
            let mut state = self.state.lock().await;
            if state.jog.is_finished() || state.last_position == Some(position) {
                return PositionUpdate::Ignored;
            }
            state.last_position = Some(position);

            if !state.jog.is_following() {
                state.jog.set_start_point(position);
                None
            } else {
                let progress = state.jog.advance(position);
                if progress.summary.is_some() {
                    state.generation += 1;
                }
                Some(progress)
            }
        };

        match progress {
            None => PositionUpdate::Replanned(self.regenerate().await),
            Some(progress) => {
                let finished = match progress.summary.clone() {
                    Some(summary) => Some(self.upload(summary).await),
                    None => None,
                };
                PositionUpdate::Progressed { progress, finished }
            }
        }
    }

    /// Starts following the current route.
    pub async fn start_jog(&self) -> bool {
        let mut state = self.state.lock().await;
        let started = state.jog.start_jog();
        if started {
            log::info!("jog {} started", self.jog_id);
        }
        started
    }

    /// Stops following, finalizes the distance travelled and hands the record
    /// to the recorder. Returns `None` if the route was not being followed.
    pub async fn end_jog(&self) -> Option<Finished> {
        let summary = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.jog.end_jog()
        }?;
        Some(self.upload(summary).await)
    }

    /// Ends the session without a record, e.g. when it is discarded before
    /// the route was ever followed. Outstanding route planning is dropped.
    pub async fn close(&self) -> Option<Finished> {
        if let Some(finished) = self.end_jog().await {
            return Some(finished);
        }
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.jog.abandon();
        None
    }

    async fn upload(&self, summary: JogSummary) -> Finished {
        let record = JogRecord {
            jog_id: self.jog_id,
            user_id: self.user_id,
            time: summary.time,
            distance: summary.distance,
        };
        log::info!(
            "jog {} ended: {}m in {}s",
            self.jog_id,
            record.distance,
            record.time.num_seconds()
        );

        let upload = self.recorder.record(record.clone()).await;
        if let Err(why) = &upload {
            log::error!("could not record jog {}: {}", self.jog_id, why);
        }
        Finished { record, upload }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use model::route::{Geometry, Leg, RouteResult, Step};
    use tokio::sync::{Notify, Semaphore};

    use super::*;
    use crate::{
        routing::RoutingError,
        selector::tests::{route_of, FakeRouting},
        PlanError,
    };

    #[derive(Default)]
    struct FakeRecorder {
        records: StdMutex<Vec<JogRecord>>,
        reject: bool,
    }

    #[async_trait]
    impl JogRecorder for FakeRecorder {
        async fn record(&self, record: JogRecord) -> Result<(), RecordError> {
            if self.reject {
                return Err(RecordError::Rejected("failure".to_owned()));
            }
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    /// Holds every request until a permit is added to `gate`.
    struct GatedRouting {
        route: RouteResult,
        gate: Semaphore,
        entered: Notify,
    }

    #[async_trait]
    impl RoutingService for GatedRouting {
        async fn route(&self, _waypoints: &[Coordinate]) -> Result<RouteResult, RoutingError> {
            self.entered.notify_one();
            let _permit = self.gate.acquire().await.map_err(|_| RoutingError::NoRoute)?;
            Ok(self.route.clone())
        }
    }

    const START: Coordinate = Coordinate {
        longitude: 0.0,
        latitude: 0.0,
    };

    fn session(
        routing: Arc<dyn RoutingService>,
        recorder: Arc<FakeRecorder>,
        jog: JogState,
    ) -> JogSession {
        JogSession::new(
            Id::new(11),
            Id::new(42),
            SessionConfig::default(),
            routing,
            recorder,
            jog,
        )
    }

    fn circular() -> JogState {
        JogState::new(5.0, JogMode::Circular, START, TrackerConfig::default())
    }

    fn linear_to(destination: Coordinate) -> JogState {
        let mut jog = JogState::new(5.0, JogMode::Linear, START, TrackerConfig::default());
        jog.set_destination(Some(destination));
        jog
    }

    /// One leg whose two steps start 25 units east and north of the origin.
    fn two_step_route() -> RouteResult {
        let first = Coordinate::new(25.0, 0.0);
        let second = Coordinate::new(0.0, 25.0);
        RouteResult {
            distance: 5000.0,
            duration: 1800.0,
            geometry: Geometry::new(vec![first, second]),
            legs: vec![Leg {
                distance: 5000.0,
                steps: vec![
                    Step {
                        distance: 2000.0,
                        geometry: Geometry::new(vec![first, second]),
                    },
                    Step {
                        distance: 3000.0,
                        geometry: Geometry::new(vec![second, START]),
                    },
                ],
            }],
        }
    }

    #[tokio::test]
    async fn regeneration_adopts_the_closest_loop() {
        let routing = Arc::new(FakeRouting::with_distances(&[6100.0, 5200.0, 4700.0, 5050.0]));
        let session = session(routing.clone(), Arc::default(), circular());

        let planned = session.regenerate().await;
        assert!(planned.notice.is_none());
        assert_eq!(planned.route, Route::Planned(route_of(5050.0)));
        assert_eq!(session.snapshot().await.route, planned.route);
        assert_eq!(routing.calls(), 4);
    }

    #[tokio::test]
    async fn failed_regeneration_falls_back_to_the_empty_route() {
        let routing = Arc::new(FakeRouting::new([]));
        let session = session(routing, Arc::default(), circular());

        let planned = session.regenerate().await;
        assert!(planned.route.is_empty());
        assert!(matches!(planned.notice, Some(PlanError::NoCandidatesSucceeded)));

        assert!(session.start_jog().await);
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.state, ProgressState::Idle);
        assert!(snapshot.following);
    }

    #[tokio::test]
    async fn repeated_positions_are_ignored() {
        let routing = Arc::new(FakeRouting::with_distances(&[5000.0; 8]));
        let session = session(routing.clone(), Arc::default(), circular());

        let update = session.update_position(Coordinate::new(0.00001, -0.00002)).await;
        assert!(matches!(update, PositionUpdate::Ignored));
        assert_eq!(routing.calls(), 0);

        let moved = Coordinate::new(0.00051, 0.0);
        let update = session.update_position(moved).await;
        assert!(matches!(update, PositionUpdate::Replanned(_)));
        assert_eq!(routing.calls(), 4);
        assert_eq!(session.snapshot().await.start_point, Coordinate::new(0.0005, 0.0));

        let update = session.update_position(Coordinate::new(0.000504, 0.0)).await;
        assert!(matches!(update, PositionUpdate::Ignored));
        assert_eq!(routing.calls(), 4);
    }

    #[tokio::test]
    async fn destinations_only_apply_to_linear_jogs() {
        let routing = Arc::new(FakeRouting::with_distances(&[1500.0]));
        let session = session(routing.clone(), Arc::default(), circular());

        assert!(session.set_destination(Coordinate::new(0.01, 0.01)).await.is_none());

        let planned = session.set_mode(JogMode::Linear).await;
        assert_eq!(planned.route, Route::Empty);
        assert_eq!(routing.calls(), 0);

        let planned = session.set_destination(Coordinate::new(0.01, 0.01)).await.unwrap();
        assert_eq!(planned.route, Route::Planned(route_of(1500.0)));
        assert_eq!(routing.calls(), 1);
    }

    #[tokio::test]
    async fn following_a_route_to_the_end_records_the_jog() {
        let routing = Arc::new(FakeRouting::new([Ok(two_step_route())]));
        let recorder = Arc::new(FakeRecorder::default());
        let session = session(
            routing.clone(),
            recorder.clone(),
            linear_to(Coordinate::new(0.0, 25.0)),
        );

        session.regenerate().await;
        assert!(session.start_jog().await);
        assert!(!session.start_jog().await);

        // still 25 units from the first step
        let update = session.update_position(Coordinate::new(0.0, -0.0001)).await;
        let PositionUpdate::Progressed { progress, finished } = update else {
            panic!("expected progress");
        };
        assert_eq!(progress.state, ProgressState::Following);
        assert!(finished.is_none());

        session.update_position(Coordinate::new(10.0, 0.0)).await;
        assert_eq!(session.snapshot().await.distance_travelled, 2000.0);

        let update = session.update_position(Coordinate::new(0.0, 10.0)).await;
        let PositionUpdate::Progressed { progress, finished } = update else {
            panic!("expected progress");
        };
        assert_eq!(progress.state, ProgressState::Completed);
        assert_eq!(progress.route, Route::Empty);
        let finished = finished.unwrap();
        assert!(finished.upload.is_ok());
        assert_eq!(finished.record.jog_id, Id::new(11));
        assert_eq!(finished.record.user_id, Id::new(42));
        assert_eq!(finished.record.distance, 5000.0);

        assert_eq!(recorder.records.lock().unwrap().len(), 1);
        assert_eq!(session.snapshot().await.state, ProgressState::Completed);
        assert!(matches!(
            session.update_position(Coordinate::new(1.0, 1.0)).await,
            PositionUpdate::Ignored
        ));
        assert!(session.end_jog().await.is_none());
        assert_eq!(routing.calls(), 1);
    }

    #[tokio::test]
    async fn ending_early_reports_the_distance_so_far() {
        let routing = Arc::new(FakeRouting::new([Ok(two_step_route())]));
        let recorder = Arc::new(FakeRecorder {
            records: StdMutex::new(vec![]),
            reject: true,
        });
        let session = session(routing, recorder, linear_to(Coordinate::new(0.0, 25.0)));

        assert!(session.end_jog().await.is_none());

        session.regenerate().await;
        session.start_jog().await;
        session.update_position(Coordinate::new(20.0, 0.0)).await;

        let finished = session.end_jog().await.unwrap();
        assert_eq!(finished.record.distance, 2000.0);
        assert!(matches!(finished.upload, Err(RecordError::Rejected(_))));
        assert!(session.is_finished().await);
    }

    #[tokio::test]
    async fn routes_planned_before_the_session_closed_are_discarded() {
        let routing = Arc::new(GatedRouting {
            route: route_of(1500.0),
            gate: Semaphore::new(0),
            entered: Notify::new(),
        });
        let session = Arc::new(session(
            routing.clone(),
            Arc::default(),
            linear_to(Coordinate::new(0.01, 0.01)),
        ));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.regenerate().await }
        });
        routing.entered.notified().await;

        assert!(session.close().await.is_none());
        routing.gate.add_permits(1);

        let planned = pending.await.unwrap();
        assert!(planned.route.is_empty());
        assert_eq!(session.snapshot().await.route, Route::Empty);
        assert_eq!(session.snapshot().await.state, ProgressState::Completed);
    }

    #[tokio::test]
    async fn superseded_routes_are_discarded() {
        let routing = Arc::new(GatedRouting {
            route: route_of(1500.0),
            gate: Semaphore::new(0),
            entered: Notify::new(),
        });
        let session = Arc::new(session(
            routing.clone(),
            Arc::default(),
            linear_to(Coordinate::new(0.01, 0.01)),
        ));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.regenerate().await }
        });
        routing.entered.notified().await;

        // starting the jog while planning keeps the route that was shown
        assert!(session.start_jog().await);
        routing.gate.add_permits(1);

        assert!(pending.await.unwrap().route.is_empty());
        assert_eq!(session.snapshot().await.state, ProgressState::Idle);
    }
}
