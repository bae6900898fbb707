use futures::future::join_all;
use itertools::Itertools;
use model::{
    jog::JogMode,
    route::{Route, RouteResult},
};
use utility::geo::Coordinate;

use crate::{circle, routing::RoutingService, PlanError, PlanResult};

/// Everything route generation needs, captured from a jog at one point in
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub mode: JogMode,
    /// km
    pub distance: f64,
    pub start: Coordinate,
    pub destination: Option<Coordinate>,
}

/// Outcome of route generation. Failures are already resolved into the
/// empty route; `notice` carries the reason for the user.
#[derive(Debug, Clone)]
pub struct Planned {
    pub route: Route,
    pub notice: Option<PlanError>,
}

impl Planned {
    pub fn route(route: Route) -> Self {
        Self {
            route,
            notice: None,
        }
    }

    pub fn failed(why: PlanError) -> Self {
        Self {
            route: Route::Empty,
            notice: Some(why),
        }
    }
}

/// Index of the distance closest to `requested`. Ties go to the first one.
pub fn closest_distance_index(distances: &[f64], requested: f64) -> Option<usize> {
    distances
        .iter()
        .map(|distance| (requested - distance).abs())
        .position_min_by(|a, b| a.total_cmp(b))
}

/// Requests all four loop candidates around `start` and keeps the one whose
/// realized length is closest to `distance` (km). Candidates the routing
/// service fails on are skipped.
pub async fn select_circular<R>(
    routing: &R,
    start: Coordinate,
    distance: f64,
) -> PlanResult<RouteResult>
where
    R: RoutingService + ?Sized,
{
    let candidates = circle::project_candidates(start, distance);
    let responses = join_all(
        candidates
            .iter()
            .map(|waypoints| routing.route(waypoints)),
    )
    .await;

    let mut routes = responses
        .into_iter()
        .enumerate()
        .filter_map(|(index, response)| match response {
            Ok(route) => Some(route),
            Err(why) => {
                log::warn!("loop candidate {index} failed: {why}");
                None
            }
        })
        .collect::<Vec<_>>();

    let distances = routes.iter().map(RouteResult::distance_km).collect::<Vec<_>>();
    log::debug!("loop candidates for {distance}km: {distances:?}");

    let closest = closest_distance_index(&distances, distance)
        .ok_or(PlanError::NoCandidatesSucceeded)?;
    Ok(routes.swap_remove(closest))
}

/// Routes from `start` to `destination`. Without a destination there is
/// nothing to route and no request is made.
pub async fn select_linear<R>(
    routing: &R,
    start: Coordinate,
    destination: Option<Coordinate>,
) -> PlanResult<Route>
where
    R: RoutingService + ?Sized,
{
    let Some(destination) = destination else {
        return Ok(Route::Empty);
    };
    let route = routing.route(&[start, destination]).await?;
    Ok(Route::Planned(route))
}

pub async fn plan<R>(routing: &R, request: &PlanRequest) -> Planned
where
    R: RoutingService + ?Sized,
{
    let result = match request.mode {
        JogMode::Circular => select_circular(routing, request.start, request.distance)
            .await
            .map(Route::Planned),
        JogMode::Linear => select_linear(routing, request.start, request.destination).await,
    };

    match result {
        Ok(route) => Planned::route(route),
        Err(why) => {
            log::warn!("could not plan {:?} route: {}", request.mode, why);
            Planned::failed(why)
        }
    }
}
