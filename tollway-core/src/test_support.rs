//! Deterministic collaborators for unit and behaviour tests.
//!
//! [`TollNetwork`] is a miniature road network: toll stations sit on a
//! west-east motorway along the equator and every corridor either passes
//! through a station or detours about five kilometres north of it. Avoidance
//! polygons block the corridors they intersect, so the real
//! [`SpatialTollLocator`] and [`crate::DiskAvoidanceBuilder`] can be used
//! against it unchanged.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use geo::{Coord, Intersects, LineString, MultiPolygon, Point};

use crate::geometry::LocalProjection;
use crate::{
    Candidate, Cost, Route, RoutingError, RoutingProvider, SpatialTollLocator, TollId, TollKind,
    TollReference, TollStation,
};

/// Longitude spacing between consecutive stations (about 11 km).
const STATION_SPACING_DEG: f64 = 0.1;

/// Latitude of the detour taken around a skipped station.
const DETOUR_OFFSET_DEG: f64 = 0.05;

const NETWORK_URL: &str = "memory://toll-network";

/// A routing call observed by [`TollNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingCall {
    /// Unconstrained route.
    Base {
        /// Stations pinned by intermediate waypoints.
        via: BTreeSet<TollId>,
    },
    /// Polygon avoidance; records the stations inside the polygons.
    AvoidPolygons {
        /// Stations enclosed by the avoidance area.
        enclosed: BTreeSet<TollId>,
        /// Stations pinned by intermediate waypoints.
        via: BTreeSet<TollId>,
    },
    /// Tollway avoidance.
    AvoidTollways,
}

#[derive(Debug, Clone)]
struct Corridor {
    through: BTreeSet<TollId>,
    duration: Duration,
}

/// In-memory road network implementing [`RoutingProvider`].
///
/// The base route is the fastest corridor. Polygon avoidance returns the
/// fastest corridor whose geometry misses every polygon. Tollway avoidance
/// returns the corridor with the fewest stations, preferring the fastest.
/// An intermediate waypoint placed on a station restricts the base and
/// polygon-avoidance calls to corridors through that station.
///
/// # Example
///
/// ```
/// use tollway_core::test_support::TollNetwork;
/// use tollway_core::{RoutingProvider, TollKind, TollLocator};
///
/// let network = TollNetwork::new()
///     .with_station("A", TollKind::Open)
///     .with_station("B", TollKind::Open)
///     .with_corridor(&["A", "B"], 3_600)
///     .with_corridor(&["B"], 4_000);
///
/// let base = network.base_route(&network.waypoints()).expect("base route");
/// assert_eq!(network.locator().locate(&base).on_route.len(), 2);
/// assert_eq!(network.call_count(), 1);
/// ```
#[derive(Debug)]
pub struct TollNetwork {
    stations: Vec<TollReference>,
    corridors: Vec<Corridor>,
    tollway_avoidance: bool,
    reachable: bool,
    calls: Mutex<Vec<RoutingCall>>,
}

impl Default for TollNetwork {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            corridors: Vec::new(),
            tollway_avoidance: true,
            reachable: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl TollNetwork {
    /// Create an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a station east of the existing ones.
    #[must_use]
    pub fn with_station(mut self, id: &str, kind: TollKind) -> Self {
        let x = station_longitude(self.stations.len());
        self.stations
            .push(TollReference::new(id, kind, Coord { x, y: 0.0 }));
        self
    }

    /// Add a corridor crossing exactly the named stations.
    #[must_use]
    pub fn with_corridor(mut self, through: &[&str], duration_secs: u64) -> Self {
        self.corridors.push(Corridor {
            through: through.iter().map(|id| TollId::new(id)).collect(),
            duration: Duration::from_secs(duration_secs),
        });
        self
    }

    /// Make tollway avoidance fail with [`RoutingError::NoRoute`].
    #[must_use]
    pub const fn without_tollway_avoidance(mut self) -> Self {
        self.tollway_avoidance = false;
        self
    }

    /// Make every call fail with a network error.
    #[must_use]
    pub const fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Locator indexing this network's stations.
    #[must_use]
    pub fn locator(&self) -> SpatialTollLocator {
        SpatialTollLocator::new(self.stations.iter().cloned())
    }

    /// Origin and destination of the motorway.
    #[must_use]
    pub fn waypoints(&self) -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord {
                x: station_longitude(self.stations.len()),
                y: 0.0,
            },
        ]
    }

    /// Build the route a corridor through `through` would produce.
    ///
    /// # Panics
    ///
    /// Panics if the network has no coordinates, which cannot happen.
    #[must_use]
    pub fn route_through(&self, through: &[&str], duration_secs: u64) -> Route {
        let corridor = Corridor {
            through: through.iter().map(|id| TollId::new(id)).collect(),
            duration: Duration::from_secs(duration_secs),
        };
        self.corridor_route(&corridor)
            .unwrap_or_else(|err| panic!("corridor geometry is never empty: {err}"))
    }

    /// Every call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RoutingCall> {
        self.lock_calls().clone()
    }

    /// Number of calls observed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Stations enclosed by each polygon-avoidance call, in call order.
    #[must_use]
    pub fn avoidance_requests(&self) -> Vec<BTreeSet<TollId>> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                RoutingCall::AvoidPolygons { enclosed, .. } => Some(enclosed.clone()),
                RoutingCall::Base { .. } | RoutingCall::AvoidTollways => None,
            })
            .collect()
    }

    /// Stations pinned by each base or polygon-avoidance call that had any,
    /// in call order.
    #[must_use]
    pub fn via_requests(&self) -> Vec<BTreeSet<TollId>> {
        self.lock_calls()
            .iter()
            .filter_map(|call| match call {
                RoutingCall::Base { via } | RoutingCall::AvoidPolygons { via, .. } => {
                    (!via.is_empty()).then(|| via.clone())
                }
                RoutingCall::AvoidTollways => None,
            })
            .collect()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<RoutingCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RoutingCall, waypoints: &[Coord<f64>]) -> Result<(), RoutingError> {
        self.lock_calls().push(call);
        if !self.reachable {
            return Err(RoutingError::NetworkError {
                url: NETWORK_URL.to_owned(),
                message: "connection refused".to_owned(),
            });
        }
        if waypoints.len() < 2 {
            return Err(RoutingError::InsufficientWaypoints {
                count: waypoints.len(),
            });
        }
        Ok(())
    }

    fn pinned(&self, waypoints: &[Coord<f64>]) -> BTreeSet<TollId> {
        let inner = waypoints
            .get(1..waypoints.len().saturating_sub(1))
            .unwrap_or_default();
        self.stations
            .iter()
            .filter(|station| inner.contains(&station.location))
            .map(|station| station.id.clone())
            .collect()
    }

    fn geometry(&self, corridor: &Corridor) -> LineString<f64> {
        let waypoints = self.waypoints();
        let mut coords = Vec::with_capacity(self.stations.len() + 2);
        coords.extend(waypoints.first().copied());
        coords.extend(self.stations.iter().map(|station| {
            if corridor.through.contains(&station.id) {
                station.location
            } else {
                Coord {
                    x: station.location.x,
                    y: DETOUR_OFFSET_DEG,
                }
            }
        }));
        coords.extend(waypoints.last().copied());
        LineString::new(coords)
    }

    fn corridor_route(&self, corridor: &Corridor) -> Result<Route, RoutingError> {
        let geometry = self.geometry(corridor);
        let distance = LocalProjection::around(&geometry.0).length(&geometry.0);
        Route::new(geometry, distance, corridor.duration).map_err(|err| {
            RoutingError::ParseError {
                message: err.to_string(),
            }
        })
    }

    fn fastest<'a, I>(&self, corridors: I) -> Result<Route, RoutingError>
    where
        I: Iterator<Item = &'a Corridor>,
    {
        corridors
            .min_by_key(|corridor| corridor.duration)
            .ok_or(RoutingError::NoRoute)
            .and_then(|corridor| self.corridor_route(corridor))
    }
}

impl RoutingProvider for TollNetwork {
    fn base_route(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        let via = self.pinned(waypoints);
        self.record(RoutingCall::Base { via: via.clone() }, waypoints)?;
        self.fastest(
            self.corridors
                .iter()
                .filter(|corridor| corridor.through.is_superset(&via)),
        )
    }

    fn route_avoiding_polygons(
        &self,
        waypoints: &[Coord<f64>],
        avoid: &MultiPolygon<f64>,
    ) -> Result<Route, RoutingError> {
        let enclosed = self
            .stations
            .iter()
            .filter(|station| avoid.intersects(&Point::from(station.location)))
            .map(|station| station.id.clone())
            .collect();
        let via = self.pinned(waypoints);
        self.record(
            RoutingCall::AvoidPolygons {
                enclosed,
                via: via.clone(),
            },
            waypoints,
        )?;
        self.fastest(self.corridors.iter().filter(|corridor| {
            corridor.through.is_superset(&via) && !avoid.intersects(&self.geometry(corridor))
        }))
    }

    fn route_avoiding_tollways(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        self.record(RoutingCall::AvoidTollways, waypoints)?;
        if !self.tollway_avoidance {
            return Err(RoutingError::NoRoute);
        }
        let fewest = self
            .corridors
            .iter()
            .map(|corridor| corridor.through.len())
            .min()
            .ok_or(RoutingError::NoRoute)?;
        self.fastest(
            self.corridors
                .iter()
                .filter(|corridor| corridor.through.len() == fewest),
        )
    }
}

fn station_longitude(index: usize) -> f64 {
    #[expect(clippy::cast_precision_loss, reason = "station counts are small")]
    let position = (index + 1) as f64;
    STATION_SPACING_DEG * position
}

/// Routing provider replaying canned responses.
///
/// Polygon-avoidance calls consume the queue in order and fail with
/// [`RoutingError::NoRoute`] once it is empty.
#[derive(Debug)]
pub struct ScriptedRoutingProvider {
    base: Result<Route, RoutingError>,
    avoidance: Mutex<VecDeque<Result<Route, RoutingError>>>,
    tollways: Result<Route, RoutingError>,
    calls: AtomicUsize,
}

impl ScriptedRoutingProvider {
    /// Serve `base` as the unconstrained route.
    #[must_use]
    pub fn new(base: Result<Route, RoutingError>) -> Self {
        Self {
            base,
            avoidance: Mutex::new(VecDeque::new()),
            tollways: Err(RoutingError::NoRoute),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue responses for polygon-avoidance calls.
    #[must_use]
    pub fn with_avoidance_responses<I>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = Result<Route, RoutingError>>,
    {
        Self {
            avoidance: Mutex::new(responses.into_iter().collect()),
            ..self
        }
    }

    /// Serve `response` for tollway-avoidance calls.
    #[must_use]
    pub fn with_tollway_response(self, response: Result<Route, RoutingError>) -> Self {
        Self {
            tollways: response,
            ..self
        }
    }

    /// Number of calls served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for ScriptedRoutingProvider {
    fn base_route(&self, _waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.base.clone()
    }

    fn route_avoiding_polygons(
        &self,
        _waypoints: &[Coord<f64>],
        _avoid: &MultiPolygon<f64>,
    ) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.avoidance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(RoutingError::NoRoute))
    }

    fn route_avoiding_tollways(&self, _waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tollways.clone()
    }
}

/// An open toll priced at `cents`, placed at `position_m` along the route.
#[must_use]
pub fn priced_toll(id: &str, cents: u64, position_m: f64) -> TollStation {
    TollStation::new(id, TollKind::Open, Coord { x: 0.0, y: 0.0 })
        .with_position(position_m)
        .with_cost(Cost::from_cents(cents))
}

/// A verified candidate taking `duration_secs` and crossing `tolls`, which
/// avoided the stations named in `avoided`.
///
/// # Panics
///
/// Panics if `avoided` names a station in `tolls`.
#[must_use]
pub fn candidate(duration_secs: u64, tolls: Vec<TollStation>, avoided: &[&str]) -> Candidate {
    let route = Route::new(
        LineString::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }]),
        0.0,
        Duration::from_secs(duration_secs),
    )
    .unwrap_or_else(|err| panic!("fixed geometry is valid: {err}"));
    let avoided = avoided.iter().map(|id| TollId::new(id)).collect();
    Candidate::verified(route, tolls, avoided)
        .unwrap_or_else(|err| panic!("test candidate must be consistent: {err}"))
}
