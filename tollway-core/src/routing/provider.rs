//! Routing provider trait.

use geo::{Coord, MultiPolygon};

use crate::Route;

use super::error::RoutingError;

/// Turn waypoints, optionally with avoidance restrictions, into a route.
///
/// Implementations must be `Send + Sync`: the optimiser evaluates avoidance
/// candidates from a bounded worker pool and shares one provider across it.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use geo::{Coord, LineString, MultiPolygon};
/// use tollway_core::{Route, RoutingError, RoutingProvider};
///
/// struct StraightLine;
///
/// impl StraightLine {
///     fn route(waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
///         if waypoints.len() < 2 {
///             return Err(RoutingError::InsufficientWaypoints { count: waypoints.len() });
///         }
///         Route::new(LineString::from(waypoints.to_vec()), 0.0, Duration::from_secs(60))
///             .map_err(|err| RoutingError::ParseError { message: err.to_string() })
///     }
/// }
///
/// impl RoutingProvider for StraightLine {
///     fn base_route(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
///         Self::route(waypoints)
///     }
///
///     fn route_avoiding_polygons(
///         &self,
///         waypoints: &[Coord<f64>],
///         _avoid: &MultiPolygon<f64>,
///     ) -> Result<Route, RoutingError> {
///         Self::route(waypoints)
///     }
///
///     fn route_avoiding_tollways(&self, _waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
///         Err(RoutingError::NoRoute)
///     }
/// }
///
/// let waypoints = [Coord { x: 2.35, y: 48.85 }, Coord { x: 4.83, y: 45.76 }];
/// assert!(StraightLine.base_route(&waypoints).is_ok());
/// assert_eq!(StraightLine.route_avoiding_tollways(&waypoints), Err(RoutingError::NoRoute));
/// ```
pub trait RoutingProvider: Send + Sync {
    /// Fastest route through `waypoints` without restrictions.
    fn base_route(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError>;

    /// Fastest route through `waypoints` that does not enter `avoid`.
    fn route_avoiding_polygons(
        &self,
        waypoints: &[Coord<f64>],
        avoid: &MultiPolygon<f64>,
    ) -> Result<Route, RoutingError>;

    /// Fastest route through `waypoints` that stays off tolled roads where
    /// the network allows it.
    ///
    /// Engines treat this as a preference: the returned route may still
    /// cross tolls when no toll-free path exists.
    fn route_avoiding_tollways(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError>;
}

impl<T: RoutingProvider + ?Sized> RoutingProvider for &T {
    fn base_route(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        (**self).base_route(waypoints)
    }

    fn route_avoiding_polygons(
        &self,
        waypoints: &[Coord<f64>],
        avoid: &MultiPolygon<f64>,
    ) -> Result<Route, RoutingError> {
        (**self).route_avoiding_polygons(waypoints, avoid)
    }

    fn route_avoiding_tollways(&self, waypoints: &[Coord<f64>]) -> Result<Route, RoutingError> {
        (**self).route_avoiding_tollways(waypoints)
    }
}
