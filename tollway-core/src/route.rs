//! Routes returned by a routing provider.

use std::time::Duration;

use geo::LineString;
use thiserror::Error;

/// Geometry and summary of a drivable route.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use geo::line_string;
/// use tollway_core::Route;
///
/// # fn main() -> Result<(), tollway_core::RouteError> {
/// let route = Route::new(
///     line_string![(x: 2.35, y: 48.85), (x: 4.83, y: 45.76)],
///     465_000.0,
///     Duration::from_secs(16_200),
/// )?;
/// assert_eq!(route.duration(), Duration::from_secs(16_200));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    geometry: LineString<f64>,
    distance_m: f64,
    duration: Duration,
}

/// Errors returned by [`Route::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The geometry contained no coordinates.
    #[error("route geometry must contain at least one coordinate")]
    EmptyGeometry,
    /// The distance was negative, NaN or infinite.
    #[error("route distance must be a finite, non-negative number of metres")]
    InvalidDistance,
}

impl Route {
    /// Validate and construct a [`Route`].
    pub fn new(
        geometry: LineString<f64>,
        distance_m: f64,
        duration: Duration,
    ) -> Result<Self, RouteError> {
        if geometry.0.is_empty() {
            return Err(RouteError::EmptyGeometry);
        }
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(RouteError::InvalidDistance);
        }
        Ok(Self {
            geometry,
            distance_m,
            duration,
        })
    }

    /// Polyline in longitude/latitude order.
    #[must_use]
    pub const fn geometry(&self) -> &LineString<f64> {
        &self.geometry
    }

    /// Length in metres.
    #[must_use]
    pub const fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Expected travel time.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use rstest::rstest;

    #[rstest]
    fn rejects_empty_geometry() {
        let result = Route::new(LineString::new(Vec::new()), 0.0, Duration::ZERO);
        assert_eq!(result, Err(RouteError::EmptyGeometry));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_distance(#[case] distance: f64) {
        let result = Route::new(line_string![(x: 0.0, y: 0.0)], distance, Duration::ZERO);
        assert_eq!(result, Err(RouteError::InvalidDistance));
    }
}
