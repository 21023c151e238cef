//! Match toll stations to a route geometry.
//!
//! The [`TollLocator`] trait maps a [`Route`] to the ordered toll stations it
//! crosses and those it merely passes near. [`SpatialTollLocator`] is the
//! in-memory implementation: reference stations live in an R\*-tree, the
//! route's bounding box (grown by the nearby radius) selects candidates, and
//! each candidate is projected onto the polyline to measure its offset and
//! its distance along the route.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use geo::{Coord, line_string};
//! use tollway_core::{Route, SpatialTollLocator, TollKind, TollLocator, TollReference};
//!
//! let locator = SpatialTollLocator::new([
//!     TollReference::new("APRR_O1", TollKind::Open, Coord { x: 0.5, y: 0.0 }),
//!     TollReference::new("APRR_O2", TollKind::Open, Coord { x: 0.5, y: 0.2 }),
//! ]);
//! let route = Route::new(
//!     line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
//!     111_320.0,
//!     Duration::from_secs(3_600),
//! )?;
//!
//! let located = locator.locate(&route);
//! assert_eq!(located.on_route.len(), 1);
//! assert!(located.nearby.is_empty());
//! # Ok::<(), tollway_core::RouteError>(())
//! ```

use geo::Coord;
use rstar::{AABB, RTree, RTreeObject};

use crate::geometry::{LocalProjection, metres_to_lat_degrees, metres_to_lon_degrees};
use crate::{Route, TollId, TollKind, TollStation};

/// Default offset within which a station counts as crossed.
pub const DEFAULT_ON_ROUTE_RADIUS_M: f64 = 120.0;

/// Default offset within which a station counts as nearby.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 500.0;

/// Toll stations found along a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocatedTolls {
    /// Stations the route crosses, ordered by distance along the route.
    pub on_route: Vec<TollStation>,
    /// Stations close to, but not on, the route.
    pub nearby: Vec<TollStation>,
}

/// Locate the toll stations a route crosses or passes near.
///
/// Returned stations are unpriced; pricing depends on the full ordered
/// sequence and belongs to a [`crate::TollCostModel`].
pub trait TollLocator: Send + Sync {
    /// Locate stations relative to `route`.
    fn locate(&self, route: &Route) -> LocatedTolls;
}

impl<T: TollLocator + ?Sized> TollLocator for &T {
    fn locate(&self, route: &Route) -> LocatedTolls {
        (**self).locate(route)
    }
}

/// Reference record of a physical toll station.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TollReference {
    /// Canonical identifier.
    pub id: TollId,
    /// Open or closed pricing.
    pub kind: TollKind,
    /// Longitude/latitude of the barrier.
    pub location: Coord<f64>,
}

impl TollReference {
    /// Construct a reference record.
    pub fn new(id: impl Into<TollId>, kind: TollKind, location: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            kind,
            location,
        }
    }

    fn station(&self, position_on_route: f64) -> TollStation {
        TollStation::new(self.id.clone(), self.kind, self.location).with_position(position_on_route)
    }
}

impl RTreeObject for TollReference {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// R\*-tree backed [`TollLocator`].
#[derive(Debug, Clone)]
pub struct SpatialTollLocator {
    index: RTree<TollReference>,
    on_route_radius_m: f64,
    nearby_radius_m: f64,
}

impl SpatialTollLocator {
    /// Index the given reference stations with default radii.
    pub fn new<I>(references: I) -> Self
    where
        I: IntoIterator<Item = TollReference>,
    {
        Self {
            index: RTree::bulk_load(references.into_iter().collect()),
            on_route_radius_m: DEFAULT_ON_ROUTE_RADIUS_M,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
        }
    }

    /// Set the offset within which a station counts as crossed.
    #[must_use]
    pub fn with_on_route_radius(mut self, metres: f64) -> Self {
        self.on_route_radius_m = metres;
        self
    }

    /// Set the offset within which a station counts as nearby.
    ///
    /// Values below the on-route radius disable nearby matching.
    #[must_use]
    pub fn with_nearby_radius(mut self, metres: f64) -> Self {
        self.nearby_radius_m = metres;
        self
    }

    /// Number of indexed stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Whether no stations are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }

    fn search_envelope(&self, coords: &[Coord<f64>]) -> Option<AABB<[f64; 2]>> {
        let first = coords.first()?;
        let (mut min, mut max) = (*first, *first);
        for c in coords {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        let reach = self.nearby_radius_m.max(self.on_route_radius_m);
        let widest_lat = min.y.abs().max(max.y.abs());
        let dx = metres_to_lon_degrees(reach, widest_lat);
        let dy = metres_to_lat_degrees(reach);
        Some(AABB::from_corners(
            [min.x - dx, min.y - dy],
            [max.x + dx, max.y + dy],
        ))
    }
}

impl TollLocator for SpatialTollLocator {
    fn locate(&self, route: &Route) -> LocatedTolls {
        let coords = &route.geometry().0;
        let Some(envelope) = self.search_envelope(coords) else {
            return LocatedTolls::default();
        };
        let projection = LocalProjection::around(coords);

        let mut on_route = Vec::new();
        let mut nearby = Vec::new();
        for reference in self.index.locate_in_envelope_intersecting(&envelope) {
            let Some(foot) = projection.onto_polyline(reference.location, coords) else {
                continue;
            };
            if foot.distance_m <= self.on_route_radius_m {
                on_route.push(reference.station(foot.along_m));
            } else if foot.distance_m <= self.nearby_radius_m {
                nearby.push(reference.station(foot.along_m));
            }
        }

        // The R*-tree yields entries in storage order; order by travel.
        let by_position = |a: &TollStation, b: &TollStation| {
            a.position_on_route
                .total_cmp(&b.position_on_route)
                .then_with(|| a.id.cmp(&b.id))
        };
        on_route.sort_by(by_position);
        nearby.sort_by(by_position);
        log::debug!(
            "located {} tolls on route and {} nearby",
            on_route.len(),
            nearby.len()
        );
        LocatedTolls { on_route, nearby }
    }
}
