//! Build exclusion polygons around toll stations.
//!
//! Each station is buffered into a disk of the requested radius and the disks
//! are merged into one [`MultiPolygon`], which routing engines accept as an
//! area to stay out of. Overlapping disks collapse into a single ring so the
//! request stays small.

use std::f64::consts::TAU;

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};

use crate::TollStation;
use crate::geometry::{metres_to_lat_degrees, metres_to_lon_degrees};

/// Default number of vertices approximating each disk.
pub const DEFAULT_DISK_SEGMENTS: usize = 32;

/// Smallest accepted vertex count.
const MIN_DISK_SEGMENTS: usize = 8;

/// Build the area a route must avoid to bypass `tolls`.
pub trait AvoidanceGeometryBuilder: Send + Sync {
    /// Buffer every station by `radius_m` metres and union the result.
    ///
    /// An empty `tolls` slice yields an empty multipolygon.
    fn build(&self, tolls: &[TollStation], radius_m: f64) -> MultiPolygon<f64>;
}

impl<T: AvoidanceGeometryBuilder + ?Sized> AvoidanceGeometryBuilder for &T {
    fn build(&self, tolls: &[TollStation], radius_m: f64) -> MultiPolygon<f64> {
        (**self).build(tolls, radius_m)
    }
}

/// Buffer-then-union builder using regular polygons as disks.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use tollway_core::{AvoidanceGeometryBuilder, DiskAvoidanceBuilder, TollKind, TollStation};
///
/// let tolls = [
///     TollStation::new("A", TollKind::Open, Coord { x: 4.80, y: 45.70 }),
///     TollStation::new("B", TollKind::Open, Coord { x: 4.801, y: 45.70 }),
/// ];
/// // The two disks overlap and merge into one polygon.
/// let area = DiskAvoidanceBuilder::default().build(&tolls, 250.0);
/// assert_eq!(area.0.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskAvoidanceBuilder {
    segments: usize,
}

impl Default for DiskAvoidanceBuilder {
    fn default() -> Self {
        Self {
            segments: DEFAULT_DISK_SEGMENTS,
        }
    }
}

impl DiskAvoidanceBuilder {
    /// Set the vertex count per disk. Values below eight are raised to eight.
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments.max(MIN_DISK_SEGMENTS);
        self
    }

    /// Vertex count per disk.
    #[must_use]
    pub const fn segments(&self) -> usize {
        self.segments
    }

    fn disk(&self, centre: Coord<f64>, radius_m: f64) -> Polygon<f64> {
        let dx = metres_to_lon_degrees(radius_m, centre.y);
        let dy = metres_to_lat_degrees(radius_m);
        #[expect(clippy::cast_precision_loss, reason = "segment counts are small")]
        let step = TAU / self.segments as f64;
        let ring: Vec<Coord<f64>> = (0..self.segments)
            .map(|i| {
                #[expect(clippy::cast_precision_loss, reason = "segment counts are small")]
                let angle = step * i as f64;
                Coord {
                    x: centre.x + dx * angle.cos(),
                    y: centre.y + dy * angle.sin(),
                }
            })
            .collect();
        // `Polygon::new` closes the ring.
        Polygon::new(LineString::new(ring), Vec::new())
    }
}

impl AvoidanceGeometryBuilder for DiskAvoidanceBuilder {
    fn build(&self, tolls: &[TollStation], radius_m: f64) -> MultiPolygon<f64> {
        let mut disks = tolls
            .iter()
            .map(|toll| MultiPolygon::new(vec![self.disk(toll.location, radius_m)]));
        let Some(first) = disks.next() else {
            return MultiPolygon::new(Vec::new());
        };
        disks.fold(first, |merged, disk| merged.union(&disk))
    }
}
