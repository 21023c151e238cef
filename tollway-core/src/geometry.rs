//! Local metric approximations for short distances on the globe.
//!
//! Toll matching works at the scale of a few hundred metres, where an
//! equirectangular projection around the route's mean latitude is accurate
//! to well under a metre. Nothing here is exposed publicly.

use geo::Coord;

/// Metres per degree of latitude (mean Earth radius).
pub(crate) const METRES_PER_DEGREE: f64 = 111_320.0;

/// Degrees of latitude spanned by `metres`.
pub(crate) fn metres_to_lat_degrees(metres: f64) -> f64 {
    metres / METRES_PER_DEGREE
}

/// Degrees of longitude spanned by `metres` at `latitude`.
///
/// Clamped near the poles so the result stays finite.
pub(crate) fn metres_to_lon_degrees(metres: f64, latitude: f64) -> f64 {
    let cos = latitude.to_radians().cos().max(0.01);
    metres / (METRES_PER_DEGREE * cos)
}

/// Equirectangular projection to metres around a reference latitude.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalProjection {
    lon_scale: f64,
}

/// Where a point falls relative to a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PolylineProjection {
    /// Perpendicular distance to the nearest segment, in metres.
    pub(crate) distance_m: f64,
    /// Distance along the polyline to the foot of the perpendicular.
    pub(crate) along_m: f64,
}

impl LocalProjection {
    pub(crate) fn around(coords: &[Coord<f64>]) -> Self {
        let count = coords.len().max(1);
        #[expect(clippy::cast_precision_loss, reason = "coordinate counts are small")]
        let mean_lat = coords.iter().map(|c| c.y).sum::<f64>() / count as f64;
        Self {
            lon_scale: METRES_PER_DEGREE * mean_lat.to_radians().cos(),
        }
    }

    pub(crate) fn project(self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: coord.x * self.lon_scale,
            y: coord.y * METRES_PER_DEGREE,
        }
    }

    /// Length of a polyline in metres.
    pub(crate) fn length(self, coords: &[Coord<f64>]) -> f64 {
        coords
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(distance(self.project(*a), self.project(*b))),
                _ => None,
            })
            .sum()
    }

    /// Project `point` onto the polyline `coords`.
    ///
    /// Returns `None` for an empty polyline. A single coordinate behaves as
    /// a degenerate segment.
    pub(crate) fn onto_polyline(
        self,
        point: Coord<f64>,
        coords: &[Coord<f64>],
    ) -> Option<PolylineProjection> {
        let p = self.project(point);
        let projected: Vec<Coord<f64>> = coords.iter().map(|c| self.project(*c)).collect();
        if let [only] = projected.as_slice() {
            return Some(PolylineProjection {
                distance_m: distance(p, *only),
                along_m: 0.0,
            });
        }

        let mut best: Option<PolylineProjection> = None;
        let mut travelled = 0.0;
        for pair in projected.windows(2) {
            let [a, b] = pair else { continue };
            let (foot, t) = foot_of_perpendicular(p, *a, *b);
            let segment = distance(*a, *b);
            let candidate = PolylineProjection {
                distance_m: distance(p, foot),
                along_m: travelled + t * segment,
            };
            if best.is_none_or(|current| candidate.distance_m < current.distance_m) {
                best = Some(candidate);
            }
            travelled += segment;
        }
        best
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Closest point on segment `a`–`b` to `p`, and its parameter in `0..=1`.
fn foot_of_perpendicular(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> (Coord<f64>, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return (a, 0.0);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    (
        Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        },
        t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn approx(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{actual} not within {tolerance} of {expected}"
        );
    }

    #[rstest]
    fn equator_degree_is_about_111_km() {
        let projection = LocalProjection::around(&[Coord { x: 0.0, y: 0.0 }]);
        let length = projection.length(&[Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }]);
        approx(length, METRES_PER_DEGREE, 1e-6);
    }

    #[rstest]
    fn projects_onto_middle_segment() {
        let line = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.01, y: 0.0 },
            Coord { x: 0.02, y: 0.0 },
        ];
        let projection = LocalProjection::around(&line);
        let foot = projection
            .onto_polyline(Coord { x: 0.015, y: 0.001 }, &line)
            .expect("non-empty polyline");
        approx(foot.distance_m, 111.32, 0.01);
        approx(foot.along_m, 1_669.8, 0.01);
    }

    #[rstest]
    fn empty_polyline_has_no_projection() {
        let projection = LocalProjection::around(&[]);
        assert_eq!(projection.onto_polyline(Coord { x: 0.0, y: 0.0 }, &[]), None);
    }

    #[rstest]
    fn longitude_degrees_widen_towards_the_poles() {
        assert!(metres_to_lon_degrees(500.0, 60.0) > metres_to_lon_degrees(500.0, 0.0));
        approx(metres_to_lat_degrees(METRES_PER_DEGREE), 1.0, 1e-12);
    }
}
