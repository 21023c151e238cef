//! OpenRouteService directions API request and response types.
//!
//! Requests target the GeoJSON flavour of the directions service, which
//! answers with a `FeatureCollection` holding one feature per route.
//!
//! See: <https://openrouteservice.org/dev/#/api-docs/v2/directions/{profile}/geojson/post>

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// Road features the provider can ask the service to avoid.
const TOLLWAYS: &str = "tollways";

/// Body of a directions request.
#[derive(Debug, Serialize)]
pub struct DirectionsRequest {
    /// Waypoints as `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
    /// Extra per-segment attributes to return.
    pub extra_info: Vec<&'static str>,
    /// Avoidance options, omitted for unconstrained routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RouteOptions>,
}

/// The `options` object of a directions request.
#[derive(Debug, Default, Serialize)]
pub struct RouteOptions {
    /// Areas the route must not cross.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_polygons: Option<GeoJsonMultiPolygon>,
    /// Road feature classes the route must not use.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub avoid_features: Vec<&'static str>,
}

/// A GeoJSON `MultiPolygon` geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonMultiPolygon {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<Vec<Vec<[f64; 2]>>>,
}

impl From<&MultiPolygon<f64>> for GeoJsonMultiPolygon {
    fn from(value: &MultiPolygon<f64>) -> Self {
        Self {
            kind: "MultiPolygon",
            coordinates: value.iter().map(polygon_rings).collect(),
        }
    }
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

impl DirectionsRequest {
    /// Unconstrained route through `waypoints`.
    pub fn base(waypoints: &[Coord<f64>]) -> Self {
        Self {
            coordinates: waypoints.iter().map(|c| [c.x, c.y]).collect(),
            extra_info: vec![TOLLWAYS],
            options: None,
        }
    }

    /// Route through `waypoints` that stays out of `avoid`.
    pub fn avoiding_polygons(waypoints: &[Coord<f64>], avoid: &MultiPolygon<f64>) -> Self {
        Self {
            options: Some(RouteOptions {
                avoid_polygons: Some(avoid.into()),
                ..RouteOptions::default()
            }),
            ..Self::base(waypoints)
        }
    }

    /// Route through `waypoints` that avoids tollways altogether.
    pub fn avoiding_tollways(waypoints: &[Coord<f64>]) -> Self {
        Self {
            options: Some(RouteOptions {
                avoid_features: vec![TOLLWAYS],
                ..RouteOptions::default()
            }),
            ..Self::base(waypoints)
        }
    }
}

/// A directions response, successful or not.
///
/// Error responses carry only the `error` member; successful ones carry the
/// feature list.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    /// Routes, best first.
    #[serde(default)]
    pub features: Vec<RouteFeature>,
    /// Service-reported failure.
    pub error: Option<ServiceErrorBody>,
}

/// One route of a directions response.
#[derive(Debug, Deserialize)]
pub struct RouteFeature {
    /// Route polyline.
    pub geometry: RouteGeometry,
    /// Route attributes.
    #[serde(default)]
    pub properties: RouteProperties,
}

/// Polyline coordinates. Elevation, when requested, is a third element.
#[derive(Debug, Deserialize)]
pub struct RouteGeometry {
    /// `[lon, lat]` or `[lon, lat, elevation]` positions.
    pub coordinates: Vec<Vec<f64>>,
}

/// Properties attached to a route feature.
#[derive(Debug, Default, Deserialize)]
pub struct RouteProperties {
    /// Aggregate distance and duration.
    #[serde(default)]
    pub summary: RouteSummary,
}

/// Route totals. ORS omits both for zero-length routes.
#[derive(Debug, Default, Deserialize)]
pub struct RouteSummary {
    /// Length in metres.
    #[serde(default)]
    pub distance: f64,
    /// Travel time in seconds.
    #[serde(default)]
    pub duration: f64,
}

/// The `error` member of a failed response.
///
/// ORS reports structured errors as `{code, message}` but some gateways
/// reply with a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ServiceErrorBody {
    /// Structured error with an ORS error code.
    Detailed {
        /// Numeric ORS error code.
        code: Option<i64>,
        /// Human-readable description.
        #[serde(default)]
        message: String,
    },
    /// Free-text error.
    Message(String),
}

impl RouteGeometry {
    /// Convert the positions into a planar line string.
    ///
    /// Returns `None` if a position lacks a latitude.
    pub fn to_line_string(&self) -> Option<LineString<f64>> {
        self.coordinates
            .iter()
            .map(|position| match position.as_slice() {
                [x, y, ..] => Some(Coord { x: *x, y: *y }),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(LineString::new)
    }
}
