//! OpenRouteService routing provider.
//!
//! [`OrsRoutingProvider`] implements [`tollway_core::RoutingProvider`] over
//! the ORS v2 directions API. Avoidance areas travel as a GeoJSON
//! `MultiPolygon` in `options.avoid_polygons`; tollway avoidance uses
//! `options.avoid_features`.

mod payload;
mod provider;

pub use provider::{
    DEFAULT_PROFILE, DEFAULT_USER_AGENT, OrsRoutingProvider, OrsRoutingProviderConfig,
    ProviderBuildError,
};
