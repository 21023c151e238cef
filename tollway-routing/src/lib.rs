//! HTTP routing providers for the tollway engine.
//!
//! Responsibilities:
//! - Implement `tollway_core::RoutingProvider` over external routing
//!   services.
//! - Map transport and service failures onto `tollway_core::RoutingError`.
//!
//! Boundaries:
//! - No toll logic; providers return raw routes.
//! - Blocking callers are bridged onto an owned Tokio runtime.

pub mod ors;

pub use ors::{
    DEFAULT_PROFILE, DEFAULT_USER_AGENT, OrsRoutingProvider, OrsRoutingProviderConfig,
    ProviderBuildError,
};
