//! Facade crate for the tollway route engine.
//!
//! This crate re-exports the core domain types and exposes the optimiser and
//! HTTP routing provider behind feature flags.

#![forbid(unsafe_code)]

pub use tollway_core::{
    AvoidanceGeometryBuilder, BudgetPercent, Candidate, ClassPrices, Constraint, Cost,
    DiskAvoidanceBuilder, OptimisationOutcome, OptimiseError, OptimiseRequest, Optimiser,
    ResolutionLevel, ResultSlots, Route, RoutingError, RoutingProvider, SearchStats,
    SpatialTollLocator, TariffCostModel, TariffTable, TollCostModel, TollId, TollKind,
    TollLocator, TollStation, VehicleClass,
};

#[cfg(feature = "optimiser")]
pub use tollway_optimiser::{OptimiserBuildError, OptimiserConfig, TollOptimiser};

#[cfg(feature = "routing-ors")]
pub use tollway_routing::{OrsRoutingProvider, OrsRoutingProviderConfig};
