//! Core domain types for the tollway engine.
//!
//! Responsibilities:
//! - Model toll stations, costs, constraints and verified route candidates.
//! - Define the collaborator seams the optimiser drives: routing, toll
//!   location, pricing and avoidance geometry.
//! - Provide in-memory implementations of the location, pricing and
//!   geometry seams.
//!
//! Boundaries:
//! - No network I/O; HTTP routing lives in `tollway-routing`.
//! - No search policy; combination search lives in `tollway-optimiser`.
//!
//! Invariants:
//! - Costs are integer cents and never negative.
//! - A [`Candidate`] never crosses a toll it was asked to avoid.

mod avoidance;
mod candidate;
mod constraint;
mod cost;
mod geometry;
mod locator;
mod optimiser;
mod route;
mod routing;
mod tariff;
mod toll;
mod vehicle;

#[doc(hidden)]
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use avoidance::{AvoidanceGeometryBuilder, DEFAULT_DISK_SEGMENTS, DiskAvoidanceBuilder};
pub use candidate::{Candidate, CandidateError, ResultSlots};
pub use constraint::Constraint;
pub use cost::{BudgetPercent, BudgetPercentError, Cost};
pub use locator::{
    DEFAULT_NEARBY_RADIUS_M, DEFAULT_ON_ROUTE_RADIUS_M, LocatedTolls, SpatialTollLocator,
    TollLocator, TollReference,
};
pub use optimiser::{
    OptimisationOutcome, OptimiseError, OptimiseRequest, OptimiseRequestError, Optimiser,
    ResolutionLevel, SearchStats,
};
pub use route::{Route, RouteError};
pub use routing::{RoutingError, RoutingProvider};
pub use tariff::{
    ClassPrices, TariffCostModel, TariffEntry, TariffError, TariffTable, TollCostModel,
};
pub use toll::{TollId, TollKind, TollStation};
pub use vehicle::{ParseVehicleClassError, VehicleClass};
