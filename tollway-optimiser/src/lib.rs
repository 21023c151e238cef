//! Toll-constrained route search for the tollway engine.
//!
//! This crate provides [`TollOptimiser`], the default implementation of the
//! [`Optimiser`](tollway_core::Optimiser) trait. Given a journey and a single
//! toll constraint, it fetches the unconstrained route, enumerates sets of
//! tolls to steer around in descending estimated saving, asks the routing
//! provider for alternatives on a bounded worker pool, and keeps the fastest,
//! cheapest and fewest-toll routes that satisfy the constraint.
//!
//! When the exact constraint cannot be met the [`PriorityResolver`] relaxes it
//! one level at a time, down to a single toll-free request, and finally hands
//! over to [`FallbackStrategy`]. Every request is capped by an attempt budget
//! on provider calls.
//!
//! # Example
//!
//! ```
//! use tollway_core::test_support::TollNetwork;
//! use tollway_core::{
//!     ClassPrices, Constraint, Cost, DiskAvoidanceBuilder, OptimiseRequest, Optimiser,
//!     ResolutionLevel, TariffCostModel, TariffTable, TollKind,
//! };
//! use tollway_optimiser::TollOptimiser;
//!
//! let network = TollNetwork::new()
//!     .with_station("A", TollKind::Open)
//!     .with_corridor(&["A"], 3_600)
//!     .with_corridor(&[], 4_500);
//! let tariffs = TariffTable::new().with_open("A", ClassPrices::uniform(Cost::from_cents(420)));
//! let optimiser = TollOptimiser::new(
//!     &network,
//!     network.locator(),
//!     TariffCostModel::new(tariffs),
//!     DiskAvoidanceBuilder::default(),
//! )?;
//!
//! let request = OptimiseRequest::new(network.waypoints(), Constraint::ExactTollCount(0));
//! let outcome = optimiser.optimise(&request).expect("toll-free corridor exists");
//! assert_eq!(outcome.resolution, ResolutionLevel::Exact);
//! assert!(outcome.slots.iter().all(|route| route.cost() == Cost::ZERO));
//! # Ok::<(), tollway_optimiser::OptimiserBuildError>(())
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod combination;
mod config;
mod evaluator;
mod fallback;
mod feasibility;
mod optimiser;
mod resolver;
mod state;
mod tracker;

pub use combination::{
    AvoidanceRequest, CombinationGenerator, Combinations, StationAvoidance, StationDetour,
    TollSignature,
};
pub use config::{DEFAULT_AVOIDANCE_RADII_M, OptimiserBuildError, OptimiserConfig};
pub use evaluator::{BaseRoute, CandidateEvaluator, EvaluationError};
pub use fallback::FallbackStrategy;
pub use feasibility::FeasibilityChecker;
pub use optimiser::TollOptimiser;
pub use resolver::PriorityResolver;
pub use state::SearchState;
pub use tracker::ResultTracker;
