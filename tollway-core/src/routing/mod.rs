//! Fetch drivable routes, optionally steering around toll stations.
//!
//! The `RoutingProvider` trait abstracts the external routing engine. The
//! optimiser asks it for an unconstrained base route, for routes avoiding a
//! set of exclusion polygons, and for routes avoiding tollways altogether.
//!
//! Every call is a blocking network round-trip in real deployments, so the
//! optimiser budgets them per request.

mod error;
mod provider;

pub use error::RoutingError;
pub use provider::RoutingProvider;
