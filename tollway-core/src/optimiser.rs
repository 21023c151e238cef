//! Requests, outcomes and the optimiser seam.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use geo::Coord;
use thiserror::Error;

use crate::{Candidate, Constraint, ResultSlots, VehicleClass};

/// Parameters for an optimisation request.
///
/// # Examples
/// ```rust
/// use geo::Coord;
/// use tollway_core::{Constraint, Cost, OptimiseRequest, VehicleClass};
///
/// let request = OptimiseRequest::new(
///     vec![Coord { x: 2.35, y: 48.85 }, Coord { x: 4.83, y: 45.76 }],
///     Constraint::MaxBudget(Cost::from_cents(1_500)),
/// )
/// .with_vehicle_class(VehicleClass::C2);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptimiseRequest {
    /// Origin, optional via points and destination, as lon/lat.
    pub waypoints: Vec<Coord<f64>>,
    /// The toll constraint to satisfy.
    pub constraint: Constraint,
    /// Vehicle tariff class used for pricing.
    pub vehicle_class: VehicleClass,
}

/// Errors returned by [`OptimiseRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimiseRequestError {
    /// Fewer than two waypoints were supplied.
    #[error("at least two waypoints are required, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },
    /// A waypoint was not a finite longitude/latitude pair.
    #[error("waypoint {index} is not a valid longitude/latitude pair")]
    InvalidWaypoint {
        /// Position of the offending waypoint.
        index: usize,
    },
}

impl OptimiseRequest {
    /// Create a request for a class 1 vehicle.
    #[must_use]
    pub fn new(waypoints: Vec<Coord<f64>>, constraint: Constraint) -> Self {
        Self {
            waypoints,
            constraint,
            vehicle_class: VehicleClass::default(),
        }
    }

    /// Set the vehicle tariff class.
    #[must_use]
    pub const fn with_vehicle_class(mut self, vehicle_class: VehicleClass) -> Self {
        self.vehicle_class = vehicle_class;
        self
    }

    /// Check that the waypoints describe a routable journey.
    pub fn validate(&self) -> Result<(), OptimiseRequestError> {
        if self.waypoints.len() < 2 {
            return Err(OptimiseRequestError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        // Range checks reject NaN as well.
        let valid =
            |c: &Coord<f64>| (-180.0..=180.0).contains(&c.x) && (-90.0..=90.0).contains(&c.y);
        match self.waypoints.iter().position(|c| !valid(c)) {
            Some(index) => Err(OptimiseRequestError::InvalidWaypoint { index }),
            None => Ok(()),
        }
    }
}

/// Which tier of the resolver produced the returned routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ResolutionLevel {
    /// The requested constraint was met.
    Exact,
    /// Met after allowing one more toll, or a deeper budget search.
    PlusOne,
    /// Met after allowing one fewer toll.
    MinusOne,
    /// A dedicated toll-free request produced the result.
    TollFree,
    /// A percentage budget was met only after widening it to at most 150%.
    WidenedBudget,
    /// An absolute budget was missed by no more than 20%.
    NearBudget,
    /// No level succeeded; the fallback returned what it could.
    Degraded,
    /// No constraint was active; the unconstrained route is returned.
    None,
}

impl ResolutionLevel {
    /// Whether the constraint had to be loosened.
    #[must_use]
    pub const fn is_relaxed(self) -> bool {
        matches!(
            self,
            Self::PlusOne
                | Self::MinusOne
                | Self::TollFree
                | Self::WidenedBudget
                | Self::NearBudget
        )
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::PlusOne => "plus_one",
            Self::MinusOne => "minus_one",
            Self::TollFree => "toll_free",
            Self::WidenedBudget => "widened_budget",
            Self::NearBudget => "near_budget",
            Self::Degraded => "degraded",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ResolutionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Diagnostic information about an optimisation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Time spent resolving the request.
    pub solve_time: Duration,
    /// Routing-provider calls made, including the base route.
    pub attempts_used: usize,
    /// Avoidance requests that produced a verified candidate.
    pub candidates_evaluated: usize,
    /// Avoidance requests dropped after provider or verification failures.
    pub candidates_rejected: usize,
    /// Combinations skipped before any provider call.
    pub combinations_pruned: usize,
    /// Relaxation levels entered.
    pub levels_tried: usize,
}

/// Result of a successful optimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationOutcome {
    /// Best routes per objective.
    pub slots: ResultSlots,
    /// Tier that produced `slots`.
    pub resolution: ResolutionLevel,
    /// The unconstrained route, when the provider returned one.
    pub base_route: Option<Arc<Candidate>>,
    /// Search diagnostics.
    pub stats: SearchStats,
}

/// Errors returned by [`Optimiser::optimise`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimiseError {
    /// Request parameters were invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] OptimiseRequestError),
    /// No route of any kind could be obtained, not even the base route.
    #[error("no route could be obtained after {attempts_used} provider calls")]
    TotalFailure {
        /// Routing-provider calls made before giving up.
        attempts_used: usize,
    },
}

/// Find routes satisfying a toll constraint.
///
/// Every outcome short of [`OptimiseError::TotalFailure`] is reported through
/// [`OptimisationOutcome::resolution`] rather than as an error, so callers can
/// surface how closely the constraint was met.
/// Optimisers must be `Send + Sync` to serve concurrent requests.
pub trait Optimiser: Send + Sync {
    /// Resolve a request into the best routes found.
    fn optimise(&self, request: &OptimiseRequest) -> Result<OptimisationOutcome, OptimiseError>;
}
