//! Early rejection of budgets no toll-bearing route can meet.

use tollway_core::{Constraint, Cost, TollKind, TollStation};

/// Decides whether the budget levels are worth searching at all.
///
/// The cheapest toll a route could realistically pay is the cheapest open
/// barrier near the journey, unpriced barriers included; priced closed-system
/// pairings only count when the journey has no open barrier. A budget below
/// that floor cannot be met by any route that still pays a toll, so only the
/// toll-free level remains useful.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeasibilityChecker;

impl FeasibilityChecker {
    /// Lowest price a toll-bearing route would pay among `tolls`.
    ///
    /// Returns `None` when there is neither an open barrier nor a priced
    /// closed station.
    #[must_use]
    pub fn min_possible_cost(tolls: &[TollStation]) -> Option<Cost> {
        let open = tolls
            .iter()
            .filter(|toll| toll.kind == TollKind::Open)
            .map(|toll| toll.cost)
            .min();
        open.or_else(|| {
            tolls
                .iter()
                .filter(|toll| toll.kind == TollKind::Closed && !toll.cost.is_zero())
                .map(|toll| toll.cost)
                .min()
        })
    }

    /// Whether `constraint` is certainly out of reach for toll-bearing routes.
    ///
    /// `base_tolls` holds the priced stations on and near the base route; it
    /// is `None` when the base route could not be obtained, in which case the
    /// search is allowed to proceed.
    #[must_use]
    pub fn is_infeasible(&self, base_tolls: Option<&[TollStation]>, constraint: &Constraint) -> bool {
        let (Some(tolls), Some(limit)) = (base_tolls, constraint.budget_limit()) else {
            return false;
        };
        Self::min_possible_cost(tolls).is_some_and(|floor| limit < floor)
    }
}
