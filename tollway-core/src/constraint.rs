//! Toll constraints and the compliance predicate shared by every search level.

use crate::{BudgetPercent, Candidate, Cost};

/// The single toll constraint active for an optimisation request.
///
/// # Examples
///
/// ```
/// use tollway_core::{Constraint, Cost};
///
/// let budget = Constraint::MaxBudget(Cost::from_cents(400));
/// assert!(budget.is_compliant(Cost::from_cents(400), 3));
/// assert!(!budget.is_compliant(Cost::from_cents(401), 0));
///
/// let count = Constraint::ExactTollCount(2);
/// assert!(count.is_compliant(Cost::from_cents(9_999), 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Constraint {
    /// The route must cross exactly this many toll stations.
    ExactTollCount(usize),
    /// The route's toll cost must not exceed this amount.
    MaxBudget(Cost),
    /// The route's toll cost must not exceed a share of a base cost.
    MaxBudgetPercent {
        /// Share of `base_cost` that may be spent.
        percent: BudgetPercent,
        /// Cost of the unconstrained route; bound from the base route when
        /// absent.
        base_cost: Option<Cost>,
    },
    /// No constraint: the unconstrained route is acceptable.
    None,
}

impl Constraint {
    /// Upper bound on toll cost, if this is a budget with a known base.
    #[must_use]
    pub fn budget_limit(&self) -> Option<Cost> {
        match *self {
            Self::MaxBudget(limit) => Some(limit),
            Self::MaxBudgetPercent {
                percent,
                base_cost: Some(base),
            } => Some(percent.apply(base)),
            Self::MaxBudgetPercent {
                base_cost: None, ..
            }
            | Self::ExactTollCount(_)
            | Self::None => None,
        }
    }

    /// Requested toll count for count constraints.
    #[must_use]
    pub const fn toll_target(&self) -> Option<usize> {
        match *self {
            Self::ExactTollCount(target) => Some(target),
            _ => None,
        }
    }

    /// Whether this is a monetary constraint.
    #[must_use]
    pub const fn is_budget(&self) -> bool {
        matches!(self, Self::MaxBudget(_) | Self::MaxBudgetPercent { .. })
    }

    /// Compliance predicate over a route's toll cost and crossing count.
    ///
    /// A percentage budget whose base cost has not been bound yet admits
    /// nothing.
    #[must_use]
    pub fn is_compliant(&self, cost: Cost, toll_count: usize) -> bool {
        match *self {
            Self::ExactTollCount(target) => toll_count == target,
            Self::MaxBudget(_) | Self::MaxBudgetPercent { .. } => {
                self.budget_limit().is_some_and(|limit| cost <= limit)
            }
            Self::None => true,
        }
    }

    /// Compliance of an evaluated candidate.
    #[must_use]
    pub fn is_satisfied_by(&self, candidate: &Candidate) -> bool {
        self.is_compliant(candidate.cost(), candidate.toll_count())
    }

    /// Fill in the base cost of an unbound percentage budget.
    ///
    /// Other constraints, and percentages that already carry a base, are
    /// returned unchanged.
    #[must_use]
    pub const fn bind_base_cost(self, base: Cost) -> Self {
        match self {
            Self::MaxBudgetPercent {
                percent,
                base_cost: None,
            } => Self::MaxBudgetPercent {
                percent,
                base_cost: Some(base),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn percent(fraction: f64) -> BudgetPercent {
        BudgetPercent::from_fraction(fraction).expect("valid fraction")
    }

    #[rstest]
    #[case(Constraint::ExactTollCount(2), Cost::from_cents(10), 2, true)]
    #[case(Constraint::ExactTollCount(2), Cost::ZERO, 1, false)]
    #[case(Constraint::MaxBudget(Cost::from_cents(400)), Cost::from_cents(400), 9, true)]
    #[case(Constraint::MaxBudget(Cost::from_cents(400)), Cost::from_cents(401), 0, false)]
    #[case(Constraint::None, Cost::from_cents(u64::MAX), 99, true)]
    fn compliance_follows_variant(
        #[case] constraint: Constraint,
        #[case] cost: Cost,
        #[case] toll_count: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(constraint.is_compliant(cost, toll_count), expected);
    }

    #[rstest]
    fn unbound_percentage_admits_nothing() {
        let constraint = Constraint::MaxBudgetPercent {
            percent: percent(1.0),
            base_cost: None,
        };
        assert_eq!(constraint.budget_limit(), None);
        assert!(!constraint.is_compliant(Cost::ZERO, 0));
    }

    #[rstest]
    fn binding_sets_percentage_limit() {
        let constraint = Constraint::MaxBudgetPercent {
            percent: percent(0.5),
            base_cost: None,
        }
        .bind_base_cost(Cost::from_cents(1_000));
        assert_eq!(constraint.budget_limit(), Some(Cost::from_cents(500)));
        assert!(constraint.is_compliant(Cost::from_cents(500), 4));
    }

    #[rstest]
    fn binding_keeps_explicit_base() {
        let constraint = Constraint::MaxBudgetPercent {
            percent: percent(0.5),
            base_cost: Some(Cost::from_cents(200)),
        };
        assert_eq!(constraint.bind_base_cost(Cost::from_cents(1_000)), constraint);
        assert_eq!(
            Constraint::MaxBudget(Cost::ZERO).bind_base_cost(Cost::from_cents(5)),
            Constraint::MaxBudget(Cost::ZERO)
        );
    }

    #[rstest]
    fn only_counts_carry_a_target() {
        assert_eq!(Constraint::ExactTollCount(3).toll_target(), Some(3));
        assert_eq!(Constraint::MaxBudget(Cost::ZERO).toll_target(), None);
        assert!(Constraint::MaxBudget(Cost::ZERO).is_budget());
        assert!(!Constraint::None.is_budget());
    }
}
