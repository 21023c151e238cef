//! Last-resort answer once every relaxation level has failed.
//!
//! Budget targets first look for a near miss among every route the request
//! verified: a percentage budget is widened to 110%, 125% and then 150% of
//! its limit, and an absolute budget accepts the cheapest route within 20%
//! above it. Anything else ranks the toll-free and base routes under the
//! original constraint.

use std::sync::Arc;

use log::{info, warn};
use tollway_core::{Candidate, Constraint, ResolutionLevel, ResultSlots};

use crate::ResultTracker;

/// Widening steps for percentage budgets, in basis points of the limit.
const WIDENING_STEPS: [u32; 3] = [11_000, 12_500, 15_000];

/// Largest overrun accepted for an absolute budget, in basis points.
const NEAR_BUDGET_CEILING: u32 = 12_000;

/// Builds degraded slots from whatever routes the request still has.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackStrategy;

impl FallbackStrategy {
    /// Rank the remaining routes, returning `None` when there are none.
    ///
    /// `seen` holds every candidate verified during the search.
    #[must_use]
    pub fn degrade(
        &self,
        constraint: &Constraint,
        seen: &[Arc<Candidate>],
        toll_free: Option<&Arc<Candidate>>,
        base: Option<&Arc<Candidate>>,
    ) -> Option<(ResultSlots, ResolutionLevel)> {
        let routes: Vec<&Arc<Candidate>> = seen.iter().chain(toll_free).chain(base).collect();
        if let Some(resolved) = Self::near_budget(constraint, &routes) {
            return Some(resolved);
        }
        warn!(
            "Falling back for {constraint:?} (toll-free route: {}, base route: {})",
            toll_free.is_some(),
            base.is_some()
        );
        let slots = rank(*constraint, toll_free.into_iter().chain(base));
        (!slots.is_empty()).then_some((slots, ResolutionLevel::Degraded))
    }

    fn near_budget(
        constraint: &Constraint,
        routes: &[&Arc<Candidate>],
    ) -> Option<(ResultSlots, ResolutionLevel)> {
        let cheapest = routes.iter().map(|route| route.cost()).min()?;
        let (limit, level) = match *constraint {
            Constraint::MaxBudgetPercent {
                base_cost: Some(_), ..
            } => {
                let limit = constraint.budget_limit()?;
                let widened = WIDENING_STEPS
                    .iter()
                    .map(|step| limit.scaled(*step))
                    .find(|widened| cheapest <= *widened)?;
                (widened, ResolutionLevel::WidenedBudget)
            }
            Constraint::MaxBudget(limit) => {
                let ceiling = limit.scaled(NEAR_BUDGET_CEILING);
                (cheapest <= ceiling).then_some((ceiling, ResolutionLevel::NearBudget))?
            }
            Constraint::ExactTollCount(_)
            | Constraint::MaxBudgetPercent { .. }
            | Constraint::None => return None,
        };
        info!("Accepting {constraint:?} as {level} with a limit of {limit}");
        let slots = rank(Constraint::MaxBudget(limit), routes.iter().copied());
        Some((slots, level))
    }
}

fn rank<'a, I>(constraint: Constraint, routes: I) -> ResultSlots
where
    I: Iterator<Item = &'a Arc<Candidate>>,
{
    let tracker = ResultTracker::new(constraint);
    for candidate in routes {
        tracker.update(candidate);
    }
    tracker.into_slots()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tollway_core::{BudgetPercent, Cost};
    use tollway_core::test_support::{candidate, priced_toll};

    fn priced(secs: u64, cents: u64, id: &str) -> Arc<Candidate> {
        Arc::new(candidate(secs, vec![priced_toll(id, cents, 0.0)], &[]))
    }

    fn cheapest(slots: &ResultSlots) -> Option<Cost> {
        slots.cheapest.as_ref().map(|c| c.cost())
    }

    fn half_of(base_cents: u64) -> Constraint {
        Constraint::MaxBudgetPercent {
            percent: BudgetPercent::from_fraction(0.5).expect("fraction"),
            base_cost: Some(Cost::from_cents(base_cents)),
        }
    }

    #[rstest]
    fn nothing_to_offer_is_total_failure() {
        assert!(
            FallbackStrategy
                .degrade(&Constraint::ExactTollCount(0), &[], None, None)
                .is_none()
        );
    }

    #[rstest]
    fn base_route_fills_the_slots_alone() {
        let base = priced(3_600, 500, "A");

        let (slots, level) = FallbackStrategy
            .degrade(&Constraint::ExactTollCount(0), &[], None, Some(&base))
            .expect("base route survives");

        assert_eq!(level, ResolutionLevel::Degraded);
        assert!(slots.iter().all(|c| Arc::ptr_eq(c, &base)));
    }

    #[rstest]
    fn compliant_route_leads_every_slot() {
        let base = priced(3_600, 500, "A");
        let free = Arc::new(candidate(4_800, Vec::new(), &[]));

        let (slots, _) = FallbackStrategy
            .degrade(
                &Constraint::ExactTollCount(0),
                &[],
                Some(&free),
                Some(&base),
            )
            .expect("two routes");

        assert!(slots.fastest.is_some_and(|c| Arc::ptr_eq(&c, &free)));
    }

    #[rstest]
    #[case(540, Some(ResolutionLevel::WidenedBudget))]
    #[case(600, Some(ResolutionLevel::WidenedBudget))]
    #[case(750, Some(ResolutionLevel::WidenedBudget))]
    #[case(760, None)]
    fn percentage_budgets_widen_in_steps(
        #[case] cents: u64,
        #[case] expected: Option<ResolutionLevel>,
    ) {
        let base = priced(3_600, 1_000, "A");
        let seen = [priced(4_000, cents, "B")];

        let (slots, level) = FallbackStrategy
            .degrade(&half_of(1_000), &seen, None, Some(&base))
            .expect("base route survives");

        match expected {
            Some(widened) => {
                assert_eq!(level, widened);
                assert_eq!(cheapest(&slots), Some(Cost::from_cents(cents)));
                assert!(slots.iter().all(|c| c.cost() <= Cost::from_cents(750)));
            }
            None => assert_eq!(level, ResolutionLevel::Degraded),
        }
    }

    #[rstest]
    fn absolute_budgets_accept_a_near_miss() {
        let base = priced(3_600, 900, "A");
        let seen = [priced(4_000, 580, "B"), priced(3_900, 650, "C")];

        let (slots, level) = FallbackStrategy
            .degrade(
                &Constraint::MaxBudget(Cost::from_cents(500)),
                &seen,
                None,
                Some(&base),
            )
            .expect("near miss");

        assert_eq!(level, ResolutionLevel::NearBudget);
        assert_eq!(cheapest(&slots), Some(Cost::from_cents(580)));
        assert!(slots.fastest.is_some_and(|c| c.cost() == Cost::from_cents(580)));
    }

    #[rstest]
    fn distant_budgets_still_degrade() {
        let base = priced(3_600, 900, "A");
        let seen = [priced(4_000, 610, "B")];

        let (slots, level) = FallbackStrategy
            .degrade(
                &Constraint::MaxBudget(Cost::from_cents(500)),
                &seen,
                None,
                Some(&base),
            )
            .expect("base route survives");

        assert_eq!(level, ResolutionLevel::Degraded);
        assert!(slots.iter().all(|c| Arc::ptr_eq(c, &base)));
    }
}
