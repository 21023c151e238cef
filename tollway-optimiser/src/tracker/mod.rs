//! Keep the best candidate per objective while workers report results.
//!
//! Each slot ranks candidates by compliance first, then by its objective
//! chain, then by a stable identity so that equal candidates resolve the same
//! way whatever order they arrive in:
//!
//! | Slot        | Chain                           |
//! |-------------|---------------------------------|
//! | `cheapest`  | cost, duration, toll count      |
//! | `fastest`   | duration, cost, toll count      |
//! | `min_tolls` | toll count, cost, duration      |

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tollway_core::{Candidate, Constraint, Cost, ResultSlots};

#[derive(Debug, Clone, Copy)]
enum Objective {
    Cheapest,
    Fastest,
    MinTolls,
}

impl Objective {
    fn compare(self, a: &Candidate, b: &Candidate) -> Ordering {
        let cost = || a.cost().cmp(&b.cost());
        let duration = || a.duration().cmp(&b.duration());
        let count = || a.toll_count().cmp(&b.toll_count());
        match self {
            Self::Cheapest => cost().then_with(duration).then_with(count),
            Self::Fastest => duration().then_with(cost).then_with(count),
            Self::MinTolls => count().then_with(cost).then_with(duration),
        }
    }
}

fn identity(a: &Candidate, b: &Candidate) -> Ordering {
    a.avoided_toll_ids()
        .cmp(b.avoided_toll_ids())
        .then_with(|| a.on_route_ids().cmp(b.on_route_ids()))
}

/// Thread-safe best-so-far slots for one constraint.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tollway_core::test_support::{candidate, priced_toll};
/// use tollway_core::{Constraint, Cost};
/// use tollway_optimiser::ResultTracker;
///
/// let tracker = ResultTracker::new(Constraint::MaxBudget(Cost::from_cents(300)));
/// tracker.update(&Arc::new(candidate(3_600, vec![priced_toll("A", 500, 0.0)], &[])));
/// assert!(!tracker.is_constraint_satisfied());
///
/// tracker.update(&Arc::new(candidate(4_200, vec![priced_toll("B", 200, 0.0)], &["A"])));
/// assert!(tracker.is_constraint_satisfied());
/// assert_eq!(tracker.best_cost(), Some(Cost::from_cents(200)));
/// ```
#[derive(Debug)]
pub struct ResultTracker {
    constraint: Constraint,
    slots: Mutex<ResultSlots>,
}

impl ResultTracker {
    /// Empty slots ranking against `constraint`.
    #[must_use]
    pub fn new(constraint: Constraint) -> Self {
        Self {
            constraint,
            slots: Mutex::new(ResultSlots::default()),
        }
    }

    /// The constraint used for compliance.
    #[must_use]
    pub const fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    fn slots(&self) -> MutexGuard<'_, ResultSlots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rank(&self, objective: Objective, a: &Candidate, b: &Candidate) -> Ordering {
        // `false` sorts first, so compliant candidates lead.
        let breaches = |c: &Candidate| !self.constraint.is_satisfied_by(c);
        breaches(a)
            .cmp(&breaches(b))
            .then_with(|| objective.compare(a, b))
            .then_with(|| identity(a, b))
    }

    fn offer(
        &self,
        objective: Objective,
        slot: &mut Option<Arc<Candidate>>,
        candidate: &Arc<Candidate>,
    ) -> bool {
        let replace = slot
            .as_ref()
            .is_none_or(|current| self.rank(objective, candidate, current) == Ordering::Less);
        if replace {
            *slot = Some(Arc::clone(candidate));
        }
        replace
    }

    /// Offer `candidate` to every slot. Returns `true` if any slot changed.
    pub fn update(&self, candidate: &Arc<Candidate>) -> bool {
        let mut slots = self.slots();
        let cheapest = self.offer(Objective::Cheapest, &mut slots.cheapest, candidate);
        let fastest = self.offer(Objective::Fastest, &mut slots.fastest, candidate);
        let min_tolls = self.offer(Objective::MinTolls, &mut slots.min_tolls, candidate);
        cheapest || fastest || min_tolls
    }

    /// Snapshot of the current slots.
    #[must_use]
    pub fn get(&self) -> ResultSlots {
        self.slots().clone()
    }

    /// Whether any slot holds a compliant candidate.
    #[must_use]
    pub fn is_constraint_satisfied(&self) -> bool {
        self.slots()
            .iter()
            .any(|candidate| self.constraint.is_satisfied_by(candidate))
    }

    /// Cost of the cheapest candidate seen so far.
    #[must_use]
    pub fn best_cost(&self) -> Option<Cost> {
        self.slots().cheapest.as_ref().map(|candidate| candidate.cost())
    }

    /// Consume the tracker, returning its slots.
    #[must_use]
    pub fn into_slots(self) -> ResultSlots {
        self.slots.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
