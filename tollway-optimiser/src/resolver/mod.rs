//! Relaxation ladder driving one optimisation request.
//!
//! Levels run in a fixed order and the first one whose tracker holds a
//! compliant candidate ends the search:
//!
//! 1. exact: the requested constraint;
//! 2. plus one: one more toll, or one more combination size for budgets;
//! 3. minus one: one fewer toll, for count targets above one;
//! 4. toll free: a single tollway-avoidance request.
//!
//! Every verified candidate is remembered and replayed into each new level
//! before any provider call, so a route found early can satisfy a later
//! target for free. A target of exactly one toll tries detours through
//! single open tolls before any combination.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::ThreadPool;
use rayon::prelude::*;
use tollway_core::{
    AvoidanceGeometryBuilder, Candidate, Constraint, OptimisationOutcome, OptimiseError,
    ResolutionLevel, ResultSlots, RoutingProvider, SearchStats, TollCostModel, TollKind,
    TollLocator, TollStation,
};

use crate::{
    AvoidanceRequest, BaseRoute, CandidateEvaluator, CombinationGenerator, EvaluationError,
    FallbackStrategy, FeasibilityChecker, OptimiserConfig, ResultTracker, SearchState,
};

/// Runs the relaxation ladder for a single request.
///
/// A resolver owns the request's [`SearchState`], so it must not be reused
/// across requests.
#[derive(Debug)]
pub struct PriorityResolver<'a, R: ?Sized, L: ?Sized, C: ?Sized, G: ?Sized> {
    evaluator: CandidateEvaluator<'a, R, L, C, G>,
    config: &'a OptimiserConfig,
    pool: &'a ThreadPool,
    state: SearchState,
    seen: Mutex<Vec<Arc<Candidate>>>,
    toll_free: OnceLock<Option<Arc<Candidate>>>,
    evaluated: AtomicUsize,
    rejected: AtomicUsize,
    pruned: AtomicUsize,
    levels: AtomicUsize,
}

impl<'a, R, L, C, G> PriorityResolver<'a, R, L, C, G>
where
    R: RoutingProvider + ?Sized,
    L: TollLocator + ?Sized,
    C: TollCostModel + ?Sized,
    G: AvoidanceGeometryBuilder + ?Sized,
{
    /// Resolver for one request, dispatching on `pool`.
    #[must_use]
    pub fn new(
        evaluator: CandidateEvaluator<'a, R, L, C, G>,
        config: &'a OptimiserConfig,
        pool: &'a ThreadPool,
    ) -> Self {
        Self {
            evaluator,
            config,
            pool,
            state: SearchState::new(config.attempt_budget),
            seen: Mutex::new(Vec::new()),
            toll_free: OnceLock::new(),
            evaluated: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            pruned: AtomicUsize::new(0),
            levels: AtomicUsize::new(0),
        }
    }

    /// Resolve `constraint` for the evaluator's journey.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiseError::TotalFailure`] when neither the search nor
    /// the fallback produced any route.
    pub fn resolve(&self, constraint: &Constraint) -> Result<OptimisationOutcome, OptimiseError> {
        let started = Instant::now();
        let base = self.fetch_base();
        let bound = base
            .as_ref()
            .map_or(*constraint, |b| constraint.bind_base_cost(b.candidate.cost()));
        let found = self.search(bound, base.as_ref());
        let mut base_route = base.map(|b| b.candidate);
        let (slots, resolution) = match found {
            Some(resolved) => resolved,
            None => {
                if base_route.is_none() {
                    base_route = self.fetch_base().map(|b| b.candidate);
                }
                let toll_free = self.toll_free();
                let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
                FallbackStrategy
                    .degrade(&bound, &seen, toll_free.as_ref(), base_route.as_ref())
                    .ok_or(OptimiseError::TotalFailure {
                        attempts_used: self.state.attempts_used(),
                    })?
            }
        };
        let stats = self.stats(started);
        info!(
            "Resolved {bound:?} at level {resolution} using {} of {} provider calls",
            stats.attempts_used,
            self.state.attempt_budget()
        );
        Ok(OptimisationOutcome {
            slots,
            resolution,
            base_route,
            stats,
        })
    }

    fn search(
        &self,
        constraint: Constraint,
        base: Option<&BaseRoute>,
    ) -> Option<(ResultSlots, ResolutionLevel)> {
        if constraint == Constraint::None {
            return base.map(|b| (single_slots(&b.candidate), ResolutionLevel::None));
        }
        let base_count = base.map_or(0, |b| b.candidate.toll_count());
        let generator = base.map_or_else(CombinationGenerator::default, |b| {
            CombinationGenerator::new(&avoidance_pool(b, &constraint))
        });
        let max_size = self.config.max_combination_size;

        let reachable: Option<Vec<TollStation>> = base.map(|b| {
            b.candidate
                .tolls_on_route()
                .iter()
                .chain(&b.nearby)
                .cloned()
                .collect()
        });
        if FeasibilityChecker.is_infeasible(reachable.as_deref(), &constraint) {
            warn!("{constraint:?} is below the cheapest reachable toll; trying toll-free only");
        } else {
            let detours = match (constraint.toll_target(), base) {
                (Some(1), Some(b)) => generator.detours(&b.nearby),
                _ => Vec::new(),
            };
            let exact_sizes = generator.sizes_for(&constraint, base_count, max_size);
            let exact = detours
                .into_iter()
                .chain(generator.generate(exact_sizes));
            if let Some(slots) = self.run_level(ResolutionLevel::Exact, constraint, exact) {
                return Some((slots, ResolutionLevel::Exact));
            }
            let (looser, looser_sizes) = match constraint.toll_target() {
                Some(count) => {
                    let plus_one = Constraint::ExactTollCount(count.saturating_add(1));
                    (plus_one, generator.sizes_for(&plus_one, base_count, max_size))
                }
                None => (
                    constraint,
                    generator.sizes_for(&constraint, base_count, max_size.saturating_add(1)),
                ),
            };
            if let Some(slots) = self.run_level(
                ResolutionLevel::PlusOne,
                looser,
                generator.generate(looser_sizes),
            ) {
                return Some((slots, ResolutionLevel::PlusOne));
            }
        }

        if let Some(count) = constraint.toll_target()
            && count > 1
        {
            let minus_one = Constraint::ExactTollCount(count - 1);
            let sizes = generator.sizes_for(&minus_one, base_count, max_size);
            if let Some(slots) =
                self.run_level(ResolutionLevel::MinusOne, minus_one, generator.generate(sizes))
            {
                return Some((slots, ResolutionLevel::MinusOne));
            }
        }

        self.toll_free_level(&constraint)
            .map(|slots| (slots, ResolutionLevel::TollFree))
    }

    fn toll_free_level(&self, constraint: &Constraint) -> Option<ResultSlots> {
        self.levels.fetch_add(1, Ordering::Relaxed);
        let target = if constraint.toll_target().is_some() {
            Constraint::ExactTollCount(0)
        } else {
            *constraint
        };
        debug!("Entering level {} for {target:?}", ResolutionLevel::TollFree);
        let toll_free = self.toll_free()?;
        let tracker = self.seeded_tracker(target);
        tracker.update(&toll_free);
        Some(tracker.into_slots())
    }

    fn run_level<I>(
        &self,
        level: ResolutionLevel,
        target: Constraint,
        mut requests: I,
    ) -> Option<ResultSlots>
    where
        I: Iterator<Item = AvoidanceRequest>,
    {
        self.levels.fetch_add(1, Ordering::Relaxed);
        debug!("Entering level {level} for {target:?}");
        let tracker = self.seeded_tracker(target);
        while !tracker.is_constraint_satisfied()
            && !self.state.stop_requested()
            && self.state.attempts_remaining() > 0
        {
            let wave = self.next_wave(&mut requests, &tracker);
            if wave.is_empty() {
                debug!("Level {level} exhausted its combinations");
                break;
            }
            self.pool.install(|| {
                wave.par_iter()
                    .for_each(|request| self.dispatch(request, &tracker));
            });
        }
        tracker
            .is_constraint_satisfied()
            .then(|| tracker.into_slots())
    }

    fn seeded_tracker(&self, target: Constraint) -> ResultTracker {
        let tracker = ResultTracker::new(target);
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
        for candidate in &seen {
            tracker.update(candidate);
        }
        tracker
    }

    fn next_wave<I>(&self, requests: &mut I, tracker: &ResultTracker) -> Vec<AvoidanceRequest>
    where
        I: Iterator<Item = AvoidanceRequest>,
    {
        let budget = tracker.constraint().budget_limit();
        let width = self.config.workers.min(self.state.attempts_remaining());
        let mut wave = Vec::with_capacity(width);
        while wave.len() < width {
            let Some(request) = requests.next() else {
                break;
            };
            if let Some(saving) = request.estimated_saving() {
                if saving.is_zero() {
                    self.pruned.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                // A single station's saving is only an estimate; its
                // alternative may also drop tolls it never named.
                let single = request.signature().is_some_and(|s| s.len() == 1);
                if let (Some(limit), Some(best)) = (budget, tracker.best_cost())
                    && !single
                    && best.saturating_sub(saving) > limit
                {
                    debug!(
                        "Pruned {request_signature}: best {best} less {saving} exceeds {limit}",
                        request_signature = request
                            .signature()
                            .map_or_else(String::new, ToString::to_string)
                    );
                    self.pruned.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            }
            if let Some(signature) = request.signature()
                && !self.state.mark_tested(signature)
            {
                continue;
            }
            wave.push(request);
        }
        wave
    }

    fn dispatch(&self, request: &AvoidanceRequest, tracker: &ResultTracker) {
        if self.state.stop_requested() {
            return;
        }
        let outcome = match request {
            AvoidanceRequest::AllTollways => self.toll_free(),
            AvoidanceRequest::Stations(avoidance) => {
                debug!(
                    "Dispatching {} (saving {})",
                    avoidance.signature, avoidance.estimated_saving
                );
                self.evaluate(request)
            }
            AvoidanceRequest::Detour(detour) => {
                debug!("Dispatching detour via {}", detour.via.id);
                self.evaluate(request)
            }
        };
        let Some(candidate) = outcome else {
            return;
        };
        let lands_free = candidate.cost().is_zero() || candidate.toll_count() == 0;
        if tracker.constraint().is_satisfied_by(&candidate) && lands_free {
            debug!("Compliant toll-free candidate found; stopping dispatch");
            self.state.request_stop();
        }
        tracker.update(&candidate);
    }

    fn evaluate(&self, request: &AvoidanceRequest) -> Option<Arc<Candidate>> {
        match self.evaluator.evaluate(request, &self.state) {
            Ok(candidate) => {
                self.evaluated.fetch_add(1, Ordering::Relaxed);
                let shared = Arc::new(candidate);
                self.remember(Arc::clone(&shared));
                Some(shared)
            }
            Err(EvaluationError::BudgetExhausted) => {
                debug!("Attempt budget exhausted before {request:?} completed");
                None
            }
            Err(err) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("Dropped avoidance request: {err}");
                None
            }
        }
    }

    fn toll_free(&self) -> Option<Arc<Candidate>> {
        self.toll_free
            .get_or_init(|| self.evaluate(&AvoidanceRequest::AllTollways))
            .clone()
    }

    fn fetch_base(&self) -> Option<BaseRoute> {
        match self.evaluator.evaluate_base(&self.state) {
            Ok(base) => {
                self.remember(Arc::clone(&base.candidate));
                Some(base)
            }
            Err(err) => {
                warn!("Base route unavailable: {err}");
                None
            }
        }
    }

    fn remember(&self, candidate: Arc<Candidate>) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(candidate);
    }

    fn stats(&self, started: Instant) -> SearchStats {
        SearchStats {
            solve_time: started.elapsed(),
            attempts_used: self.state.attempts_used(),
            candidates_evaluated: self.evaluated.load(Ordering::Relaxed),
            candidates_rejected: self.rejected.load(Ordering::Relaxed),
            combinations_pruned: self.pruned.load(Ordering::Relaxed),
            levels_tried: self.levels.load(Ordering::Relaxed),
        }
    }
}

/// Tolls worth steering around: the base route's, plus open tolls near it
/// when the target is a budget.
fn avoidance_pool(base: &BaseRoute, constraint: &Constraint) -> Vec<TollStation> {
    let on_route = base.candidate.tolls_on_route().iter();
    if constraint.is_budget() {
        on_route
            .chain(base.nearby.iter().filter(|toll| toll.kind == TollKind::Open))
            .cloned()
            .collect()
    } else {
        on_route.cloned().collect()
    }
}

fn single_slots(candidate: &Arc<Candidate>) -> ResultSlots {
    ResultSlots {
        fastest: Some(Arc::clone(candidate)),
        cheapest: Some(Arc::clone(candidate)),
        min_tolls: Some(Arc::clone(candidate)),
    }
}

#[cfg(test)]
mod tests;
