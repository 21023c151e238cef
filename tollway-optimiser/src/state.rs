//! Per-request search bookkeeping shared by the worker pool.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::TollSignature;

#[derive(Debug, Default)]
struct Ledger {
    tested: HashSet<TollSignature>,
    attempts_used: usize,
}

/// Tested signatures, the provider-call budget and the stop flag for one
/// optimisation request.
///
/// Signatures and attempts share one lock. The stop flag is set at most once
/// and read without locking.
#[derive(Debug)]
pub struct SearchState {
    ledger: Mutex<Ledger>,
    attempt_budget: usize,
    stop_requested: AtomicBool,
}

impl SearchState {
    /// Fresh state allowing `attempt_budget` provider calls.
    #[must_use]
    pub fn new(attempt_budget: usize) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            attempt_budget,
            stop_requested: AtomicBool::new(false),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve one provider call. Returns `false` once the budget is spent.
    pub fn try_acquire_attempt(&self) -> bool {
        let mut ledger = self.ledger();
        if ledger.attempts_used >= self.attempt_budget {
            return false;
        }
        ledger.attempts_used += 1;
        true
    }

    /// Record `signature` as tested. Returns `false` if it already was.
    pub fn mark_tested(&self, signature: &TollSignature) -> bool {
        let mut ledger = self.ledger();
        if ledger.tested.contains(signature) {
            return false;
        }
        ledger.tested.insert(signature.clone())
    }

    /// Whether `signature` has been dispatched before.
    #[must_use]
    pub fn is_tested(&self, signature: &TollSignature) -> bool {
        self.ledger().tested.contains(signature)
    }

    /// Provider calls made so far.
    #[must_use]
    pub fn attempts_used(&self) -> usize {
        self.ledger().attempts_used
    }

    /// Provider calls still allowed.
    #[must_use]
    pub fn attempts_remaining(&self) -> usize {
        self.attempt_budget.saturating_sub(self.attempts_used())
    }

    /// The configured cap.
    #[must_use]
    pub const fn attempt_budget(&self) -> usize {
        self.attempt_budget
    }

    /// Ask workers not to start further provider calls.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}
