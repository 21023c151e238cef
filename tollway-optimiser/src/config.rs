//! Search limits for [`crate::TollOptimiser`].

use thiserror::Error;

/// Avoidance radii tried in order before a combination is dropped.
pub const DEFAULT_AVOIDANCE_RADII_M: [f64; 5] = [250.0, 500.0, 800.0, 1200.0, 1500.0];

/// Configuration for [`crate::TollOptimiser`].
///
/// # Examples
///
/// ```
/// use tollway_optimiser::OptimiserConfig;
///
/// let config = OptimiserConfig::default()
///     .with_workers(2)
///     .with_attempt_budget(20);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_combination_size, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct OptimiserConfig {
    /// Largest avoidance set tried for budget constraints.
    pub max_combination_size: usize,
    /// Hard cap on routing-provider calls per request.
    pub attempt_budget: usize,
    /// Escalating avoidance radii in metres.
    pub avoidance_radii_m: Vec<f64>,
    /// Concurrent candidate evaluations.
    pub workers: usize,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            max_combination_size: 2,
            attempt_budget: 50,
            avoidance_radii_m: DEFAULT_AVOIDANCE_RADII_M.to_vec(),
            workers: 4,
        }
    }
}

/// Errors raised while building a [`crate::TollOptimiser`].
#[derive(Debug, Error)]
pub enum OptimiserBuildError {
    /// `max_combination_size` was zero.
    #[error("max_combination_size must be at least 1")]
    ZeroCombinationSize,
    /// `attempt_budget` was zero.
    #[error("attempt_budget must be at least 1")]
    ZeroAttemptBudget,
    /// `workers` was zero.
    #[error("workers must be at least 1")]
    ZeroWorkers,
    /// No avoidance radius was configured.
    #[error("at least one avoidance radius is required")]
    NoRadii,
    /// A radius was not a positive, finite number of metres.
    #[error("avoidance radius {radius_m} is not a positive distance")]
    InvalidRadius {
        /// The rejected radius.
        radius_m: f64,
    },
    /// Radii did not strictly increase.
    #[error("avoidance radii must strictly increase")]
    UnorderedRadii,
    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl OptimiserConfig {
    /// Set the largest avoidance set tried for budget constraints.
    #[must_use]
    pub const fn with_max_combination_size(mut self, size: usize) -> Self {
        self.max_combination_size = size;
        self
    }

    /// Set the per-request provider call cap.
    #[must_use]
    pub const fn with_attempt_budget(mut self, budget: usize) -> Self {
        self.attempt_budget = budget;
        self
    }

    /// Replace the avoidance radius escalation.
    #[must_use]
    pub fn with_avoidance_radii<I>(mut self, radii: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.avoidance_radii_m = radii.into_iter().collect();
        self
    }

    /// Set the number of concurrent evaluations.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check that the configuration can drive a search.
    ///
    /// # Errors
    ///
    /// Returns the first violated limit.
    pub fn validate(&self) -> Result<(), OptimiserBuildError> {
        if self.max_combination_size == 0 {
            return Err(OptimiserBuildError::ZeroCombinationSize);
        }
        if self.attempt_budget == 0 {
            return Err(OptimiserBuildError::ZeroAttemptBudget);
        }
        if self.workers == 0 {
            return Err(OptimiserBuildError::ZeroWorkers);
        }
        if self.avoidance_radii_m.is_empty() {
            return Err(OptimiserBuildError::NoRadii);
        }
        if let Some(&radius_m) = self
            .avoidance_radii_m
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(OptimiserBuildError::InvalidRadius { radius_m });
        }
        if self
            .avoidance_radii_m
            .windows(2)
            .any(|pair| matches!(pair, [a, b] if a >= b))
        {
            return Err(OptimiserBuildError::UnorderedRadii);
        }
        Ok(())
    }
}
