//! `TollOptimiser`: the [`Optimiser`] implementation.

use std::fmt;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tollway_core::{
    AvoidanceGeometryBuilder, OptimisationOutcome, OptimiseError, OptimiseRequest, Optimiser,
    RoutingProvider, TollCostModel, TollLocator,
};

use crate::{CandidateEvaluator, OptimiserBuildError, OptimiserConfig, PriorityResolver};

/// Toll-constrained route search over injected collaborators.
///
/// The optimiser is generic over the engine boundaries: a routing provider,
/// a toll locator, a cost model and an avoidance-geometry builder. Each
/// request gets its own search state; the worker pool is shared.
pub struct TollOptimiser<R, L, C, G>
where
    R: RoutingProvider,
    L: TollLocator,
    C: TollCostModel,
    G: AvoidanceGeometryBuilder,
{
    provider: R,
    locator: L,
    cost_model: C,
    geometry: G,
    config: OptimiserConfig,
    pool: ThreadPool,
}

impl<R, L, C, G> TollOptimiser<R, L, C, G>
where
    R: RoutingProvider,
    L: TollLocator,
    C: TollCostModel,
    G: AvoidanceGeometryBuilder,
{
    /// Construct an optimiser using default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserBuildError::ThreadPool`] if the workers cannot be
    /// started.
    pub fn new(
        provider: R,
        locator: L,
        cost_model: C,
        geometry: G,
    ) -> Result<Self, OptimiserBuildError> {
        Self::with_config(
            provider,
            locator,
            cost_model,
            geometry,
            OptimiserConfig::default(),
        )
    }

    /// Construct an optimiser with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid limit in `config`, or
    /// [`OptimiserBuildError::ThreadPool`] if the workers cannot be started.
    pub fn with_config(
        provider: R,
        locator: L,
        cost_model: C,
        geometry: G,
        config: OptimiserConfig,
    ) -> Result<Self, OptimiserBuildError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|index| format!("tollway-worker-{index}"))
            .build()?;
        Ok(Self {
            provider,
            locator,
            cost_model,
            geometry,
            config,
            pool,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OptimiserConfig {
        &self.config
    }
}

impl<R, L, C, G> fmt::Debug for TollOptimiser<R, L, C, G>
where
    R: RoutingProvider,
    L: TollLocator,
    C: TollCostModel,
    G: AvoidanceGeometryBuilder,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TollOptimiser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R, L, C, G> Optimiser for TollOptimiser<R, L, C, G>
where
    R: RoutingProvider,
    L: TollLocator,
    C: TollCostModel,
    G: AvoidanceGeometryBuilder,
{
    fn optimise(&self, request: &OptimiseRequest) -> Result<OptimisationOutcome, OptimiseError> {
        request.validate()?;
        let evaluator = CandidateEvaluator::new(
            &self.provider,
            &self.locator,
            &self.cost_model,
            &self.geometry,
        )
        .with_radii(&self.config.avoidance_radii_m)
        .with_journey(&request.waypoints, request.vehicle_class);
        PriorityResolver::new(evaluator, &self.config, &self.pool).resolve(&request.constraint)
    }
}
