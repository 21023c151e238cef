//! Turn avoidance requests into verified, priced candidates.
//!
//! Polygon avoidance is only a hint to the routing engine: a route may still
//! clip a small avoidance disk. Each station request therefore escalates
//! through the configured radii, re-locating and re-pricing the returned
//! route until none of the requested stations remain on it.
//!
//! A detour inserts its via toll as a waypoint before the destination and
//! escalates the same way around the stations it avoids.

use std::collections::BTreeSet;
use std::sync::Arc;

use geo::Coord;
use log::debug;
use thiserror::Error;
use tollway_core::{
    AvoidanceGeometryBuilder, Candidate, CandidateError, LocatedTolls, Route, RoutingError,
    RoutingProvider, TollCostModel, TollId, TollLocator, TollStation, VehicleClass,
};

use crate::{
    AvoidanceRequest, DEFAULT_AVOIDANCE_RADII_M, SearchState, StationAvoidance, StationDetour,
};

/// Why a request produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The routing provider failed; the request is dropped.
    #[error("routing provider failed: {0}")]
    Provider(#[from] RoutingError),
    /// Requested stations stayed on the route at every radius.
    #[error("avoided tolls still on route at every radius: {still_present:?}")]
    Verification {
        /// Requested stations found on the last route returned.
        still_present: Vec<TollId>,
    },
    /// The request's attempt budget was spent.
    #[error("attempt budget exhausted")]
    BudgetExhausted,
}

impl From<CandidateError> for EvaluationError {
    fn from(err: CandidateError) -> Self {
        match err {
            CandidateError::AvoidedTollPresent { ids } => Self::Verification { still_present: ids },
        }
    }
}

/// The unconstrained route of a journey.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRoute {
    /// Priced base candidate; avoids nothing.
    pub candidate: Arc<Candidate>,
    /// Priced stations near, but not on, the base route.
    pub nearby: Vec<TollStation>,
}

/// Evaluates avoidance requests for one journey.
///
/// Every provider call first reserves an attempt from the request's
/// [`SearchState`].
#[derive(Debug)]
pub struct CandidateEvaluator<'a, R: ?Sized, L: ?Sized, C: ?Sized, G: ?Sized> {
    provider: &'a R,
    locator: &'a L,
    cost_model: &'a C,
    geometry: &'a G,
    radii: &'a [f64],
    waypoints: &'a [Coord<f64>],
    vehicle: VehicleClass,
}

impl<'a, R, L, C, G> CandidateEvaluator<'a, R, L, C, G>
where
    R: RoutingProvider + ?Sized,
    L: TollLocator + ?Sized,
    C: TollCostModel + ?Sized,
    G: AvoidanceGeometryBuilder + ?Sized,
{
    /// Evaluator with the default radii and no journey.
    #[must_use]
    pub const fn new(provider: &'a R, locator: &'a L, cost_model: &'a C, geometry: &'a G) -> Self {
        Self {
            provider,
            locator,
            cost_model,
            geometry,
            radii: &DEFAULT_AVOIDANCE_RADII_M,
            waypoints: &[],
            vehicle: VehicleClass::C1,
        }
    }

    /// Use `radii` for escalation.
    #[must_use]
    pub const fn with_radii(mut self, radii: &'a [f64]) -> Self {
        self.radii = radii;
        self
    }

    /// Route between `waypoints` and price for `vehicle`.
    #[must_use]
    pub const fn with_journey(mut self, waypoints: &'a [Coord<f64>], vehicle: VehicleClass) -> Self {
        self.waypoints = waypoints;
        self.vehicle = vehicle;
        self
    }

    fn assess(
        &self,
        route: Route,
        avoided: BTreeSet<TollId>,
    ) -> Result<(Candidate, Vec<TollStation>), CandidateError> {
        let LocatedTolls { on_route, nearby } = self.locator.locate(&route);
        let priced = self.cost_model.assign_costs(on_route, self.vehicle);
        let candidate = Candidate::verified(route, priced, avoided)?;
        Ok((candidate, nearby))
    }

    /// Fetch and price the unconstrained route.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::BudgetExhausted`] if no attempt remains and
    /// [`EvaluationError::Provider`] if routing fails.
    pub fn evaluate_base(&self, state: &SearchState) -> Result<BaseRoute, EvaluationError> {
        if !state.try_acquire_attempt() {
            return Err(EvaluationError::BudgetExhausted);
        }
        let route = self.provider.base_route(self.waypoints)?;
        let (candidate, nearby) = self.assess(route, BTreeSet::new())?;
        Ok(BaseRoute {
            candidate: Arc::new(candidate),
            nearby: self.cost_model.assign_costs(nearby, self.vehicle),
        })
    }

    /// Evaluate one avoidance request.
    ///
    /// # Errors
    ///
    /// Station requests fail with [`EvaluationError::Verification`] once
    /// every radius left a requested station on the route. Provider errors
    /// abort immediately and budget exhaustion stops escalation.
    pub fn evaluate(
        &self,
        request: &AvoidanceRequest,
        state: &SearchState,
    ) -> Result<Candidate, EvaluationError> {
        match request {
            AvoidanceRequest::AllTollways => {
                if !state.try_acquire_attempt() {
                    return Err(EvaluationError::BudgetExhausted);
                }
                let route = self.provider.route_avoiding_tollways(self.waypoints)?;
                Ok(self.assess(route, BTreeSet::new())?.0)
            }
            AvoidanceRequest::Stations(avoidance) => self.evaluate_stations(avoidance, state),
            AvoidanceRequest::Detour(detour) => self.evaluate_detour(detour, state),
        }
    }

    fn evaluate_stations(
        &self,
        avoidance: &StationAvoidance,
        state: &SearchState,
    ) -> Result<Candidate, EvaluationError> {
        let avoided: BTreeSet<TollId> = avoidance.signature.ids().iter().cloned().collect();
        self.escalate(&avoidance.tolls, self.waypoints, &avoided, state)
    }

    fn evaluate_detour(
        &self,
        detour: &StationDetour,
        state: &SearchState,
    ) -> Result<Candidate, EvaluationError> {
        let mut waypoints = self.waypoints.to_vec();
        waypoints.insert(waypoints.len().saturating_sub(1), detour.via.location);
        let avoided: BTreeSet<TollId> = detour.avoid.iter().map(|toll| toll.id.clone()).collect();
        if avoided.is_empty() {
            if !state.try_acquire_attempt() {
                return Err(EvaluationError::BudgetExhausted);
            }
            let route = self.provider.base_route(&waypoints)?;
            return Ok(self.assess(route, avoided)?.0);
        }
        self.escalate(&detour.avoid, &waypoints, &avoided, state)
    }

    fn escalate(
        &self,
        tolls: &[TollStation],
        waypoints: &[Coord<f64>],
        avoided: &BTreeSet<TollId>,
        state: &SearchState,
    ) -> Result<Candidate, EvaluationError> {
        let mut still_present = Vec::new();
        for &radius_m in self.radii {
            if !state.try_acquire_attempt() {
                return Err(EvaluationError::BudgetExhausted);
            }
            let area = self.geometry.build(tolls, radius_m);
            let route = self.provider.route_avoiding_polygons(waypoints, &area)?;
            match self.assess(route, avoided.clone()) {
                Ok((candidate, _)) => return Ok(candidate),
                Err(CandidateError::AvoidedTollPresent { ids }) => {
                    debug!("Avoiding {avoided:?} at {radius_m} m still crossed {ids:?}");
                    still_present = ids;
                }
            }
        }
        Err(EvaluationError::Verification { still_present })
    }
}

#[cfg(test)]
mod tests;
