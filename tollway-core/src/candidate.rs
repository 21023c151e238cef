//! Evaluated routes and the three best-so-far result slots.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::{Cost, Route, TollId, TollStation};

/// Errors returned by [`Candidate::verified`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    /// The route still crosses tolls it was asked to avoid.
    #[error("route still crosses avoided tolls: {ids:?}")]
    AvoidedTollPresent {
        /// Avoided identifiers found on the route, in route order.
        ids: Vec<TollId>,
    },
}

/// A route whose tolls have been located, priced and checked against the
/// avoidance request that produced it.
///
/// The only constructor rejects routes that still cross an avoided toll, so
/// every `Candidate` satisfies `avoided ∩ on-route = ∅`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    route: Route,
    cost: Cost,
    toll_count: usize,
    tolls_on_route: Vec<TollStation>,
    avoided_toll_ids: BTreeSet<TollId>,
}

impl Candidate {
    /// Verify and construct a candidate from a priced, ordered toll sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use std::time::Duration;
    /// use geo::{Coord, line_string};
    /// use tollway_core::{Candidate, Cost, Route, TollId, TollKind, TollStation};
    ///
    /// let route = Route::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)], 111_000.0, Duration::from_secs(3_600))
    ///     .expect("valid route");
    /// let toll = TollStation::new("APRR_O1", TollKind::Open, Coord { x: 0.5, y: 0.0 })
    ///     .with_cost(Cost::from_cents(300));
    ///
    /// let avoided = BTreeSet::from([TollId::new("APRR_O1")]);
    /// assert!(Candidate::verified(route.clone(), vec![toll.clone()], avoided).is_err());
    ///
    /// let candidate = Candidate::verified(route, vec![toll], BTreeSet::new()).expect("nothing avoided");
    /// assert_eq!(candidate.cost(), Cost::from_cents(300));
    /// assert_eq!(candidate.toll_count(), 1);
    /// ```
    pub fn verified(
        route: Route,
        tolls_on_route: Vec<TollStation>,
        avoided_toll_ids: BTreeSet<TollId>,
    ) -> Result<Self, CandidateError> {
        let still_present: Vec<TollId> = tolls_on_route
            .iter()
            .filter(|toll| avoided_toll_ids.contains(&toll.id))
            .map(|toll| toll.id.clone())
            .collect();
        if !still_present.is_empty() {
            return Err(CandidateError::AvoidedTollPresent { ids: still_present });
        }
        let cost = tolls_on_route.iter().map(|toll| toll.cost).sum();
        Ok(Self {
            route,
            cost,
            toll_count: tolls_on_route.len(),
            tolls_on_route,
            avoided_toll_ids,
        })
    }

    /// The underlying route.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Total toll cost.
    #[must_use]
    pub const fn cost(&self) -> Cost {
        self.cost
    }

    /// Expected travel time.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.route.duration()
    }

    /// Number of toll stations crossed.
    #[must_use]
    pub const fn toll_count(&self) -> usize {
        self.toll_count
    }

    /// Priced tolls in route order.
    #[must_use]
    pub fn tolls_on_route(&self) -> &[TollStation] {
        &self.tolls_on_route
    }

    /// Identifiers the route was asked to avoid.
    #[must_use]
    pub const fn avoided_toll_ids(&self) -> &BTreeSet<TollId> {
        &self.avoided_toll_ids
    }

    /// Identifiers of the crossed tolls, in route order.
    pub fn on_route_ids(&self) -> impl Iterator<Item = &TollId> {
        self.tolls_on_route.iter().map(|toll| &toll.id)
    }
}

/// Best-known candidates along three independent objectives.
///
/// Slots share candidates through [`Arc`], so one route may fill several.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSlots {
    /// Shortest travel time.
    pub fastest: Option<Arc<Candidate>>,
    /// Lowest toll cost.
    pub cheapest: Option<Arc<Candidate>>,
    /// Fewest toll crossings.
    pub min_tolls: Option<Arc<Candidate>>,
}

impl ResultSlots {
    /// Whether every slot is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fastest.is_none() && self.cheapest.is_none() && self.min_tolls.is_none()
    }

    /// Iterate over the filled slots.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Candidate>> {
        [&self.fastest, &self.cheapest, &self.min_tolls]
            .into_iter()
            .flatten()
    }
}
