//! Enumerate toll-avoidance sets in descending estimated saving.
//!
//! The pool is the priced on-route tolls of the base route, sorted by cost
//! descending then id. Each size class is walked best-first over index
//! tuples: the successors of a tuple bump one index by one, which never
//! increases the saving, so a max-heap pops tuples in exact saving order.
//! Ties fall back to the lexicographic order of the index tuples.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

use tollway_core::{Constraint, Cost, TollId, TollKind, TollStation};

/// Canonical identity of an avoidance set: its sorted, de-duplicated ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TollSignature(Vec<TollId>);

impl TollSignature {
    /// Canonicalise `ids`.
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = TollId>,
    {
        let mut sorted: Vec<TollId> = ids.into_iter().collect();
        sorted.sort();
        sorted.dedup();
        Self(sorted)
    }

    /// The ids in canonical order.
    #[must_use]
    pub fn ids(&self) -> &[TollId] {
        &self.0
    }

    /// Number of distinct ids.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature names no toll.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TollSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, id) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("}")
    }
}

/// A set of stations to steer around.
#[derive(Debug, Clone, PartialEq)]
pub struct StationAvoidance {
    /// Stations to avoid, in pool order.
    pub tolls: Vec<TollStation>,
    /// Canonical identity of `tolls`.
    pub signature: TollSignature,
    /// Sum of the stations' base-route prices.
    pub estimated_saving: Cost,
}

/// A route forced through one open toll while steering around the others.
#[derive(Debug, Clone, PartialEq)]
pub struct StationDetour {
    /// Open toll the route must pass.
    pub via: TollStation,
    /// Pooled stations to avoid; never contains `via`.
    pub avoid: Vec<TollStation>,
}

/// One alternative-route request produced by the generator.
#[derive(Debug, Clone, PartialEq)]
pub enum AvoidanceRequest {
    /// Avoid every tollway; issued for a target of zero tolls.
    AllTollways,
    /// Avoid a specific set of stations.
    Stations(StationAvoidance),
    /// Pass one open toll and avoid the rest; issued for a target of one.
    Detour(StationDetour),
}

impl AvoidanceRequest {
    /// Estimated saving, if the request names stations.
    #[must_use]
    pub const fn estimated_saving(&self) -> Option<Cost> {
        match self {
            Self::AllTollways | Self::Detour(_) => None,
            Self::Stations(avoidance) => Some(avoidance.estimated_saving),
        }
    }

    /// Canonical signature, if the request names stations.
    #[must_use]
    pub const fn signature(&self) -> Option<&TollSignature> {
        match self {
            Self::AllTollways | Self::Detour(_) => None,
            Self::Stations(avoidance) => Some(&avoidance.signature),
        }
    }
}

/// Builds avoidance requests from the base route's tolls.
///
/// # Examples
///
/// ```
/// use tollway_core::test_support::priced_toll;
/// use tollway_optimiser::{AvoidanceRequest, CombinationGenerator};
///
/// let generator = CombinationGenerator::new(&[
///     priced_toll("A", 500, 0.0),
///     priced_toll("B", 300, 1.0),
///     priced_toll("C", 200, 2.0),
/// ]);
/// let savings: Vec<u64> = generator
///     .generate(1..=2)
///     .filter_map(|request| request.estimated_saving())
///     .map(|saving| saving.cents())
///     .collect();
/// assert_eq!(savings, [500, 300, 200, 800, 700, 500]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombinationGenerator {
    pool: Vec<TollStation>,
}

impl CombinationGenerator {
    /// Pool the priced tolls of `base_tolls`.
    ///
    /// Unpriced tolls cannot yield a saving and are left out. Repeated ids
    /// keep their first occurrence.
    #[must_use]
    pub fn new(base_tolls: &[TollStation]) -> Self {
        let mut seen = HashSet::new();
        let mut pool: Vec<TollStation> = base_tolls
            .iter()
            .filter(|toll| !toll.cost.is_zero() && seen.insert(toll.id.clone()))
            .cloned()
            .collect();
        pool.sort_by(|a, b| b.cost.cmp(&a.cost).then_with(|| a.id.cmp(&b.id)));
        Self { pool }
    }

    /// Pooled tolls in enumeration order.
    #[must_use]
    pub fn pool(&self) -> &[TollStation] {
        &self.pool
    }

    /// Detours through each priced open toll, cheapest first.
    ///
    /// Vias come from the pool and from `nearby`; each detour avoids the
    /// rest of the pool.
    #[must_use]
    pub fn detours(&self, nearby: &[TollStation]) -> Vec<AvoidanceRequest> {
        let mut seen = HashSet::new();
        let mut vias: Vec<&TollStation> = self
            .pool
            .iter()
            .chain(nearby)
            .filter(|toll| {
                toll.kind == TollKind::Open && !toll.cost.is_zero() && seen.insert(&toll.id)
            })
            .collect();
        vias.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.id.cmp(&b.id)));
        vias.into_iter()
            .map(|via| {
                let avoid = self
                    .pool
                    .iter()
                    .filter(|toll| toll.id != via.id)
                    .cloned()
                    .collect();
                AvoidanceRequest::Detour(StationDetour {
                    via: via.clone(),
                    avoid,
                })
            })
            .collect()
    }

    /// Size classes worth enumerating for `target`.
    ///
    /// `base_count` is the toll count of the base route. Count targets below
    /// it need at least the difference removed; a target equal to it is
    /// already met by the base route. A target of zero is served by a single
    /// tollway-avoidance request. Budget targets try every size up to
    /// `max_combination_size`.
    #[must_use]
    pub fn sizes_for(
        &self,
        target: &Constraint,
        base_count: usize,
        max_combination_size: usize,
    ) -> RangeInclusive<usize> {
        let pool_size = self.pool.len();
        match target {
            Constraint::ExactTollCount(0) => 0..=0,
            Constraint::ExactTollCount(count) if *count < base_count => {
                let need = base_count - count;
                need..=pool_size.min(need.max(max_combination_size))
            }
            Constraint::MaxBudget(_) | Constraint::MaxBudgetPercent { .. } => {
                1..=pool_size.min(max_combination_size)
            }
            Constraint::ExactTollCount(_) | Constraint::None => empty_sizes(),
        }
    }

    /// Lazily enumerate requests for every size in `sizes`.
    ///
    /// Size classes are visited in ascending order and size zero yields
    /// [`AvoidanceRequest::AllTollways`]. The same inputs always produce the
    /// same sequence.
    #[must_use]
    pub fn generate(&self, sizes: RangeInclusive<usize>) -> Combinations<'_> {
        Combinations {
            pool: &self.pool,
            sizes,
            frontier: None,
        }
    }
}

const fn empty_sizes() -> RangeInclusive<usize> {
    RangeInclusive::new(1, 0)
}

/// Iterator returned by [`CombinationGenerator::generate`].
#[derive(Debug)]
pub struct Combinations<'a> {
    pool: &'a [TollStation],
    sizes: RangeInclusive<usize>,
    frontier: Option<Frontier>,
}

impl Iterator for Combinations<'_> {
    type Item = AvoidanceRequest;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(indices) = self
                .frontier
                .as_mut()
                .and_then(|frontier| frontier.pop(self.pool))
            {
                return Some(self.request(&indices));
            }
            let size = self.sizes.next()?;
            if size == 0 {
                self.frontier = None;
                return Some(AvoidanceRequest::AllTollways);
            }
            if size > self.pool.len() {
                self.frontier = None;
                self.sizes = empty_sizes();
                return None;
            }
            self.frontier = Some(Frontier::new(size, self.pool));
        }
    }
}

impl Combinations<'_> {
    fn request(&self, indices: &[usize]) -> AvoidanceRequest {
        let tolls: Vec<TollStation> = indices
            .iter()
            .filter_map(|index| self.pool.get(*index))
            .cloned()
            .collect();
        let signature = TollSignature::new(tolls.iter().map(|toll| toll.id.clone()));
        let estimated_saving = tolls.iter().map(|toll| toll.cost).sum();
        AvoidanceRequest::Stations(StationAvoidance {
            tolls,
            signature,
            estimated_saving,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    saving: Cost,
    indices: Vec<usize>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.saving
            .cmp(&other.saving)
            .then_with(|| other.indices.cmp(&self.indices))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first frontier over the index tuples of one size class.
#[derive(Debug)]
struct Frontier {
    heap: BinaryHeap<Entry>,
    seen: HashSet<Vec<usize>>,
}

impl Frontier {
    fn new(size: usize, pool: &[TollStation]) -> Self {
        let start: Vec<usize> = (0..size).collect();
        let mut frontier = Self {
            heap: BinaryHeap::new(),
            seen: HashSet::new(),
        };
        frontier.push(start, pool);
        frontier
    }

    fn push(&mut self, indices: Vec<usize>, pool: &[TollStation]) {
        if self.seen.insert(indices.clone()) {
            let saving = indices
                .iter()
                .filter_map(|index| pool.get(*index))
                .map(|toll| toll.cost)
                .sum();
            self.heap.push(Entry { saving, indices });
        }
    }

    fn pop(&mut self, pool: &[TollStation]) -> Option<Vec<usize>> {
        let Entry { indices, .. } = self.heap.pop()?;
        for position in 0..indices.len() {
            let limit = indices.get(position + 1).copied().unwrap_or(pool.len());
            let Some(bumped) = indices.get(position).map(|index| index + 1) else {
                continue;
            };
            if bumped < limit {
                let mut successor = indices.clone();
                if let Some(slot) = successor.get_mut(position) {
                    *slot = bumped;
                }
                self.push(successor, pool);
            }
        }
        Some(indices)
    }
}
