//! Toll station identity and classification.

use std::fmt;

use geo::Coord;

use crate::Cost;

/// Canonical identifier of a toll station.
///
/// Raw identifiers from routing data and tariff tables are trimmed and
/// upper-cased on construction so that every comparison uses one form.
///
/// # Examples
///
/// ```
/// use tollway_core::TollId;
///
/// assert_eq!(TollId::new(" aprr_o012 "), TollId::new("APRR_O012"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub struct TollId(String);

impl TollId {
    /// Canonicalise a raw identifier.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// Borrow the canonical form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TollId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TollId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<TollId> for String {
    fn from(id: TollId) -> Self {
        id.0
    }
}

/// Pricing system a toll station belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum TollKind {
    /// Fixed, stand-alone price charged at the barrier.
    Open,
    /// Priced as an entry/exit pair within a closed motorway system.
    Closed,
}

impl TollKind {
    /// Classify an operator identifier such as `APRR_O012` or `APRR_F104`.
    ///
    /// The segment following the operator prefix starts with `O` for open
    /// barriers and `F` for closed-system gates. Anything else is unknown.
    ///
    /// ```
    /// use tollway_core::{TollId, TollKind};
    ///
    /// assert_eq!(TollKind::infer_from_id(&TollId::new("APRR_O012")), Some(TollKind::Open));
    /// assert_eq!(TollKind::infer_from_id(&TollId::new("aprr_f104")), Some(TollKind::Closed));
    /// assert_eq!(TollKind::infer_from_id(&TollId::new("BARRIER")), None);
    /// ```
    #[must_use]
    pub fn infer_from_id(id: &TollId) -> Option<Self> {
        let marker = id.as_str().split('_').nth(1)?.chars().next()?;
        match marker {
            'O' => Some(Self::Open),
            'F' => Some(Self::Closed),
            _ => None,
        }
    }
}

/// A toll station as it appears on a particular route.
///
/// `position_on_route` and `cost` are route-specific: the locator fills in
/// the position and the cost model the price. Costs depend on the order of
/// the sequence, so they must be recomputed whenever that order changes.
#[derive(Debug, Clone, PartialEq)]
pub struct TollStation {
    /// Canonical identifier.
    pub id: TollId,
    /// Open or closed pricing.
    pub kind: TollKind,
    /// Longitude/latitude of the barrier.
    pub location: Coord<f64>,
    /// Distance along the route in metres.
    pub position_on_route: f64,
    /// Price assigned for the current sequence.
    pub cost: Cost,
}

impl TollStation {
    /// Create an unpriced station at the start of the route.
    pub fn new(id: impl Into<TollId>, kind: TollKind, location: Coord<f64>) -> Self {
        Self {
            id: id.into(),
            kind,
            location,
            position_on_route: 0.0,
            cost: Cost::ZERO,
        }
    }

    /// Set the distance along the route.
    #[must_use]
    pub fn with_position(mut self, position_on_route: f64) -> Self {
        self.position_on_route = position_on_route;
        self
    }

    /// Set the assigned price.
    #[must_use]
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }
}
