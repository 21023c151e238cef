//! Price an ordered toll sequence for a vehicle class.
//!
//! Open barriers charge a fixed price keyed as the pair `(id, id)`. Closed
//! systems charge at the exit, for the pair formed with the most recent
//! unpaired entry. [`TariffCostModel`] expresses this as a fold over the
//! sequence, so re-pricing after a route change is just another call.

use std::collections::HashMap;

use thiserror::Error;

use crate::{Cost, TollId, TollKind, TollStation, VehicleClass};

/// Assign costs to an ordered toll sequence.
///
/// The result must preserve the input order. Costs depend on that order, so
/// callers re-price whenever the sequence changes.
pub trait TollCostModel: Send + Sync {
    /// Return `ordered` with every station's `cost` filled in.
    fn assign_costs(&self, ordered: Vec<TollStation>, vehicle: VehicleClass) -> Vec<TollStation>;
}

impl<T: TollCostModel + ?Sized> TollCostModel for &T {
    fn assign_costs(&self, ordered: Vec<TollStation>, vehicle: VehicleClass) -> Vec<TollStation> {
        (**self).assign_costs(ordered, vehicle)
    }
}

/// Prices for each vehicle class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassPrices {
    /// Cars and light vans.
    #[cfg_attr(feature = "serde", serde(default))]
    pub c1: Cost,
    /// Intermediate vehicles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub c2: Cost,
    /// Two-axle heavy goods vehicles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub c3: Cost,
    /// Heavy goods vehicles with three or more axles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub c4: Cost,
    /// Motorcycles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub c5: Cost,
}

impl ClassPrices {
    /// The same price for every class.
    #[must_use]
    pub const fn uniform(cost: Cost) -> Self {
        Self {
            c1: cost,
            c2: cost,
            c3: cost,
            c4: cost,
            c5: cost,
        }
    }

    /// Price for `vehicle`.
    #[must_use]
    pub const fn for_class(&self, vehicle: VehicleClass) -> Cost {
        match vehicle {
            VehicleClass::C1 => self.c1,
            VehicleClass::C2 => self.c2,
            VehicleClass::C3 => self.c3,
            VehicleClass::C4 => self.c4,
            VehicleClass::C5 => self.c5,
        }
    }
}

/// One row of a tariff table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TariffEntry {
    /// Entry station; equal to `exit` for open barriers.
    pub entry: TollId,
    /// Exit station.
    pub exit: TollId,
    /// Prices per vehicle class.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub prices: ClassPrices,
}

/// Errors raised while loading a tariff table.
#[derive(Debug, Error)]
pub enum TariffError {
    /// The JSON document could not be decoded.
    #[cfg(feature = "serde")]
    #[error("failed to decode tariff table: {source}")]
    Decode {
        /// Decoder error returned by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The same pair appeared twice with different prices.
    #[error("conflicting tariffs for {entry} -> {exit}")]
    Conflict {
        /// Entry station of the duplicated pair.
        entry: TollId,
        /// Exit station of the duplicated pair.
        exit: TollId,
    },
}

/// In-memory lookup of prices by `(entry, exit)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TariffTable {
    prices: HashMap<(TollId, TollId), ClassPrices>,
}

impl TariffTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from rows, rejecting conflicting duplicates.
    pub fn from_entries<I>(entries: I) -> Result<Self, TariffError>
    where
        I: IntoIterator<Item = TariffEntry>,
    {
        let mut table = Self::new();
        for TariffEntry {
            entry,
            exit,
            prices,
        } in entries
        {
            match table.prices.get(&(entry.clone(), exit.clone())) {
                Some(existing) if *existing != prices => {
                    return Err(TariffError::Conflict { entry, exit });
                }
                _ => {
                    table.prices.insert((entry, exit), prices);
                }
            }
        }
        Ok(table)
    }

    /// Decode a JSON array of [`TariffEntry`] rows.
    ///
    /// ```
    /// use tollway_core::{Cost, TariffTable, TollId, VehicleClass};
    ///
    /// let table = TariffTable::from_json(r#"[
    ///     {"entry": "APRR_O1", "exit": "APRR_O1", "c1": 310, "c2": 470}
    /// ]"#)?;
    /// let open = TollId::new("APRR_O1");
    /// assert_eq!(table.price(&open, &open, VehicleClass::C2), Some(Cost::from_cents(470)));
    /// # Ok::<(), tollway_core::TariffError>(())
    /// ```
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, TariffError> {
        let entries: Vec<TariffEntry> =
            serde_json::from_str(json).map_err(|source| TariffError::Decode { source })?;
        Self::from_entries(entries)
    }

    /// Add or replace the fixed price of an open barrier.
    #[must_use]
    pub fn with_open(mut self, id: impl Into<TollId>, prices: ClassPrices) -> Self {
        let id = id.into();
        self.prices.insert((id.clone(), id), prices);
        self
    }

    /// Add or replace the price between two closed-system stations.
    #[must_use]
    pub fn with_pair(
        mut self,
        entry: impl Into<TollId>,
        exit: impl Into<TollId>,
        prices: ClassPrices,
    ) -> Self {
        self.prices.insert((entry.into(), exit.into()), prices);
        self
    }

    /// Price of the `(entry, exit)` pair, if known.
    #[must_use]
    pub fn price(&self, entry: &TollId, exit: &TollId, vehicle: VehicleClass) -> Option<Cost> {
        self.prices
            .get(&(entry.clone(), exit.clone()))
            .map(|prices| prices.for_class(vehicle))
    }

    /// Number of priced pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the table holds no prices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Sequential open/closed pricing over a [`TariffTable`].
///
/// Pairs missing from the table price at zero, mirroring operators that do
/// not publish every combination.
///
/// ```
/// use geo::Coord;
/// use tollway_core::{
///     ClassPrices, Cost, TariffCostModel, TariffTable, TollCostModel, TollKind, TollStation,
///     VehicleClass,
/// };
///
/// let table = TariffTable::new().with_pair("ASF_F1", "ASF_F2", ClassPrices::uniform(Cost::from_cents(870)));
/// let model = TariffCostModel::new(table);
/// let origin = Coord { x: 0.0, y: 0.0 };
/// let priced = model.assign_costs(
///     vec![
///         TollStation::new("ASF_F1", TollKind::Closed, origin),
///         TollStation::new("ASF_F2", TollKind::Closed, origin),
///     ],
///     VehicleClass::C1,
/// );
/// let costs: Vec<u64> = priced.iter().map(|t| t.cost.cents()).collect();
/// assert_eq!(costs, [0, 870]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TariffCostModel {
    table: TariffTable,
}

impl TariffCostModel {
    /// Price against `table`.
    #[must_use]
    pub const fn new(table: TariffTable) -> Self {
        Self { table }
    }

    /// The underlying table.
    #[must_use]
    pub const fn table(&self) -> &TariffTable {
        &self.table
    }

    fn lookup(&self, entry: &TollId, exit: &TollId, vehicle: VehicleClass) -> Cost {
        self.table.price(entry, exit, vehicle).unwrap_or_else(|| {
            log::debug!("no {vehicle} tariff for {entry} -> {exit}; pricing at zero");
            Cost::ZERO
        })
    }
}

impl TollCostModel for TariffCostModel {
    fn assign_costs(&self, ordered: Vec<TollStation>, vehicle: VehicleClass) -> Vec<TollStation> {
        ordered
            .into_iter()
            .scan(None::<TollId>, |pending_entry, station| {
                let cost = match station.kind {
                    TollKind::Open => {
                        *pending_entry = None;
                        self.lookup(&station.id, &station.id, vehicle)
                    }
                    TollKind::Closed => match pending_entry.take() {
                        Some(entry) => self.lookup(&entry, &station.id, vehicle),
                        None => {
                            *pending_entry = Some(station.id.clone());
                            Cost::ZERO
                        }
                    },
                };
                Some(station.with_cost(cost))
            })
            .collect()
    }
}
