//! Vehicle tariff classes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Tariff class of the vehicle, as used by French motorway operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum VehicleClass {
    /// Cars and light vans.
    #[default]
    C1,
    /// Intermediate vehicles, such as vans over two metres.
    C2,
    /// Two-axle heavy goods vehicles and coaches.
    C3,
    /// Heavy goods vehicles with three or more axles.
    C4,
    /// Motorcycles.
    C5,
}

impl VehicleClass {
    /// All classes in tariff-table order.
    pub const ALL: [Self; 5] = [Self::C1, Self::C2, Self::C3, Self::C4, Self::C5];

    /// Lowercase label used by tariff tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::C1 => "c1",
            Self::C2 => "c2",
            Self::C3 => "c3",
            Self::C4 => "c4",
            Self::C5 => "c5",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown vehicle class label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vehicle class: {0}")]
pub struct ParseVehicleClassError(pub String);

impl FromStr for VehicleClass {
    type Err = ParseVehicleClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.label() == label)
            .ok_or_else(|| ParseVehicleClassError(s.to_owned()))
    }
}
