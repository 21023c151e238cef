//! Monetary amounts and budget percentages.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use thiserror::Error;

/// A monetary amount in minor currency units (cents).
///
/// Integer cents keep comparisons exact, which the result tracker relies on
/// for deterministic tie-breaking.
///
/// ```
/// use tollway_core::Cost;
///
/// let total: Cost = [Cost::from_cents(250), Cost::from_cents(130)].into_iter().sum();
/// assert_eq!(total.to_string(), "3.80");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Cost(u64);

impl Cost {
    /// No charge.
    pub const ZERO: Self = Self(0);

    /// Construct from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Add, clamping at the maximum representable amount.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Scale by `basis_points` (10 000 is unchanged), rounding down.
    ///
    /// ```
    /// use tollway_core::Cost;
    ///
    /// assert_eq!(Cost::from_cents(999).scaled(12_000), Cost::from_cents(1_198));
    /// ```
    #[must_use]
    pub fn scaled(self, basis_points: u32) -> Self {
        let scaled = u128::from(self.0) * u128::from(basis_points) / u128::from(BudgetPercent::FULL);
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Cost {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Errors returned when constructing a [`BudgetPercent`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BudgetPercentError {
    /// The fraction was NaN or infinite.
    #[error("budget percentage must be a finite number")]
    NotFinite,
    /// The fraction was outside `0.0..=1.0`.
    #[error("budget percentage {0} must lie between 0 and 1")]
    OutOfRange(f64),
}

/// A share of the unconstrained route's cost, stored in basis points.
///
/// ```
/// use tollway_core::{BudgetPercent, Cost};
///
/// # fn main() -> Result<(), tollway_core::BudgetPercentError> {
/// let percent = BudgetPercent::from_fraction(0.8)?;
/// assert_eq!(percent.apply(Cost::from_cents(1_000)), Cost::from_cents(800));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct BudgetPercent {
    basis_points: u16,
}

impl BudgetPercent {
    /// Basis points representing 100%.
    pub const FULL: u16 = 10_000;

    /// Validate a fraction in `0.0..=1.0`.
    pub fn from_fraction(fraction: f64) -> Result<Self, BudgetPercentError> {
        if !fraction.is_finite() {
            return Err(BudgetPercentError::NotFinite);
        }
        if !(0.0..=1.0).contains(&fraction) {
            return Err(BudgetPercentError::OutOfRange(fraction));
        }
        let scaled = (fraction * f64::from(Self::FULL)).round();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "scaled is range-checked to 0..=10_000"
        )]
        let basis_points = scaled as u16;
        Ok(Self { basis_points })
    }

    /// Basis points, where 10 000 is 100%.
    #[must_use]
    pub const fn basis_points(self) -> u16 {
        self.basis_points
    }

    /// The share as a fraction.
    #[must_use]
    pub fn fraction(self) -> f64 {
        f64::from(self.basis_points) / f64::from(Self::FULL)
    }

    /// Apply the share to a base cost, rounding down to whole cents.
    #[must_use]
    pub fn apply(self, base: Cost) -> Cost {
        base.scaled(u32::from(self.basis_points))
    }
}

impl TryFrom<f64> for BudgetPercent {
    type Error = BudgetPercentError;

    fn try_from(fraction: f64) -> Result<Self, Self::Error> {
        Self::from_fraction(fraction)
    }
}

impl From<BudgetPercent> for f64 {
    fn from(percent: BudgetPercent) -> Self {
        percent.fraction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00")]
    #[case(5, "0.05")]
    #[case(1_234, "12.34")]
    fn displays_major_and_minor_units(#[case] cents: u64, #[case] expected: &str) {
        assert_eq!(Cost::from_cents(cents).to_string(), expected);
    }

    #[rstest]
    fn arithmetic_saturates() {
        assert_eq!(Cost::from_cents(3).saturating_sub(Cost::from_cents(5)), Cost::ZERO);
        assert_eq!(Cost::from_cents(u64::MAX) + Cost::from_cents(1), Cost::from_cents(u64::MAX));
    }

    #[rstest]
    #[case(500, 11_000, 550)]
    #[case(333, 12_500, 416)]
    #[case(u64::MAX, 15_000, u64::MAX)]
    fn scaling_rounds_down_and_saturates(
        #[case] cents: u64,
        #[case] basis_points: u32,
        #[case] expected: u64,
    ) {
        assert_eq!(
            Cost::from_cents(cents).scaled(basis_points),
            Cost::from_cents(expected)
        );
    }

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.825, 8_250)]
    #[case(1.0, 10_000)]
    fn accepts_fractions_in_range(#[case] fraction: f64, #[case] basis_points: u16) {
        let percent = BudgetPercent::from_fraction(fraction).expect("fraction in range");
        assert_eq!(percent.basis_points(), basis_points);
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.01)]
    fn rejects_fractions_out_of_range(#[case] fraction: f64) {
        assert!(matches!(
            BudgetPercent::from_fraction(fraction),
            Err(BudgetPercentError::OutOfRange(_))
        ));
    }

    #[rstest]
    fn rejects_nan() {
        assert_eq!(
            BudgetPercent::from_fraction(f64::NAN),
            Err(BudgetPercentError::NotFinite)
        );
    }

    #[rstest]
    fn apply_rounds_down() {
        let percent = BudgetPercent::from_fraction(0.333).expect("fraction in range");
        assert_eq!(percent.apply(Cost::from_cents(1_000)), Cost::from_cents(333));
        assert_eq!(percent.apply(Cost::from_cents(1)), Cost::ZERO);
    }
}
