// SPDX-License-Identifier: Apache-2.0

use crate::fields::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Largest storable amount in minor units (10 billion in major units).
/// Keeps qty multiplication and order-wide sums far from i64 overflow.
pub const MONEY_MAX_MINOR_UNITS: i64 = 1_000_000_000_000;

pub const COMMISSION_RATE_MAX_BPS: u32 = 5_000;
pub const COMMISSION_RATE_DEFAULT_BPS: u32 = 1_000;

/// Non-negative amount in minor currency units (cents).
///
/// All financial arithmetic happens on integers; the two-decimal wire form
/// is a presentation concern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor_units(minor: i64) -> Result<Self, ParseError> {
        if minor < 0 {
            return Err(ParseError::InvalidFormat("amount must not be negative"));
        }
        if minor > MONEY_MAX_MINOR_UNITS {
            return Err(ParseError::InvalidFormat("amount exceeds supported range"));
        }
        Ok(Self(minor))
    }

    /// Parses a wire amount given in major units (e.g. `749.99`), rounding
    /// half-up to the nearest minor unit.
    pub fn from_major_units(major: f64) -> Result<Self, ParseError> {
        if !major.is_finite() {
            return Err(ParseError::InvalidFormat("amount must be a finite number"));
        }
        if major < 0.0 {
            return Err(ParseError::InvalidFormat("amount must not be negative"));
        }
        let scaled = (major * 100.0).round();
        if scaled > MONEY_MAX_MINOR_UNITS as f64 {
            return Err(ParseError::InvalidFormat("amount exceeds supported range"));
        }
        Ok(Self(scaled as i64))
    }

    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn to_major_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Result<Money, ParseError> {
        let sum = self
            .0
            .checked_add(other.0)
            .ok_or(ParseError::InvalidFormat("amount exceeds supported range"))?;
        Money::from_minor_units(sum)
    }

    /// Subtraction never goes below zero in this domain; an underflow is a
    /// caller bug surfaced as an error rather than a wrapped value.
    pub fn checked_sub(self, other: Money) -> Result<Money, ParseError> {
        if other.0 > self.0 {
            return Err(ParseError::InvalidFormat(
                "amount subtraction would be negative",
            ));
        }
        Ok(Money(self.0 - other.0))
    }

    pub fn mul_qty(self, qty: u32) -> Result<Money, ParseError> {
        let product = self
            .0
            .checked_mul(i64::from(qty))
            .ok_or(ParseError::InvalidFormat("amount exceeds supported range"))?;
        Money::from_minor_units(product)
    }

    /// Total counterparts of the checked ops, for arithmetic whose operands
    /// are already bounded (ledger sums inside one validated order).
    #[must_use]
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0).min(MONEY_MAX_MINOR_UNITS))
    }

    #[must_use]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Share of this amount at the given rate, rounded half-up to the minor
    /// unit. Always within `[0, self]` because rates cap at 50%.
    #[must_use]
    pub fn rate_portion(self, rate: CommissionRate) -> Money {
        let bps = i64::from(rate.as_bps());
        Money((self.0 * bps + 5_000) / 10_000)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Platform commission rate in basis points (1/100th of a percent).
///
/// 1000 bps = 10%, the platform default; rates above 50% are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct CommissionRate(u32);

impl CommissionRate {
    pub fn from_bps(bps: u32) -> Result<Self, ParseError> {
        if bps > COMMISSION_RATE_MAX_BPS {
            return Err(ParseError::InvalidFormat(
                "commission rate must not exceed 50%",
            ));
        }
        Ok(Self(bps))
    }

    /// Parses a wire rate given in percent (e.g. `12.5`), rounding half-up
    /// to the nearest basis point.
    pub fn from_percent(percent: f64) -> Result<Self, ParseError> {
        if !percent.is_finite() || percent < 0.0 {
            return Err(ParseError::InvalidFormat(
                "commission rate must be a non-negative number",
            ));
        }
        let bps = (percent * 100.0).round();
        if bps > COMMISSION_RATE_MAX_BPS as f64 {
            return Err(ParseError::InvalidFormat(
                "commission rate must not exceed 50%",
            ));
        }
        Self::from_bps(bps as u32)
    }

    #[must_use]
    pub const fn as_bps(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn to_percent(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self(COMMISSION_RATE_DEFAULT_BPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_reject_negative_and_oversized() {
        assert!(Money::from_minor_units(-1).is_err());
        assert!(Money::from_minor_units(MONEY_MAX_MINOR_UNITS + 1).is_err());
        assert_eq!(
            Money::from_minor_units(75_000).expect("money").minor_units(),
            75_000
        );
    }

    #[test]
    fn major_units_round_half_up_to_cents() {
        assert_eq!(
            Money::from_major_units(749.995).expect("money").minor_units(),
            75_000
        );
        assert_eq!(
            Money::from_major_units(0.004).expect("money").minor_units(),
            0
        );
        assert!(Money::from_major_units(f64::NAN).is_err());
        assert!(Money::from_major_units(-0.01).is_err());
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_minor_units(75_000).expect("money").to_string(), "750.00");
        assert_eq!(Money::from_minor_units(5).expect("money").to_string(), "0.05");
    }

    #[test]
    fn subtraction_refuses_underflow() {
        let a = Money::from_minor_units(100).expect("a");
        let b = Money::from_minor_units(250).expect("b");
        assert!(a.checked_sub(b).is_err());
        assert_eq!(b.checked_sub(a).expect("sub").minor_units(), 150);
    }

    #[test]
    fn rate_portion_rounds_half_up() {
        let amount = Money::from_minor_units(75_000).expect("amount");
        // 10% of 750.00 is exactly 75.00
        assert_eq!(
            amount.rate_portion(CommissionRate::default()).minor_units(),
            7_500
        );
        // 3.33% of 0.50 is 0.01665, rounds to 0.02
        let fifty = Money::from_minor_units(50).expect("amount");
        let rate = CommissionRate::from_bps(333).expect("rate");
        assert_eq!(fifty.rate_portion(rate).minor_units(), 2);
        // below half a cent the portion rounds to zero
        let cent = Money::from_minor_units(1).expect("amount");
        let tiny = CommissionRate::from_bps(1).expect("rate");
        assert_eq!(cent.rate_portion(tiny).minor_units(), 0);
    }

    #[test]
    fn commission_rate_bounds() {
        assert!(CommissionRate::from_bps(5_001).is_err());
        assert_eq!(CommissionRate::default().as_bps(), 1_000);
        assert_eq!(
            CommissionRate::from_percent(12.5).expect("rate").as_bps(),
            1_250
        );
        assert!(CommissionRate::from_percent(50.01).is_err());
    }
}
