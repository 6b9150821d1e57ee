// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use souk_model::{CommissionRate, Money};

/// Two-way ledger split of one amount: the platform's cut and what the
/// vendor keeps. The two sides always re-add to the input amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommissionSplit {
    pub commission: Money,
    pub vendor_earning: Money,
}

/// Splits an amount at the given rate, commission rounded half-up to the
/// minor unit; the vendor keeps the exact remainder.
#[must_use]
pub fn commission_split(amount: Money, rate: CommissionRate) -> CommissionSplit {
    let commission = amount.rate_portion(rate);
    CommissionSplit {
        commission,
        vendor_earning: amount.saturating_sub(commission),
    }
}

/// Platform cut of a single line subtotal.
#[must_use]
pub fn product_commission(line_subtotal: Money, rate: CommissionRate) -> Money {
    line_subtotal.rate_portion(rate)
}

/// What the vendor keeps of one amount.
#[must_use]
pub fn vendor_earnings(amount: Money, rate: CommissionRate) -> Money {
    commission_split(amount, rate).vendor_earning
}

/// Sum of the platform's cut across already-split buckets.
#[must_use]
pub fn platform_commission<'a, I>(commissions: I) -> Money
where
    I: IntoIterator<Item = &'a Money>,
{
    commissions
        .into_iter()
        .fold(Money::ZERO, |acc, c| acc.saturating_add(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor).expect("money")
    }

    #[test]
    fn default_rate_takes_ten_percent() {
        let split = commission_split(money(75_000), CommissionRate::default());
        assert_eq!(split.commission.minor_units(), 7_500);
        assert_eq!(split.vendor_earning.minor_units(), 67_500);
    }

    #[test]
    fn split_sides_readd_to_the_amount() {
        let amount = money(9_999);
        let rate = CommissionRate::from_bps(1_234).expect("rate");
        let split = commission_split(amount, rate);
        assert_eq!(
            split.commission.saturating_add(split.vendor_earning),
            amount
        );
    }

    #[test]
    fn zero_rate_gives_everything_to_the_vendor() {
        let split = commission_split(money(5_000), CommissionRate::from_bps(0).expect("rate"));
        assert!(split.commission.is_zero());
        assert_eq!(split.vendor_earning.minor_units(), 5_000);
    }

    #[test]
    fn platform_commission_sums_bucket_cuts() {
        let cuts = [money(7_500), money(1_200), money(0)];
        assert_eq!(platform_commission(cuts.iter()).minor_units(), 8_700);
    }

    #[test]
    fn vendor_earnings_complement_product_commission() {
        let amount = money(31_415);
        let rate = CommissionRate::from_bps(2_718).expect("rate");
        let earned = vendor_earnings(amount, rate);
        let cut = product_commission(amount, rate);
        assert_eq!(earned.saturating_add(cut), amount);
    }
}
