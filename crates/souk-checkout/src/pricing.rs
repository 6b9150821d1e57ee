// SPDX-License-Identifier: Apache-2.0

use souk_model::Money;

/// Integer percent off the printed price, rounded half-up.
///
/// `mrp=1000.00, selling=750.00` is 25. Degenerate inputs (zero mrp, or a
/// selling price at/above mrp) read as no discount.
#[must_use]
pub fn discount_percentage(mrp: Money, selling_price: Money) -> u32 {
    let mrp_minor = mrp.minor_units();
    let selling_minor = selling_price.minor_units();
    if mrp_minor <= 0 || selling_minor >= mrp_minor {
        return 0;
    }
    let off = mrp_minor - selling_minor;
    // round-half-up of (off * 100 / mrp) without leaving integers
    ((off * 200 + mrp_minor) / (2 * mrp_minor)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor).expect("money")
    }

    #[test]
    fn quarter_off_reads_twenty_five() {
        assert_eq!(discount_percentage(money(100_000), money(75_000)), 25);
    }

    #[test]
    fn rounds_half_up() {
        // 1/3 off = 33.33..% -> 33
        assert_eq!(discount_percentage(money(30_000), money(20_000)), 33);
        // 12.5% -> 13
        assert_eq!(discount_percentage(money(80_000), money(70_000)), 13);
        // exactly half a percent boundary: 0.5% -> 1
        assert_eq!(discount_percentage(money(100_000), money(99_500)), 1);
    }

    #[test]
    fn degenerate_inputs_read_zero() {
        assert_eq!(discount_percentage(Money::ZERO, money(100)), 0);
        assert_eq!(discount_percentage(money(100), money(100)), 0);
        assert_eq!(discount_percentage(money(100), money(150)), 0);
    }

    #[test]
    fn full_discount_reads_one_hundred() {
        assert_eq!(discount_percentage(money(100_000), Money::ZERO), 100);
    }
}
