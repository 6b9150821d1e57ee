// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use proptest::test_runner::Config;
use souk_checkout::{commission_split, discount_percentage, split_cart, ResolvedLine};
use souk_model::{CommissionRate, Money, ProductId, VendorId};

fn money(minor: i64) -> Money {
    Money::from_minor_units(minor).expect("money")
}

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn split_sides_always_readd_to_the_amount(
        amount_minor in 0_i64..=1_000_000_000_i64,
        rate_bps in 0_u32..=5_000_u32
    ) {
        let amount = money(amount_minor);
        let rate = CommissionRate::from_bps(rate_bps).expect("rate");
        let split = commission_split(amount, rate);
        prop_assert_eq!(
            split.commission.minor_units() + split.vendor_earning.minor_units(),
            amount_minor
        );
        prop_assert!(split.commission.minor_units() >= 0);
        prop_assert!(split.vendor_earning.minor_units() >= 0);
    }

    #[test]
    fn commission_never_exceeds_the_amount(
        amount_minor in 0_i64..=1_000_000_000_i64,
        rate_bps in 0_u32..=5_000_u32
    ) {
        let amount = money(amount_minor);
        let rate = CommissionRate::from_bps(rate_bps).expect("rate");
        let split = commission_split(amount, rate);
        prop_assert!(split.commission <= amount);
    }

    #[test]
    fn bucket_subtotals_cover_every_line(
        units in proptest::collection::vec((1_i64..=100_000_i64, 1_u32..=9_u32, 0_u8..=2_u8), 1..12)
    ) {
        let vendors = [None, Some(VendorId::generate()), Some(VendorId::generate())];
        let lines: Vec<ResolvedLine> = units
            .iter()
            .map(|(unit, qty, which)| ResolvedLine {
                product_id: ProductId::generate(),
                variant_id: None,
                name: "item".to_string(),
                sku: None,
                vendor_id: vendors[usize::from(*which)],
                vendor_rate: None,
                unit_price: money(*unit),
                qty: *qty,
            })
            .collect();
        let expected: i64 = units
            .iter()
            .map(|(unit, qty, _)| unit * i64::from(*qty))
            .sum();
        let split = split_cart(&lines, CommissionRate::default()).expect("split");
        let bucket_sum: i64 = split
            .buckets
            .iter()
            .map(|b| b.subtotal.minor_units())
            .sum();
        let line_sum: i64 = split
            .buckets
            .iter()
            .flat_map(|b| b.lines.iter())
            .map(|l| l.subtotal.minor_units())
            .sum();
        prop_assert_eq!(bucket_sum, expected);
        prop_assert_eq!(line_sum, expected);
        prop_assert_eq!(split.subtotal.minor_units(), expected);
    }

    #[test]
    fn every_bucket_ledger_balances(
        units in proptest::collection::vec((1_i64..=100_000_i64, 1_u32..=9_u32, 0_u8..=2_u8), 1..12),
        rate_bps in 0_u32..=5_000_u32
    ) {
        let vendors = [None, Some(VendorId::generate()), Some(VendorId::generate())];
        let lines: Vec<ResolvedLine> = units
            .iter()
            .map(|(unit, qty, which)| ResolvedLine {
                product_id: ProductId::generate(),
                variant_id: None,
                name: "item".to_string(),
                sku: None,
                vendor_id: vendors[usize::from(*which)],
                vendor_rate: None,
                unit_price: money(*unit),
                qty: *qty,
            })
            .collect();
        let rate = CommissionRate::from_bps(rate_bps).expect("rate");
        let split = split_cart(&lines, rate).expect("split");
        for bucket in &split.buckets {
            prop_assert_eq!(
                bucket.commission.minor_units() + bucket.vendor_earning.minor_units(),
                bucket.subtotal.minor_units()
            );
        }
    }

    #[test]
    fn discount_percentage_stays_within_percent_bounds(
        mrp_minor in 1_i64..=1_000_000_i64,
        selling_minor in 0_i64..=1_000_000_i64
    ) {
        let pct = discount_percentage(money(mrp_minor), money(selling_minor));
        prop_assert!(pct <= 100);
        if selling_minor >= mrp_minor {
            prop_assert_eq!(pct, 0);
        }
    }
}

#[test]
fn distinct_vendor_count_matches_bucket_count() {
    let v1 = VendorId::generate();
    let v2 = VendorId::generate();
    let make = |vendor| ResolvedLine {
        product_id: ProductId::generate(),
        variant_id: None,
        name: "item".to_string(),
        sku: None,
        vendor_id: vendor,
        vendor_rate: None,
        unit_price: money(10_000),
        qty: 1,
    };
    let two_vendors = vec![make(Some(v1)), make(Some(v2))];
    let split = split_cart(&two_vendors, CommissionRate::default()).expect("split");
    assert_eq!(split.buckets.len(), 2);

    let no_vendor = vec![make(None), make(None), make(None)];
    let split = split_cart(&no_vendor, CommissionRate::default()).expect("split");
    assert_eq!(split.buckets.len(), 1);
    assert_eq!(split.buckets[0].vendor_id, None);
    assert_eq!(split.buckets[0].lines.len(), 3);
}
