use souk_api::{
    parse_admin_order_params, parse_admin_vendor_params, parse_page_params,
    parse_storefront_params, ApiErrorCode, MAX_CURSOR_BYTES,
};
use souk_model::{PaymentStatus, VendorStatus};
use std::collections::BTreeMap;

fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn storefront_defaults_apply_on_an_empty_query() {
    let req = parse_storefront_params(&query(&[])).expect("empty query");
    assert_eq!(req.limit, 24);
    assert!(req.cursor.is_none());
    assert!(req.filter.q.is_none());
    assert!(!req.filter.featured_only);
}

#[test]
fn storefront_limit_bounds_are_enforced() {
    let zero = query(&[("limit", "0")]);
    assert_eq!(
        parse_storefront_params(&zero).expect_err("limit=0").code,
        ApiErrorCode::BadRequest
    );

    let over = query(&[("limit", "101")]);
    assert_eq!(
        parse_storefront_params(&over).expect_err("limit>max").code,
        ApiErrorCode::BadRequest
    );

    let max = query(&[("limit", "100")]);
    assert_eq!(parse_storefront_params(&max).expect("limit=max").limit, 100);
}

#[test]
fn storefront_price_band_is_parsed_and_ordered() {
    let ok = query(&[("min_price", "99.50"), ("max_price", "500")]);
    let req = parse_storefront_params(&ok).expect("price band");
    assert_eq!(req.filter.min_price.map(|m| m.minor_units()), Some(9_950));
    assert_eq!(req.filter.max_price.map(|m| m.minor_units()), Some(50_000));

    let inverted = query(&[("min_price", "500"), ("max_price", "99.50")]);
    assert_eq!(
        parse_storefront_params(&inverted)
            .expect_err("min > max")
            .code,
        ApiErrorCode::BadRequest
    );

    let garbage = query(&[("min_price", "cheap")]);
    assert_eq!(
        parse_storefront_params(&garbage)
            .expect_err("non-numeric")
            .code,
        ApiErrorCode::BadRequest
    );
}

#[test]
fn storefront_rejects_malformed_ids_and_flags() {
    let bad_category = query(&[("category", "not-a-uuid")]);
    assert_eq!(
        parse_storefront_params(&bad_category)
            .expect_err("category")
            .code,
        ApiErrorCode::BadRequest
    );

    let bad_flag = query(&[("featured", "yes")]);
    assert_eq!(
        parse_storefront_params(&bad_flag)
            .expect_err("featured")
            .code,
        ApiErrorCode::BadRequest
    );

    let ok = query(&[("featured", "1")]);
    assert!(
        parse_storefront_params(&ok)
            .expect("featured=1")
            .filter
            .featured_only
    );
}

#[test]
fn oversized_cursors_are_rejected_before_any_decode() {
    let huge = "A".repeat(MAX_CURSOR_BYTES + 1);
    let q = query(&[("cursor", huge.as_str())]);
    let err = parse_storefront_params(&q).expect_err("cursor too long");
    assert_eq!(err.code, ApiErrorCode::BadRequest);
    assert_eq!(err.message, "invalid cursor");
}

#[test]
fn blank_search_text_is_treated_as_absent() {
    let q = query(&[("q", "   ")]);
    assert!(parse_storefront_params(&q).expect("blank q").filter.q.is_none());

    let q = query(&[("q", "  rug ")]);
    assert_eq!(
        parse_storefront_params(&q).expect("trimmed q").filter.q.as_deref(),
        Some("rug")
    );
}

#[test]
fn page_params_default_and_clamp() {
    let defaults = parse_page_params(&query(&[])).expect("defaults");
    assert_eq!((defaults.page, defaults.per_page), (1, 20));

    let explicit = parse_page_params(&query(&[("page", "3"), ("per_page", "50")])).expect("set");
    assert_eq!((explicit.page, explicit.per_page), (3, 50));

    assert_eq!(
        parse_page_params(&query(&[("page", "0")]))
            .expect_err("page=0")
            .code,
        ApiErrorCode::BadRequest
    );
    assert_eq!(
        parse_page_params(&query(&[("per_page", "101")]))
            .expect_err("per_page>max")
            .code,
        ApiErrorCode::BadRequest
    );
}

#[test]
fn admin_order_filters_parse_typed_statuses() {
    let q = query(&[
        ("q", "asha@example.com"),
        ("payment_status", "paid"),
        ("status", "shipped"),
    ]);
    let (filter, page) = parse_admin_order_params(&q).expect("filters");
    assert_eq!(filter.q.as_deref(), Some("asha@example.com"));
    assert_eq!(filter.payment_status, Some(PaymentStatus::Paid));
    assert_eq!(page.page, 1);

    let bad = query(&[("payment_status", "refunded")]);
    assert_eq!(
        parse_admin_order_params(&bad)
            .expect_err("unknown payment status")
            .code,
        ApiErrorCode::BadRequest
    );
}

#[test]
fn admin_vendor_filter_accepts_the_status_vocabulary() {
    for raw in ["pending", "approved", "suspended", "rejected"] {
        let (status, _) =
            parse_admin_vendor_params(&query(&[("status", raw)])).expect("vendor status");
        assert_eq!(status.map(|s| s.as_str()), Some(raw));
    }

    assert_eq!(
        parse_admin_vendor_params(&query(&[("status", "banned")]))
            .expect_err("unknown vendor status")
            .code,
        ApiErrorCode::BadRequest
    );
}

#[test]
fn field_errors_name_the_offending_parameter() {
    let err = parse_storefront_params(&query(&[("vendor", "***")])).expect_err("vendor id");
    let entry = &err.details["fieldErrors"][0];
    assert_eq!(entry["parameter"], "vendor");
    assert_eq!(entry["value"], "***");
}

#[test]
fn vendor_status_filter_round_trips_the_enum() {
    let (status, _) = parse_admin_vendor_params(&query(&[("status", "approved")])).expect("parse");
    assert_eq!(status, Some(VendorStatus::Approved));
}
