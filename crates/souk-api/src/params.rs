// SPDX-License-Identifier: Apache-2.0

//! Query-string parsing. Handlers collect the query into a
//! `BTreeMap<String, String>` and hand it here; everything returns a typed
//! filter or a 400-shaped [`ApiError`] naming the offending parameter.

use crate::errors::ApiError;
use souk_model::{CategoryId, FulfillmentStatus, Money, PaymentStatus, VendorId, VendorStatus};
use souk_store::products::{STOREFRONT_DEFAULT_LIMIT, STOREFRONT_MAX_LIMIT};
use souk_store::{CatalogPageRequest, OrderAdminFilter, ProductAdminFilter, StorefrontFilter};
use std::collections::BTreeMap;

/// Signed cursors are short; anything past this is garbage or an attack.
pub const MAX_CURSOR_BYTES: usize = 4096;
pub const PAGE_DEFAULT_PER_PAGE: u32 = 20;
pub const PAGE_MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

/// `?q=&category=&vendor=&min_price=&max_price=&featured=&limit=&cursor=`
/// for the public storefront listing.
pub fn parse_storefront_params(
    query: &BTreeMap<String, String>,
) -> Result<CatalogPageRequest, ApiError> {
    parse_storefront_params_with_limit(query, STOREFRONT_DEFAULT_LIMIT, STOREFRONT_MAX_LIMIT)
}

pub fn parse_storefront_params_with_limit(
    query: &BTreeMap<String, String>,
    default_limit: usize,
    max_limit: usize,
) -> Result<CatalogPageRequest, ApiError> {
    let q = query
        .get("q")
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned);

    let category_id = match query.get("category") {
        Some(raw) => Some(
            CategoryId::parse(raw).map_err(|_| ApiError::invalid_param("category", raw))?,
        ),
        None => None,
    };
    let vendor_id = match query.get("vendor") {
        Some(raw) => {
            Some(VendorId::parse(raw).map_err(|_| ApiError::invalid_param("vendor", raw))?)
        }
        None => None,
    };

    let min_price = parse_price(query, "min_price")?;
    let max_price = parse_price(query, "max_price")?;
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            let raw = query.get("min_price").map(String::as_str).unwrap_or("");
            return Err(ApiError::invalid_param("min_price", raw));
        }
    }

    let featured_only = match query.get("featured") {
        Some(raw) => parse_bool("featured", raw)?,
        None => false,
    };

    let limit = if let Some(raw) = query.get("limit") {
        let value = raw
            .parse::<usize>()
            .map_err(|_| ApiError::invalid_param("limit", raw))?;
        if value == 0 || value > max_limit {
            return Err(ApiError::invalid_param("limit", raw));
        }
        value
    } else {
        default_limit
    };

    let cursor = query.get("cursor").cloned();
    if let Some(value) = &cursor {
        if value.len() > MAX_CURSOR_BYTES {
            return Err(ApiError::invalid_cursor(value));
        }
    }

    Ok(CatalogPageRequest {
        filter: StorefrontFilter {
            q,
            category_id,
            vendor_id,
            min_price,
            max_price,
            featured_only,
        },
        limit,
        cursor,
    })
}

/// `?page=&per_page=` for admin and vendor-panel lists.
pub fn parse_page_params(query: &BTreeMap<String, String>) -> Result<PageParams, ApiError> {
    parse_page_params_with_limit(query, PAGE_DEFAULT_PER_PAGE, PAGE_MAX_PER_PAGE)
}

pub fn parse_page_params_with_limit(
    query: &BTreeMap<String, String>,
    default_per_page: u32,
    max_per_page: u32,
) -> Result<PageParams, ApiError> {
    let page = if let Some(raw) = query.get("page") {
        let value = raw
            .parse::<u32>()
            .map_err(|_| ApiError::invalid_param("page", raw))?;
        if value == 0 {
            return Err(ApiError::invalid_param("page", raw));
        }
        value
    } else {
        1
    };

    let per_page = if let Some(raw) = query.get("per_page") {
        let value = raw
            .parse::<u32>()
            .map_err(|_| ApiError::invalid_param("per_page", raw))?;
        if value == 0 || value > max_per_page {
            return Err(ApiError::invalid_param("per_page", raw));
        }
        value
    } else {
        default_per_page
    };

    Ok(PageParams { page, per_page })
}

/// Admin product list: the page params plus `q`, `category`, `vendor`,
/// `is_active`, `featured`.
pub fn parse_admin_product_params(
    query: &BTreeMap<String, String>,
) -> Result<(ProductAdminFilter, PageParams), ApiError> {
    let page = parse_page_params(query)?;

    let q = query
        .get("q")
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned);
    let category_id = match query.get("category") {
        Some(raw) => Some(
            CategoryId::parse(raw).map_err(|_| ApiError::invalid_param("category", raw))?,
        ),
        None => None,
    };
    let vendor_id = match query.get("vendor") {
        Some(raw) => {
            Some(VendorId::parse(raw).map_err(|_| ApiError::invalid_param("vendor", raw))?)
        }
        None => None,
    };
    let is_active = match query.get("is_active") {
        Some(raw) => Some(parse_bool("is_active", raw)?),
        None => None,
    };
    let is_featured = match query.get("featured") {
        Some(raw) => Some(parse_bool("featured", raw)?),
        None => None,
    };

    Ok((
        ProductAdminFilter {
            q,
            category_id,
            vendor_id,
            is_active,
            is_featured,
        },
        page,
    ))
}

/// Admin order list: page params plus `q` (name/email/order-number search),
/// `payment_status`, `status` (fulfillment, matches any bucket).
pub fn parse_admin_order_params(
    query: &BTreeMap<String, String>,
) -> Result<(OrderAdminFilter, PageParams), ApiError> {
    let page = parse_page_params(query)?;

    let q = query
        .get("q")
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned);
    let payment_status = match query.get("payment_status") {
        Some(raw) => Some(
            PaymentStatus::parse(raw)
                .map_err(|_| ApiError::invalid_param("payment_status", raw))?,
        ),
        None => None,
    };
    let fulfillment_status = match query.get("status") {
        Some(raw) => Some(
            FulfillmentStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?,
        ),
        None => None,
    };

    Ok((
        OrderAdminFilter {
            q,
            payment_status,
            fulfillment_status,
        },
        page,
    ))
}

/// Admin vendor list: page params plus an optional `status` filter.
pub fn parse_admin_vendor_params(
    query: &BTreeMap<String, String>,
) -> Result<(Option<VendorStatus>, PageParams), ApiError> {
    let page = parse_page_params(query)?;
    let status = match query.get("status") {
        Some(raw) => {
            Some(VendorStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?)
        }
        None => None,
    };
    Ok((status, page))
}

fn parse_price(
    query: &BTreeMap<String, String>,
    name: &'static str,
) -> Result<Option<Money>, ApiError> {
    match query.get(name) {
        Some(raw) => {
            let major = raw
                .parse::<f64>()
                .map_err(|_| ApiError::invalid_param(name, raw))?;
            let money =
                Money::from_major_units(major).map_err(|_| ApiError::invalid_param(name, raw))?;
            Ok(Some(money))
        }
        None => Ok(None),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ApiError> {
    match raw {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ApiError::invalid_param(name, raw)),
    }
}
