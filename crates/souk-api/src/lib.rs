// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Wire contract for the souk HTTP surface: the `{success, statusCode,
//! message, data}` envelope, typed error codes with their status mapping,
//! camelCase DTOs, query-parameter parsing, and the shopping-feed XML
//! renderer. Pure data; no transport or storage here.

pub mod convert;
pub mod dto;
pub mod error_mapping;
pub mod errors;
pub mod feed;
pub mod params;
pub mod responses;

pub use error_mapping::{map_error, status_for};
pub use errors::{ApiError, ApiErrorCode};
pub use params::{
    parse_admin_order_params, parse_admin_product_params, parse_admin_vendor_params,
    parse_page_params, parse_storefront_params, PageParams, MAX_CURSOR_BYTES,
};
pub use responses::{Envelope, ErrorBody};
