//! Route handlers, grouped the way the API surface is grouped: ops
//! probes, public storefront, auth, vendor panel, admin panel.

pub(crate) mod admin;
pub(crate) mod auth_routes;
pub(crate) mod ops;
pub(crate) mod storefront;
pub(crate) mod vendor_panel;

use crate::middleware::RequestId;
use crate::store_fail;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use souk_api::dto::{ProductCreateRequest, ProductUpdateRequest};
use souk_api::{convert, ApiError, ApiErrorCode, Envelope};
use souk_model::{
    parse_description, parse_image_url, parse_name, validate_price_pair, CategoryId, Product,
    ProductId, Slug, VendorId, PRODUCT_MEDIA_MAX,
};
use souk_store::products::ProductUpdate;
use souk_store::{categories, products};

/// Unwraps an axum JSON extraction, turning rejections (bad content type,
/// malformed JSON, unknown fields) into the envelope error shape instead
/// of axum's plain-text default.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::new(
            ApiErrorCode::BadRequest,
            "request body could not be read",
            json!({ "reason": rejection.body_text() }),
            "req-unknown",
        )),
    }
}

pub(crate) fn ok_response<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::OK, Json(Envelope::ok(message, data))).into_response()
}

pub(crate) fn created_response<T: Serialize>(message: &str, data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope::created(message, data))).into_response()
}

pub(crate) fn error_response(error: ApiError, request_id: &RequestId) -> Response {
    let error = error.with_request_id(request_id.0.clone());
    let envelope = Envelope::failure(&error);
    let status = StatusCode::from_u16(envelope.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

pub(crate) fn respond<T: Serialize>(
    result: Result<T, ApiError>,
    request_id: &RequestId,
    message: &str,
) -> Response {
    match result {
        Ok(data) => ok_response(message, data),
        Err(error) => error_response(error, request_id),
    }
}

pub(crate) fn respond_created<T: Serialize>(
    result: Result<T, ApiError>,
    request_id: &RequestId,
    message: &str,
) -> Response {
    match result {
        Ok(data) => created_response(message, data),
        Err(error) => error_response(error, request_id),
    }
}

fn parse_media(media: &[String]) -> Result<Vec<String>, ApiError> {
    if media.len() > PRODUCT_MEDIA_MAX {
        return Err(ApiError::invalid_field(
            "media",
            format!("at most {PRODUCT_MEDIA_MAX} media entries"),
        ));
    }
    media
        .iter()
        .map(|url| {
            parse_image_url(url).map_err(|err| ApiError::invalid_field("media", err.to_string()))
        })
        .collect()
}

/// Builds a product from a create payload. The caller decides ownership:
/// the vendor panel pins `vendor_id` to the caller's vendor and may not
/// feature products; the admin surface passes whatever it was given.
pub(crate) fn build_new_product(
    conn: &Connection,
    request: &ProductCreateRequest,
    vendor_id: Option<VendorId>,
    allow_featured: bool,
    now: DateTime<Utc>,
) -> Result<Product, ApiError> {
    let name = parse_name("name", &request.name)
        .map_err(|err| ApiError::invalid_field("name", err.to_string()))?;
    let slug = match &request.slug {
        Some(raw) => Slug::parse(raw)
            .map_err(|err| ApiError::invalid_field("slug", err.to_string()))?,
        None => Slug::from_text(&name)
            .map_err(|err| ApiError::invalid_field("name", err.to_string()))?,
    };
    let category_id = CategoryId::parse(&request.category_id)
        .map_err(|err| ApiError::invalid_field("categoryId", err.to_string()))?;
    categories::category_by_id(conn, &category_id)
        .map_err(store_fail)?
        .ok_or_else(|| ApiError::not_found("category"))?;
    let mrp = convert::money_in("mrp", request.mrp)?;
    let selling_price = convert::money_in("sellingPrice", request.selling_price)?;
    validate_price_pair(mrp, selling_price)
        .map_err(|err| ApiError::invalid_field("sellingPrice", err.to_string()))?;

    let mut product = Product::new(
        ProductId::generate(),
        name,
        slug,
        category_id,
        vendor_id,
        mrp,
        selling_price,
        now,
    );
    if let Some(description) = request.description.as_deref().filter(|d| !d.is_empty()) {
        product.description = Some(
            parse_description(description)
                .map_err(|err| ApiError::invalid_field("description", err.to_string()))?,
        );
    }
    if let Some(media) = &request.media {
        product.media = parse_media(media)?;
    }
    if let Some(stock) = request.stock {
        product.stock = stock;
    }
    if let Some(is_active) = request.is_active {
        product.is_active = is_active;
    }
    if allow_featured {
        if let Some(is_featured) = request.is_featured {
            product.is_featured = is_featured;
        }
    }
    product.validate()?;
    Ok(product)
}

/// Applies a patch payload to a stored product and returns the refreshed
/// row. Price fields are cross-checked against the merged pair, so a patch
/// cannot push the selling price above the MRP.
pub(crate) fn apply_product_patch(
    conn: &Connection,
    current: &Product,
    request: &ProductUpdateRequest,
    allow_featured: bool,
    now: DateTime<Utc>,
) -> Result<Product, ApiError> {
    let mut update = ProductUpdate::default();
    if let Some(raw) = &request.name {
        update.name = Some(
            parse_name("name", raw)
                .map_err(|err| ApiError::invalid_field("name", err.to_string()))?,
        );
    }
    if let Some(raw) = &request.description {
        update.description = if raw.is_empty() {
            Some(None)
        } else {
            Some(Some(parse_description(raw).map_err(|err| {
                ApiError::invalid_field("description", err.to_string())
            })?))
        };
    }
    if let Some(raw) = &request.category_id {
        let category_id = CategoryId::parse(raw)
            .map_err(|err| ApiError::invalid_field("categoryId", err.to_string()))?;
        categories::category_by_id(conn, &category_id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("category"))?;
        update.category_id = Some(category_id);
    }
    let mrp = match request.mrp {
        Some(raw) => {
            let value = convert::money_in("mrp", raw)?;
            update.mrp = Some(value);
            value
        }
        None => current.mrp,
    };
    let selling_price = match request.selling_price {
        Some(raw) => {
            let value = convert::money_in("sellingPrice", raw)?;
            update.selling_price = Some(value);
            value
        }
        None => current.selling_price,
    };
    if request.mrp.is_some() || request.selling_price.is_some() {
        validate_price_pair(mrp, selling_price)
            .map_err(|err| ApiError::invalid_field("sellingPrice", err.to_string()))?;
    }
    if let Some(media) = &request.media {
        update.media = Some(parse_media(media)?);
    }
    update.stock = request.stock;
    update.is_active = request.is_active;
    if allow_featured {
        update.is_featured = request.is_featured;
    }

    if !products::update_product(conn, &current.id, &update, now).map_err(store_fail)? {
        return Err(ApiError::not_found("product"));
    }
    products::product_by_id(conn, &current.id)
        .map_err(store_fail)?
        .ok_or_else(|| ApiError::not_found("product"))
}
