//! Public storefront endpoints: catalog browsing, checkout, and the
//! shopping feed. None of these require a session.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use souk_api::dto::CreateOrderRequest;
use souk_api::params::parse_storefront_params;
use souk_api::{convert, feed, ApiError};
use souk_model::Slug;
use souk_store::{categories, products, vendors};

use crate::checkout::place_order;
use crate::http::{error_response, json_body, respond, respond_created};
use crate::middleware::RequestId;
use crate::{run_store, store_fail, AppState};

pub(crate) async fn categories_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let result = run_store(&state, |conn| {
        let rows = categories::list_categories(conn).map_err(store_fail)?;
        Ok(rows.iter().map(convert::category_dto).collect::<Vec<_>>())
    })
    .await;
    respond(result, &request_id, "categories")
}

pub(crate) async fn products_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = match parse_storefront_params(&query) {
        Ok(request) => {
            let secret = state.config.session_secret.clone();
            run_store(&state, move |conn| {
                let page = products::storefront_products(conn, &request, &secret)
                    .map_err(store_fail)?;
                Ok(convert::storefront_page_dto(&page))
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(result, &request_id, "products")
}

/// A slug that does not parse cannot name a product, so it reads as 404
/// rather than 400. Products of non-approved vendors are hidden the same
/// way; the status itself is not disclosed.
pub(crate) async fn product_detail_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(raw_slug): Path<String>,
) -> Response {
    let result = match Slug::parse(&raw_slug) {
        Ok(slug) => {
            run_store(&state, move |conn| {
                let product = products::product_by_slug(conn, &slug)
                    .map_err(store_fail)?
                    .filter(|p| p.is_active)
                    .ok_or_else(|| ApiError::not_found("product"))?;
                let vendor_name = match product.vendor_id {
                    Some(vendor_id) => Some(
                        vendors::vendor_by_id(conn, &vendor_id)
                            .map_err(store_fail)?
                            .filter(|v| v.is_approved())
                            .ok_or_else(|| ApiError::not_found("product"))?
                            .business_name,
                    ),
                    None => None,
                };
                let variants =
                    products::variants_for_product(conn, &product.id).map_err(store_fail)?;
                Ok(convert::product_detail(
                    &product,
                    vendor_name.as_deref(),
                    &variants,
                ))
            })
            .await
        }
        Err(_) => Err(ApiError::not_found("product")),
    };
    respond(result, &request_id, "product")
}

pub(crate) async fn create_order_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Response {
    let result = match json_body(payload) {
        Ok(request) => place_order(&state, request)
            .await
            .map(|order| convert::order_dto(&order)),
        Err(err) => Err(err),
    };
    respond_created(result, &request_id, "order placed")
}

pub(crate) async fn feed_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let result = run_store(&state, |conn| {
        products::feed_products(conn).map_err(store_fail)
    })
    .await;
    match result {
        Ok(entries) => {
            let config = &state.config;
            let xml = feed::render_feed(
                &entries,
                &config.store_name,
                &config.public_base_url,
                &config.currency,
            );
            (
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                xml,
            )
                .into_response()
        }
        Err(err) => error_response(err, &request_id),
    }
}
