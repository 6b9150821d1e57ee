//! Vendor panel: application, own profile, own products, own order
//! buckets. Every route here authenticates the session; everything past
//! `/me` additionally requires the vendor to be approved.
//!
//! Responses never include another vendor's rows. Lookups that land on
//! someone else's product or bucket answer 404, the same as a miss.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::Value;
use souk_api::dto::{
    OrderItemDto, OrderStatusUpdateRequest, PagedDto, PageMetaDto, ProductCreateRequest,
    ProductDetailDto, ProductUpdateRequest, VendorApplyRequest, VendorDto,
    VendorProfileUpdateRequest,
};
use souk_api::params::{parse_admin_product_params, parse_page_params};
use souk_api::{convert, ApiError};
use souk_model::{
    parse_description, parse_name, BankDetails, EmailAddress, FulfillmentStatus, OrderItemId,
    PhoneNumber, ProductId, Role, Slug, Vendor, VendorId,
};
use souk_store::vendors::VendorUpdate;
use souk_store::{orders, products, users, vendors, StoreError};

use crate::auth::{authenticate, require_approved_vendor, require_role, SessionClaims};
use crate::http::{
    apply_product_patch, build_new_product, json_body, respond, respond_created,
};
use crate::middleware::RequestId;
use crate::{run_store, store_fail, AppState};

/// Session + role check; the vendor row itself is fetched per handler so
/// the role check stays cheap for the failure paths.
fn vendor_claims(state: &AppState, headers: &HeaderMap) -> Result<SessionClaims, ApiError> {
    let claims = authenticate(headers, &state.config.session_secret, Utc::now())?;
    require_role(&claims, Role::Vendor)?;
    Ok(claims)
}

/// Resolves the caller's vendor record and requires `approved` status.
async fn approved_vendor(state: &AppState, headers: &HeaderMap) -> Result<Vendor, ApiError> {
    let claims = vendor_claims(state, headers)?;
    let vid = claims.vid.ok_or_else(ApiError::auth_invalid)?;
    let vendor = run_store(state, move |conn| {
        vendors::vendor_by_id(conn, &vid).map_err(store_fail)
    })
    .await?;
    require_approved_vendor(vendor)
}

async fn apply(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<VendorApplyRequest>, JsonRejection>,
) -> Result<VendorDto, ApiError> {
    let claims = authenticate(headers, &state.config.session_secret, Utc::now())?;
    match claims.role {
        Role::User => {}
        Role::Vendor => {
            return Err(ApiError::conflict("account is already linked to a vendor"))
        }
        _ => return Err(ApiError::conflict("admin accounts cannot apply as vendors")),
    }
    let request = json_body(payload)?;
    let business_name = parse_name("businessName", &request.business_name)
        .map_err(|err| ApiError::invalid_field("businessName", err.to_string()))?;
    let slug = match &request.slug {
        Some(raw) => Slug::parse(raw)
            .map_err(|err| ApiError::invalid_field("slug", err.to_string()))?,
        None => Slug::from_text(&business_name)
            .map_err(|err| ApiError::invalid_field("businessName", err.to_string()))?,
    };
    let contact_email = match request.contact_email.as_deref().filter(|e| !e.is_empty()) {
        Some(raw) => Some(
            EmailAddress::parse(raw)
                .map_err(|err| ApiError::invalid_field("contactEmail", err.to_string()))?,
        ),
        None => None,
    };
    let phone = match request.phone.as_deref().filter(|p| !p.is_empty()) {
        Some(raw) => Some(
            PhoneNumber::parse(raw)
                .map_err(|err| ApiError::invalid_field("phone", err.to_string()))?,
        ),
        None => None,
    };
    let description = match request.description.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            parse_description(raw)
                .map_err(|err| ApiError::invalid_field("description", err.to_string()))?,
        ),
        None => None,
    };

    let uid = claims.uid;
    let default_rate = state.config.default_commission;
    let now = Utc::now();
    let vendor = run_store(state, move |conn| {
        let tx = conn
            .transaction()
            .map_err(|e| store_fail(StoreError::from(e)))?;
        let user = users::user_by_id(&tx, &uid)
            .map_err(store_fail)?
            .ok_or_else(ApiError::auth_invalid)?;
        if user.vendor_id.is_some() {
            return Err(ApiError::conflict("account is already linked to a vendor"));
        }
        let contact_email = contact_email.unwrap_or_else(|| user.email.clone());
        let mut vendor = Vendor::new(
            VendorId::generate(),
            business_name,
            slug,
            contact_email,
            default_rate,
            now,
        );
        vendor.phone = phone;
        vendor.description = description;
        vendors::insert_vendor(&tx, &vendor).map_err(|err| match err {
            StoreError::Conflict(_) => {
                ApiError::conflict("vendor slug or contact email already in use")
            }
            other => store_fail(other),
        })?;
        if !users::link_vendor(&tx, &user.id, &vendor.id, now).map_err(store_fail)? {
            return Err(ApiError::internal());
        }
        tx.commit().map_err(|e| store_fail(StoreError::from(e)))?;
        Ok(vendor)
    })
    .await?;
    Ok(convert::vendor_dto(&vendor))
}

pub(crate) async fn apply_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<VendorApplyRequest>, JsonRejection>,
) -> Response {
    respond_created(
        apply(&state, &headers, payload).await,
        &request_id,
        "vendor application submitted",
    )
}

/// Own profile. Unlike the rest of the panel this works for pending and
/// suspended vendors too; it is how an applicant sees their status.
pub(crate) async fn me_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    let result = async {
        let claims = vendor_claims(&state, &headers)?;
        let vid = claims.vid.ok_or_else(ApiError::auth_invalid)?;
        let vendor = run_store(&state, move |conn| {
            vendors::vendor_by_id(conn, &vid)
                .map_err(store_fail)?
                .ok_or_else(|| ApiError::not_found("vendor"))
        })
        .await?;
        Ok(convert::vendor_dto(&vendor))
    }
    .await;
    respond(result, &request_id, "vendor profile")
}

async fn update_profile(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<VendorProfileUpdateRequest>, JsonRejection>,
) -> Result<VendorDto, ApiError> {
    let claims = vendor_claims(state, headers)?;
    let vid = claims.vid.ok_or_else(ApiError::auth_invalid)?;
    let request = json_body(payload)?;

    let mut update = VendorUpdate::default();
    if let Some(raw) = &request.business_name {
        update.business_name = Some(
            parse_name("businessName", raw)
                .map_err(|err| ApiError::invalid_field("businessName", err.to_string()))?,
        );
    }
    if let Some(raw) = &request.phone {
        update.phone = Some(
            PhoneNumber::parse(raw)
                .map_err(|err| ApiError::invalid_field("phone", err.to_string()))?,
        );
    }
    if let Some(raw) = &request.description {
        update.description = Some(
            parse_description(raw)
                .map_err(|err| ApiError::invalid_field("description", err.to_string()))?,
        );
    }
    if let Some(bank) = &request.bank {
        let bank = BankDetails {
            account_name: bank.account_name.clone(),
            account_number: bank.account_number.clone(),
            bank_name: bank.bank_name.clone(),
        };
        bank.validate()
            .map_err(|err| ApiError::invalid_field("bank", err.to_string()))?;
        update.bank = Some(bank);
    }

    let now = Utc::now();
    let vendor = run_store(state, move |conn| {
        if !vendors::update_vendor(conn, &vid, &update, now).map_err(store_fail)? {
            return Err(ApiError::not_found("vendor"));
        }
        vendors::vendor_by_id(conn, &vid)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("vendor"))
    })
    .await?;
    Ok(convert::vendor_dto(&vendor))
}

pub(crate) async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<VendorProfileUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_profile(&state, &headers, payload).await,
        &request_id,
        "vendor profile updated",
    )
}

pub(crate) async fn list_products_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        let vendor = approved_vendor(&state, &headers).await?;
        let (mut filter, page) = parse_admin_product_params(&query)?;
        // The scope is always the caller; a `vendor` query param is ignored.
        filter.vendor_id = Some(vendor.id);
        let rows = run_store(&state, move |conn| {
            products::admin_list_products(conn, &filter, page.page, page.per_page)
                .map_err(store_fail)
        })
        .await?;
        Ok(convert::page_dto(&rows, convert::product_card))
    }
    .await;
    respond(result, &request_id, "products")
}

async fn create_product(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<ProductCreateRequest>, JsonRejection>,
) -> Result<ProductDetailDto, ApiError> {
    let vendor = approved_vendor(state, headers).await?;
    let request = json_body(payload)?;
    let vendor_id = vendor.id;
    let vendor_name = vendor.business_name;
    let now = Utc::now();
    let product = run_store(state, move |conn| {
        let product = build_new_product(conn, &request, Some(vendor_id), false, now)?;
        products::insert_product(conn, &product).map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::conflict("product slug already in use"),
            other => store_fail(other),
        })?;
        Ok(product)
    })
    .await?;
    Ok(convert::product_detail(&product, Some(&vendor_name), &[]))
}

pub(crate) async fn create_product_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<ProductCreateRequest>, JsonRejection>,
) -> Response {
    respond_created(
        create_product(&state, &headers, payload).await,
        &request_id,
        "product created",
    )
}

/// Parses a path id; anything that is not a well-formed id reads as a
/// miss, the same as an id that points at nothing.
fn product_path_id(raw: &str) -> Result<ProductId, ApiError> {
    ProductId::parse(raw).map_err(|_| ApiError::not_found("product"))
}

async fn update_product(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> Result<ProductDetailDto, ApiError> {
    let vendor = approved_vendor(state, headers).await?;
    let id = product_path_id(raw_id)?;
    let request = json_body(payload)?;
    let vendor_id = vendor.id;
    let vendor_name = vendor.business_name;
    let now = Utc::now();
    let (product, variants) = run_store(state, move |conn| {
        let current = products::product_by_id(conn, &id)
            .map_err(store_fail)?
            .filter(|p| p.vendor_id == Some(vendor_id))
            .ok_or_else(|| ApiError::not_found("product"))?;
        let product = apply_product_patch(conn, &current, &request, false, now)?;
        let variants = products::variants_for_product(conn, &id).map_err(store_fail)?;
        Ok((product, variants))
    })
    .await?;
    Ok(convert::product_detail(
        &product,
        Some(&vendor_name),
        &variants,
    ))
}

pub(crate) async fn update_product_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_product(&state, &headers, &raw_id, payload).await,
        &request_id,
        "product updated",
    )
}

pub(crate) async fn delete_product_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        let vendor = approved_vendor(&state, &headers).await?;
        let id = product_path_id(&raw_id)?;
        let vendor_id = vendor.id;
        let now = Utc::now();
        run_store(&state, move |conn| {
            products::product_by_id(conn, &id)
                .map_err(store_fail)?
                .filter(|p| p.vendor_id == Some(vendor_id))
                .ok_or_else(|| ApiError::not_found("product"))?;
            if !products::soft_delete_product(conn, &id, now).map_err(store_fail)? {
                return Err(ApiError::not_found("product"));
            }
            Ok(Value::Null)
        })
        .await
    }
    .await;
    respond(result, &request_id, "product deleted")
}

pub(crate) async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        let vendor = approved_vendor(&state, &headers).await?;
        let page = parse_page_params(&query)?;
        let vid = vendor.id;
        let rows = run_store(&state, move |conn| {
            orders::vendor_orders(conn, &vid, page.page, page.per_page).map_err(store_fail)
        })
        .await?;
        let total_pages = if rows.per_page == 0 {
            0
        } else {
            rows.total.div_ceil(u64::from(rows.per_page))
        };
        Ok(PagedDto {
            rows: rows.rows.iter().map(convert::vendor_order_dto).collect(),
            meta: PageMetaDto {
                page: rows.page,
                per_page: rows.per_page,
                total: rows.total,
                total_pages,
            },
        })
    }
    .await;
    respond(result, &request_id, "orders")
}

async fn update_order_status(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<OrderStatusUpdateRequest>, JsonRejection>,
) -> Result<OrderItemDto, ApiError> {
    let vendor = approved_vendor(state, headers).await?;
    let id = OrderItemId::parse(raw_id).map_err(|_| ApiError::not_found("order item"))?;
    let request = json_body(payload)?;
    let next = FulfillmentStatus::parse(&request.status)
        .map_err(|err| ApiError::invalid_field("status", err.to_string()))?;
    let vendor_id = vendor.id;
    let now = Utc::now();
    let item = run_store(state, move |conn| {
        orders::order_item_by_id(conn, &id)
            .map_err(store_fail)?
            .filter(|(_, item)| item.vendor_id == Some(vendor_id))
            .ok_or_else(|| ApiError::not_found("order item"))?;
        orders::set_item_status(conn, &id, next, now)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("order item"))
    })
    .await?;
    Ok(convert::item_dto(&item))
}

pub(crate) async fn update_order_status_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<OrderStatusUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_order_status(&state, &headers, &raw_id, payload).await,
        &request_id,
        "fulfillment status updated",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use souk_api::ApiErrorCode;

    #[test]
    fn malformed_product_ids_read_as_not_found() {
        let err = product_path_id("definitely-not-a-uuid").expect_err("must fail");
        assert_eq!(err.code, ApiErrorCode::NotFound);
        assert_eq!(err.message, "product not found");
    }
}
