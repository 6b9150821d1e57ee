//! Admin panel: category and product CRUD (any vendor or platform-owned),
//! variants, vendor moderation, and the order back office. Every route
//! requires an authenticated admin session.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::Value;
use souk_api::dto::{
    CategoryCreateRequest, CategoryDto, CategoryUpdateRequest, OrderDto,
    OrderStatusUpdateRequest, PaymentStatusUpdateRequest, ProductCreateRequest,
    ProductDetailDto, ProductUpdateRequest, VariantCreateRequest, VariantDto,
    VariantUpdateRequest, VendorDto, VendorStatusUpdateRequest,
};
use souk_api::params::{
    parse_admin_order_params, parse_admin_product_params, parse_admin_vendor_params,
};
use souk_api::{convert, ApiError};
use souk_model::{
    parse_description, parse_image_url, parse_name, validate_price_pair, Category, CategoryId,
    CommissionRate, FulfillmentStatus, OrderId, OrderItem, OrderItemId, PaymentStatus, Product,
    ProductId, ProductVariant, Role, Sku, Slug, VariantId, VendorId, VendorStatus,
};
use souk_store::categories::CategoryUpdate;
use souk_store::products::VariantUpdate;
use souk_store::{categories, orders, products, vendors, StoreError};

use crate::auth::{authenticate, require_role};
use crate::http::{
    apply_product_patch, build_new_product, json_body, respond, respond_created,
};
use crate::middleware::RequestId;
use crate::{run_store, store_fail, AppState};

fn admin_only(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let claims = authenticate(headers, &state.config.session_secret, Utc::now())?;
    require_role(&claims, Role::Admin)
}

// --- categories ---

pub(crate) async fn list_categories_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let rows = run_store(&state, |conn| {
            categories::list_categories(conn).map_err(store_fail)
        })
        .await?;
        Ok(rows.iter().map(convert::category_dto).collect::<Vec<_>>())
    }
    .await;
    respond(result, &request_id, "categories")
}

async fn create_category(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<CategoryCreateRequest>, JsonRejection>,
) -> Result<CategoryDto, ApiError> {
    admin_only(state, headers)?;
    let request = json_body(payload)?;
    let name = parse_name("name", &request.name)
        .map_err(|err| ApiError::invalid_field("name", err.to_string()))?;
    let slug = match &request.slug {
        Some(raw) => Slug::parse(raw)
            .map_err(|err| ApiError::invalid_field("slug", err.to_string()))?,
        None => Slug::from_text(&name)
            .map_err(|err| ApiError::invalid_field("name", err.to_string()))?,
    };
    let parent_id = match request.parent_id.as_deref().filter(|p| !p.is_empty()) {
        Some(raw) => Some(
            CategoryId::parse(raw)
                .map_err(|err| ApiError::invalid_field("parentId", err.to_string()))?,
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
    let image_url = match request.image_url.as_deref().filter(|u| !u.is_empty()) {
        Some(raw) => Some(
            parse_image_url(raw)
                .map_err(|err| ApiError::invalid_field("imageUrl", err.to_string()))?,
        ),
        None => None,
    };

    let now = Utc::now();
    let category = run_store(state, move |conn| {
        if let Some(parent_id) = &parent_id {
            categories::category_by_id(conn, parent_id)
                .map_err(store_fail)?
                .ok_or_else(|| ApiError::not_found("parent category"))?;
        }
        let mut category = Category::new(CategoryId::generate(), name, slug, now);
        category.parent_id = parent_id;
        category.description = description;
        category.image_url = image_url;
        categories::insert_category(conn, &category).map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::conflict("category slug already in use"),
            other => store_fail(other),
        })?;
        Ok(category)
    })
    .await?;
    Ok(convert::category_dto(&category))
}

pub(crate) async fn create_category_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<CategoryCreateRequest>, JsonRejection>,
) -> Response {
    respond_created(
        create_category(&state, &headers, payload).await,
        &request_id,
        "category created",
    )
}

async fn update_category(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<CategoryUpdateRequest>, JsonRejection>,
) -> Result<CategoryDto, ApiError> {
    admin_only(state, headers)?;
    let id = CategoryId::parse(raw_id).map_err(|_| ApiError::not_found("category"))?;
    let request = json_body(payload)?;

    let mut update = CategoryUpdate::default();
    if let Some(raw) = &request.name {
        update.name = Some(
            parse_name("name", raw)
                .map_err(|err| ApiError::invalid_field("name", err.to_string()))?,
        );
    }
    let parent_id = match &request.parent_id {
        Some(raw) if raw.is_empty() => {
            update.parent_id = Some(None);
            None
        }
        Some(raw) => {
            let parent = CategoryId::parse(raw)
                .map_err(|err| ApiError::invalid_field("parentId", err.to_string()))?;
            update.parent_id = Some(Some(parent));
            Some(parent)
        }
        None => None,
    };
    if let Some(raw) = &request.description {
        update.description = if raw.is_empty() {
            Some(None)
        } else {
            Some(Some(parse_description(raw).map_err(|err| {
                ApiError::invalid_field("description", err.to_string())
            })?))
        };
    }
    if let Some(raw) = &request.image_url {
        update.image_url = if raw.is_empty() {
            Some(None)
        } else {
            Some(Some(parse_image_url(raw).map_err(|err| {
                ApiError::invalid_field("imageUrl", err.to_string())
            })?))
        };
    }

    let now = Utc::now();
    let category = run_store(state, move |conn| {
        if let Some(parent_id) = &parent_id {
            categories::category_by_id(conn, parent_id)
                .map_err(store_fail)?
                .ok_or_else(|| ApiError::not_found("parent category"))?;
        }
        if !categories::update_category(conn, &id, &update, now).map_err(store_fail)? {
            return Err(ApiError::not_found("category"));
        }
        categories::category_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("category"))
    })
    .await?;
    Ok(convert::category_dto(&category))
}

pub(crate) async fn update_category_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<CategoryUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_category(&state, &headers, &raw_id, payload).await,
        &request_id,
        "category updated",
    )
}

pub(crate) async fn delete_category_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let id = CategoryId::parse(&raw_id).map_err(|_| ApiError::not_found("category"))?;
        let now = Utc::now();
        run_store(&state, move |conn| {
            let in_use = categories::category_product_count(conn, &id).map_err(store_fail)?;
            if in_use > 0 {
                return Err(ApiError::conflict(format!(
                    "category still has {in_use} products"
                )));
            }
            if !categories::soft_delete_category(conn, &id, now).map_err(store_fail)? {
                return Err(ApiError::not_found("category"));
            }
            Ok(Value::Null)
        })
        .await
    }
    .await;
    respond(result, &request_id, "category deleted")
}

// --- products ---

pub(crate) async fn list_products_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let (filter, page) = parse_admin_product_params(&query)?;
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
    admin_only(state, headers)?;
    let request = json_body(payload)?;
    let vendor_id = match request.vendor_id.as_deref().filter(|v| !v.is_empty()) {
        Some(raw) => Some(
            VendorId::parse(raw)
                .map_err(|err| ApiError::invalid_field("vendorId", err.to_string()))?,
        ),
        None => None,
    };
    let now = Utc::now();
    let (product, vendor_name) = run_store(state, move |conn| {
        let vendor_name = match &vendor_id {
            Some(vendor_id) => Some(
                vendors::vendor_by_id(conn, vendor_id)
                    .map_err(store_fail)?
                    .ok_or_else(|| ApiError::not_found("vendor"))?
                    .business_name,
            ),
            None => None,
        };
        let product = build_new_product(conn, &request, vendor_id, true, now)?;
        products::insert_product(conn, &product).map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::conflict("product slug already in use"),
            other => store_fail(other),
        })?;
        Ok((product, vendor_name))
    })
    .await?;
    Ok(convert::product_detail(
        &product,
        vendor_name.as_deref(),
        &[],
    ))
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

/// Admin product reads join the owning vendor's name regardless of the
/// vendor's status; the back office sees suspended inventory too.
fn admin_product_detail(
    conn: &rusqlite::Connection,
    product: &Product,
) -> Result<ProductDetailDto, ApiError> {
    let vendor_name = match product.vendor_id {
        Some(vendor_id) => vendors::vendor_by_id(conn, &vendor_id)
            .map_err(store_fail)?
            .map(|v| v.business_name),
        None => None,
    };
    let variants = products::variants_for_product(conn, &product.id).map_err(store_fail)?;
    Ok(convert::product_detail(
        product,
        vendor_name.as_deref(),
        &variants,
    ))
}

async fn update_product(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<ProductUpdateRequest>, JsonRejection>,
) -> Result<ProductDetailDto, ApiError> {
    admin_only(state, headers)?;
    let id = ProductId::parse(raw_id).map_err(|_| ApiError::not_found("product"))?;
    let request = json_body(payload)?;
    let now = Utc::now();
    run_store(state, move |conn| {
        let current = products::product_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("product"))?;
        let product = apply_product_patch(conn, &current, &request, true, now)?;
        admin_product_detail(conn, &product)
    })
    .await
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
        admin_only(&state, &headers)?;
        let id = ProductId::parse(&raw_id).map_err(|_| ApiError::not_found("product"))?;
        let now = Utc::now();
        run_store(&state, move |conn| {
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

// --- variants ---

async fn create_variant(
    state: &AppState,
    headers: &HeaderMap,
    raw_product_id: &str,
    payload: Result<Json<VariantCreateRequest>, JsonRejection>,
) -> Result<VariantDto, ApiError> {
    admin_only(state, headers)?;
    let product_id =
        ProductId::parse(raw_product_id).map_err(|_| ApiError::not_found("product"))?;
    let request = json_body(payload)?;
    let sku = Sku::parse(&request.sku)
        .map_err(|err| ApiError::invalid_field("sku", err.to_string()))?;
    let mrp = convert::money_in("mrp", request.mrp)?;
    let selling_price = convert::money_in("sellingPrice", request.selling_price)?;
    validate_price_pair(mrp, selling_price)
        .map_err(|err| ApiError::invalid_field("sellingPrice", err.to_string()))?;
    let image_url = match request.image_url.as_deref().filter(|u| !u.is_empty()) {
        Some(raw) => Some(
            parse_image_url(raw)
                .map_err(|err| ApiError::invalid_field("imageUrl", err.to_string()))?,
        ),
        None => None,
    };
    let color = request.color.clone().filter(|c| !c.is_empty());
    let size = request.size.clone().filter(|s| !s.is_empty());
    let stock = request.stock;

    let now = Utc::now();
    let variant = run_store(state, move |conn| {
        products::product_by_id(conn, &product_id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("product"))?;
        let mut variant = ProductVariant::new(
            VariantId::generate(),
            product_id,
            sku,
            mrp,
            selling_price,
            stock,
            now,
        );
        variant.color = color;
        variant.size = size;
        variant.image_url = image_url;
        products::insert_variant(conn, &variant).map_err(|err| match err {
            StoreError::Conflict(_) => ApiError::conflict("variant sku already in use"),
            other => store_fail(other),
        })?;
        Ok(variant)
    })
    .await?;
    Ok(convert::variant_dto(&variant))
}

pub(crate) async fn create_variant_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_product_id): Path<String>,
    payload: Result<Json<VariantCreateRequest>, JsonRejection>,
) -> Response {
    respond_created(
        create_variant(&state, &headers, &raw_product_id, payload).await,
        &request_id,
        "variant created",
    )
}

async fn update_variant(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<VariantUpdateRequest>, JsonRejection>,
) -> Result<VariantDto, ApiError> {
    admin_only(state, headers)?;
    let id = VariantId::parse(raw_id).map_err(|_| ApiError::not_found("variant"))?;
    let request = json_body(payload)?;

    let mut update = VariantUpdate::default();
    if let Some(raw) = &request.color {
        update.color = Some(if raw.is_empty() { None } else { Some(raw.clone()) });
    }
    if let Some(raw) = &request.size {
        update.size = Some(if raw.is_empty() { None } else { Some(raw.clone()) });
    }
    if let Some(raw) = &request.image_url {
        update.image_url = if raw.is_empty() {
            Some(None)
        } else {
            Some(Some(parse_image_url(raw).map_err(|err| {
                ApiError::invalid_field("imageUrl", err.to_string())
            })?))
        };
    }
    if let Some(raw) = request.mrp {
        update.mrp = Some(convert::money_in("mrp", raw)?);
    }
    if let Some(raw) = request.selling_price {
        update.selling_price = Some(convert::money_in("sellingPrice", raw)?);
    }
    update.stock = request.stock;

    let now = Utc::now();
    let variant = run_store(state, move |conn| {
        let current = products::variant_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("variant"))?;
        if update.mrp.is_some() || update.selling_price.is_some() {
            let mrp = update.mrp.unwrap_or(current.mrp);
            let selling_price = update.selling_price.unwrap_or(current.selling_price);
            validate_price_pair(mrp, selling_price)
                .map_err(|err| ApiError::invalid_field("sellingPrice", err.to_string()))?;
        }
        if !products::update_variant(conn, &id, &update, now).map_err(store_fail)? {
            return Err(ApiError::not_found("variant"));
        }
        products::variant_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("variant"))
    })
    .await?;
    Ok(convert::variant_dto(&variant))
}

pub(crate) async fn update_variant_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<VariantUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_variant(&state, &headers, &raw_id, payload).await,
        &request_id,
        "variant updated",
    )
}

pub(crate) async fn delete_variant_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let id = VariantId::parse(&raw_id).map_err(|_| ApiError::not_found("variant"))?;
        let now = Utc::now();
        run_store(&state, move |conn| {
            if !products::soft_delete_variant(conn, &id, now).map_err(store_fail)? {
                return Err(ApiError::not_found("variant"));
            }
            Ok(Value::Null)
        })
        .await
    }
    .await;
    respond(result, &request_id, "variant deleted")
}

// --- vendors ---

pub(crate) async fn list_vendors_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let (status, page) = parse_admin_vendor_params(&query)?;
        let rows = run_store(&state, move |conn| {
            vendors::list_vendors(conn, status, page.page, page.per_page).map_err(store_fail)
        })
        .await?;
        Ok(convert::page_dto(&rows, convert::vendor_dto))
    }
    .await;
    respond(result, &request_id, "vendors")
}

pub(crate) async fn vendor_detail_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let id = VendorId::parse(&raw_id).map_err(|_| ApiError::not_found("vendor"))?;
        let vendor = run_store(&state, move |conn| {
            vendors::vendor_by_id(conn, &id)
                .map_err(store_fail)?
                .ok_or_else(|| ApiError::not_found("vendor"))
        })
        .await?;
        Ok(convert::vendor_dto(&vendor))
    }
    .await;
    respond(result, &request_id, "vendor")
}

async fn update_vendor_status(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<VendorStatusUpdateRequest>, JsonRejection>,
) -> Result<VendorDto, ApiError> {
    admin_only(state, headers)?;
    let id = VendorId::parse(raw_id).map_err(|_| ApiError::not_found("vendor"))?;
    let request = json_body(payload)?;
    let next = VendorStatus::parse(&request.status)
        .map_err(|err| ApiError::invalid_field("status", err.to_string()))?;
    let rate: Option<CommissionRate> = match request.commission_rate {
        Some(percent) => Some(convert::rate_in("commissionRate", percent)?),
        None => None,
    };

    let now = Utc::now();
    let vendor = run_store(state, move |conn| {
        vendors::set_vendor_status(conn, &id, next, rate, now)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("vendor"))
    })
    .await?;
    Ok(convert::vendor_dto(&vendor))
}

pub(crate) async fn update_vendor_status_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<VendorStatusUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_vendor_status(&state, &headers, &raw_id, payload).await,
        &request_id,
        "vendor status updated",
    )
}

// --- orders ---

pub(crate) async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let (filter, page) = parse_admin_order_params(&query)?;
        let rows = run_store(&state, move |conn| {
            orders::admin_list_orders(conn, &filter, page.page, page.per_page)
                .map_err(store_fail)
        })
        .await?;
        Ok(convert::page_dto(&rows, convert::order_dto))
    }
    .await;
    respond(result, &request_id, "orders")
}

pub(crate) async fn order_detail_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Response {
    let result = async {
        admin_only(&state, &headers)?;
        let id = OrderId::parse(&raw_id).map_err(|_| ApiError::not_found("order"))?;
        let order = run_store(&state, move |conn| {
            orders::order_by_id(conn, &id)
                .map_err(store_fail)?
                .ok_or_else(|| ApiError::not_found("order"))
        })
        .await?;
        Ok(convert::order_dto(&order))
    }
    .await;
    respond(result, &request_id, "order")
}

async fn update_payment(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<PaymentStatusUpdateRequest>, JsonRejection>,
) -> Result<OrderDto, ApiError> {
    admin_only(state, headers)?;
    let id = OrderId::parse(raw_id).map_err(|_| ApiError::not_found("order"))?;
    let request = json_body(payload)?;
    let next = PaymentStatus::parse(&request.payment_status)
        .map_err(|err| ApiError::invalid_field("paymentStatus", err.to_string()))?;

    let now = Utc::now();
    let order = run_store(state, move |conn| {
        orders::set_payment_status(conn, &id, next, now)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("order"))
    })
    .await?;
    Ok(convert::order_dto(&order))
}

pub(crate) async fn update_payment_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    payload: Result<Json<PaymentStatusUpdateRequest>, JsonRejection>,
) -> Response {
    respond(
        update_payment(&state, &headers, &raw_id, payload).await,
        &request_id,
        "payment status updated",
    )
}

/// Picks the per-vendor bucket an admin status update targets. The payload
/// may name one; when it does not and the order has exactly one bucket,
/// that one moves. Orders with several buckets refuse an unnamed update
/// rather than guessing.
fn select_bucket(items: &[OrderItem], named: Option<OrderItemId>) -> Result<OrderItemId, ApiError> {
    match named {
        Some(item_id) => {
            if !items.iter().any(|item| item.id == item_id) {
                return Err(ApiError::not_found("order item"));
            }
            Ok(item_id)
        }
        None => {
            if items.len() != 1 {
                return Err(ApiError::invalid_field(
                    "orderItemId",
                    "order has multiple buckets; name the one to move",
                ));
            }
            Ok(items[0].id)
        }
    }
}

async fn update_order_status(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    payload: Result<Json<OrderStatusUpdateRequest>, JsonRejection>,
) -> Result<OrderDto, ApiError> {
    admin_only(state, headers)?;
    let id = OrderId::parse(raw_id).map_err(|_| ApiError::not_found("order"))?;
    let request = json_body(payload)?;
    let next = FulfillmentStatus::parse(&request.status)
        .map_err(|err| ApiError::invalid_field("status", err.to_string()))?;
    let named_item = match request.order_item_id.as_deref().filter(|i| !i.is_empty()) {
        Some(raw) => {
            Some(OrderItemId::parse(raw).map_err(|_| ApiError::not_found("order item"))?)
        }
        None => None,
    };

    let now = Utc::now();
    let order = run_store(state, move |conn| {
        let order = orders::order_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("order"))?;
        let item_id = select_bucket(&order.items, named_item)?;
        orders::set_item_status(conn, &item_id, next, now)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("order item"))?;
        orders::order_by_id(conn, &id)
            .map_err(store_fail)?
            .ok_or_else(|| ApiError::not_found("order"))
    })
    .await?;
    Ok(convert::order_dto(&order))
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
    use souk_api::ApiErrorCode;
    use souk_model::Money;

    use super::*;

    fn bucket() -> OrderItem {
        OrderItem {
            id: OrderItemId::generate(),
            vendor_id: None,
            lines: Vec::new(),
            subtotal: Money::ZERO,
            commission: Money::ZERO,
            vendor_earning: Money::ZERO,
            status: FulfillmentStatus::Placed,
        }
    }

    #[test]
    fn sole_bucket_is_picked_without_being_named() {
        let items = vec![bucket()];
        let picked = select_bucket(&items, None).unwrap();
        assert_eq!(picked, items[0].id);
    }

    #[test]
    fn multi_bucket_orders_require_a_named_bucket() {
        let items = vec![bucket(), bucket()];
        let err = select_bucket(&items, None).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::Validation);

        let picked = select_bucket(&items, Some(items[1].id)).unwrap();
        assert_eq!(picked, items[1].id);
    }

    #[test]
    fn a_bucket_from_another_order_reads_as_a_miss() {
        let items = vec![bucket()];
        let err = select_bucket(&items, Some(OrderItemId::generate())).unwrap_err();
        assert_eq!(err.code, ApiErrorCode::NotFound);
    }
}
