//! Order creation pipeline: validate the payload, resolve cart lines
//! against the live catalog, split per vendor, persist atomically, then
//! fire the best-effort confirmation email.
//!
//! Catalog reads and the order write share one connection so the stock
//! pre-check and the transactional decrement see the same database.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::{json, Value};
use souk_api::convert::shipping_from;
use souk_api::dto::{CartLineRequest, CreateOrderRequest};
use souk_api::ApiError;
use souk_checkout::{split_cart, CheckoutError, ResolvedLine};
use souk_model::{
    order_number_for, parse_name, parse_qty, CommissionRate, EmailAddress, FulfillmentStatus,
    Money, Order, OrderId, OrderItem, OrderItemId, PaymentMethod, PaymentStatus, PhoneNumber,
    ProductId, ProductVariant, ShippingAddress, VariantId,
};
use souk_store::{orders, products, vendors};
use tracing::warn;

use crate::mailer::render_order_email;
use crate::{run_store, store_fail, AppState};

#[derive(Debug)]
pub(crate) struct CustomerInfo {
    pub name: String,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub shipping: ShippingAddress,
}

/// Validates everything except the cart lines. Failures collect into a
/// single `validation` error so the client sees every bad field at once.
pub(crate) fn parse_customer(
    request: &CreateOrderRequest,
) -> Result<(CustomerInfo, PaymentMethod), ApiError> {
    let mut field_errors: Vec<Value> = Vec::new();
    let mut fail = |field: &str, reason: String| {
        field_errors.push(json!({ "field": field, "reason": reason }));
    };

    let name = match parse_name("customerName", &request.customer_name) {
        Ok(name) => Some(name),
        Err(err) => {
            fail("customerName", err.to_string());
            None
        }
    };
    let email = match EmailAddress::parse(&request.customer_email) {
        Ok(email) => Some(email),
        Err(err) => {
            fail("customerEmail", err.to_string());
            None
        }
    };
    let phone = match PhoneNumber::parse(&request.customer_phone) {
        Ok(phone) => Some(phone),
        Err(err) => {
            fail("customerPhone", err.to_string());
            None
        }
    };
    let shipping = shipping_from(&request.shipping_address);
    if let Err(err) = shipping.validate() {
        fail("shippingAddress", err.to_string());
    }
    let payment_method = match PaymentMethod::parse(&request.payment_method) {
        Ok(method) => Some(method),
        Err(err) => {
            fail("paymentMethod", err.to_string());
            None
        }
    };

    if !field_errors.is_empty() {
        return Err(ApiError::validation_failed(Value::Array(field_errors)));
    }
    // Unwraps are unreachable: any None pushed a field error above.
    let customer = CustomerInfo {
        name: name.unwrap_or_default(),
        email: email.ok_or_else(ApiError::internal)?,
        phone: phone.ok_or_else(ApiError::internal)?,
        shipping,
    };
    Ok((customer, payment_method.ok_or_else(ApiError::internal)?))
}

fn variant_line_name(product_name: &str, variant: &ProductVariant) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(color) = variant.color.as_deref() {
        parts.push(color);
    }
    if let Some(size) = variant.size.as_deref() {
        parts.push(size);
    }
    if parts.is_empty() {
        product_name.to_string()
    } else {
        format!("{product_name} ({})", parts.join(", "))
    }
}

/// Resolves cart lines against the catalog, re-pricing every line from
/// the stored selling price. Client-sent prices never enter an order.
///
/// A product whose vendor is not currently approved resolves the same as
/// a missing product: the storefront must not sell it, and the response
/// must not reveal the vendor's status.
pub(crate) fn resolve_cart(
    conn: &Connection,
    cart: &[CartLineRequest],
) -> Result<Vec<ResolvedLine>, ApiError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    let mut resolved = Vec::with_capacity(cart.len());
    for line in cart {
        let qty =
            parse_qty(line.qty).map_err(|err| ApiError::invalid_field("qty", err.to_string()))?;
        let product_id = ProductId::parse(&line.product_id)
            .map_err(|err| ApiError::invalid_field("productId", err.to_string()))?;
        let product = products::product_by_id(conn, &product_id)
            .map_err(store_fail)?
            .filter(|p| p.is_active)
            .ok_or(CheckoutError::UnknownProduct { product_id })?;

        let mut vendor_rate: Option<CommissionRate> = None;
        if let Some(vendor_id) = product.vendor_id {
            let vendor = vendors::vendor_by_id(conn, &vendor_id)
                .map_err(store_fail)?
                .filter(|v| v.is_approved())
                .ok_or(CheckoutError::UnknownProduct { product_id })?;
            vendor_rate = Some(vendor.commission_rate);
        }

        match line.variant_id.as_deref() {
            Some(raw) => {
                let variant_id = VariantId::parse(raw)
                    .map_err(|err| ApiError::invalid_field("variantId", err.to_string()))?;
                let variant = products::variant_by_id(conn, &variant_id)
                    .map_err(store_fail)?
                    .filter(|v| v.product_id == product.id)
                    .ok_or(CheckoutError::UnknownVariant { variant_id })?;
                if variant.stock < qty {
                    return Err(CheckoutError::OutOfStock {
                        product_id,
                        variant_id: Some(variant_id),
                        requested: qty,
                        available: variant.stock,
                    }
                    .into());
                }
                resolved.push(ResolvedLine {
                    product_id,
                    variant_id: Some(variant_id),
                    name: variant_line_name(&product.name, &variant),
                    sku: Some(variant.sku.clone()),
                    vendor_id: product.vendor_id,
                    vendor_rate,
                    unit_price: variant.selling_price,
                    qty,
                });
            }
            None => {
                if product.stock < qty {
                    return Err(CheckoutError::OutOfStock {
                        product_id,
                        variant_id: None,
                        requested: qty,
                        available: product.stock,
                    }
                    .into());
                }
                resolved.push(ResolvedLine {
                    product_id,
                    variant_id: None,
                    name: product.name.clone(),
                    sku: None,
                    vendor_id: product.vendor_id,
                    vendor_rate,
                    unit_price: product.selling_price,
                    qty,
                });
            }
        }
    }
    Ok(resolved)
}

/// Splits the resolved cart into per-vendor buckets and assembles the
/// order header. Payment starts `pending` and every bucket `placed`.
pub(crate) fn build_order(
    customer: CustomerInfo,
    payment_method: PaymentMethod,
    resolved: &[ResolvedLine],
    default_rate: CommissionRate,
    now: DateTime<Utc>,
) -> Result<Order, ApiError> {
    let split = split_cart(resolved, default_rate)?;
    let items: Vec<OrderItem> = split
        .buckets
        .into_iter()
        .map(|bucket| OrderItem {
            id: OrderItemId::generate(),
            vendor_id: bucket.vendor_id,
            lines: bucket.lines,
            subtotal: bucket.subtotal,
            commission: bucket.commission,
            vendor_earning: bucket.vendor_earning,
            status: FulfillmentStatus::Placed,
        })
        .collect();

    let id = OrderId::generate();
    let order = Order {
        id,
        order_number: order_number_for(&id),
        customer_name: customer.name,
        customer_email: customer.email,
        customer_phone: customer.phone,
        shipping: customer.shipping,
        payment_method,
        payment_status: PaymentStatus::Pending,
        subtotal: split.subtotal,
        discount: Money::ZERO,
        total: split.subtotal,
        items,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    order.validate()?;
    Ok(order)
}

/// Runs the whole pipeline. The resolve, split, and insert happen on one
/// blocking store call; the confirmation email happens after the commit
/// and never fails the request.
pub(crate) async fn place_order(
    state: &AppState,
    request: CreateOrderRequest,
) -> Result<Order, ApiError> {
    let (customer, payment_method) = parse_customer(&request)?;
    let cart = request.products;
    let default_rate = state.config.default_commission;
    let now = Utc::now();

    let order = run_store(state, move |conn| {
        let resolved = resolve_cart(conn, &cart)?;
        let order = build_order(customer, payment_method, &resolved, default_rate, now)?;
        orders::create_order(conn, &order).map_err(store_fail)?;
        Ok(order)
    })
    .await?;

    let email = render_order_email(&order, &state.config.store_name, &state.config.mail.from);
    if let Err(err) = state.mailer.send(&email).await {
        warn!(
            order_number = %order.order_number,
            error = %err,
            "order confirmation email failed; the order stands"
        );
    }
    Ok(order)
}
