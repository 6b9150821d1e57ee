// SPDX-License-Identifier: Apache-2.0

//! Order ledger persistence.
//!
//! [`create_order`] is the durability point of checkout: the order header,
//! per-vendor items, purchased lines, stock decrements, and vendor metric
//! bumps all land in one transaction or not at all.

use crate::{codec, escape_like, Page, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};
use souk_model::{
    EmailAddress, FulfillmentStatus, Order, OrderId, OrderItem, OrderItemId, OrderLine,
    PaymentMethod, PaymentStatus, PhoneNumber, ProductId, ShippingAddress, Sku, VariantId,
    VendorId,
};
use std::collections::BTreeMap;

const ORDER_COLS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     ship_line1, ship_line2, ship_city, ship_state, ship_postal_code, ship_country, \
     payment_method, payment_status, subtotal, discount, total, created_at, updated_at, deleted_at";

struct OrderRow {
    id: String,
    order_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    ship_line1: String,
    ship_line2: Option<String>,
    ship_city: String,
    ship_state: String,
    ship_postal_code: String,
    ship_country: String,
    payment_method: String,
    payment_status: String,
    subtotal: i64,
    discount: i64,
    total: i64,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl OrderRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            order_number: row.get(1)?,
            customer_name: row.get(2)?,
            customer_email: row.get(3)?,
            customer_phone: row.get(4)?,
            ship_line1: row.get(5)?,
            ship_line2: row.get(6)?,
            ship_city: row.get(7)?,
            ship_state: row.get(8)?,
            ship_postal_code: row.get(9)?,
            ship_country: row.get(10)?,
            payment_method: row.get(11)?,
            payment_status: row.get(12)?,
            subtotal: row.get(13)?,
            discount: row.get(14)?,
            total: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
            deleted_at: row.get(18)?,
        })
    }

    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let map = |e: souk_model::ParseError| StoreError::Other(format!("corrupt order row: {e}"));
        Ok(Order {
            id: OrderId::parse(&self.id).map_err(map)?,
            order_number: self.order_number,
            customer_name: self.customer_name,
            customer_email: EmailAddress::parse(&self.customer_email).map_err(map)?,
            customer_phone: PhoneNumber::parse(&self.customer_phone).map_err(map)?,
            shipping: ShippingAddress {
                line1: self.ship_line1,
                line2: self.ship_line2,
                city: self.ship_city,
                state: self.ship_state,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            payment_method: PaymentMethod::parse(&self.payment_method).map_err(map)?,
            payment_status: PaymentStatus::parse(&self.payment_status).map_err(map)?,
            subtotal: codec::money(self.subtotal)?,
            discount: codec::money(self.discount)?,
            total: codec::money(self.total)?,
            items,
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

struct ItemRaw {
    id: String,
    order_id: String,
    vendor_id: Option<String>,
    subtotal: i64,
    commission: i64,
    vendor_earning: i64,
    status: String,
}

impl ItemRaw {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            order_id: row.get(1)?,
            vendor_id: row.get(2)?,
            subtotal: row.get(3)?,
            commission: row.get(4)?,
            vendor_earning: row.get(5)?,
            status: row.get(6)?,
        })
    }

    fn into_item(self, lines: Vec<OrderLine>) -> Result<OrderItem, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt order item: {e}"));
        if lines.is_empty() {
            return Err(StoreError::Other(format!(
                "corrupt order item {}: no lines",
                self.id
            )));
        }
        Ok(OrderItem {
            id: OrderItemId::parse(&self.id).map_err(map)?,
            vendor_id: self
                .vendor_id
                .as_deref()
                .map(VendorId::parse)
                .transpose()
                .map_err(map)?,
            lines,
            subtotal: codec::money(self.subtotal)?,
            commission: codec::money(self.commission)?,
            vendor_earning: codec::money(self.vendor_earning)?,
            status: FulfillmentStatus::parse(&self.status).map_err(map)?,
        })
    }
}

struct LineRaw {
    order_item_id: String,
    product_id: String,
    variant_id: Option<String>,
    name: String,
    sku: Option<String>,
    qty: i64,
    unit_price: i64,
    subtotal: i64,
}

impl LineRaw {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            order_item_id: row.get(0)?,
            product_id: row.get(1)?,
            variant_id: row.get(2)?,
            name: row.get(3)?,
            sku: row.get(4)?,
            qty: row.get(5)?,
            unit_price: row.get(6)?,
            subtotal: row.get(7)?,
        })
    }

    fn into_line(self) -> Result<OrderLine, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt order line: {e}"));
        Ok(OrderLine {
            product_id: ProductId::parse(&self.product_id).map_err(map)?,
            variant_id: self
                .variant_id
                .as_deref()
                .map(VariantId::parse)
                .transpose()
                .map_err(map)?,
            name: self.name,
            sku: self.sku.as_deref().map(Sku::parse).transpose().map_err(map)?,
            qty: u32::try_from(self.qty)
                .map_err(|_| StoreError::Other("corrupt order line qty".to_string()))?,
            unit_price: codec::money(self.unit_price)?,
            subtotal: codec::money(self.subtotal)?,
        })
    }
}

/// Persists a checked-out order in one transaction.
///
/// Every purchased line decrements its variant or product stock behind a
/// `stock >= qty` guard, so a concurrent sale of the last unit surfaces as
/// `Conflict` and rolls the whole order back. Vendor buckets bump the
/// owning vendor's running metrics in the same transaction.
pub fn create_order(conn: &mut Connection, order: &Order) -> Result<(), StoreError> {
    order
        .validate()
        .map_err(|e| StoreError::Other(format!("order failed validation: {e}")))?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO orders (id, order_number, customer_name, customer_email, customer_phone,
           ship_line1, ship_line2, ship_city, ship_state, ship_postal_code, ship_country,
           payment_method, payment_status, subtotal, discount, total,
           created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            order.id.to_string(),
            order.order_number,
            order.customer_name,
            order.customer_email.as_str(),
            order.customer_phone.as_str(),
            order.shipping.line1,
            order.shipping.line2,
            order.shipping.city,
            order.shipping.state,
            order.shipping.postal_code,
            order.shipping.country,
            order.payment_method.as_str(),
            order.payment_status.as_str(),
            order.subtotal.minor_units(),
            order.discount.minor_units(),
            order.total.minor_units(),
            codec::millis(order.created_at),
            codec::millis(order.updated_at),
            codec::millis_opt(order.deleted_at),
        ],
    )?;

    {
        let mut item_stmt = tx.prepare(
            "INSERT INTO order_items (id, order_id, vendor_id, subtotal, commission,
               vendor_earning, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let mut line_stmt = tx.prepare(
            "INSERT INTO order_lines (order_id, order_item_id, line_no, product_id, variant_id,
               name, sku, qty, unit_price, subtotal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        let mut product_guard = tx.prepare(
            "UPDATE products SET stock = stock - ?2, updated_at = ?3
             WHERE id = ?1 AND deleted_at IS NULL AND stock >= ?2",
        )?;
        let mut variant_guard = tx.prepare(
            "UPDATE product_variants SET stock = stock - ?2, updated_at = ?3
             WHERE id = ?1 AND deleted_at IS NULL AND stock >= ?2",
        )?;
        let mut vendor_bump = tx.prepare(
            "UPDATE vendors SET total_orders = total_orders + 1,
               gross_sales = gross_sales + ?2,
               total_earnings = total_earnings + ?3,
               last_order_at = ?4, updated_at = ?4
             WHERE id = ?1 AND deleted_at IS NULL",
        )?;

        let now = codec::millis(order.created_at);
        let mut line_no: i64 = 0;
        for item in &order.items {
            item_stmt.execute(params![
                item.id.to_string(),
                order.id.to_string(),
                item.vendor_id.as_ref().map(ToString::to_string),
                item.subtotal.minor_units(),
                item.commission.minor_units(),
                item.vendor_earning.minor_units(),
                item.status.as_str(),
                now,
                now,
            ])?;
            for line in &item.lines {
                line_no += 1;
                line_stmt.execute(params![
                    order.id.to_string(),
                    item.id.to_string(),
                    line_no,
                    line.product_id.to_string(),
                    line.variant_id.as_ref().map(ToString::to_string),
                    line.name,
                    line.sku.as_ref().map(|s| s.as_str().to_string()),
                    i64::from(line.qty),
                    line.unit_price.minor_units(),
                    line.subtotal.minor_units(),
                ])?;

                let qty = i64::from(line.qty);
                let changed = match &line.variant_id {
                    Some(variant_id) => {
                        variant_guard.execute(params![variant_id.to_string(), qty, now])?
                    }
                    None => product_guard.execute(params![line.product_id.to_string(), qty, now])?,
                };
                if changed == 0 {
                    return Err(StoreError::Conflict(match &line.variant_id {
                        Some(variant_id) => {
                            format!("insufficient stock for variant {variant_id}")
                        }
                        None => format!("insufficient stock for product {}", line.product_id),
                    }));
                }
            }
            if let Some(vendor_id) = &item.vendor_id {
                let changed = vendor_bump.execute(params![
                    vendor_id.to_string(),
                    item.subtotal.minor_units(),
                    item.vendor_earning.minor_units(),
                    now,
                ])?;
                if changed == 0 {
                    return Err(StoreError::Conflict(format!(
                        "vendor {vendor_id} is no longer available"
                    )));
                }
            }
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn order_by_id(conn: &Connection, id: &OrderId) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLS} FROM orders WHERE id = ?1 AND deleted_at IS NULL");
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params![id.to_string()], OrderRow::from_row)?;
    let mut headers = Vec::new();
    for raw in mapped {
        headers.push(raw.map_err(StoreError::from)?);
    }
    Ok(assemble(conn, headers)?.pop())
}

pub fn order_by_number(conn: &Connection, number: &str) -> Result<Option<Order>, StoreError> {
    let sql =
        format!("SELECT {ORDER_COLS} FROM orders WHERE order_number = ?1 AND deleted_at IS NULL");
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params![number], OrderRow::from_row)?;
    let mut headers = Vec::new();
    for raw in mapped {
        headers.push(raw.map_err(StoreError::from)?);
    }
    Ok(assemble(conn, headers)?.pop())
}

/// Attaches items and lines to a batch of order headers. Item order within
/// an order is the platform bucket first, then vendors by id, matching how
/// checkout emits buckets.
fn assemble(conn: &Connection, headers: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Value> = headers
        .iter()
        .map(|h| Value::Text(h.id.clone()))
        .collect();
    let placeholders = vec!["?"; ids.len()].join(", ");

    let sql = format!(
        "SELECT id, order_id, vendor_id, subtotal, commission, vendor_earning, status
         FROM order_items WHERE order_id IN ({placeholders})
         ORDER BY order_id, (vendor_id IS NOT NULL), vendor_id, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(ids.iter()), ItemRaw::from_row)?;
    let mut items_raw = Vec::new();
    for raw in mapped {
        items_raw.push(raw.map_err(StoreError::from)?);
    }

    let sql = format!(
        "SELECT order_item_id, product_id, variant_id, name, sku, qty, unit_price, subtotal
         FROM order_lines WHERE order_id IN ({placeholders})
         ORDER BY order_id, line_no"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(ids.iter()), LineRaw::from_row)?;
    let mut lines_by_item: BTreeMap<String, Vec<OrderLine>> = BTreeMap::new();
    for raw in mapped {
        let raw = raw.map_err(StoreError::from)?;
        let key = raw.order_item_id.clone();
        lines_by_item.entry(key).or_default().push(raw.into_line()?);
    }

    let mut items_by_order: BTreeMap<String, Vec<OrderItem>> = BTreeMap::new();
    for raw in items_raw {
        let order_id = raw.order_id.clone();
        let lines = lines_by_item.remove(&raw.id).unwrap_or_default();
        items_by_order
            .entry(order_id)
            .or_default()
            .push(raw.into_item(lines)?);
    }

    let mut orders = Vec::with_capacity(headers.len());
    for header in headers {
        let items = items_by_order.remove(&header.id).unwrap_or_default();
        orders.push(header.into_order(items)?);
    }
    Ok(orders)
}

#[derive(Debug, Clone, Default)]
pub struct OrderAdminFilter {
    /// Matches customer name, email, or the order number.
    pub q: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    /// Keeps orders where at least one vendor bucket sits in this state.
    pub fulfillment_status: Option<FulfillmentStatus>,
}

pub fn admin_list_orders(
    conn: &Connection,
    filter: &OrderAdminFilter,
    page: u32,
    per_page: u32,
) -> Result<Page<Order>, StoreError> {
    let mut where_parts = vec!["deleted_at IS NULL".to_string()];
    let mut filter_params: Vec<Value> = Vec::new();
    if let Some(q) = &filter.q {
        where_parts.push(
            "(customer_name LIKE ? ESCAPE '!' OR customer_email LIKE ? ESCAPE '!' \
             OR order_number LIKE ? ESCAPE '!')"
                .to_string(),
        );
        let needle = format!("%{}%", escape_like(q));
        filter_params.push(Value::Text(needle.clone()));
        filter_params.push(Value::Text(needle.clone()));
        filter_params.push(Value::Text(needle));
    }
    if let Some(status) = filter.payment_status {
        where_parts.push("payment_status = ?".to_string());
        filter_params.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(status) = filter.fulfillment_status {
        where_parts.push(
            "EXISTS (SELECT 1 FROM order_items oi WHERE oi.order_id = orders.id AND oi.status = ?)"
                .to_string(),
        );
        filter_params.push(Value::Text(status.as_str().to_string()));
    }
    let where_sql = where_parts.join(" AND ");

    let total: i64 = conn
        .prepare(&format!("SELECT COUNT(*) FROM orders WHERE {where_sql}"))?
        .query_row(params_from_iter(filter_params.iter()), |row| row.get(0))?;

    let mut params_all = filter_params;
    params_all.push(Value::Integer(i64::from(per_page)));
    params_all.push(Value::Integer(i64::from(page.saturating_sub(1)) * i64::from(per_page)));
    let sql = format!(
        "SELECT {ORDER_COLS} FROM orders WHERE {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(params_all.iter()), OrderRow::from_row)?;
    let mut headers = Vec::new();
    for raw in mapped {
        headers.push(raw.map_err(StoreError::from)?);
    }
    Ok(Page {
        rows: assemble(conn, headers)?,
        total: u64::try_from(total).unwrap_or(0),
        page,
        per_page,
    })
}

/// One order as a vendor sees it: the header fields needed to ship, plus
/// only that vendor's bucket. Sibling buckets stay invisible.
#[derive(Debug, Clone)]
pub struct VendorOrderRow {
    pub order_id: OrderId,
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer_name: String,
    pub shipping: ShippingAddress,
    pub item: OrderItem,
}

#[derive(Debug, Clone)]
pub struct VendorOrderPage {
    pub rows: Vec<VendorOrderRow>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

pub fn vendor_orders(
    conn: &Connection,
    vendor_id: &VendorId,
    page: u32,
    per_page: u32,
) -> Result<VendorOrderPage, StoreError> {
    let total: i64 = conn
        .prepare(
            "SELECT COUNT(*) FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE oi.vendor_id = ?1 AND o.deleted_at IS NULL",
        )?
        .query_row(params![vendor_id.to_string()], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT oi.id, oi.order_id, oi.vendor_id, oi.subtotal, oi.commission, oi.vendor_earning,
                oi.status, o.order_number, o.customer_name, o.ship_line1, o.ship_line2, o.ship_city,
                o.ship_state, o.ship_postal_code, o.ship_country, o.payment_method,
                o.payment_status, o.created_at
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE oi.vendor_id = ?1 AND o.deleted_at IS NULL
         ORDER BY o.created_at DESC, o.id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);
    let mapped = stmt.query_map(
        params![vendor_id.to_string(), i64::from(per_page), offset],
        |row| {
            let item = ItemRaw::from_row(row)?;
            let order_number: String = row.get(7)?;
            let customer_name: String = row.get(8)?;
            let ship_line1: String = row.get(9)?;
            let ship_line2: Option<String> = row.get(10)?;
            let ship_city: String = row.get(11)?;
            let ship_state: String = row.get(12)?;
            let ship_postal_code: String = row.get(13)?;
            let ship_country: String = row.get(14)?;
            let payment_method: String = row.get(15)?;
            let payment_status: String = row.get(16)?;
            let created_at: i64 = row.get(17)?;
            Ok((
                item,
                order_number,
                customer_name,
                ship_line1,
                ship_line2,
                ship_city,
                ship_state,
                ship_postal_code,
                ship_country,
                payment_method,
                payment_status,
                created_at,
            ))
        },
    )?;
    let mut raws = Vec::new();
    for raw in mapped {
        raws.push(raw.map_err(StoreError::from)?);
    }

    let item_ids: Vec<Value> = raws
        .iter()
        .map(|(item, ..)| Value::Text(item.id.clone()))
        .collect();
    let mut lines_by_item: BTreeMap<String, Vec<OrderLine>> = BTreeMap::new();
    if !item_ids.is_empty() {
        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql = format!(
            "SELECT order_item_id, product_id, variant_id, name, sku, qty, unit_price, subtotal
             FROM order_lines WHERE order_item_id IN ({placeholders})
             ORDER BY order_id, line_no"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params_from_iter(item_ids.iter()), LineRaw::from_row)?;
        for raw in mapped {
            let raw = raw.map_err(StoreError::from)?;
            let key = raw.order_item_id.clone();
            lines_by_item.entry(key).or_default().push(raw.into_line()?);
        }
    }

    let map = |e: souk_model::ParseError| StoreError::Other(format!("corrupt order row: {e}"));
    let mut rows = Vec::with_capacity(raws.len());
    for (
        item,
        order_number,
        customer_name,
        ship_line1,
        ship_line2,
        ship_city,
        ship_state,
        ship_postal_code,
        ship_country,
        payment_method,
        payment_status,
        created_at,
    ) in raws
    {
        let order_id = OrderId::parse(&item.order_id).map_err(map)?;
        let lines = lines_by_item.remove(&item.id).unwrap_or_default();
        rows.push(VendorOrderRow {
            order_id,
            order_number,
            placed_at: codec::datetime(created_at),
            payment_method: PaymentMethod::parse(&payment_method).map_err(map)?,
            payment_status: PaymentStatus::parse(&payment_status).map_err(map)?,
            customer_name,
            shipping: ShippingAddress {
                line1: ship_line1,
                line2: ship_line2,
                city: ship_city,
                state: ship_state,
                postal_code: ship_postal_code,
                country: ship_country,
            },
            item: item.into_item(lines)?,
        });
    }
    Ok(VendorOrderPage {
        rows,
        total: u64::try_from(total).unwrap_or(0),
        page,
        per_page,
    })
}

/// Fetches one bucket together with its parent order id, for ownership
/// checks before a status move.
pub fn order_item_by_id(
    conn: &Connection,
    id: &OrderItemId,
) -> Result<Option<(OrderId, OrderItem)>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT oi.id, oi.order_id, oi.vendor_id, oi.subtotal, oi.commission, oi.vendor_earning,
                oi.status
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE oi.id = ?1 AND o.deleted_at IS NULL",
    )?;
    let mut rows = stmt.query(params![id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let raw = ItemRaw::from_row(row).map_err(StoreError::from)?;
    drop(rows);
    drop(stmt);

    let mut stmt = conn.prepare(
        "SELECT order_item_id, product_id, variant_id, name, sku, qty, unit_price, subtotal
         FROM order_lines WHERE order_item_id = ?1 ORDER BY line_no",
    )?;
    let mapped = stmt.query_map(params![id.to_string()], LineRaw::from_row)?;
    let mut lines = Vec::new();
    for line in mapped {
        lines.push(line.map_err(StoreError::from)?.into_line()?);
    }

    let map = |e: souk_model::ParseError| StoreError::Other(format!("corrupt order row: {e}"));
    let order_id = OrderId::parse(&raw.order_id).map_err(map)?;
    Ok(Some((order_id, raw.into_item(lines)?)))
}

/// Moves a vendor bucket along the fulfillment pipeline. Refuses moves the
/// pipeline does not allow with `Conflict`.
pub fn set_item_status(
    conn: &Connection,
    id: &OrderItemId,
    next: FulfillmentStatus,
    at: DateTime<Utc>,
) -> Result<Option<OrderItem>, StoreError> {
    let Some((_, item)) = order_item_by_id(conn, id)? else {
        return Ok(None);
    };
    if !item.status.transition_allowed(next) {
        return Err(StoreError::Conflict(format!(
            "fulfillment cannot move from {} to {}",
            item.status.as_str(),
            next.as_str()
        )));
    }
    conn.execute(
        "UPDATE order_items SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), next.as_str(), codec::millis(at)],
    )?;
    Ok(order_item_by_id(conn, id)?.map(|(_, item)| item))
}

/// Marks payment received. The only legal move is pending to paid.
pub fn set_payment_status(
    conn: &Connection,
    id: &OrderId,
    next: PaymentStatus,
    at: DateTime<Utc>,
) -> Result<Option<Order>, StoreError> {
    let Some(order) = order_by_id(conn, id)? else {
        return Ok(None);
    };
    if !(order.payment_status == PaymentStatus::Pending && next == PaymentStatus::Paid) {
        return Err(StoreError::Conflict(format!(
            "payment status cannot move from {} to {}",
            order.payment_status.as_str(),
            next.as_str()
        )));
    }
    conn.execute(
        "UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string(), next.as_str(), codec::millis(at)],
    )?;
    order_by_id(conn, id)
}
