// SPDX-License-Identifier: Apache-2.0

use crate::{codec, Page, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};
use souk_model::{
    BankDetails, CommissionRate, EmailAddress, PhoneNumber, Slug, Vendor, VendorId,
    VendorMetrics, VendorStatus,
};

const VENDOR_COLS: &str = "id, business_name, slug, contact_email, phone, description, status, \
     commission_rate_bps, bank_account_name, bank_account_number, bank_name, \
     total_orders, gross_sales, total_earnings, last_order_at, created_at, updated_at, deleted_at";

struct VendorRow {
    id: String,
    business_name: String,
    slug: String,
    contact_email: String,
    phone: Option<String>,
    description: Option<String>,
    status: String,
    commission_rate_bps: i64,
    bank_account_name: Option<String>,
    bank_account_number: Option<String>,
    bank_name: Option<String>,
    total_orders: i64,
    gross_sales: i64,
    total_earnings: i64,
    last_order_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl VendorRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            business_name: row.get(1)?,
            slug: row.get(2)?,
            contact_email: row.get(3)?,
            phone: row.get(4)?,
            description: row.get(5)?,
            status: row.get(6)?,
            commission_rate_bps: row.get(7)?,
            bank_account_name: row.get(8)?,
            bank_account_number: row.get(9)?,
            bank_name: row.get(10)?,
            total_orders: row.get(11)?,
            gross_sales: row.get(12)?,
            total_earnings: row.get(13)?,
            last_order_at: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
            deleted_at: row.get(17)?,
        })
    }

    fn into_vendor(self) -> Result<Vendor, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt vendor row: {e}"));
        let rate_bps = u32::try_from(self.commission_rate_bps)
            .map_err(|_| StoreError::Other("corrupt vendor rate".to_string()))?;
        Ok(Vendor {
            id: VendorId::parse(&self.id).map_err(map)?,
            business_name: self.business_name,
            slug: Slug::parse(&self.slug).map_err(map)?,
            contact_email: EmailAddress::parse(&self.contact_email).map_err(map)?,
            phone: self
                .phone
                .as_deref()
                .map(PhoneNumber::parse)
                .transpose()
                .map_err(map)?,
            description: self.description,
            status: VendorStatus::parse(&self.status).map_err(map)?,
            commission_rate: CommissionRate::from_bps(rate_bps).map_err(map)?,
            bank: BankDetails {
                account_name: self.bank_account_name,
                account_number: self.bank_account_number,
                bank_name: self.bank_name,
            },
            metrics: VendorMetrics {
                total_orders: u64::try_from(self.total_orders.max(0)).unwrap_or(0),
                gross_sales: codec::money(self.gross_sales)?,
                total_earnings: codec::money(self.total_earnings)?,
                last_order_at: codec::datetime_opt(self.last_order_at),
            },
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

pub fn insert_vendor(conn: &Connection, vendor: &Vendor) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO vendors (id, business_name, slug, contact_email, phone, description, status,
           commission_rate_bps, bank_account_name, bank_account_number, bank_name,
           total_orders, gross_sales, total_earnings, last_order_at, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            vendor.id.to_string(),
            vendor.business_name,
            vendor.slug.as_str(),
            vendor.contact_email.as_str(),
            vendor.phone.as_ref().map(|p| p.as_str().to_string()),
            vendor.description,
            vendor.status.as_str(),
            i64::from(vendor.commission_rate.as_bps()),
            vendor.bank.account_name,
            vendor.bank.account_number,
            vendor.bank.bank_name,
            i64::try_from(vendor.metrics.total_orders).unwrap_or(i64::MAX),
            vendor.metrics.gross_sales.minor_units(),
            vendor.metrics.total_earnings.minor_units(),
            codec::millis_opt(vendor.metrics.last_order_at),
            codec::millis(vendor.created_at),
            codec::millis(vendor.updated_at),
            codec::millis_opt(vendor.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn vendor_by_id(conn: &Connection, id: &VendorId) -> Result<Option<Vendor>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {VENDOR_COLS} FROM vendors WHERE id = ?1 AND deleted_at IS NULL"),
        &id.to_string(),
    )
}

pub fn vendor_by_slug(conn: &Connection, slug: &Slug) -> Result<Option<Vendor>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {VENDOR_COLS} FROM vendors WHERE slug = ?1 AND deleted_at IS NULL"),
        slug.as_str(),
    )
}

fn fetch_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<Vendor>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![key])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    VendorRow::from_row(row)
        .map_err(StoreError::from)?
        .into_vendor()
        .map(Some)
}

pub fn list_vendors(
    conn: &Connection,
    status: Option<VendorStatus>,
    page: u32,
    per_page: u32,
) -> Result<Page<Vendor>, StoreError> {
    let mut where_parts = vec!["deleted_at IS NULL".to_string()];
    let mut filter_params: Vec<Value> = Vec::new();
    if let Some(status) = status {
        where_parts.push("status = ?".to_string());
        filter_params.push(Value::Text(status.as_str().to_string()));
    }
    let where_sql = where_parts.join(" AND ");

    let total: i64 = conn
        .prepare(&format!("SELECT COUNT(*) FROM vendors WHERE {where_sql}"))?
        .query_row(params_from_iter(filter_params.iter()), |row| row.get(0))?;

    let mut params_all = filter_params;
    params_all.push(Value::Integer(i64::from(per_page)));
    params_all.push(Value::Integer(i64::from(page.saturating_sub(1)) * i64::from(per_page)));
    let sql = format!(
        "SELECT {VENDOR_COLS} FROM vendors WHERE {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(params_all.iter()), VendorRow::from_row)?;
    let mut rows = Vec::new();
    for raw in mapped {
        rows.push(raw.map_err(StoreError::from)?.into_vendor()?);
    }
    Ok(Page {
        rows,
        total: u64::try_from(total).unwrap_or(0),
        page,
        per_page,
    })
}

/// Fields an admin or the vendor may edit in place; status moves through
/// [`set_vendor_status`] so transition rules stay in one spot.
#[derive(Debug, Clone, Default)]
pub struct VendorUpdate {
    pub business_name: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub description: Option<String>,
    pub bank: Option<BankDetails>,
}

pub fn update_vendor(
    conn: &Connection,
    id: &VendorId,
    update: &VendorUpdate,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let mut sets = vec!["updated_at = ?".to_string()];
    let mut values: Vec<Value> = vec![Value::Integer(codec::millis(at))];
    if let Some(name) = &update.business_name {
        sets.push("business_name = ?".to_string());
        values.push(Value::Text(name.clone()));
    }
    if let Some(phone) = &update.phone {
        sets.push("phone = ?".to_string());
        values.push(Value::Text(phone.as_str().to_string()));
    }
    if let Some(description) = &update.description {
        sets.push("description = ?".to_string());
        values.push(Value::Text(description.clone()));
    }
    if let Some(bank) = &update.bank {
        sets.push("bank_account_name = ?".to_string());
        values.push(match &bank.account_name {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
        sets.push("bank_account_number = ?".to_string());
        values.push(match &bank.account_number {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
        sets.push("bank_name = ?".to_string());
        values.push(match &bank.bank_name {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    values.push(Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE vendors SET {} WHERE id = ? AND deleted_at IS NULL",
        sets.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(changed == 1)
}

/// Applies a moderation decision. Returns the stored vendor on success;
/// `Conflict` when the move is not allowed from the current status.
pub fn set_vendor_status(
    conn: &Connection,
    id: &VendorId,
    next: VendorStatus,
    rate: Option<CommissionRate>,
    at: DateTime<Utc>,
) -> Result<Option<Vendor>, StoreError> {
    let Some(current) = vendor_by_id(conn, id)? else {
        return Ok(None);
    };
    if !current.status.transition_allowed(next) {
        return Err(StoreError::Conflict(format!(
            "vendor status cannot move from {} to {}",
            current.status.as_str(),
            next.as_str()
        )));
    }
    let rate_bps = rate.unwrap_or(current.commission_rate).as_bps();
    conn.execute(
        "UPDATE vendors SET status = ?2, commission_rate_bps = ?3, updated_at = ?4
         WHERE id = ?1 AND deleted_at IS NULL",
        params![
            id.to_string(),
            next.as_str(),
            i64::from(rate_bps),
            codec::millis(at)
        ],
    )?;
    vendor_by_id(conn, id)
}

/// Recomputes the running metrics from the order ledger. The CLI uses this
/// to audit the transactional increments.
pub fn recompute_vendor_metrics(
    conn: &Connection,
    id: &VendorId,
) -> Result<VendorMetrics, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(DISTINCT oi.order_id),
                COALESCE(SUM(oi.subtotal), 0),
                COALESCE(SUM(oi.vendor_earning), 0),
                MAX(o.created_at)
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE oi.vendor_id = ?1 AND o.deleted_at IS NULL",
    )?;
    let (orders, sales, earnings, last_at): (i64, i64, i64, Option<i64>) =
        stmt.query_row(params![id.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
    Ok(VendorMetrics {
        total_orders: u64::try_from(orders).unwrap_or(0),
        gross_sales: codec::money(sales)?,
        total_earnings: codec::money(earnings)?,
        last_order_at: codec::datetime_opt(last_at),
    })
}
