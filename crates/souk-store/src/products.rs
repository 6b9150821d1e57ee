// SPDX-License-Identifier: Apache-2.0

use crate::cursor::{self, CatalogPageRequest, CursorPayload};
use crate::{codec, escape_like, Page, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};
use souk_model::{
    CategoryId, Money, Product, ProductId, ProductVariant, Sku, Slug, VariantId, VendorId,
};

pub const STOREFRONT_DEFAULT_LIMIT: usize = 24;
pub const STOREFRONT_MAX_LIMIT: usize = 100;

const PRODUCT_COLS: &str = "id, name, slug, description, category_id, vendor_id, mrp, \
     selling_price, media, stock, is_active, is_featured, created_at, updated_at, deleted_at";

const VARIANT_COLS: &str = "id, product_id, color, size, sku, mrp, selling_price, stock, \
     image_url, created_at, updated_at, deleted_at";

fn product_cols(prefix: &str) -> String {
    PRODUCT_COLS
        .split(", ")
        .map(|c| format!("{prefix}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

struct ProductRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    category_id: String,
    vendor_id: Option<String>,
    mrp: i64,
    selling_price: i64,
    media: String,
    stock: i64,
    is_active: i64,
    is_featured: i64,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl ProductRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            category_id: row.get(4)?,
            vendor_id: row.get(5)?,
            mrp: row.get(6)?,
            selling_price: row.get(7)?,
            media: row.get(8)?,
            stock: row.get(9)?,
            is_active: row.get(10)?,
            is_featured: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            deleted_at: row.get(14)?,
        })
    }

    fn into_product(self) -> Result<Product, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt product row: {e}"));
        let media: Vec<String> = serde_json::from_str(&self.media)
            .map_err(|e| StoreError::Other(format!("corrupt product media: {e}")))?;
        Ok(Product {
            id: ProductId::parse(&self.id).map_err(map)?,
            name: self.name,
            slug: Slug::parse(&self.slug).map_err(map)?,
            description: self.description,
            category_id: CategoryId::parse(&self.category_id).map_err(map)?,
            vendor_id: self
                .vendor_id
                .as_deref()
                .map(VendorId::parse)
                .transpose()
                .map_err(map)?,
            mrp: codec::money(self.mrp)?,
            selling_price: codec::money(self.selling_price)?,
            media,
            stock: codec::stock(self.stock)?,
            is_active: self.is_active != 0,
            is_featured: self.is_featured != 0,
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

pub fn insert_product(conn: &Connection, product: &Product) -> Result<(), StoreError> {
    let media = serde_json::to_string(&product.media)
        .map_err(|e| StoreError::Other(format!("encode product media: {e}")))?;
    conn.execute(
        "INSERT INTO products (id, name, slug, description, category_id, vendor_id, mrp,
           selling_price, media, stock, is_active, is_featured, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            product.id.to_string(),
            product.name,
            product.slug.as_str(),
            product.description,
            product.category_id.to_string(),
            product.vendor_id.as_ref().map(ToString::to_string),
            product.mrp.minor_units(),
            product.selling_price.minor_units(),
            media,
            i64::from(product.stock),
            i64::from(product.is_active),
            i64::from(product.is_featured),
            codec::millis(product.created_at),
            codec::millis(product.updated_at),
            codec::millis_opt(product.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn product_by_id(conn: &Connection, id: &ProductId) -> Result<Option<Product>, StoreError> {
    let sql = format!("SELECT {PRODUCT_COLS} FROM products WHERE id = ?1 AND deleted_at IS NULL");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    ProductRow::from_row(row)
        .map_err(StoreError::from)?
        .into_product()
        .map(Some)
}

/// Storefront detail lookup: only active products whose owner is the
/// platform or an approved vendor are visible to shoppers.
pub fn product_by_slug(conn: &Connection, slug: &Slug) -> Result<Option<Product>, StoreError> {
    let sql = format!(
        "SELECT {} FROM products p
         LEFT JOIN vendors v ON v.id = p.vendor_id AND v.deleted_at IS NULL
         WHERE p.slug = ?1 AND p.deleted_at IS NULL AND p.is_active = 1
           AND (p.vendor_id IS NULL OR v.status = 'approved')",
        product_cols("p")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![slug.as_str()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    ProductRow::from_row(row)
        .map_err(StoreError::from)?
        .into_product()
        .map(Some)
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<CategoryId>,
    pub mrp: Option<Money>,
    pub selling_price: Option<Money>,
    pub media: Option<Vec<String>>,
    pub stock: Option<u32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Applies the patch columns. Callers merge and validate the domain value
/// first; the store does not re-check cross-field price rules.
pub fn update_product(
    conn: &Connection,
    id: &ProductId,
    update: &ProductUpdate,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let mut sets = vec!["updated_at = ?".to_string()];
    let mut values: Vec<Value> = vec![Value::Integer(codec::millis(at))];
    if let Some(name) = &update.name {
        sets.push("name = ?".to_string());
        values.push(Value::Text(name.clone()));
    }
    if let Some(description) = &update.description {
        sets.push("description = ?".to_string());
        values.push(match description {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    if let Some(category_id) = &update.category_id {
        sets.push("category_id = ?".to_string());
        values.push(Value::Text(category_id.to_string()));
    }
    if let Some(mrp) = update.mrp {
        sets.push("mrp = ?".to_string());
        values.push(Value::Integer(mrp.minor_units()));
    }
    if let Some(selling_price) = update.selling_price {
        sets.push("selling_price = ?".to_string());
        values.push(Value::Integer(selling_price.minor_units()));
    }
    if let Some(media) = &update.media {
        let encoded = serde_json::to_string(media)
            .map_err(|e| StoreError::Other(format!("encode product media: {e}")))?;
        sets.push("media = ?".to_string());
        values.push(Value::Text(encoded));
    }
    if let Some(stock) = update.stock {
        sets.push("stock = ?".to_string());
        values.push(Value::Integer(i64::from(stock)));
    }
    if let Some(is_active) = update.is_active {
        sets.push("is_active = ?".to_string());
        values.push(Value::Integer(i64::from(is_active)));
    }
    if let Some(is_featured) = update.is_featured {
        sets.push("is_featured = ?".to_string());
        values.push(Value::Integer(i64::from(is_featured)));
    }
    values.push(Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE products SET {} WHERE id = ? AND deleted_at IS NULL",
        sets.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(changed == 1)
}

/// Retires a product and every variant under it in one statement pair.
pub fn soft_delete_product(
    conn: &Connection,
    id: &ProductId,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let millis = codec::millis(at);
    let changed = conn.execute(
        "UPDATE products SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string(), millis],
    )?;
    if changed == 1 {
        conn.execute(
            "UPDATE product_variants SET deleted_at = ?2, updated_at = ?2
             WHERE product_id = ?1 AND deleted_at IS NULL",
            params![id.to_string(), millis],
        )?;
    }
    Ok(changed == 1)
}

#[derive(Debug, Clone, Default)]
pub struct ProductAdminFilter {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub vendor_id: Option<VendorId>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

pub fn admin_list_products(
    conn: &Connection,
    filter: &ProductAdminFilter,
    page: u32,
    per_page: u32,
) -> Result<Page<Product>, StoreError> {
    let mut where_parts = vec!["deleted_at IS NULL".to_string()];
    let mut filter_params: Vec<Value> = Vec::new();
    if let Some(q) = &filter.q {
        where_parts.push("(name LIKE ? ESCAPE '!' OR slug LIKE ? ESCAPE '!')".to_string());
        let needle = format!("%{}%", escape_like(q));
        filter_params.push(Value::Text(needle.clone()));
        filter_params.push(Value::Text(needle));
    }
    if let Some(category_id) = &filter.category_id {
        where_parts.push("category_id = ?".to_string());
        filter_params.push(Value::Text(category_id.to_string()));
    }
    if let Some(vendor_id) = &filter.vendor_id {
        where_parts.push("vendor_id = ?".to_string());
        filter_params.push(Value::Text(vendor_id.to_string()));
    }
    if let Some(is_active) = filter.is_active {
        where_parts.push("is_active = ?".to_string());
        filter_params.push(Value::Integer(i64::from(is_active)));
    }
    if let Some(is_featured) = filter.is_featured {
        where_parts.push("is_featured = ?".to_string());
        filter_params.push(Value::Integer(i64::from(is_featured)));
    }
    let where_sql = where_parts.join(" AND ");

    let total: i64 = conn
        .prepare(&format!("SELECT COUNT(*) FROM products WHERE {where_sql}"))?
        .query_row(params_from_iter(filter_params.iter()), |row| row.get(0))?;

    let mut params_all = filter_params;
    params_all.push(Value::Integer(i64::from(per_page)));
    params_all.push(Value::Integer(i64::from(page.saturating_sub(1)) * i64::from(per_page)));
    let sql = format!(
        "SELECT {PRODUCT_COLS} FROM products WHERE {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(params_all.iter()), ProductRow::from_row)?;
    let mut rows = Vec::new();
    for raw in mapped {
        rows.push(raw.map_err(StoreError::from)?.into_product()?);
    }
    Ok(Page {
        rows,
        total: u64::try_from(total).unwrap_or(0),
        page,
        per_page,
    })
}

/// One storefront page plus the cursor for the next, `None` at the end.
#[derive(Debug, Clone)]
pub struct StorefrontPage {
    pub rows: Vec<Product>,
    pub next_cursor: Option<String>,
}

/// Keyset walk over the storefront in newest-first order. The cursor is
/// HMAC signed and bound to the filter, so a stale or edited token pages
/// nothing but an `InvalidCursor` error.
pub fn storefront_products(
    conn: &Connection,
    request: &CatalogPageRequest,
    cursor_secret: &[u8],
) -> Result<StorefrontPage, StoreError> {
    let limit = request.limit.clamp(1, STOREFRONT_MAX_LIMIT);
    let filter = &request.filter;
    let filter_hash = cursor::filter_hash(filter)?;

    let mut where_parts = vec![
        "p.deleted_at IS NULL".to_string(),
        "p.is_active = 1".to_string(),
        "(p.vendor_id IS NULL OR v.status = 'approved')".to_string(),
    ];
    let mut sql_params: Vec<Value> = Vec::new();
    if let Some(q) = &filter.q {
        where_parts.push("(p.name LIKE ? ESCAPE '!' OR p.description LIKE ? ESCAPE '!')".to_string());
        let needle = format!("%{}%", escape_like(q));
        sql_params.push(Value::Text(needle.clone()));
        sql_params.push(Value::Text(needle));
    }
    if let Some(category_id) = &filter.category_id {
        where_parts.push("p.category_id = ?".to_string());
        sql_params.push(Value::Text(category_id.to_string()));
    }
    if let Some(vendor_id) = &filter.vendor_id {
        where_parts.push("p.vendor_id = ?".to_string());
        sql_params.push(Value::Text(vendor_id.to_string()));
    }
    if let Some(min_price) = filter.min_price {
        where_parts.push("p.selling_price >= ?".to_string());
        sql_params.push(Value::Integer(min_price.minor_units()));
    }
    if let Some(max_price) = filter.max_price {
        where_parts.push("p.selling_price <= ?".to_string());
        sql_params.push(Value::Integer(max_price.minor_units()));
    }
    if filter.featured_only {
        where_parts.push("p.is_featured = 1".to_string());
    }
    if let Some(token) = &request.cursor {
        let payload = cursor::decode_cursor(token, cursor_secret, &filter_hash)?;
        where_parts.push("(p.created_at < ? OR (p.created_at = ? AND p.id < ?))".to_string());
        sql_params.push(Value::Integer(payload.last_created_at));
        sql_params.push(Value::Integer(payload.last_created_at));
        sql_params.push(Value::Text(payload.last_id));
    }

    let sql = format!(
        "SELECT {} FROM products p
         LEFT JOIN vendors v ON v.id = p.vendor_id AND v.deleted_at IS NULL
         WHERE {}
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?",
        product_cols("p"),
        where_parts.join(" AND ")
    );
    let fetch = i64::try_from(limit).unwrap_or(i64::MAX).saturating_add(1);
    sql_params.push(Value::Integer(fetch));

    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(sql_params.iter()), ProductRow::from_row)?;
    let mut raw_rows = Vec::new();
    for raw in mapped {
        raw_rows.push(raw.map_err(StoreError::from)?);
    }

    let has_more = raw_rows.len() > limit;
    raw_rows.truncate(limit);
    let next_cursor = if has_more {
        raw_rows.last().map_or(Ok(None), |last| {
            cursor::encode_cursor(
                &CursorPayload {
                    last_created_at: last.created_at,
                    last_id: last.id.clone(),
                    filter_hash: filter_hash.clone(),
                },
                cursor_secret,
            )
            .map(Some)
        })?
    } else {
        None
    };

    let mut rows = Vec::with_capacity(raw_rows.len());
    for raw in raw_rows {
        rows.push(raw.into_product()?);
    }
    Ok(StorefrontPage { rows, next_cursor })
}

/// Feed line for the XML shopping export: the product plus the display
/// names the feed prints instead of ids.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub product: Product,
    pub category_name: String,
    pub vendor_name: Option<String>,
}

/// Everything the storefront shows, joined with names, oldest first so
/// feed consumers see a stable document order.
pub fn feed_products(conn: &Connection) -> Result<Vec<FeedEntry>, StoreError> {
    let sql = format!(
        "SELECT {}, c.name, v.business_name FROM products p
         JOIN categories c ON c.id = p.category_id
         LEFT JOIN vendors v ON v.id = p.vendor_id AND v.deleted_at IS NULL
         WHERE p.deleted_at IS NULL AND p.is_active = 1
           AND (p.vendor_id IS NULL OR v.status = 'approved')
         ORDER BY p.created_at ASC, p.id ASC",
        product_cols("p")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map([], |row| {
        let product = ProductRow::from_row(row)?;
        let category_name: String = row.get(15)?;
        let vendor_name: Option<String> = row.get(16)?;
        Ok((product, category_name, vendor_name))
    })?;
    let mut entries = Vec::new();
    for raw in mapped {
        let (product, category_name, vendor_name) = raw.map_err(StoreError::from)?;
        entries.push(FeedEntry {
            product: product.into_product()?,
            category_name,
            vendor_name,
        });
    }
    Ok(entries)
}

struct VariantRow {
    id: String,
    product_id: String,
    color: Option<String>,
    size: Option<String>,
    sku: String,
    mrp: i64,
    selling_price: i64,
    stock: i64,
    image_url: Option<String>,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl VariantRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            product_id: row.get(1)?,
            color: row.get(2)?,
            size: row.get(3)?,
            sku: row.get(4)?,
            mrp: row.get(5)?,
            selling_price: row.get(6)?,
            stock: row.get(7)?,
            image_url: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            deleted_at: row.get(11)?,
        })
    }

    fn into_variant(self) -> Result<ProductVariant, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt variant row: {e}"));
        Ok(ProductVariant {
            id: VariantId::parse(&self.id).map_err(map)?,
            product_id: ProductId::parse(&self.product_id).map_err(map)?,
            color: self.color,
            size: self.size,
            sku: Sku::parse(&self.sku).map_err(map)?,
            mrp: codec::money(self.mrp)?,
            selling_price: codec::money(self.selling_price)?,
            stock: codec::stock(self.stock)?,
            image_url: self.image_url,
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

pub fn insert_variant(conn: &Connection, variant: &ProductVariant) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO product_variants (id, product_id, color, size, sku, mrp, selling_price,
           stock, image_url, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            variant.id.to_string(),
            variant.product_id.to_string(),
            variant.color,
            variant.size,
            variant.sku.as_str(),
            variant.mrp.minor_units(),
            variant.selling_price.minor_units(),
            i64::from(variant.stock),
            variant.image_url,
            codec::millis(variant.created_at),
            codec::millis(variant.updated_at),
            codec::millis_opt(variant.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn variant_by_id(conn: &Connection, id: &VariantId) -> Result<Option<ProductVariant>, StoreError> {
    let sql =
        format!("SELECT {VARIANT_COLS} FROM product_variants WHERE id = ?1 AND deleted_at IS NULL");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    VariantRow::from_row(row)
        .map_err(StoreError::from)?
        .into_variant()
        .map(Some)
}

/// SKUs are unique among live variants, so this resolves support lookups
/// that arrive with a label instead of an id.
pub fn variant_by_sku(conn: &Connection, sku: &Sku) -> Result<Option<ProductVariant>, StoreError> {
    let sql = format!(
        "SELECT {VARIANT_COLS} FROM product_variants WHERE sku = ?1 AND deleted_at IS NULL"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![sku.as_str()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    VariantRow::from_row(row)
        .map_err(StoreError::from)?
        .into_variant()
        .map(Some)
}

pub fn variants_for_product(
    conn: &Connection,
    product_id: &ProductId,
) -> Result<Vec<ProductVariant>, StoreError> {
    let sql = format!(
        "SELECT {VARIANT_COLS} FROM product_variants
         WHERE product_id = ?1 AND deleted_at IS NULL ORDER BY created_at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params![product_id.to_string()], VariantRow::from_row)?;
    let mut rows = Vec::new();
    for raw in mapped {
        rows.push(raw.map_err(StoreError::from)?.into_variant()?);
    }
    Ok(rows)
}

#[derive(Debug, Clone, Default)]
pub struct VariantUpdate {
    pub color: Option<Option<String>>,
    pub size: Option<Option<String>>,
    pub mrp: Option<Money>,
    pub selling_price: Option<Money>,
    pub stock: Option<u32>,
    pub image_url: Option<Option<String>>,
}

pub fn update_variant(
    conn: &Connection,
    id: &VariantId,
    update: &VariantUpdate,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let mut sets = vec!["updated_at = ?".to_string()];
    let mut values: Vec<Value> = vec![Value::Integer(codec::millis(at))];
    if let Some(color) = &update.color {
        sets.push("color = ?".to_string());
        values.push(match color {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    if let Some(size) = &update.size {
        sets.push("size = ?".to_string());
        values.push(match size {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    if let Some(mrp) = update.mrp {
        sets.push("mrp = ?".to_string());
        values.push(Value::Integer(mrp.minor_units()));
    }
    if let Some(selling_price) = update.selling_price {
        sets.push("selling_price = ?".to_string());
        values.push(Value::Integer(selling_price.minor_units()));
    }
    if let Some(stock) = update.stock {
        sets.push("stock = ?".to_string());
        values.push(Value::Integer(i64::from(stock)));
    }
    if let Some(image_url) = &update.image_url {
        sets.push("image_url = ?".to_string());
        values.push(match image_url {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
    }
    values.push(Value::Text(id.to_string()));
    let sql = format!(
        "UPDATE product_variants SET {} WHERE id = ? AND deleted_at IS NULL",
        sets.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(changed == 1)
}

pub fn soft_delete_variant(
    conn: &Connection,
    id: &VariantId,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE product_variants SET deleted_at = ?2, updated_at = ?2
         WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string(), codec::millis(at)],
    )?;
    Ok(changed == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::init_schema;
    use crate::vendors::{insert_vendor, set_vendor_status};
    use souk_model::{CommissionRate, EmailAddress, Vendor, VendorStatus};

    const SECRET: &[u8] = b"test-cursor-secret";

    fn setup() -> (Connection, CategoryId) {
        let conn = Connection::open_in_memory().expect("conn");
        init_schema(&conn).expect("schema");
        let category = souk_model::Category::new(
            CategoryId::generate(),
            "Rugs".to_string(),
            Slug::parse("rugs").expect("slug"),
            Utc::now(),
        );
        crate::categories::insert_category(&conn, &category).expect("category");
        (conn, category.id)
    }

    fn seed_vendor(conn: &Connection, slug: &str, status: VendorStatus) -> VendorId {
        let vendor = Vendor::new(
            VendorId::generate(),
            format!("Vendor {slug}"),
            Slug::parse(slug).expect("slug"),
            EmailAddress::parse(&format!("{slug}@vendors.example")).expect("email"),
            CommissionRate::default(),
            Utc::now(),
        );
        insert_vendor(conn, &vendor).expect("vendor");
        if status != VendorStatus::Pending {
            set_vendor_status(conn, &vendor.id, status, None, Utc::now()).expect("status");
        }
        vendor.id
    }

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor).expect("money")
    }

    fn sample(category_id: CategoryId, slug: &str, at_millis: i64) -> Product {
        let mut product = Product::new(
            ProductId::generate(),
            format!("Product {slug}"),
            Slug::parse(slug).expect("slug"),
            category_id,
            None,
            money(100_000),
            money(75_000),
            codec::datetime(at_millis),
        );
        product.stock = 5;
        product
    }

    #[test]
    fn insert_fetch_round_trip_keeps_media() {
        let (conn, category_id) = setup();
        let mut product = sample(category_id, "wool-rug", 1_700_000_000_000);
        product.media = vec![
            "https://img.example/rug-front.jpg".to_string(),
            "https://img.example/rug-back.jpg".to_string(),
        ];
        insert_product(&conn, &product).expect("insert");
        let loaded = product_by_id(&conn, &product.id).expect("query").expect("found");
        assert_eq!(loaded.media, product.media);
        assert_eq!(loaded.selling_price, money(75_000));
        assert_eq!(loaded.stock, 5);
    }

    #[test]
    fn storefront_slug_hides_inactive_and_unapproved_vendor_products() {
        let (conn, category_id) = setup();

        let mut inactive = sample(category_id, "inactive-rug", 1_700_000_000_000);
        inactive.is_active = false;
        insert_product(&conn, &inactive).expect("insert");
        assert!(product_by_slug(&conn, &inactive.slug).expect("query").is_none());

        let pending = seed_vendor(&conn, "pending-vendor", VendorStatus::Pending);
        let mut hidden = sample(category_id, "pending-rug", 1_700_000_000_000);
        hidden.vendor_id = Some(pending);
        insert_product(&conn, &hidden).expect("insert");
        assert!(product_by_slug(&conn, &hidden.slug).expect("query").is_none());

        let approved = seed_vendor(&conn, "approved-vendor", VendorStatus::Approved);
        let mut visible = sample(category_id, "approved-rug", 1_700_000_000_000);
        visible.vendor_id = Some(approved);
        insert_product(&conn, &visible).expect("insert");
        assert!(product_by_slug(&conn, &visible.slug).expect("query").is_some());

        let platform = sample(category_id, "platform-rug", 1_700_000_000_000);
        insert_product(&conn, &platform).expect("insert");
        assert!(product_by_slug(&conn, &platform.slug).expect("query").is_some());
    }

    #[test]
    fn admin_search_escapes_like_wildcards() {
        let (conn, category_id) = setup();
        let mut wool = sample(category_id, "wool-rug", 1_700_000_000_000);
        wool.name = "100% Wool Rug".to_string();
        let plain = sample(category_id, "cotton-rug", 1_700_000_001_000);
        insert_product(&conn, &wool).expect("insert");
        insert_product(&conn, &plain).expect("insert");

        let filter = ProductAdminFilter {
            q: Some("100%".to_string()),
            ..ProductAdminFilter::default()
        };
        let page = admin_list_products(&conn, &filter, 1, 20).expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].name, "100% Wool Rug");
    }

    #[test]
    fn storefront_pages_walk_with_the_cursor() {
        let (conn, category_id) = setup();
        for i in 0..3 {
            let product = sample(
                category_id,
                &format!("rug-{i}"),
                1_700_000_000_000 + i * 1_000,
            );
            insert_product(&conn, &product).expect("insert");
        }

        let request = CatalogPageRequest {
            filter: cursor::StorefrontFilter::default(),
            limit: 2,
            cursor: None,
        };
        let first = storefront_products(&conn, &request, SECRET).expect("page one");
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.rows[0].slug.as_str(), "rug-2");
        let token = first.next_cursor.expect("more pages");

        let request = CatalogPageRequest {
            filter: cursor::StorefrontFilter::default(),
            limit: 2,
            cursor: Some(token),
        };
        let second = storefront_products(&conn, &request, SECRET).expect("page two");
        assert_eq!(second.rows.len(), 1);
        assert_eq!(second.rows[0].slug.as_str(), "rug-0");
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn price_band_filter_bounds_the_listing() {
        let (conn, category_id) = setup();
        let mut cheap = sample(category_id, "cheap-rug", 1_700_000_000_000);
        cheap.selling_price = money(20_000);
        cheap.mrp = money(30_000);
        let mid = sample(category_id, "mid-rug", 1_700_000_001_000);
        let mut dear = sample(category_id, "dear-rug", 1_700_000_002_000);
        dear.selling_price = money(900_000);
        dear.mrp = money(900_000);
        insert_product(&conn, &cheap).expect("insert");
        insert_product(&conn, &mid).expect("insert");
        insert_product(&conn, &dear).expect("insert");

        let request = CatalogPageRequest {
            filter: cursor::StorefrontFilter {
                min_price: Some(money(50_000)),
                max_price: Some(money(100_000)),
                ..cursor::StorefrontFilter::default()
            },
            limit: 10,
            cursor: None,
        };
        let page = storefront_products(&conn, &request, SECRET).expect("page");
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].slug.as_str(), "mid-rug");
    }

    #[test]
    fn variant_sku_is_unique_while_live() {
        let (conn, category_id) = setup();
        let product = sample(category_id, "wool-rug", 1_700_000_000_000);
        insert_product(&conn, &product).expect("insert");

        let variant = ProductVariant::new(
            VariantId::generate(),
            product.id,
            Sku::parse("RUG-RED-M").expect("sku"),
            money(100_000),
            money(75_000),
            4,
            Utc::now(),
        );
        insert_variant(&conn, &variant).expect("insert");
        let found = variant_by_sku(&conn, &variant.sku).expect("query").expect("found");
        assert_eq!(found.id, variant.id);

        let twin = ProductVariant::new(
            VariantId::generate(),
            product.id,
            Sku::parse("RUG-RED-M").expect("sku"),
            money(100_000),
            money(75_000),
            4,
            Utc::now(),
        );
        let err = insert_variant(&conn, &twin).expect_err("duplicate sku");
        assert!(matches!(err, StoreError::Conflict(_)));

        soft_delete_variant(&conn, &variant.id, Utc::now()).expect("delete");
        assert!(variant_by_sku(&conn, &variant.sku).expect("query").is_none());
        insert_variant(&conn, &twin).expect("sku freed after delete");
        let reused = variant_by_sku(&conn, &twin.sku).expect("query").expect("found");
        assert_eq!(reused.id, twin.id);
    }

    #[test]
    fn deleting_a_product_retires_its_variants() {
        let (conn, category_id) = setup();
        let product = sample(category_id, "wool-rug", 1_700_000_000_000);
        insert_product(&conn, &product).expect("insert");
        let variant = ProductVariant::new(
            VariantId::generate(),
            product.id,
            Sku::parse("RUG-RED-M").expect("sku"),
            money(100_000),
            money(75_000),
            4,
            Utc::now(),
        );
        insert_variant(&conn, &variant).expect("insert");

        assert!(soft_delete_product(&conn, &product.id, Utc::now()).expect("delete"));
        assert!(product_by_id(&conn, &product.id).expect("query").is_none());
        assert!(variant_by_id(&conn, &variant.id).expect("query").is_none());
        assert!(variants_for_product(&conn, &product.id).expect("query").is_empty());
    }
}
