// SPDX-License-Identifier: Apache-2.0

use crate::StoreError;
use rusqlite::{params, Connection};

pub const SQLITE_SCHEMA_VERSION: i64 = 1;

/// Idempotent DDL: every table and index is `IF NOT EXISTS`, so the server
/// and the CLI can both run it at startup without coordination.
pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          email TEXT NOT NULL,
          password_hash TEXT NOT NULL,
          role TEXT NOT NULL,
          vendor_id TEXT,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE UNIQUE INDEX IF NOT EXISTS users_email_live
          ON users(email) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS vendors (
          id TEXT PRIMARY KEY,
          business_name TEXT NOT NULL,
          slug TEXT NOT NULL,
          contact_email TEXT NOT NULL,
          phone TEXT,
          description TEXT,
          status TEXT NOT NULL,
          commission_rate_bps INTEGER NOT NULL,
          bank_account_name TEXT,
          bank_account_number TEXT,
          bank_name TEXT,
          total_orders INTEGER NOT NULL DEFAULT 0,
          gross_sales INTEGER NOT NULL DEFAULT 0,
          total_earnings INTEGER NOT NULL DEFAULT 0,
          last_order_at INTEGER,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE UNIQUE INDEX IF NOT EXISTS vendors_slug_live
          ON vendors(slug) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS vendors_status
          ON vendors(status) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS categories (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          slug TEXT NOT NULL,
          parent_id TEXT REFERENCES categories(id),
          description TEXT,
          image_url TEXT,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE UNIQUE INDEX IF NOT EXISTS categories_slug_live
          ON categories(slug) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS products (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          slug TEXT NOT NULL,
          description TEXT,
          category_id TEXT NOT NULL REFERENCES categories(id),
          vendor_id TEXT REFERENCES vendors(id),
          mrp INTEGER NOT NULL,
          selling_price INTEGER NOT NULL,
          media TEXT NOT NULL DEFAULT '[]',
          stock INTEGER NOT NULL DEFAULT 0,
          is_active INTEGER NOT NULL DEFAULT 1,
          is_featured INTEGER NOT NULL DEFAULT 0,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE UNIQUE INDEX IF NOT EXISTS products_slug_live
          ON products(slug) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS products_category
          ON products(category_id) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS products_vendor
          ON products(vendor_id) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS products_storefront
          ON products(created_at DESC, id DESC) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS product_variants (
          id TEXT PRIMARY KEY,
          product_id TEXT NOT NULL REFERENCES products(id),
          color TEXT,
          size TEXT,
          sku TEXT NOT NULL,
          mrp INTEGER NOT NULL,
          selling_price INTEGER NOT NULL,
          stock INTEGER NOT NULL DEFAULT 0,
          image_url TEXT,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE UNIQUE INDEX IF NOT EXISTS variants_sku_live
          ON product_variants(sku) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS variants_product
          ON product_variants(product_id) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS orders (
          id TEXT PRIMARY KEY,
          order_number TEXT NOT NULL UNIQUE,
          customer_name TEXT NOT NULL,
          customer_email TEXT NOT NULL,
          customer_phone TEXT NOT NULL,
          ship_line1 TEXT NOT NULL,
          ship_line2 TEXT,
          ship_city TEXT NOT NULL,
          ship_state TEXT NOT NULL,
          ship_postal_code TEXT NOT NULL,
          ship_country TEXT NOT NULL,
          payment_method TEXT NOT NULL,
          payment_status TEXT NOT NULL,
          subtotal INTEGER NOT NULL,
          discount INTEGER NOT NULL,
          total INTEGER NOT NULL,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL,
          deleted_at INTEGER
        ) WITHOUT ROWID;
        CREATE INDEX IF NOT EXISTS orders_created
          ON orders(created_at DESC, id DESC) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS orders_email
          ON orders(customer_email) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS order_items (
          id TEXT PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(id),
          vendor_id TEXT REFERENCES vendors(id),
          subtotal INTEGER NOT NULL,
          commission INTEGER NOT NULL,
          vendor_earning INTEGER NOT NULL,
          status TEXT NOT NULL,
          created_at INTEGER NOT NULL,
          updated_at INTEGER NOT NULL
        ) WITHOUT ROWID;
        CREATE INDEX IF NOT EXISTS order_items_order
          ON order_items(order_id);
        CREATE INDEX IF NOT EXISTS order_items_vendor
          ON order_items(vendor_id);

        CREATE TABLE IF NOT EXISTS order_lines (
          id INTEGER PRIMARY KEY,
          order_id TEXT NOT NULL REFERENCES orders(id),
          order_item_id TEXT NOT NULL REFERENCES order_items(id),
          line_no INTEGER NOT NULL,
          product_id TEXT NOT NULL,
          variant_id TEXT,
          name TEXT NOT NULL,
          sku TEXT,
          qty INTEGER NOT NULL,
          unit_price INTEGER NOT NULL,
          subtotal INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS order_lines_order
          ON order_lines(order_id, line_no);
        CREATE INDEX IF NOT EXISTS order_lines_item
          ON order_lines(order_item_id);

        CREATE TABLE IF NOT EXISTS souk_meta (
          k TEXT PRIMARY KEY,
          v TEXT NOT NULL
        ) WITHOUT ROWID;
        ",
    )
    .map_err(|e| StoreError::Other(e.to_string()))?;

    conn.execute(
        "INSERT INTO souk_meta (k, v) VALUES ('schema_version', ?1)
         ON CONFLICT(k) DO UPDATE SET v = excluded.v",
        params![SQLITE_SCHEMA_VERSION.to_string()],
    )
    .map_err(|e| StoreError::Other(e.to_string()))?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<Option<i64>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT v FROM souk_meta WHERE k = 'schema_version'")
        .map_err(|e| StoreError::Other(e.to_string()))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| StoreError::Other(e.to_string()))?;
    let Some(row) = rows.next().map_err(|e| StoreError::Other(e.to_string()))? else {
        return Ok(None);
    };
    let raw: String = row.get(0).map_err(|e| StoreError::Other(e.to_string()))?;
    raw.parse::<i64>()
        .map(Some)
        .map_err(|e| StoreError::Other(format!("schema_version not an integer: {e}")))
}
