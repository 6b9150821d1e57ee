// SPDX-License-Identifier: Apache-2.0

use crate::{codec, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};
use souk_model::{Category, CategoryId, Slug};

const CATEGORY_COLS: &str =
    "id, name, slug, parent_id, description, image_url, created_at, updated_at, deleted_at";

struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    parent_id: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl CategoryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            parent_id: row.get(3)?,
            description: row.get(4)?,
            image_url: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            deleted_at: row.get(8)?,
        })
    }

    fn into_category(self) -> Result<Category, StoreError> {
        let map =
            |e: souk_model::ParseError| StoreError::Other(format!("corrupt category row: {e}"));
        Ok(Category {
            id: CategoryId::parse(&self.id).map_err(map)?,
            name: self.name,
            slug: Slug::parse(&self.slug).map_err(map)?,
            parent_id: self
                .parent_id
                .as_deref()
                .map(CategoryId::parse)
                .transpose()
                .map_err(map)?,
            description: self.description,
            image_url: self.image_url,
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

pub fn insert_category(conn: &Connection, category: &Category) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO categories (id, name, slug, parent_id, description, image_url,
           created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            category.id.to_string(),
            category.name,
            category.slug.as_str(),
            category.parent_id.as_ref().map(ToString::to_string),
            category.description,
            category.image_url,
            codec::millis(category.created_at),
            codec::millis(category.updated_at),
            codec::millis_opt(category.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn category_by_id(conn: &Connection, id: &CategoryId) -> Result<Option<Category>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1 AND deleted_at IS NULL"),
        &id.to_string(),
    )
}

pub fn category_by_slug(conn: &Connection, slug: &Slug) -> Result<Option<Category>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {CATEGORY_COLS} FROM categories WHERE slug = ?1 AND deleted_at IS NULL"),
        slug.as_str(),
    )
}

fn fetch_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<Category>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![key])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    CategoryRow::from_row(row)
        .map_err(StoreError::from)?
        .into_category()
        .map(Some)
}

/// Flat list of live categories, name order. The storefront nests them
/// client side from `parent_id`.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>, StoreError> {
    let sql = format!(
        "SELECT {CATEGORY_COLS} FROM categories WHERE deleted_at IS NULL ORDER BY name ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map([], CategoryRow::from_row)?;
    let mut rows = Vec::new();
    for raw in mapped {
        rows.push(raw.map_err(StoreError::from)?.into_category()?);
    }
    Ok(rows)
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub parent_id: Option<Option<CategoryId>>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

pub fn update_category(
    conn: &Connection,
    id: &CategoryId,
    update: &CategoryUpdate,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    if update.parent_id == Some(Some(*id)) {
        return Err(StoreError::Conflict(
            "category must not be its own parent".to_string(),
        ));
    }
    let mut sets = vec!["updated_at = ?".to_string()];
    let mut values: Vec<Value> = vec![Value::Integer(codec::millis(at))];
    if let Some(name) = &update.name {
        sets.push("name = ?".to_string());
        values.push(Value::Text(name.clone()));
    }
    if let Some(parent) = &update.parent_id {
        sets.push("parent_id = ?".to_string());
        values.push(match parent {
            Some(pid) => Value::Text(pid.to_string()),
            None => Value::Null,
        });
    }
    if let Some(description) = &update.description {
        sets.push("description = ?".to_string());
        values.push(match description {
            Some(v) => Value::Text(v.clone()),
            None => Value::Null,
        });
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
        "UPDATE categories SET {} WHERE id = ? AND deleted_at IS NULL",
        sets.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(changed == 1)
}

/// Live products still filed under the category. A non-zero count blocks
/// deletion at the handler layer.
pub fn category_product_count(conn: &Connection, id: &CategoryId) -> Result<u64, StoreError> {
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM products WHERE category_id = ?1 AND deleted_at IS NULL")?
        .query_row(params![id.to_string()], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

pub fn soft_delete_category(
    conn: &Connection,
    id: &CategoryId,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE categories SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string(), codec::millis(at)],
    )?;
    Ok(changed == 1)
}
