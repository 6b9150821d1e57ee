// SPDX-License-Identifier: Apache-2.0

use crate::{codec, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use souk_model::{EmailAddress, Role, User, UserId, VendorId};

const USER_COLS: &str =
    "id, name, email, password_hash, role, vendor_id, created_at, updated_at, deleted_at";

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    vendor_id: Option<String>,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            vendor_id: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            deleted_at: row.get(8)?,
        })
    }

    fn into_user(self) -> Result<User, StoreError> {
        let map = |e: souk_model::ParseError| StoreError::Other(format!("corrupt user row: {e}"));
        Ok(User {
            id: UserId::parse(&self.id).map_err(map)?,
            name: self.name,
            email: EmailAddress::parse(&self.email).map_err(map)?,
            password_hash: self.password_hash,
            role: Role::parse(&self.role).map_err(map)?,
            vendor_id: self
                .vendor_id
                .as_deref()
                .map(VendorId::parse)
                .transpose()
                .map_err(map)?,
            created_at: codec::datetime(self.created_at),
            updated_at: codec::datetime(self.updated_at),
            deleted_at: codec::datetime_opt(self.deleted_at),
        })
    }
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, vendor_id, created_at, updated_at, deleted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.name,
            user.email.as_str(),
            user.password_hash,
            user.role.as_str(),
            user.vendor_id.map(|v| v.to_string()),
            codec::millis(user.created_at),
            codec::millis(user.updated_at),
            codec::millis_opt(user.deleted_at),
        ],
    )?;
    Ok(())
}

pub fn user_by_email(
    conn: &Connection,
    email: &EmailAddress,
) -> Result<Option<User>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {USER_COLS} FROM users WHERE email = ?1 AND deleted_at IS NULL"),
        email.as_str(),
    )
}

pub fn user_by_id(conn: &Connection, id: &UserId) -> Result<Option<User>, StoreError> {
    fetch_one(
        conn,
        &format!("SELECT {USER_COLS} FROM users WHERE id = ?1 AND deleted_at IS NULL"),
        &id.to_string(),
    )
}

fn fetch_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![key])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    UserRow::from_row(row)
        .map_err(StoreError::from)?
        .into_user()
        .map(Some)
}

/// Flips an account to the vendor role and records the back-reference, the
/// tail end of a successful vendor application.
pub fn link_vendor(
    conn: &Connection,
    user_id: &UserId,
    vendor_id: &VendorId,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE users SET role = 'vendor', vendor_id = ?2, updated_at = ?3
         WHERE id = ?1 AND deleted_at IS NULL",
        params![user_id.to_string(), vendor_id.to_string(), codec::millis(at)],
    )?;
    Ok(changed == 1)
}

/// Replaces an account's password hash and role in one step, the CLI's
/// `create-admin` upsert path for an email that already has an account.
pub fn set_credentials(
    conn: &Connection,
    id: &UserId,
    password_hash: &str,
    role: Role,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE users SET password_hash = ?2, role = ?3, updated_at = ?4
         WHERE id = ?1 AND deleted_at IS NULL",
        params![
            id.to_string(),
            password_hash,
            role.as_str(),
            codec::millis(at)
        ],
    )?;
    Ok(changed == 1)
}

pub fn soft_delete_user(
    conn: &Connection,
    id: &UserId,
    at: DateTime<Utc>,
) -> Result<bool, StoreError> {
    let changed = conn.execute(
        "UPDATE users SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string(), codec::millis(at)],
    )?;
    Ok(changed == 1)
}
