#![forbid(unsafe_code)]
//! SQLite persistence for souk.
//!
//! Repositories are free functions over a [`rusqlite::Connection`]; the
//! [`Store`] handle mints configured connections for the server and CLI,
//! while tests run the same functions against in-memory databases.

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod categories;
pub mod cursor;
pub mod orders;
pub mod products;
pub mod schema;
pub mod users;
pub mod vendors;

pub use categories::CategoryUpdate;
pub use cursor::{CatalogPageRequest, StorefrontFilter};
pub use orders::{OrderAdminFilter, VendorOrderPage, VendorOrderRow};
pub use products::{FeedEntry, ProductAdminFilter, ProductUpdate, StorefrontPage, VariantUpdate};
pub use schema::{init_schema, schema_version, SQLITE_SCHEMA_VERSION};
pub use vendors::VendorUpdate;

pub const BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Uniqueness or stock guard violated; surfaces as an HTTP conflict.
    Conflict(String),
    /// Cursor failed signature, shape, or filter-binding checks.
    InvalidCursor(String),
    Other(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(msg) => write!(f, "conflict: {msg}"),
            Self::InvalidCursor(msg) => write!(f, "invalid cursor: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(err.to_string())
            }
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Offset-paginated result for the admin and vendor panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.per_page))
    }
}

/// Handle on the database file. Connections are opened per operation; WAL
/// plus a busy timeout covers concurrent handler access.
#[derive(Debug, Clone)]
pub struct Store {
    path: Arc<PathBuf>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Other(format!("create data dir: {e}")))?;
            }
        }
        Ok(Self {
            path: Arc::new(path.to_path_buf()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conn(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(self.path.as_ref())?;
        conn.execute_batch(&format!(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            PRAGMA busy_timeout={BUSY_TIMEOUT_MS};
            "
        ))?;
        Ok(conn)
    }

    pub fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        schema::init_schema(&conn)
    }

    /// Cheap liveness probe for the readiness endpoint.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(StoreError::from)
    }
}

pub(crate) mod codec {
    use super::StoreError;
    use chrono::{DateTime, Utc};
    use souk_core::time::{from_unix_millis, unix_millis};
    use souk_model::Money;

    pub fn millis(at: DateTime<Utc>) -> i64 {
        unix_millis(at)
    }

    pub fn millis_opt(at: Option<DateTime<Utc>>) -> Option<i64> {
        at.map(unix_millis)
    }

    pub fn datetime(millis: i64) -> DateTime<Utc> {
        from_unix_millis(millis)
    }

    pub fn datetime_opt(millis: Option<i64>) -> Option<DateTime<Utc>> {
        millis.map(from_unix_millis)
    }

    pub fn money(minor: i64) -> Result<Money, StoreError> {
        Money::from_minor_units(minor)
            .map_err(|e| StoreError::Other(format!("corrupt stored amount: {e}")))
    }

    pub fn stock(raw: i64) -> Result<u32, StoreError> {
        u32::try_from(raw).map_err(|_| StoreError::Other("corrupt stored stock".to_string()))
    }
}

/// Escapes `%`/`_`/`!` so user text can ride inside a LIKE pattern with
/// `ESCAPE '!'`.
pub(crate) fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
