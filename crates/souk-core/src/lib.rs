// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const CRATE_NAME: &str = "souk-core";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    NotFound = 4,
    Internal = 10,
}

pub const ENV_SOUK_LOG: &str = "SOUK_LOG";
pub const ENV_SOUK_DATA_DIR: &str = "SOUK_DATA_DIR";

/// Database file inside the data directory; the server and the CLI must
/// agree on it.
pub const DB_FILE_NAME: &str = "souk.db";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Resolves the directory holding the platform database and generated feeds.
///
/// Precedence: `SOUK_DATA_DIR`, then `XDG_DATA_HOME/souk`, then
/// `$HOME/.local/share/souk`, then a relative `.souk` fallback.
#[must_use]
pub fn resolve_souk_data_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var(ENV_SOUK_DATA_DIR) {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        let trimmed = xdg_data_home.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed).join("souk");
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed)
                .join(".local")
                .join("share")
                .join("souk");
        }
    }

    PathBuf::from(".souk")
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

pub mod time {
    use chrono::{DateTime, TimeZone, Utc};

    #[must_use]
    pub fn unix_millis(at: DateTime<Utc>) -> i64 {
        at.timestamp_millis()
    }

    /// Millisecond timestamps outside chrono's representable range collapse
    /// to the unix epoch rather than panicking on malformed rows.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> DateTime<Utc> {
        match Utc.timestamp_millis_opt(millis) {
            chrono::LocalResult::Single(at) => at,
            _ => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

pub mod canonical {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde::Serialize;
    use serde_json::{Map, Value};
    use sha2::{Digest, Sha256};

    pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
        let raw = serde_json::to_value(value)?;
        let normalized = normalize_json_value(raw);
        serde_json::to_vec(&normalized)
    }

    #[must_use]
    pub fn stable_hash_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn stable_json_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
        let bytes = stable_json_bytes(value)?;
        Ok(stable_hash_hex(&bytes))
    }

    pub fn encode_cursor_payload<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
        let bytes = stable_json_bytes(payload)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn decode_cursor_payload(token: &str) -> Result<Value, String> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| format!("cursor base64 decode failed: {e}"))?;
        serde_json::from_slice::<Value>(&bytes)
            .map_err(|e| format!("cursor JSON decode failed: {e}"))
    }

    fn normalize_json_value(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut sorted = Map::new();
                let mut entries: Vec<(String, Value)> = map
                    .into_iter()
                    .map(|(k, v)| (k, normalize_json_value(v)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                for (k, v) in entries {
                    sorted.insert(k, v);
                }
                Value::Object(sorted)
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(normalize_json_value).collect())
            }
            other => other,
        }
    }
}

/// Argon2id password hashing, shared by the server's login flow and the
/// CLI's `create-admin`. Stored hashes are PHC strings.
pub mod password {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
    use argon2::Argon2;

    pub fn hash(plain: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| format!("password hash failed: {e}"))
    }

    /// Wrong password and an unparseable stored hash both read as a plain
    /// refusal; callers never learn which.
    #[must_use]
    pub fn verify(plain: &str, phc: &str) -> bool {
        PasswordHash::new(phc)
            .and_then(|parsed| Argon2::default().verify_password(plain.as_bytes(), &parsed))
            .is_ok()
    }
}
