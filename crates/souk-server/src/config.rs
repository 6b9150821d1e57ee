// SPDX-License-Identifier: Apache-2.0

//! Environment-driven server configuration, `SOUK_*` prefix.
//!
//! Every knob has a usable default so a bare `souk-server` starts on
//! localhost with a throwaway session secret. Misconfigurations that
//! would bite later fail fast through
//! [`validate_startup_config_contract`].

use serde::Serialize;
use souk_core::resolve_souk_data_dir;
use souk_model::CommissionRate;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub use souk_core::DB_FILE_NAME;

pub const SESSION_SECRET_MIN_BYTES: usize = 16;

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub(crate) fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Where order notification mails go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MailMode {
    /// Render the mail into the server log. The default.
    Log,
    /// POST a JSON payload to `SOUK_MAIL_URL`.
    Http,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailConfig {
    pub mode: MailMode,
    pub url: Option<String>,
    pub from: String,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            mode: MailMode::Log,
            url: None,
            from: "orders@souk.example".to_string(),
            timeout: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    // Never serialized; secrets stay out of config dumps and logs.
    #[serde(skip_serializing)]
    pub session_secret: Vec<u8>,
    /// True when no `SOUK_SESSION_SECRET` was set and the server minted an
    /// ephemeral one. Sessions then die with the process; main warns.
    pub session_secret_generated: bool,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    pub default_commission: CommissionRate,
    pub body_limit_bytes: usize,
    pub concurrency_limit: usize,
    pub shutdown_drain: Duration,
    pub currency: String,
    pub public_base_url: String,
    pub store_name: String,
    pub mail: MailConfig,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            db_path: resolve_souk_data_dir().join(DB_FILE_NAME),
            session_secret: ephemeral_secret(),
            session_secret_generated: true,
            session_ttl: Duration::from_secs(86_400),
            cookie_secure: false,
            default_commission: CommissionRate::default(),
            body_limit_bytes: 1024 * 1024,
            concurrency_limit: 64,
            shutdown_drain: Duration::from_millis(3_000),
            currency: "USD".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            store_name: "Souk".to_string(),
            mail: MailConfig::default(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let (session_secret, session_secret_generated) = match env::var("SOUK_SESSION_SECRET") {
            Ok(raw) if !raw.trim().is_empty() => (raw.trim().as_bytes().to_vec(), false),
            _ => (ephemeral_secret(), true),
        };

        let raw_bps = env_u64("SOUK_DEFAULT_COMMISSION_BPS", 1_000);
        let bps = u32::try_from(raw_bps)
            .map_err(|_| format!("SOUK_DEFAULT_COMMISSION_BPS out of range: {raw_bps}"))?;
        let default_commission = CommissionRate::from_bps(bps)
            .map_err(|e| format!("SOUK_DEFAULT_COMMISSION_BPS: {e}"))?;

        let mail = MailConfig {
            mode: match env_string("SOUK_MAIL_MODE", "log").to_ascii_lowercase().as_str() {
                "http" => MailMode::Http,
                _ => MailMode::Log,
            },
            url: env::var("SOUK_MAIL_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            from: env_string("SOUK_MAIL_FROM", &defaults.mail.from),
            timeout: env_duration_ms("SOUK_MAIL_TIMEOUT_MS", 5_000),
        };

        Ok(Self {
            bind_addr: env_string("SOUK_BIND_ADDR", &defaults.bind_addr),
            db_path: env::var("SOUK_DB_PATH")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map_or(defaults.db_path, PathBuf::from),
            session_secret,
            session_secret_generated,
            session_ttl: Duration::from_secs(env_u64("SOUK_SESSION_TTL_SECS", 86_400)),
            cookie_secure: env_bool("SOUK_COOKIE_SECURE", false),
            default_commission,
            body_limit_bytes: env_usize("SOUK_BODY_LIMIT_BYTES", defaults.body_limit_bytes),
            concurrency_limit: env_usize("SOUK_CONCURRENCY_LIMIT", defaults.concurrency_limit),
            shutdown_drain: env_duration_ms("SOUK_SHUTDOWN_DRAIN_MS", 3_000),
            currency: env_string("SOUK_CURRENCY", &defaults.currency),
            public_base_url: env_string("SOUK_PUBLIC_BASE_URL", &defaults.public_base_url),
            store_name: env_string("SOUK_STORE_NAME", &defaults.store_name),
            mail,
            log_json: env_bool("SOUK_LOG_JSON", false),
        })
    }
}

/// Random per-process secret for installs that never set one. Two v4
/// uuids give 32 bytes of OS randomness.
fn ephemeral_secret() -> Vec<u8> {
    let mut secret = Vec::with_capacity(32);
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret
}

pub fn validate_startup_config_contract(config: &ServerConfig) -> Result<(), String> {
    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(format!("invalid bind address: {}", config.bind_addr));
    }
    if config.session_secret.len() < SESSION_SECRET_MIN_BYTES {
        return Err(format!(
            "session secret must be at least {SESSION_SECRET_MIN_BYTES} bytes"
        ));
    }
    if config.session_ttl.is_zero() {
        return Err("session ttl must be > 0".to_string());
    }
    if config.body_limit_bytes == 0 || config.concurrency_limit == 0 {
        return Err("body and concurrency limits must be > 0".to_string());
    }
    if config.currency.len() != 3 || !config.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(format!(
            "currency must be a three-letter uppercase code, got {}",
            config.currency
        ));
    }
    if !(config.public_base_url.starts_with("http://")
        || config.public_base_url.starts_with("https://"))
    {
        return Err("public base url must start with http:// or https://".to_string());
    }
    if config.store_name.trim().is_empty() {
        return Err("store name must not be empty".to_string());
    }
    if config.mail.mode == MailMode::Http
        && config.mail.url.as_deref().map_or(true, str::is_empty)
    {
        return Err("mail mode http requires a non-empty SOUK_MAIL_URL".to_string());
    }
    if config.mail.mode == MailMode::Http && config.mail.timeout.is_zero() {
        return Err("mail timeout must be > 0".to_string());
    }
    Ok(())
}
