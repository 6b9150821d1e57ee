// SPDX-License-Identifier: Apache-2.0

//! Session auth: argon2id password hashes, HMAC-signed cookie tokens,
//! and the role guards handlers run before touching the store.
//!
//! A token is `base64url(claims).base64url(sig)` where the claims are
//! canonical JSON (`{exp, iat, role, uid, vid?}`) and the signature is
//! HMAC-SHA256 over the encoded claims part. Expiry is checked after the
//! signature so a tampered token never reads as merely expired.

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use souk_api::{ApiError, ApiErrorCode};
use souk_model::{Role, UserId, Vendor, VendorId};
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "souk_session";

pub use souk_core::password::{hash as hash_password, verify as verify_password};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    pub uid: UserId,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vid: Option<VendorId>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn issue(
        uid: UserId,
        role: Role,
        vid: Option<VendorId>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            uid,
            role,
            vid,
            iat,
            exp: iat.saturating_add(ttl.as_secs().min(i64::MAX as u64) as i64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Malformed token, bad signature, or undecodable claims.
    Invalid,
    /// Signature checked out but the token is past its expiry.
    Expired,
}

pub fn mint_session_token(claims: &SessionClaims, secret: &[u8]) -> Result<String, String> {
    let claims_bytes = souk_core::canonical::stable_json_bytes(claims)
        .map_err(|e| format!("session claims encode failed: {e}"))?;
    let claims_part = URL_SAFE_NO_PAD.encode(claims_bytes);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| format!("session mac init failed: {e}"))?;
    mac.update(claims_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{claims_part}.{sig_part}"))
}

pub fn verify_session_token(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<SessionClaims, SessionError> {
    let (claims_part, sig_part) = token.split_once('.').ok_or(SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::Invalid)?;
    mac.update(claims_part.as_bytes());
    let given = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|_| SessionError::Invalid)?;
    mac.verify_slice(&given).map_err(|_| SessionError::Invalid)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_part)
        .map_err(|_| SessionError::Invalid)?;
    let claims: SessionClaims =
        serde_json::from_slice(&claims_bytes).map_err(|_| SessionError::Invalid)?;

    if claims.exp <= now.timestamp() {
        return Err(SessionError::Expired);
    }
    Ok(claims)
}

#[must_use]
pub fn session_cookie_header(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[must_use]
pub fn clear_session_cookie_header(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pulls the session token out of the `Cookie` request header, if any.
#[must_use]
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let (name, value) = pair.trim().split_once('=')?;
        if name.trim() == SESSION_COOKIE && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Verifies the cookie on a request and hands back its claims, already
/// mapped to the wire's 401 vocabulary.
pub fn authenticate(
    headers: &HeaderMap,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<SessionClaims, ApiError> {
    let token = session_token_from_headers(headers).ok_or_else(ApiError::auth_invalid)?;
    verify_session_token(&token, secret, now).map_err(|e| match e {
        SessionError::Expired => ApiError::auth_expired(),
        SessionError::Invalid => ApiError::auth_invalid(),
    })
}

/// Authenticated-but-wrong-role is a 403, never a 401.
pub fn require_role(claims: &SessionClaims, required: Role) -> Result<(), ApiError> {
    if claims.role == required {
        Ok(())
    } else {
        Err(ApiError::insufficient_role(required.as_str()))
    }
}

/// Vendor routes also need the vendor record to exist and be approved;
/// pending, suspended, and rejected vendors are shut out of the panel.
pub fn require_approved_vendor(vendor: Option<Vendor>) -> Result<Vendor, ApiError> {
    let vendor = vendor.ok_or_else(|| ApiError::not_found("vendor"))?;
    if vendor.is_approved() {
        Ok(vendor)
    } else {
        Err(ApiError::new(
            ApiErrorCode::AuthInsufficientRole,
            "vendor is not approved",
            serde_json::json!({ "vendorStatus": vendor.status.as_str() }),
            "req-unknown",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-session-secret";

    fn claims(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims::issue(
            UserId::generate(),
            Role::User,
            None,
            now,
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn password_hash_round_trips_and_rejects_wrong_password() {
        let phc = hash_password("s3curepass").expect("hash");
        assert!(phc.starts_with("$argon2id$"));
        assert!(verify_password("s3curepass", &phc));
        assert!(!verify_password("wrongpass", &phc));
        assert!(!verify_password("s3curepass", "not-a-phc-string"));
    }

    #[test]
    fn session_token_round_trips() {
        let now = Utc::now();
        let issued = claims(now);
        let token = mint_session_token(&issued, SECRET).expect("mint");
        let verified = verify_session_token(&token, SECRET, now).expect("verify");
        assert_eq!(verified, issued);
    }

    #[test]
    fn tampered_signature_is_invalid_not_expired() {
        let now = Utc::now();
        let mut expired = claims(now);
        expired.exp = now.timestamp() - 10;
        let token = mint_session_token(&expired, SECRET).expect("mint");
        let mut forged = token.clone();
        forged.pop();
        forged.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert_eq!(
            verify_session_token(&forged, SECRET, now),
            Err(SessionError::Invalid)
        );
        // The untouched token still reports expiry.
        assert_eq!(
            verify_session_token(&token, SECRET, now),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let now = Utc::now();
        let token = mint_session_token(&claims(now), b"some-other-secret-key").expect("mint");
        assert_eq!(
            verify_session_token(&token, SECRET, now),
            Err(SessionError::Invalid)
        );
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        let now = Utc::now();
        for raw in ["", "nodot", "a.b.c", "!!!.???", "YQ.YQ"] {
            assert_eq!(
                verify_session_token(raw, SECRET, now),
                Err(SessionError::Invalid),
                "token {raw:?}"
            );
        }
    }

    #[test]
    fn cookie_header_round_trips_through_request_headers() {
        let now = Utc::now();
        let token = mint_session_token(&claims(now), SECRET).expect("mint");
        let set_cookie = session_cookie_header(&token, Duration::from_secs(60), false);
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(!set_cookie.contains("Secure"));

        let cookie_value = set_cookie.split(';').next().expect("cookie pair");
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            format!("theme=dark; {cookie_value}").parse().expect("header"),
        );
        assert_eq!(session_token_from_headers(&headers), Some(token));
    }

    #[test]
    fn secure_flag_follows_config() {
        let set_cookie = session_cookie_header("t", Duration::from_secs(60), true);
        assert!(set_cookie.contains("; Secure"));
        assert!(clear_session_cookie_header(true).contains("Max-Age=0"));
    }

    #[test]
    fn role_guard_distinguishes_401_from_403() {
        let now = Utc::now();
        let session = claims(now);
        let err = require_role(&session, Role::Admin).expect_err("user is not admin");
        assert_eq!(err.code, ApiErrorCode::AuthInsufficientRole);

        let headers = HeaderMap::new();
        let err = authenticate(&headers, SECRET, now).expect_err("no cookie");
        assert_eq!(err.code, ApiErrorCode::AuthInvalid);
    }
}
