// SPDX-License-Identifier: Apache-2.0

use crate::StoreError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use souk_model::{CategoryId, Money, VendorId};

type HmacSha256 = Hmac<Sha256>;

/// Storefront listing filters. The cursor is bound to a canonical hash of
/// this struct so a token minted for one filter set cannot page another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorefrontFilter {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub vendor_id: Option<VendorId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub featured_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogPageRequest {
    pub filter: StorefrontFilter,
    pub limit: usize,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct CursorPayload {
    pub(crate) last_created_at: i64,
    pub(crate) last_id: String,
    pub(crate) filter_hash: String,
}

pub(crate) fn filter_hash(filter: &StorefrontFilter) -> Result<String, StoreError> {
    souk_core::canonical::stable_json_hash_hex(filter)
        .map_err(|e| StoreError::Other(format!("filter hash: {e}")))
}

pub(crate) fn encode_cursor(
    payload: &CursorPayload,
    secret: &[u8],
) -> Result<String, StoreError> {
    let payload_bytes =
        serde_json::to_vec(payload).map_err(|e| StoreError::Other(e.to_string()))?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| StoreError::Other(e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let sig = mac.finalize().into_bytes();
    let sig_part = URL_SAFE_NO_PAD.encode(sig);
    Ok(format!("{payload_part}.{sig_part}"))
}

pub(crate) fn decode_cursor(
    token: &str,
    secret: &[u8],
    expected_filter_hash: &str,
) -> Result<CursorPayload, StoreError> {
    let (payload_part, sig_part) = token
        .split_once('.')
        .ok_or_else(|| StoreError::InvalidCursor("missing signature separator".to_string()))?;

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| StoreError::Other(e.to_string()))?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|e| StoreError::InvalidCursor(e.to_string()))?;
    mac.verify_slice(&expected)
        .map_err(|_| StoreError::InvalidCursor("signature mismatch".to_string()))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|e| StoreError::InvalidCursor(e.to_string()))?;
    let payload: CursorPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|e| StoreError::InvalidCursor(e.to_string()))?;

    if payload.filter_hash != expected_filter_hash {
        return Err(StoreError::InvalidCursor(
            "filter mismatch for this cursor".to_string(),
        ));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-cursor-secret";

    fn payload(hash: &str) -> CursorPayload {
        CursorPayload {
            last_created_at: 1_700_000_000_000,
            last_id: "p-last".to_string(),
            filter_hash: hash.to_string(),
        }
    }

    #[test]
    fn cursor_round_trips_with_matching_filter() {
        let filter = StorefrontFilter::default();
        let hash = filter_hash(&filter).expect("hash");
        let token = encode_cursor(&payload(&hash), SECRET).expect("encode");
        let decoded = decode_cursor(&token, SECRET, &hash).expect("decode");
        assert_eq!(decoded.last_id, "p-last");
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let filter = StorefrontFilter::default();
        let hash = filter_hash(&filter).expect("hash");
        let token = encode_cursor(&payload(&hash), SECRET).expect("encode");
        let (p, s) = token.split_once('.').expect("parts");
        let mut bytes = URL_SAFE_NO_PAD.decode(p).expect("decode");
        bytes[0] ^= 0x01;
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(bytes), s);
        assert!(matches!(
            decode_cursor(&forged, SECRET, &hash),
            Err(StoreError::InvalidCursor(_))
        ));
    }

    #[test]
    fn cursor_is_bound_to_its_filter() {
        let open = StorefrontFilter::default();
        let narrowed = StorefrontFilter {
            featured_only: true,
            ..StorefrontFilter::default()
        };
        let open_hash = filter_hash(&open).expect("hash");
        let narrowed_hash = filter_hash(&narrowed).expect("hash");
        let token = encode_cursor(&payload(&open_hash), SECRET).expect("encode");
        assert!(decode_cursor(&token, SECRET, &narrowed_hash).is_err());
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let filter = StorefrontFilter::default();
        let hash = filter_hash(&filter).expect("hash");
        let token = encode_cursor(&payload(&hash), SECRET).expect("encode");
        assert!(decode_cursor(&token, b"other-secret", &hash).is_err());
    }
}
