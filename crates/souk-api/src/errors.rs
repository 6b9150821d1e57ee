// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use souk_checkout::CheckoutError;
use souk_model::ParseError;
use souk_store::StoreError;

/// Stable wire error codes; serialized snake_case (`out_of_stock`,
/// `auth_insufficient_role`, ...). Adding a variant requires a row in
/// `error_mapping::status_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    BadRequest,
    Validation,
    AuthExpired,
    AuthInvalid,
    AuthInsufficientRole,
    NotFound,
    Conflict,
    OutOfStock,
    Internal,
    Unavailable,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Validation => "validation",
            Self::AuthExpired => "auth_expired",
            Self::AuthInvalid => "auth_invalid",
            Self::AuthInsufficientRole => "auth_insufficient_role",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::OutOfStock => "out_of_stock",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    /// Errors are built before the request id is known; handlers stamp it on
    /// the way out.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::BadRequest,
            format!("invalid query parameter: {name}"),
            json!({"fieldErrors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn invalid_cursor(value: &str) -> Self {
        Self::new(
            ApiErrorCode::BadRequest,
            "invalid cursor",
            json!({"cursor": value}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn validation_failed(field_errors: Value) -> Self {
        Self::new(
            ApiErrorCode::Validation,
            "validation failed",
            json!({"fieldErrors": field_errors}),
            "req-unknown",
        )
    }

    /// One bad body field, named the way it appears on the wire.
    #[must_use]
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self::validation_failed(json!([{"field": field, "reason": reason.into()}]))
    }

    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::validation_failed(json!([{"field": field, "reason": "required"}]))
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{} not found", what.into()),
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Conflict, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn out_of_stock(
        product_id: &str,
        variant_id: Option<&str>,
        requested: u32,
        available: u32,
    ) -> Self {
        Self::new(
            ApiErrorCode::OutOfStock,
            "insufficient stock",
            json!({
                "productId": product_id,
                "variantId": variant_id,
                "requested": requested,
                "available": available,
            }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(
            ApiErrorCode::AuthExpired,
            "session expired",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn auth_invalid() -> Self {
        Self::new(
            ApiErrorCode::AuthInvalid,
            "invalid session token",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn insufficient_role(required: &str) -> Self {
        Self::new(
            ApiErrorCode::AuthInsufficientRole,
            "insufficient role",
            json!({"requiredRole": required}),
            "req-unknown",
        )
    }

    /// Detail stays in the server log; the wire gets a fixed message.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn unavailable(what: &str) -> Self {
        Self::new(
            ApiErrorCode::Unavailable,
            format!("{what} unavailable"),
            json!({}),
            "req-unknown",
        )
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::validation_failed(json!([{"reason": err.to_string()}]))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::conflict(msg),
            StoreError::InvalidCursor(msg) => Self::new(
                ApiErrorCode::BadRequest,
                "invalid cursor",
                json!({"reason": msg}),
                "req-unknown",
            ),
            _ => Self::internal(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart
            | CheckoutError::ZeroSubtotal
            | CheckoutError::InvalidQty { .. }
            | CheckoutError::AmountRange(_) => {
                Self::validation_failed(json!([{"reason": err.to_string()}]))
            }
            CheckoutError::UnknownProduct { product_id } => Self::new(
                ApiErrorCode::NotFound,
                format!("product {product_id} not found"),
                json!({"productId": product_id.to_string()}),
                "req-unknown",
            ),
            CheckoutError::UnknownVariant { variant_id } => Self::new(
                ApiErrorCode::NotFound,
                format!("variant {variant_id} not found"),
                json!({"variantId": variant_id.to_string()}),
                "req-unknown",
            ),
            CheckoutError::OutOfStock {
                product_id,
                variant_id,
                requested,
                available,
            } => Self::out_of_stock(
                &product_id.to_string(),
                variant_id.map(|v| v.to_string()).as_deref(),
                requested,
                available,
            ),
            _ => Self::internal(),
        }
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
};
