// SPDX-License-Identifier: Apache-2.0

use crate::error_mapping::status_for;
use crate::errors::{ApiError, ApiErrorCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every `/api` response, success or failure, travels in this shape:
/// `{"success": bool, "statusCode": u16, "message": string, "data": ...}`.
/// `data` is `null` exactly when a failure has nothing structured to say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code: 200,
            message: message.into(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code: 201,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Failure payload carried in `data`: the stable code, field-level details,
/// and the request id for log correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ApiErrorCode,
    pub details: Value,
    pub request_id: String,
}

impl Envelope<ErrorBody> {
    #[must_use]
    pub fn failure(error: &ApiError) -> Self {
        Self {
            success: false,
            status_code: status_for(error.code),
            message: error.message.clone(),
            data: Some(ErrorBody {
                code: error.code,
                details: error.details.clone(),
                request_id: error.request_id.clone(),
            }),
        }
    }
}
