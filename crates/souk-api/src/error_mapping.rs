// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

/// HTTP status for a wire error code. The envelope's `statusCode` field and
/// the transport status line both come from here, so they cannot drift.
#[must_use]
pub const fn status_for(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::BadRequest | ApiErrorCode::Validation => 400,
        ApiErrorCode::AuthExpired | ApiErrorCode::AuthInvalid => 401,
        ApiErrorCode::AuthInsufficientRole => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Conflict | ApiErrorCode::OutOfStock => 409,
        ApiErrorCode::Unavailable => 503,
        _ => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> u16 {
    status_for(error.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_is_stable() {
        for (code, status) in [
            (ApiErrorCode::BadRequest, 400),
            (ApiErrorCode::Validation, 400),
            (ApiErrorCode::AuthExpired, 401),
            (ApiErrorCode::AuthInvalid, 401),
            (ApiErrorCode::AuthInsufficientRole, 403),
            (ApiErrorCode::NotFound, 404),
            (ApiErrorCode::Conflict, 409),
            (ApiErrorCode::OutOfStock, 409),
            (ApiErrorCode::Internal, 500),
            (ApiErrorCode::Unavailable, 503),
        ] {
            assert_eq!(status_for(code), status, "{}", code.as_str());
        }
    }

    #[test]
    fn map_error_reads_the_code() {
        assert_eq!(map_error(&ApiError::not_found("product")), 404);
        assert_eq!(map_error(&ApiError::auth_expired()), 401);
        assert_eq!(map_error(&ApiError::internal()), 500);
    }
}
