// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiErrorCode;

/// HTTP status for each error code. Kept as a bare `u16` so the api crate
/// stays off the web framework.
#[must_use]
pub const fn status_for(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::Forbidden => 403,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::InvalidRequestBody => 400,
        ApiErrorCode::InvalidQueryParameter => 400,
        ApiErrorCode::Conflict => 409,
        ApiErrorCode::NotPending => 409,
        ApiErrorCode::RateLimited => 429,
        ApiErrorCode::Unavailable => 503,
        ApiErrorCode::Internal => 500,
    }
}
