// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidRequestBody,
    InvalidQueryParameter,
    Conflict,
    NotPending,
    RateLimited,
    Unavailable,
    Internal,
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

    #[must_use]
    pub fn unauthorized(request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            "missing or invalid session token",
            json!({}),
            request_id,
        )
    }

    #[must_use]
    pub fn forbidden(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Forbidden,
            "caller is not allowed to do that",
            json!({"reason": reason}),
            request_id,
        )
    }

    #[must_use]
    pub fn not_found(what: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{what} not found"),
            json!({"resource": what}),
            request_id,
        )
    }

    #[must_use]
    pub fn invalid_body(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidRequestBody,
            "invalid request body",
            json!({"reason": reason}),
            request_id,
        )
    }

    #[must_use]
    pub fn invalid_param(name: &str, reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "reason": reason}),
            request_id,
        )
    }

    #[must_use]
    pub fn conflict(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Conflict,
            "request conflicts with current state",
            json!({"reason": reason}),
            request_id,
        )
    }

    #[must_use]
    pub fn not_pending(current_status: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::NotPending,
            "record already decided",
            json!({"status": current_status}),
            request_id,
        )
    }

    #[must_use]
    pub fn unavailable(reason: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Unavailable,
            "service unavailable",
            json!({"reason": reason}),
            request_id,
        )
    }

    #[must_use]
    pub fn internal(message: &str, request_id: &str) -> Self {
        Self::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({"message": message}),
            request_id,
        )
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_screaming_snake() {
        let err = ApiError::not_pending("approved", "req-1");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["code"], "NOT_PENDING");
        assert_eq!(value["request_id"], "req-1");
        assert_eq!(value["details"]["status"], "approved");
    }
}
