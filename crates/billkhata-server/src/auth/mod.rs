// SPDX-License-Identifier: Apache-2.0

//! Caller resolution: bearer token or session cookie, served through a
//! short-lived in-process cache in front of the session store.

pub(crate) mod password;
pub mod session_cache;

use crate::http::handlers::api_error_response;
use crate::AppState;
use axum::http::HeaderMap;
use axum::response::Response;
use billkhata_api::ApiError;
use billkhata_model::{KhataId, User};
use tracing::error;

pub(crate) const SESSION_COOKIE: &str = "billkhata_session";

/// `Authorization: Bearer <token>` wins over the session cookie.
#[must_use]
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string);
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| {
            raw.split(';').map(str::trim).find_map(|pair| {
                pair.strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

pub(crate) async fn resolve_caller(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &str,
) -> Result<User, Response> {
    let Some(token) = extract_token(headers) else {
        return Err(api_error_response(ApiError::unauthorized(request_id)));
    };

    if let Some(user) = state.sessions.lock().await.get(&token) {
        return Ok(user);
    }

    let user_id = state
        .store
        .session_user(&token)
        .await
        .map_err(|e| {
            error!(error = %e, "session lookup failed");
            api_error_response(ApiError::internal("session lookup failed", request_id))
        })?
        .ok_or_else(|| api_error_response(ApiError::unauthorized(request_id)))?;

    let user = state
        .store
        .user_by_id(&user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "user lookup failed");
            api_error_response(ApiError::internal("user lookup failed", request_id))
        })?
        .ok_or_else(|| api_error_response(ApiError::unauthorized(request_id)))?;

    state
        .sessions
        .lock()
        .await
        .insert(token, user.clone());
    Ok(user)
}

/// Caller must hold an approved membership in `khata`.
pub(crate) fn require_member(
    caller: &User,
    khata: &KhataId,
    request_id: &str,
) -> Result<(), Response> {
    if caller.approved_khata() == Some(khata) {
        Ok(())
    } else {
        Err(api_error_response(ApiError::forbidden(
            "not an approved member of this khata",
            request_id,
        )))
    }
}

/// Caller must be the approved manager of `khata`.
pub(crate) fn require_manager(
    caller: &User,
    khata: &KhataId,
    request_id: &str,
) -> Result<(), Response> {
    if caller.is_manager_of(khata) {
        Ok(())
    } else {
        Err(api_error_response(ApiError::forbidden(
            "only the khata manager may do that",
            request_id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_beats_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-a"));
        headers.insert(
            "cookie",
            HeaderValue::from_static("billkhata_session=tok-b; theme=dark"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok-a"));
    }

    #[test]
    fn cookie_is_found_among_other_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; billkhata_session=tok-c"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok-c"));
    }

    #[test]
    fn missing_or_empty_tokens_resolve_to_none() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers), None);
    }
}
