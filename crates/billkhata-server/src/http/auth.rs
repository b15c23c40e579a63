// SPDX-License-Identifier: Apache-2.0

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{extract_token, resolve_caller, SESSION_COOKIE};
use crate::http::handlers::{api_error_response, json_body, store_error_response, user_view};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use billkhata_api::dto::{LoginRequest, SessionResponse, SignupRequest};
use billkhata_api::ApiError;
use billkhata_model::user::{validate_email, validate_name};
use billkhata_model::{User, UserId};
use chrono::Utc;
use rand::RngCore;
use tracing::info;

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Persists a fresh session and returns the token plus a `Set-Cookie`
/// response carrying it.
async fn open_session(
    state: &AppState,
    user: &User,
    request_id: &str,
) -> Result<Response, Response> {
    let token = new_session_token();
    state
        .store
        .put_session(&token, &user.id, state.api.session_ttl)
        .await
        .map_err(|e| store_error_response(e, request_id))?;
    state
        .sessions
        .lock()
        .await
        .insert(token.clone(), user.clone());

    let body = SessionResponse {
        token: token.clone(),
        user: user_view(user),
    };
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}",
        state.api.session_ttl.as_secs()
    );
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert("set-cookie", value);
    }
    Ok(response)
}

pub(crate) async fn signup(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let req = json_body(body, &request_id)?;
    validate_name(&req.name)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    validate_email(&req.email)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    if req.password.len() < state.api.min_password_len {
        return Err(api_error_response(ApiError::invalid_body(
            "password is too short",
            &request_id,
        )));
    }

    let id = UserId::parse(&uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| api_error_response(ApiError::internal(&e.to_string(), &request_id)))?;
    let user = User {
        id,
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash: hash_password(&req.password),
        membership: None,
        created_at: Utc::now(),
    };
    state
        .store
        .create_user(&user)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    info!(user = %user.id, "user signed up");
    open_session(&state, &user, &request_id).await
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let req = json_body(body, &request_id)?;
    let user = state
        .store
        .user_by_email(&req.email)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        return Err(api_error_response(ApiError::unauthorized(&request_id)));
    };
    open_session(&state, &user, &request_id).await
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let Some(token) = extract_token(&headers) else {
        return Err(api_error_response(ApiError::unauthorized(&request_id)));
    };
    state
        .store
        .delete_session(&token)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state.sessions.lock().await.invalidate_token(&token);
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn me(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    Ok(Json(user_view(&caller)).into_response())
}
