// SPDX-License-Identifier: Apache-2.0

//! Shared handler plumbing plus the operational endpoints.

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billkhata_api::error_mapping::status_for;
use billkhata_api::ApiError;
use billkhata_model::{User, UserId};
use billkhata_store::StoreError;
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::error;

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(status_for(err.code)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

/// Conflicts surface as 409s; everything else from the store is a 500.
pub(crate) fn store_error_response(err: StoreError, request_id: &str) -> Response {
    match err {
        StoreError::Conflict(reason) => {
            api_error_response(ApiError::conflict(&reason, request_id))
        }
        other => {
            error!(error = %other, "store operation failed");
            api_error_response(ApiError::internal("storage failure", request_id))
        }
    }
}

pub(crate) fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    request_id: &str,
) -> Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(api_error_response(ApiError::invalid_body(
            &rejection.body_text(),
            request_id,
        ))),
    }
}

pub(crate) fn user_view(user: &User) -> billkhata_api::dto::UserView {
    billkhata_api::dto::UserView {
        id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        khata: user.membership.as_ref().map(|m| m.khata.to_string()),
        role: user.membership.as_ref().map(|m| m.role),
        membership_status: user.membership.as_ref().map(|m| m.status),
    }
}

pub(crate) fn bad_path(name: &str, err: impl std::fmt::Display, request_id: &str) -> Response {
    api_error_response(ApiError::invalid_param(name, &err.to_string(), request_id))
}

pub(crate) async fn load_khata(
    state: &AppState,
    id: &billkhata_model::KhataId,
    request_id: &str,
) -> Result<billkhata_model::Khata, Response> {
    state
        .store
        .khata_by_id(id)
        .await
        .map_err(|e| store_error_response(e, request_id))?
        .ok_or_else(|| api_error_response(ApiError::not_found("khata", request_id)))
}

pub(crate) async fn load_user(
    state: &AppState,
    id: &UserId,
    request_id: &str,
) -> Result<Option<User>, Response> {
    state
        .store
        .user_by_id(id)
        .await
        .map_err(|e| store_error_response(e, request_id))
}

pub(crate) async fn not_found(
    axum::Extension(crate::middleware::request_tracing::RequestId(request_id)): axum::Extension<
        crate::middleware::request_tracing::RequestId,
    >,
) -> Response {
    api_error_response(ApiError::not_found("route", &request_id))
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

pub(crate) async fn readyz(State(state): State<AppState>) -> Response {
    if state.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

pub(crate) async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics.render_prometheus().await;
    ([("content-type", "text/plain; version=0.0.4")], body).into_response()
}
