// SPDX-License-Identifier: Apache-2.0

use crate::auth::resolve_caller;
use crate::http::handlers::{api_error_response, json_body, store_error_response};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::{MarkReadRequest, NotificationView};
use billkhata_api::params::{bool_param, limit_param};
use billkhata_api::ApiError;
use billkhata_model::NotificationId;
use serde_json::json;
use std::collections::HashMap;

pub(crate) async fn list_notifications(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let unread_only = bool_param(&params, "unread");
    let limit = limit_param(&params, state.api.list_max_limit)
        .map_err(|e| api_error_response(ApiError::invalid_param("limit", &e, &request_id)))?;

    let mut rows = state
        .store
        .notifications_for(&caller.id, unread_only)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    rows.truncate(limit);
    let views: Vec<NotificationView> = rows
        .iter()
        .map(|n| NotificationView {
            id: n.id.to_string(),
            kind: n.kind,
            body: n.body.clone(),
            read: n.read,
            created_at: n.created_at,
        })
        .collect();
    Ok(Json(views).into_response())
}

pub(crate) async fn mark_read(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let req = json_body(body, &request_id)?;
    let mut ids = Vec::with_capacity(req.ids.len());
    for raw in &req.ids {
        ids.push(NotificationId::parse(raw).map_err(|e| {
            api_error_response(ApiError::invalid_body(&e.to_string(), &request_id))
        })?);
    }
    let updated = state
        .store
        .mark_notifications_read(&caller.id, &ids)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    Ok(Json(json!({"updated": updated})).into_response())
}
