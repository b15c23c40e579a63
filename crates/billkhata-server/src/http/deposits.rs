// SPDX-License-Identifier: Apache-2.0

use crate::approvals::{decide, ApprovalTarget};
use crate::auth::{require_member, resolve_caller};
use crate::http::handlers::{
    api_error_response, bad_path, json_body, load_khata, load_user, store_error_response,
};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::{DecisionRequest, DepositRequest};
use billkhata_api::params::{limit_param, month_param};
use billkhata_api::ApiError;
use billkhata_model::{Deposit, DepositId, KhataId, NotificationKind};
use chrono::Utc;

pub(crate) async fn submit_deposit(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &khata, &request_id)?;
    let req = json_body(body, &request_id)?;

    let deposit_id = DepositId::parse(&uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| api_error_response(ApiError::internal(&e.to_string(), &request_id)))?;
    let deposit = Deposit::pending(
        deposit_id,
        khata.clone(),
        caller.id.clone(),
        req.amount_cents,
        req.note,
        Utc::now(),
    )
    .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_deposit(&deposit)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;

    let khata_doc = load_khata(&state, &khata, &request_id).await?;
    if let Some(manager) = load_user(&state, &khata_doc.manager, &request_id).await? {
        let body = format!(
            "{} submitted a deposit of {} cents",
            caller.name, deposit.amount_cents
        );
        state
            .notifier
            .notify(&manager, NotificationKind::DepositSubmitted, &body)
            .await;
    }
    Ok(Json(deposit).into_response())
}

pub(crate) async fn list_deposits(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &khata, &request_id)?;
    let month = month_param(&params)
        .map_err(|e| api_error_response(ApiError::invalid_param("month", &e, &request_id)))?;
    let limit = limit_param(&params, state.api.list_max_limit)
        .map_err(|e| api_error_response(ApiError::invalid_param("limit", &e, &request_id)))?;

    let mut deposits = state
        .store
        .deposits_by_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    if let Some(month) = month {
        deposits.retain(|d| month.contains(d.created_at.date_naive()));
    }
    deposits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    deposits.truncate(limit);
    Ok(Json(deposits).into_response())
}

pub(crate) async fn decide_deposit(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = DepositId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let req = json_body(body, &request_id)?;
    decide(
        &state,
        &caller,
        ApprovalTarget::Deposit(id),
        req.decision,
        &request_id,
    )
    .await
}
