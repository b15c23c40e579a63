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
use billkhata_api::dto::{DecisionRequest, ExpenseRequest};
use billkhata_api::params::{limit_param, month_param};
use billkhata_api::ApiError;
use billkhata_model::{Expense, ExpenseId, KhataId, NotificationKind};
use chrono::Utc;

pub(crate) async fn submit_expense(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &khata, &request_id)?;
    let req = json_body(body, &request_id)?;

    let expense_id = ExpenseId::parse(&uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| api_error_response(ApiError::internal(&e.to_string(), &request_id)))?;
    let expense = Expense::pending(
        expense_id,
        khata.clone(),
        caller.id.clone(),
        &req.description,
        req.amount_cents,
        Utc::now(),
    )
    .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_expense(&expense)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;

    let khata_doc = load_khata(&state, &khata, &request_id).await?;
    if let Some(manager) = load_user(&state, &khata_doc.manager, &request_id).await? {
        let body = format!(
            "{} submitted expense \"{}\" for {} cents",
            caller.name, expense.description, expense.amount_cents
        );
        state
            .notifier
            .notify(&manager, NotificationKind::ExpenseSubmitted, &body)
            .await;
    }
    Ok(Json(expense).into_response())
}

pub(crate) async fn list_expenses(
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

    let mut expenses = state
        .store
        .expenses_by_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    if let Some(month) = month {
        expenses.retain(|e| month.contains(e.created_at.date_naive()));
    }
    expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    expenses.truncate(limit);
    Ok(Json(expenses).into_response())
}

pub(crate) async fn decide_expense(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = ExpenseId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let req = json_body(body, &request_id)?;
    decide(
        &state,
        &caller,
        ApprovalTarget::Expense(id),
        req.decision,
        &request_id,
    )
    .await
}
