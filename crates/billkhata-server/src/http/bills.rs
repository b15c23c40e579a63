// SPDX-License-Identifier: Apache-2.0

//! Bills: the manager publishes a split, each member decides their own
//! share.

use crate::approvals::{decide, ApprovalTarget};
use crate::auth::{require_manager, require_member, resolve_caller};
use crate::http::handlers::{
    api_error_response, bad_path, json_body, load_user, store_error_response,
};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::{CreateBillRequest, DecisionRequest};
use billkhata_api::params::{limit_param, month_param, Month};
use billkhata_api::ApiError;
use billkhata_model::{Bill, BillId, BillShare, KhataId, NotificationKind, UserId};
use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

pub(crate) async fn create_bill(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<CreateBillRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_manager(&caller, &khata, &request_id)?;
    let req = json_body(body, &request_id)?;
    let month = Month::parse(&req.month)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e, &request_id)))?;

    let mut shares = Vec::with_capacity(req.shares.len());
    let mut share_members = Vec::with_capacity(req.shares.len());
    for spec in &req.shares {
        let member = UserId::parse(&spec.member)
            .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
        let user = load_user(&state, &member, &request_id)
            .await?
            .filter(|u| u.approved_khata() == Some(&khata))
            .ok_or_else(|| {
                api_error_response(ApiError::invalid_body(
                    "share member is not an approved member of this khata",
                    &request_id,
                ))
            })?;
        shares.push(
            BillShare::pending(member, spec.amount_cents).map_err(|e| {
                api_error_response(ApiError::invalid_body(&e.to_string(), &request_id))
            })?,
        );
        share_members.push(user);
    }

    let bill_id = BillId::parse(&uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| api_error_response(ApiError::internal(&e.to_string(), &request_id)))?;
    let bill = Bill::new(
        bill_id,
        khata,
        &req.title,
        month.canonical_string(),
        req.total_cents,
        caller.id.clone(),
        shares,
        Utc::now(),
    )
    .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_bill(&bill)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    info!(bill = %bill.id, khata = %bill.khata, "bill published");

    for member in &share_members {
        let share = bill.share_for(&member.id);
        let amount = share.map_or(0, |s| s.amount_cents);
        let body = format!(
            "New bill \"{}\" for {}: your share is {} cents",
            bill.title, bill.month, amount
        );
        state
            .notifier
            .notify(member, NotificationKind::BillPublished, &body)
            .await;
    }
    Ok(Json(bill).into_response())
}

pub(crate) async fn list_bills(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &khata, &request_id)?;
    let month = month_param(&params)
        .map_err(|e| api_error_response(ApiError::invalid_param("month", &e, &request_id)))?;
    let limit = limit_param(&params, state.api.list_max_limit)
        .map_err(|e| api_error_response(ApiError::invalid_param("limit", &e, &request_id)))?;

    let mut bills = state
        .store
        .bills_by_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    if let Some(month) = month {
        bills.retain(|b| b.month == month.canonical_string());
    }
    bills.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bills.truncate(limit);
    Ok(Json(bills).into_response())
}

pub(crate) async fn get_bill(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = BillId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let bill = state
        .store
        .bill_by_id(&id)
        .await
        .map_err(|e| store_error_response(e, &request_id))?
        .ok_or_else(|| api_error_response(ApiError::not_found("bill", &request_id)))?;
    require_member(&caller, &bill.khata, &request_id)?;
    Ok(Json(bill).into_response())
}

pub(crate) async fn decide_share(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path((id, member_id)): Path<(String, String)>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let bill = BillId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let member = UserId::parse(&member_id).map_err(|e| bad_path("member_id", e, &request_id))?;
    let req = json_body(body, &request_id)?;
    decide(
        &state,
        &caller,
        ApprovalTarget::BillShare { bill, member },
        req.decision,
        &request_id,
    )
    .await
}
