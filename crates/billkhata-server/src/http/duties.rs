// SPDX-License-Identifier: Apache-2.0

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
use billkhata_api::dto::{DutyAssignRequest, DutyView};
use billkhata_api::params::{limit_param, month_param, parse_date};
use billkhata_api::ApiError;
use billkhata_model::{KhataId, NotificationKind, ShoppingDuty, UserId};
use std::collections::HashMap;

fn duty_view(duty: &ShoppingDuty) -> DutyView {
    DutyView {
        member: duty.member.to_string(),
        date: duty.date,
        note: duty.note.clone(),
    }
}

/// Assigns (or reassigns) the shopping duty for one date. Manager only;
/// one member holds the duty per khata per day.
pub(crate) async fn assign_duty(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path((id, date)): Path<(String, String)>,
    body: Result<Json<DutyAssignRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_manager(&caller, &khata, &request_id)?;
    let date = parse_date(&date).map_err(|e| bad_path("date", e, &request_id))?;
    let req = json_body(body, &request_id)?;

    let member = UserId::parse(&req.member)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    let member_user = load_user(&state, &member, &request_id)
        .await?
        .filter(|u| u.approved_khata() == Some(&khata))
        .ok_or_else(|| {
            api_error_response(ApiError::invalid_body(
                "duty member is not an approved member of this khata",
                &request_id,
            ))
        })?;

    let duty = ShoppingDuty::new(khata, member, date, req.note)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_duty(&duty)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;

    let body = format!("You are on shopping duty on {}", duty.date);
    state
        .notifier
        .notify(&member_user, NotificationKind::DutyAssigned, &body)
        .await;
    Ok(Json(duty_view(&duty)).into_response())
}

pub(crate) async fn list_duties(
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

    let mut duties = state
        .store
        .duties(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    if let Some(month) = month {
        duties.retain(|d| month.contains(d.date));
    }
    duties.sort_by(|a, b| a.date.cmp(&b.date));
    duties.truncate(limit);
    let views: Vec<DutyView> = duties.iter().map(duty_view).collect();
    Ok(Json(views).into_response())
}
