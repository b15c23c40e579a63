// SPDX-License-Identifier: Apache-2.0

use crate::auth::{require_member, resolve_caller};
use crate::http::handlers::{api_error_response, bad_path, json_body, store_error_response};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::MealUpdateRequest;
use billkhata_api::params::{limit_param, month_param, parse_date};
use billkhata_api::ApiError;
use billkhata_model::{KhataId, MealDay, UserId};
use std::collections::HashMap;

/// Upserts the caller's own meal counts for one day.
pub(crate) async fn put_meal_day(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path((id, date)): Path<(String, String)>,
    body: Result<Json<MealUpdateRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &khata, &request_id)?;
    let date = parse_date(&date).map_err(|e| bad_path("date", e, &request_id))?;
    let req = json_body(body, &request_id)?;

    let day = MealDay::new(khata, caller.id, date, req.breakfast, req.lunch, req.dinner)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_meal_day(&day)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    Ok(Json(day).into_response())
}

pub(crate) async fn list_meal_days(
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
    let member = params
        .get("member")
        .map(|raw| UserId::parse(raw))
        .transpose()
        .map_err(|e| bad_path("member", e, &request_id))?;

    let mut days = state
        .store
        .meal_days(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    if let Some(month) = month {
        days.retain(|d| month.contains(d.date));
    }
    if let Some(member) = member {
        days.retain(|d| d.member == member);
    }
    days.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.member.cmp(&b.member)));
    days.truncate(limit);
    Ok(Json(days).into_response())
}
