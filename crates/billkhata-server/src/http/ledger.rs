// SPDX-License-Identifier: Apache-2.0

//! Monthly ledger: one row per approved member, combining deposits, meal
//! cost at the khata's rate, and an even split of approved expenses.

use crate::auth::{require_member, resolve_caller};
use crate::http::handlers::{
    api_error_response, bad_path, load_khata, load_user, store_error_response,
};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::LedgerResponse;
use billkhata_api::params::month_param;
use billkhata_api::ApiError;
use billkhata_model::{compute_ledger, KhataId, UserId};
use std::collections::HashMap;

pub(crate) async fn get_ledger(
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
        .map_err(|e| api_error_response(ApiError::invalid_param("month", &e, &request_id)))?
        .ok_or_else(|| {
            api_error_response(ApiError::invalid_param(
                "month",
                "month is required",
                &request_id,
            ))
        })?;

    let khata_doc = load_khata(&state, &khata, &request_id).await?;

    // Pending joins are on the member index but carry no ledger weight.
    let mut members: Vec<UserId> = Vec::new();
    for member_id in state
        .store
        .khata_member_ids(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?
    {
        if let Some(user) = load_user(&state, &member_id, &request_id).await? {
            if user.approved_khata() == Some(&khata) {
                members.push(user.id);
            }
        }
    }

    let mut meals = state
        .store
        .meal_days(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    meals.retain(|m| month.contains(m.date));
    let mut deposits = state
        .store
        .deposits_by_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    deposits.retain(|d| month.contains(d.created_at.date_naive()));
    let mut expenses = state
        .store
        .expenses_by_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    expenses.retain(|e| month.contains(e.created_at.date_naive()));

    let rows = compute_ledger(
        &members,
        khata_doc.meal_rate_cents,
        &meals,
        &deposits,
        &expenses,
    );
    Ok(Json(LedgerResponse {
        khata: khata.to_string(),
        month: month.canonical_string(),
        meal_rate_cents: khata_doc.meal_rate_cents,
        rows,
    })
    .into_response())
}
