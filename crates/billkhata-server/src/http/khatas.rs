// SPDX-License-Identifier: Apache-2.0

//! Khata lifecycle: creation, membership joins, the manager's membership
//! decisions, and the meal rate.

use crate::approvals::{decide, ApprovalTarget};
use crate::auth::{require_manager, require_member, resolve_caller};
use crate::http::handlers::{
    api_error_response, bad_path, json_body, load_khata, load_user, store_error_response,
    user_view,
};
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use billkhata_api::dto::{CreateKhataRequest, DecisionRequest, MealRateRequest, MemberView};
use billkhata_api::ApiError;
use billkhata_model::{ApprovalStatus, Khata, KhataId, Membership, User, UserId};
use chrono::Utc;
use tracing::info;

fn may_take_a_khata(user: &User) -> bool {
    match &user.membership {
        None => true,
        // A rejected join leaves the user free to try elsewhere.
        Some(m) => m.status == ApprovalStatus::Rejected,
    }
}

pub(crate) async fn create_khata(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<CreateKhataRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let mut caller = resolve_caller(&state, &headers, &request_id).await?;
    let req = json_body(body, &request_id)?;
    if !may_take_a_khata(&caller) {
        return Err(api_error_response(ApiError::conflict(
            "user already belongs to a khata",
            &request_id,
        )));
    }

    let id = KhataId::parse(&uuid::Uuid::new_v4().simple().to_string())
        .map_err(|e| api_error_response(ApiError::internal(&e.to_string(), &request_id)))?;
    let khata = Khata::new(id.clone(), &req.name, caller.id.clone(), Utc::now())
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;

    caller.membership = Some(Membership::manager(id.clone()));
    state
        .store
        .put_user(&caller)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state
        .store
        .add_khata_member(&id, &caller.id)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state.sessions.lock().await.invalidate_user(&caller.id);
    info!(khata = %id, manager = %caller.id, "khata created");
    Ok(Json(khata).into_response())
}

pub(crate) async fn get_khata(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &id, &request_id)?;
    let khata = load_khata(&state, &id, &request_id).await?;
    Ok(Json(khata).into_response())
}

/// Lists everyone attached to the khata, pending joins included, so the
/// manager can see what awaits a decision.
pub(crate) async fn list_members(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_member(&caller, &id, &request_id)?;

    let member_ids = state
        .store
        .khata_member_ids(&id)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    let mut members = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        let Some(user) = load_user(&state, &member_id, &request_id).await? else {
            continue;
        };
        let Some(membership) = user.membership.as_ref().filter(|m| m.khata == id) else {
            continue;
        };
        members.push(MemberView {
            id: user.id.to_string(),
            name: user.name.clone(),
            role: membership.role,
            status: membership.status,
        });
    }
    members.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(members).into_response())
}

pub(crate) async fn join_khata(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    let mut caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    if !may_take_a_khata(&caller) {
        return Err(api_error_response(ApiError::conflict(
            "user already belongs to a khata",
            &request_id,
        )));
    }
    let khata = load_khata(&state, &id, &request_id).await?;

    caller.membership = Some(Membership::pending_member(id.clone()));
    state
        .store
        .put_user(&caller)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state
        .store
        .add_khata_member(&id, &caller.id)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state.sessions.lock().await.invalidate_user(&caller.id);

    if let Some(manager) = load_user(&state, &khata.manager, &request_id).await? {
        let body = format!("{} asked to join {}", caller.name, khata.name);
        state
            .notifier
            .notify(
                &manager,
                billkhata_model::NotificationKind::MemberJoinRequested,
                &body,
            )
            .await;
    }
    Ok(Json(user_view(&caller)).into_response())
}

/// Removes a member from the khata: the manager evicts, or the member
/// leaves on their own. The manager cannot leave their own khata.
pub(crate) async fn remove_member(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let member = UserId::parse(&user_id).map_err(|e| bad_path("user_id", e, &request_id))?;
    let removed_by_manager = caller.id != member;
    if removed_by_manager {
        require_manager(&caller, &khata, &request_id)?;
    }

    let mut user = load_user(&state, &member, &request_id)
        .await?
        .ok_or_else(|| api_error_response(ApiError::not_found("user", &request_id)))?;
    if user.membership.as_ref().map(|m| &m.khata) != Some(&khata) {
        return Err(api_error_response(ApiError::not_found(
            "membership",
            &request_id,
        )));
    }
    let khata_doc = load_khata(&state, &khata, &request_id).await?;
    if khata_doc.manager == member {
        return Err(api_error_response(ApiError::conflict(
            "the manager cannot leave their own khata",
            &request_id,
        )));
    }

    user.membership = None;
    state
        .store
        .put_user(&user)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state
        .store
        .remove_khata_member(&khata, &member)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    state.sessions.lock().await.invalidate_user(&member);
    info!(khata = %khata, member = %member, "member removed");

    if removed_by_manager {
        let body = format!("You were removed from {}", khata_doc.name);
        state
            .notifier
            .notify(&user, billkhata_model::NotificationKind::MemberRemoved, &body)
            .await;
    }
    Ok(axum::http::StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn decide_membership(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(String, String)>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let khata = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    let member = UserId::parse(&user_id).map_err(|e| bad_path("user_id", e, &request_id))?;
    let req = json_body(body, &request_id)?;
    decide(
        &state,
        &caller,
        ApprovalTarget::Membership { khata, member },
        req.decision,
        &request_id,
    )
    .await
}

pub(crate) async fn set_meal_rate(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<MealRateRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let caller = resolve_caller(&state, &headers, &request_id).await?;
    let id = KhataId::parse(&id).map_err(|e| bad_path("id", e, &request_id))?;
    require_manager(&caller, &id, &request_id)?;
    let req = json_body(body, &request_id)?;
    let mut khata = load_khata(&state, &id, &request_id).await?;
    khata
        .set_meal_rate(req.meal_rate_cents)
        .map_err(|e| api_error_response(ApiError::invalid_body(&e.to_string(), &request_id)))?;
    state
        .store
        .put_khata(&khata)
        .await
        .map_err(|e| store_error_response(e, &request_id))?;
    Ok(Json(khata).into_response())
}
