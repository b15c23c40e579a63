// SPDX-License-Identifier: Apache-2.0

//! One decision routine for every approvable record. Each target loads,
//! authorizes, applies the shared status machine, persists, and fans out
//! a notification; handlers stay free of copy-pasted status flips.

use crate::auth::{require_manager, require_member};
use crate::http::handlers::{api_error_response, load_user, store_error_response, user_view};
use crate::AppState;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billkhata_api::ApiError;
use billkhata_model::{
    ApprovalStatus, BillId, Decision, DepositId, ExpenseId, KhataId, NotificationKind,
    TransitionError, User, UserId,
};

pub(crate) enum ApprovalTarget {
    Membership { khata: KhataId, member: UserId },
    BillShare { bill: BillId, member: UserId },
    Deposit(DepositId),
    Expense(ExpenseId),
}

fn apply_status(
    status: ApprovalStatus,
    decision: Decision,
    request_id: &str,
) -> Result<ApprovalStatus, Response> {
    match status.apply(decision) {
        Ok(next) => Ok(next),
        Err(TransitionError::NotPending(current)) => Err(api_error_response(
            ApiError::not_pending(current.as_str(), request_id),
        )),
        Err(_) => Err(api_error_response(ApiError::internal(
            "unknown transition failure",
            request_id,
        ))),
    }
}

pub(crate) async fn decide(
    state: &AppState,
    caller: &User,
    target: ApprovalTarget,
    decision: Decision,
    request_id: &str,
) -> Result<Response, Response> {
    match target {
        ApprovalTarget::Membership { khata, member } => {
            decide_membership(state, caller, khata, member, decision, request_id).await
        }
        ApprovalTarget::BillShare { bill, member } => {
            decide_bill_share(state, caller, bill, member, decision, request_id).await
        }
        ApprovalTarget::Deposit(id) => {
            decide_deposit(state, caller, id, decision, request_id).await
        }
        ApprovalTarget::Expense(id) => {
            decide_expense(state, caller, id, decision, request_id).await
        }
    }
}

async fn decide_membership(
    state: &AppState,
    caller: &User,
    khata: KhataId,
    member: UserId,
    decision: Decision,
    request_id: &str,
) -> Result<Response, Response> {
    require_manager(caller, &khata, request_id)?;
    let mut user = load_user(state, &member, request_id)
        .await?
        .ok_or_else(|| api_error_response(ApiError::not_found("user", request_id)))?;
    let Some(membership) = user.membership.as_mut().filter(|m| m.khata == khata) else {
        return Err(api_error_response(ApiError::not_found(
            "membership",
            request_id,
        )));
    };
    let next = apply_status(membership.status, decision, request_id)?;
    membership.status = next;
    if next == ApprovalStatus::Rejected {
        state
            .store
            .remove_khata_member(&khata, &member)
            .await
            .map_err(|e| store_error_response(e, request_id))?;
    }
    state
        .store
        .put_user(&user)
        .await
        .map_err(|e| store_error_response(e, request_id))?;
    // The decided user may hold live sessions carrying the old membership.
    state.sessions.lock().await.invalidate_user(&member);

    let body = format!(
        "Your request to join the khata was {}",
        next.as_str()
    );
    state
        .notifier
        .notify(&user, NotificationKind::MemberDecided, &body)
        .await;
    Ok(Json(user_view(&user)).into_response())
}

async fn decide_bill_share(
    state: &AppState,
    caller: &User,
    bill_id: BillId,
    member: UserId,
    decision: Decision,
    request_id: &str,
) -> Result<Response, Response> {
    let mut bill = state
        .store
        .bill_by_id(&bill_id)
        .await
        .map_err(|e| store_error_response(e, request_id))?
        .ok_or_else(|| api_error_response(ApiError::not_found("bill", request_id)))?;
    require_member(caller, &bill.khata, request_id)?;
    // A share is accepted or disputed by the member it belongs to.
    if caller.id != member {
        return Err(api_error_response(ApiError::forbidden(
            "only the share's member may decide it",
            request_id,
        )));
    }
    let Some(share) = bill.share_for_mut(&member) else {
        return Err(api_error_response(ApiError::not_found(
            "bill share",
            request_id,
        )));
    };
    let next = apply_status(share.status, decision, request_id)?;
    share.status = next;
    share.decided_by = Some(caller.id.clone());
    state
        .store
        .put_bill(&bill)
        .await
        .map_err(|e| store_error_response(e, request_id))?;

    if let Some(creator) = load_user(state, &bill.created_by, request_id).await? {
        let body = format!(
            "{} {} their share of \"{}\"",
            caller.name,
            next.as_str(),
            bill.title
        );
        state
            .notifier
            .notify(&creator, NotificationKind::BillShareDecided, &body)
            .await;
    }
    Ok(Json(bill).into_response())
}

async fn decide_deposit(
    state: &AppState,
    caller: &User,
    id: DepositId,
    decision: Decision,
    request_id: &str,
) -> Result<Response, Response> {
    let mut deposit = state
        .store
        .deposit_by_id(&id)
        .await
        .map_err(|e| store_error_response(e, request_id))?
        .ok_or_else(|| api_error_response(ApiError::not_found("deposit", request_id)))?;
    require_manager(caller, &deposit.khata, request_id)?;
    let next = apply_status(deposit.status, decision, request_id)?;
    deposit.status = next;
    deposit.decided_by = Some(caller.id.clone());
    state
        .store
        .put_deposit(&deposit)
        .await
        .map_err(|e| store_error_response(e, request_id))?;

    if let Some(member) = load_user(state, &deposit.member, request_id).await? {
        let body = format!(
            "Your deposit of {} cents was {}",
            deposit.amount_cents,
            next.as_str()
        );
        state
            .notifier
            .notify(&member, NotificationKind::DepositDecided, &body)
            .await;
    }
    Ok(Json(deposit).into_response())
}

async fn decide_expense(
    state: &AppState,
    caller: &User,
    id: ExpenseId,
    decision: Decision,
    request_id: &str,
) -> Result<Response, Response> {
    let mut expense = state
        .store
        .expense_by_id(&id)
        .await
        .map_err(|e| store_error_response(e, request_id))?
        .ok_or_else(|| api_error_response(ApiError::not_found("expense", request_id)))?;
    require_manager(caller, &expense.khata, request_id)?;
    let next = apply_status(expense.status, decision, request_id)?;
    expense.status = next;
    expense.decided_by = Some(caller.id.clone());
    state
        .store
        .put_expense(&expense)
        .await
        .map_err(|e| store_error_response(e, request_id))?;

    if let Some(member) = load_user(state, &expense.spent_by, request_id).await? {
        let body = format!(
            "Your expense \"{}\" was {}",
            expense.description,
            next.as_str()
        );
        state
            .notifier
            .notify(&member, NotificationKind::ExpenseDecided, &body)
            .await;
    }
    Ok(Json(expense).into_response())
}
