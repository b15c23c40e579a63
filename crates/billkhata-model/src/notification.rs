// SPDX-License-Identifier: Apache-2.0

use crate::ids::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MemberJoinRequested,
    MemberDecided,
    MemberRemoved,
    BillPublished,
    BillShareDecided,
    DepositSubmitted,
    DepositDecided,
    ExpenseSubmitted,
    ExpenseDecided,
    DutyAssigned,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemberJoinRequested => "member_join_requested",
            Self::MemberDecided => "member_decided",
            Self::MemberRemoved => "member_removed",
            Self::BillPublished => "bill_published",
            Self::BillShareDecided => "bill_share_decided",
            Self::DepositSubmitted => "deposit_submitted",
            Self::DepositDecided => "deposit_decided",
            Self::ExpenseSubmitted => "expense_submitted",
            Self::ExpenseDecided => "expense_decided",
            Self::DutyAssigned => "duty_assigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
