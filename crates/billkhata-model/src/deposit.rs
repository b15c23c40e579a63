// SPDX-License-Identifier: Apache-2.0

use crate::approval::ApprovalStatus;
use crate::ids::{parse_cents, DepositId, KhataId, ParseError, UserId, NAME_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Money a member hands to the manager for the shared kitty. Counts
/// toward the member's balance only once the manager approves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Deposit {
    pub id: DepositId,
    pub khata: KhataId,
    pub member: UserId,
    pub amount_cents: i64,
    pub note: Option<String>,
    pub status: ApprovalStatus,
    pub decided_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Deposit {
    pub fn pending(
        id: DepositId,
        khata: KhataId,
        member: UserId,
        amount_cents: i64,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        if let Some(note) = &note {
            if note.len() > NAME_MAX_LEN {
                return Err(ParseError::TooLong("deposit note", NAME_MAX_LEN));
            }
        }
        Ok(Self {
            id,
            khata,
            member,
            amount_cents: parse_cents("amount_cents", amount_cents)?,
            note,
            status: ApprovalStatus::Pending,
            decided_by: None,
            created_at,
        })
    }
}
