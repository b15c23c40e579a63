// SPDX-License-Identifier: Apache-2.0

use crate::approval::ApprovalStatus;
use crate::ids::{parse_cents, ExpenseId, KhataId, ParseError, UserId, NAME_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared spending (groceries, gas refills) submitted by the member who
/// paid. Splits across the khata once the manager approves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expense {
    pub id: ExpenseId,
    pub khata: KhataId,
    pub spent_by: UserId,
    pub description: String,
    pub amount_cents: i64,
    pub status: ApprovalStatus,
    pub decided_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn pending(
        id: ExpenseId,
        khata: KhataId,
        spent_by: UserId,
        description: &str,
        amount_cents: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        if description.trim().is_empty() {
            return Err(ParseError::Empty("expense description"));
        }
        if description.len() > NAME_MAX_LEN {
            return Err(ParseError::TooLong("expense description", NAME_MAX_LEN));
        }
        Ok(Self {
            id,
            khata,
            spent_by,
            description: description.to_string(),
            amount_cents: parse_cents("amount_cents", amount_cents)?,
            status: ApprovalStatus::Pending,
            decided_by: None,
            created_at,
        })
    }
}
