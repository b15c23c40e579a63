// SPDX-License-Identifier: Apache-2.0

use crate::approval::ApprovalStatus;
use crate::ids::{parse_cents, BillId, KhataId, ParseError, UserId, NAME_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One member's slice of a bill. Decided by that member, not the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillShare {
    pub member: UserId,
    pub amount_cents: i64,
    pub status: ApprovalStatus,
    pub decided_by: Option<UserId>,
}

impl BillShare {
    pub fn pending(member: UserId, amount_cents: i64) -> Result<Self, ParseError> {
        Ok(Self {
            member,
            amount_cents: parse_cents("share amount_cents", amount_cents)?,
            status: ApprovalStatus::Pending,
            decided_by: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bill {
    pub id: BillId,
    pub khata: KhataId,
    pub title: String,
    /// Billing month in `YYYY-MM` form.
    pub month: String,
    pub total_cents: i64,
    pub created_by: UserId,
    pub shares: Vec<BillShare>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BillId,
        khata: KhataId,
        title: &str,
        month: String,
        total_cents: i64,
        created_by: UserId,
        shares: Vec<BillShare>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        if title.trim().is_empty() {
            return Err(ParseError::Empty("bill title"));
        }
        if title.len() > NAME_MAX_LEN {
            return Err(ParseError::TooLong("bill title", NAME_MAX_LEN));
        }
        let total_cents = parse_cents("total_cents", total_cents)?;
        let bill = Self {
            id,
            khata,
            title: title.to_string(),
            month,
            total_cents,
            created_by,
            shares,
            created_at,
        };
        bill.validate_shares()?;
        Ok(bill)
    }

    /// Shares must name distinct members and sum exactly to the total.
    pub fn validate_shares(&self) -> Result<(), ParseError> {
        if self.shares.is_empty() {
            return Err(ParseError::Empty("bill shares"));
        }
        let mut seen = BTreeSet::new();
        for share in &self.shares {
            if !seen.insert(&share.member) {
                return Err(ParseError::InvalidFormat(
                    "bill shares must name distinct members",
                ));
            }
        }
        let sum: i64 = self.shares.iter().map(|s| s.amount_cents).sum();
        if sum != self.total_cents {
            return Err(ParseError::InvalidFormat(
                "bill shares must sum to total_cents",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn share_for(&self, member: &UserId) -> Option<&BillShare> {
        self.shares.iter().find(|s| &s.member == member)
    }

    pub fn share_for_mut(&mut self, member: &UserId) -> Option<&mut BillShare> {
        self.shares.iter_mut().find(|s| &s.member == member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).expect("id")
    }

    fn mk_bill(total: i64, shares: Vec<BillShare>) -> Result<Bill, ParseError> {
        Bill::new(
            BillId::parse("b1").expect("id"),
            KhataId::parse("k1").expect("id"),
            "Electricity",
            "2026-08".to_string(),
            total,
            uid("mgr"),
            shares,
            Utc::now(),
        )
    }

    #[test]
    fn shares_must_sum_to_total() {
        let shares = vec![
            BillShare::pending(uid("u1"), 600).expect("share"),
            BillShare::pending(uid("u2"), 300).expect("share"),
        ];
        assert!(mk_bill(1000, shares.clone()).is_err());
        assert!(mk_bill(900, shares).is_ok());
    }

    #[test]
    fn shares_must_be_distinct_and_nonempty() {
        assert!(mk_bill(0, Vec::new()).is_err());
        let dup = vec![
            BillShare::pending(uid("u1"), 100).expect("share"),
            BillShare::pending(uid("u1"), 100).expect("share"),
        ];
        assert!(mk_bill(200, dup).is_err());
    }

    #[test]
    fn negative_share_amount_is_rejected() {
        assert!(BillShare::pending(uid("u1"), -1).is_err());
    }
}
