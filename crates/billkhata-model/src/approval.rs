// SPDX-License-Identifier: Apache-2.0

//! The one status machine every approvable record shares: bill shares,
//! deposits, expenses, and khata memberships all move Pending to a
//! terminal Approved or Rejected exactly once.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    NotPending(ApprovalStatus),
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPending(status) => {
                write!(f, "record already decided: {}", status.as_str())
            }
        }
    }
}

impl std::error::Error for TransitionError {}

impl ApprovalStatus {
    /// Applies a decision. Only `Pending` records may transition;
    /// `Approved` and `Rejected` are terminal.
    pub fn apply(self, decision: Decision) -> Result<Self, TransitionError> {
        match self {
            Self::Pending => Ok(match decision {
                Decision::Approve => Self::Approved,
                Decision::Reject => Self::Rejected,
            }),
            other => Err(TransitionError::NotPending(other)),
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_terminal_state() {
        assert_eq!(
            ApprovalStatus::Pending.apply(Decision::Approve),
            Ok(ApprovalStatus::Approved)
        );
        assert_eq!(
            ApprovalStatus::Pending.apply(Decision::Reject),
            Ok(ApprovalStatus::Rejected)
        );
    }

    #[test]
    fn terminal_states_refuse_redecision() {
        for terminal in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            for decision in [Decision::Approve, Decision::Reject] {
                assert_eq!(
                    terminal.apply(decision),
                    Err(TransitionError::NotPending(terminal))
                );
            }
        }
    }
}
