// SPDX-License-Identifier: Apache-2.0

use crate::approval::ApprovalStatus;
use crate::ids::{KhataId, ParseError, UserId, EMAIL_MAX_LEN, NAME_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Manager,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
        }
    }
}

/// A user's tie to a khata. Joining creates a `Pending` membership that
/// the khata manager approves or rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Membership {
    pub khata: KhataId,
    pub role: Role,
    pub status: ApprovalStatus,
}

impl Membership {
    #[must_use]
    pub fn pending_member(khata: KhataId) -> Self {
        Self {
            khata,
            role: Role::Member,
            status: ApprovalStatus::Pending,
        }
    }

    #[must_use]
    pub fn manager(khata: KhataId) -> Self {
        Self {
            khata,
            role: Role::Manager,
            status: ApprovalStatus::Approved,
        }
    }

    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub membership: Option<Membership>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Approved membership in some khata, if any.
    #[must_use]
    pub fn approved_khata(&self) -> Option<&KhataId> {
        self.membership
            .as_ref()
            .filter(|m| m.is_approved())
            .map(|m| &m.khata)
    }

    #[must_use]
    pub fn is_manager_of(&self, khata: &KhataId) -> bool {
        self.membership
            .as_ref()
            .is_some_and(|m| m.is_approved() && m.role == Role::Manager && &m.khata == khata)
    }
}

pub fn validate_name(name: &str) -> Result<(), ParseError> {
    if name.trim().is_empty() {
        return Err(ParseError::Empty("name"));
    }
    if name.len() > NAME_MAX_LEN {
        return Err(ParseError::TooLong("name", NAME_MAX_LEN));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ParseError> {
    if email.is_empty() {
        return Err(ParseError::Empty("email"));
    }
    if email.len() > EMAIL_MAX_LEN {
        return Err(ParseError::TooLong("email", EMAIL_MAX_LEN));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ParseError::InvalidFormat("email must contain '@'"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ParseError::InvalidFormat("email must be local@domain.tld"));
    }
    Ok(())
}
