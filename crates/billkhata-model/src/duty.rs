// SPDX-License-Identifier: Apache-2.0

use crate::ids::{KhataId, ParseError, UserId, NAME_MAX_LEN};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shopping duty roster entry: one member on duty per khata per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShoppingDuty {
    pub khata: KhataId,
    pub member: UserId,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl ShoppingDuty {
    pub fn new(
        khata: KhataId,
        member: UserId,
        date: NaiveDate,
        note: Option<String>,
    ) -> Result<Self, ParseError> {
        if let Some(note) = &note {
            if note.len() > NAME_MAX_LEN {
                return Err(ParseError::TooLong("duty note", NAME_MAX_LEN));
            }
        }
        Ok(Self {
            khata,
            member,
            date,
            note,
        })
    }
}
