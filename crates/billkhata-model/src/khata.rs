// SPDX-License-Identifier: Apache-2.0

use crate::ids::{parse_cents, KhataId, ParseError, UserId, NAME_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Khata {
    pub id: KhataId,
    pub name: String,
    pub manager: UserId,
    /// Cost charged per meal when computing the monthly ledger, set by the
    /// manager. Zero until configured.
    pub meal_rate_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Khata {
    pub fn new(
        id: KhataId,
        name: &str,
        manager: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        if name.trim().is_empty() {
            return Err(ParseError::Empty("khata name"));
        }
        if name.len() > NAME_MAX_LEN {
            return Err(ParseError::TooLong("khata name", NAME_MAX_LEN));
        }
        Ok(Self {
            id,
            name: name.to_string(),
            manager,
            meal_rate_cents: 0,
            created_at,
        })
    }

    pub fn set_meal_rate(&mut self, cents: i64) -> Result<(), ParseError> {
        self.meal_rate_cents = parse_cents("meal_rate_cents", cents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn khata_name_must_be_present_and_bounded() {
        let id = KhataId::parse("k1").expect("id");
        let manager = UserId::parse("u1").expect("id");
        assert!(Khata::new(id.clone(), "  ", manager.clone(), Utc::now()).is_err());
        let mut khata = Khata::new(id, "Flat 4B", manager, Utc::now()).expect("valid khata");
        assert_eq!(khata.meal_rate_cents, 0);
        assert!(khata.set_meal_rate(-5).is_err());
        khata.set_meal_rate(4500).expect("valid rate");
        assert_eq!(khata.meal_rate_cents, 4500);
    }
}
