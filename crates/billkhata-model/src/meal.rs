// SPDX-License-Identifier: Apache-2.0

use crate::ids::{KhataId, ParseError, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MEAL_SLOT_MAX: u8 = 9;

/// One member's meal counts for one day. Guests bump a slot above 1,
/// hence counts rather than booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealDay {
    pub khata: KhataId,
    pub member: UserId,
    pub date: NaiveDate,
    pub breakfast: u8,
    pub lunch: u8,
    pub dinner: u8,
}

impl MealDay {
    pub fn new(
        khata: KhataId,
        member: UserId,
        date: NaiveDate,
        breakfast: u8,
        lunch: u8,
        dinner: u8,
    ) -> Result<Self, ParseError> {
        for slot in [breakfast, lunch, dinner] {
            if slot > MEAL_SLOT_MAX {
                return Err(ParseError::InvalidFormat("meal slot count exceeds 9"));
            }
        }
        Ok(Self {
            khata,
            member,
            date,
            breakfast,
            lunch,
            dinner,
        })
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::from(self.breakfast) + u32::from(self.lunch) + u32::from(self.dinner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_counts_are_bounded() {
        let khata = KhataId::parse("k1").expect("id");
        let member = UserId::parse("u1").expect("id");
        let date = NaiveDate::from_ymd_opt(2026, 8, 25).expect("date");
        assert!(MealDay::new(khata.clone(), member.clone(), date, 1, 10, 0).is_err());
        let day = MealDay::new(khata, member, date, 1, 2, 1).expect("valid day");
        assert_eq!(day.total(), 4);
    }
}
