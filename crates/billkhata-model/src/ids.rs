// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const ID_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    NegativeAmount(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
            Self::NegativeAmount(name) => write!(f, "{name} must not be negative"),
        }
    }
}

impl std::error::Error for ParseError {}

macro_rules! string_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(input: &str) -> Result<Self, ParseError> {
                if input.is_empty() {
                    return Err(ParseError::Empty($label));
                }
                if input.trim() != input {
                    return Err(ParseError::Trimmed($label));
                }
                if input.len() > ID_MAX_LEN {
                    return Err(ParseError::TooLong($label, ID_MAX_LEN));
                }
                Ok(Self(input.to_string()))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UserId, "user_id");
string_id!(KhataId, "khata_id");
string_id!(BillId, "bill_id");
string_id!(DepositId, "deposit_id");
string_id!(ExpenseId, "expense_id");
string_id!(NotificationId, "notification_id");

/// Validates an amount expressed in integer cents.
pub fn parse_cents(label: &'static str, cents: i64) -> Result<i64, ParseError> {
    if cents < 0 {
        return Err(ParseError::NegativeAmount(label));
    }
    Ok(cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_parse_rejects_empty_padded_and_oversized() {
        assert!(matches!(UserId::parse(""), Err(ParseError::Empty(_))));
        assert!(matches!(UserId::parse(" u1"), Err(ParseError::Trimmed(_))));
        let long = "x".repeat(ID_MAX_LEN + 1);
        assert!(matches!(
            KhataId::parse(&long),
            Err(ParseError::TooLong(_, _))
        ));
        assert_eq!(UserId::parse("u1").expect("valid id").as_str(), "u1");
    }

    #[test]
    fn cents_parse_rejects_negative() {
        assert!(parse_cents("amount_cents", -1).is_err());
        assert_eq!(parse_cents("amount_cents", 0).expect("zero ok"), 0);
    }
}
