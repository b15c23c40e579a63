// SPDX-License-Identifier: Apache-2.0

//! Redis key layout. Documents are JSON strings; per-khata sets index the
//! documents that belong to a room.

pub fn user(prefix: &str, id: &str) -> String {
    format!("{prefix}:users:{id}")
}

pub fn user_email(prefix: &str, email: &str) -> String {
    format!("{prefix}:users:email:{}", email.to_ascii_lowercase())
}

pub fn session(prefix: &str, token: &str) -> String {
    format!("{prefix}:sessions:{token}")
}

pub fn khata(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}")
}

pub fn khata_members(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:members")
}

pub fn bill(prefix: &str, id: &str) -> String {
    format!("{prefix}:bills:{id}")
}

pub fn khata_bills(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:bills")
}

pub fn meal(prefix: &str, khata: &str, member: &str, date: &str) -> String {
    format!("{prefix}:meals:{khata}:{member}:{date}")
}

pub fn khata_meals(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:meals")
}

pub fn duty(prefix: &str, khata: &str, date: &str) -> String {
    format!("{prefix}:duties:{khata}:{date}")
}

pub fn khata_duties(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:duties")
}

pub fn deposit(prefix: &str, id: &str) -> String {
    format!("{prefix}:deposits:{id}")
}

pub fn khata_deposits(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:deposits")
}

pub fn expense(prefix: &str, id: &str) -> String {
    format!("{prefix}:expenses:{id}")
}

pub fn khata_expenses(prefix: &str, id: &str) -> String {
    format!("{prefix}:khatas:{id}:expenses")
}

pub fn notification(prefix: &str, id: &str) -> String {
    format!("{prefix}:notifications:{id}")
}

pub fn user_notifications(prefix: &str, user: &str) -> String {
    format!("{prefix}:users:{user}:notifications")
}
