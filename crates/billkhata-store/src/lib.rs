// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Persistence boundary for BillKhata. Every handler talks to a
//! [`DocumentStore`]; production wires the Redis backend, tests wire the
//! in-memory one. The database engine itself stays external.

use async_trait::async_trait;
use billkhata_model::{
    Bill, BillId, Deposit, DepositId, Expense, ExpenseId, Khata, KhataId, MealDay, Notification,
    NotificationId, ShoppingDuty, User, UserId,
};
use std::time::Duration;

mod keys;
pub mod memory;
pub mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Users. `create_user` fails with `Conflict` on a duplicate email;
    // `put_user` overwrites an existing document.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;
    async fn put_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // Sessions expire server-side after `ttl`.
    async fn put_session(&self, token: &str, user: &UserId, ttl: Duration)
        -> Result<(), StoreError>;
    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError>;
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    // Khatas and the membership index.
    async fn put_khata(&self, khata: &Khata) -> Result<(), StoreError>;
    async fn khata_by_id(&self, id: &KhataId) -> Result<Option<Khata>, StoreError>;
    async fn khata_member_ids(&self, id: &KhataId) -> Result<Vec<UserId>, StoreError>;
    async fn add_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError>;
    async fn remove_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError>;

    // Bills.
    async fn put_bill(&self, bill: &Bill) -> Result<(), StoreError>;
    async fn bill_by_id(&self, id: &BillId) -> Result<Option<Bill>, StoreError>;
    async fn bills_by_khata(&self, khata: &KhataId) -> Result<Vec<Bill>, StoreError>;

    // Meal days, keyed by (khata, member, date); a put replaces the day.
    async fn put_meal_day(&self, day: &MealDay) -> Result<(), StoreError>;
    async fn meal_days(&self, khata: &KhataId) -> Result<Vec<MealDay>, StoreError>;

    // Shopping duty roster, keyed by (khata, date); a put replaces the day.
    async fn put_duty(&self, duty: &ShoppingDuty) -> Result<(), StoreError>;
    async fn duties(&self, khata: &KhataId) -> Result<Vec<ShoppingDuty>, StoreError>;

    // Deposits.
    async fn put_deposit(&self, deposit: &Deposit) -> Result<(), StoreError>;
    async fn deposit_by_id(&self, id: &DepositId) -> Result<Option<Deposit>, StoreError>;
    async fn deposits_by_khata(&self, khata: &KhataId) -> Result<Vec<Deposit>, StoreError>;

    // Expenses.
    async fn put_expense(&self, expense: &Expense) -> Result<(), StoreError>;
    async fn expense_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, StoreError>;
    async fn expenses_by_khata(&self, khata: &KhataId) -> Result<Vec<Expense>, StoreError>;

    // Notifications.
    async fn push_notification(&self, notification: &Notification) -> Result<(), StoreError>;
    async fn notifications_for(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;
    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, StoreError>;
}
