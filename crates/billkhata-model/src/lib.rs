// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Domain model for BillKhata: rooms ("khatas") of roommates tracking
//! bills, meals, shopping duties, deposits, expenses, and the approval
//! workflows between members and managers.
//!
//! Everything in this crate is pure data plus validation; no I/O.

pub mod approval;
pub mod bill;
pub mod deposit;
pub mod duty;
pub mod expense;
pub mod ids;
pub mod khata;
pub mod ledger;
pub mod meal;
pub mod notification;
pub mod user;

pub use approval::{ApprovalStatus, Decision, TransitionError};
pub use bill::{Bill, BillShare};
pub use deposit::Deposit;
pub use duty::ShoppingDuty;
pub use expense::Expense;
pub use ids::{BillId, DepositId, ExpenseId, KhataId, NotificationId, ParseError, UserId};
pub use khata::Khata;
pub use ledger::{compute_ledger, MemberLedger};
pub use meal::MealDay;
pub use notification::{Notification, NotificationKind};
pub use user::{Membership, Role, User};
