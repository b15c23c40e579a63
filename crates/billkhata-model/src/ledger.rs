// SPDX-License-Identifier: Apache-2.0

//! Monthly balance math for one khata: approved deposits in, meal cost
//! and an even split of approved expenses out.

use crate::approval::ApprovalStatus;
use crate::deposit::Deposit;
use crate::expense::Expense;
use crate::ids::UserId;
use crate::meal::MealDay;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberLedger {
    pub member: UserId,
    pub deposits_cents: i64,
    pub meal_count: u32,
    pub meal_cost_cents: i64,
    pub expense_share_cents: i64,
    pub balance_cents: i64,
}

/// Computes one ledger row per member. Only `Approved` deposits and
/// expenses count. Expenses split evenly; the remainder cents land on the
/// lexicographically-first member ids so the split sums exactly.
#[must_use]
pub fn compute_ledger(
    members: &[UserId],
    meal_rate_cents: i64,
    meals: &[MealDay],
    deposits: &[Deposit],
    expenses: &[Expense],
) -> Vec<MemberLedger> {
    let mut ordered: Vec<UserId> = members.to_vec();
    ordered.sort();
    ordered.dedup();
    if ordered.is_empty() {
        return Vec::new();
    }

    let expense_total: i64 = expenses
        .iter()
        .filter(|e| e.status == ApprovalStatus::Approved)
        .map(|e| e.amount_cents)
        .sum();
    let head_count = ordered.len() as i64;
    let base_share = expense_total / head_count;
    let remainder = expense_total % head_count;

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, member)| {
            let deposits_cents: i64 = deposits
                .iter()
                .filter(|d| d.member == member && d.status == ApprovalStatus::Approved)
                .map(|d| d.amount_cents)
                .sum();
            let meal_count: u32 = meals
                .iter()
                .filter(|m| m.member == member)
                .map(MealDay::total)
                .sum();
            let meal_cost_cents = i64::from(meal_count) * meal_rate_cents;
            let expense_share_cents = base_share + i64::from((index as i64) < remainder);
            MemberLedger {
                balance_cents: deposits_cents - meal_cost_cents - expense_share_cents,
                member,
                deposits_cents,
                meal_count,
                meal_cost_cents,
                expense_share_cents,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DepositId, ExpenseId, KhataId};
    use chrono::{NaiveDate, Utc};

    fn uid(s: &str) -> UserId {
        UserId::parse(s).expect("id")
    }

    fn kid() -> KhataId {
        KhataId::parse("k1").expect("id")
    }

    fn approved_deposit(member: &str, cents: i64) -> Deposit {
        let mut d = Deposit::pending(
            DepositId::parse("d1").expect("id"),
            kid(),
            uid(member),
            cents,
            None,
            Utc::now(),
        )
        .expect("deposit");
        d.status = ApprovalStatus::Approved;
        d
    }

    fn expense(cents: i64, status: ApprovalStatus) -> Expense {
        let mut e = Expense::pending(
            ExpenseId::parse("e1").expect("id"),
            kid(),
            uid("a"),
            "groceries",
            cents,
            Utc::now(),
        )
        .expect("expense");
        e.status = status;
        e
    }

    fn meal(member: &str, dinner: u8) -> MealDay {
        MealDay::new(
            kid(),
            uid(member),
            NaiveDate::from_ymd_opt(2026, 8, 1).expect("date"),
            0,
            0,
            dinner,
        )
        .expect("meal day")
    }

    #[test]
    fn expense_split_distributes_remainder_deterministically() {
        let members = [uid("c"), uid("a"), uid("b")];
        let rows = compute_ledger(
            &members,
            0,
            &[],
            &[],
            &[expense(100, ApprovalStatus::Approved)],
        );
        // Sorted order: a, b, c; 100 / 3 = 33 rem 1, extra cent on "a".
        assert_eq!(rows[0].member, uid("a"));
        assert_eq!(rows[0].expense_share_cents, 34);
        assert_eq!(rows[1].expense_share_cents, 33);
        assert_eq!(rows[2].expense_share_cents, 33);
        let total: i64 = rows.iter().map(|r| r.expense_share_cents).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn pending_and_rejected_records_do_not_count() {
        let members = [uid("a")];
        let rows = compute_ledger(
            &members,
            100,
            &[],
            &[],
            &[
                expense(500, ApprovalStatus::Pending),
                expense(700, ApprovalStatus::Rejected),
            ],
        );
        assert_eq!(rows[0].expense_share_cents, 0);
        assert_eq!(rows[0].balance_cents, 0);
    }

    #[test]
    fn balance_combines_deposits_meals_and_expense_share() {
        let members = [uid("a"), uid("b")];
        let rows = compute_ledger(
            &members,
            50,
            &[meal("a", 3), meal("a", 2)],
            &[approved_deposit("a", 1000)],
            &[expense(400, ApprovalStatus::Approved)],
        );
        let a = rows.iter().find(|r| r.member == uid("a")).expect("row a");
        assert_eq!(a.meal_count, 5);
        assert_eq!(a.meal_cost_cents, 250);
        assert_eq!(a.expense_share_cents, 200);
        assert_eq!(a.balance_cents, 1000 - 250 - 200);
        let b = rows.iter().find(|r| r.member == uid("b")).expect("row b");
        assert_eq!(b.balance_cents, -200);
    }

    #[test]
    fn empty_member_list_yields_no_rows() {
        assert!(compute_ledger(&[], 100, &[], &[], &[]).is_empty());
    }
}
