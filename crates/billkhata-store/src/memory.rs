// SPDX-License-Identifier: Apache-2.0

//! In-memory [`DocumentStore`] used by every integration test and by the
//! server's dev mode when no Redis URL is configured.

use crate::{DocumentStore, StoreError};
use async_trait::async_trait;
use billkhata_model::{
    Bill, BillId, Deposit, DepositId, Expense, ExpenseId, Khata, KhataId, MealDay, Notification,
    NotificationId, ShoppingDuty, User, UserId,
};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<HashMap<UserId, User>>,
    pub emails: Mutex<HashMap<String, UserId>>,
    pub sessions: Mutex<HashMap<String, (UserId, Instant)>>,
    pub khatas: Mutex<HashMap<KhataId, Khata>>,
    pub members: Mutex<HashMap<KhataId, BTreeSet<UserId>>>,
    pub bills: Mutex<HashMap<BillId, Bill>>,
    pub meals: Mutex<HashMap<(KhataId, UserId, NaiveDate), MealDay>>,
    pub duties: Mutex<HashMap<(KhataId, NaiveDate), ShoppingDuty>>,
    pub deposits: Mutex<HashMap<DepositId, Deposit>>,
    pub expenses: Mutex<HashMap<ExpenseId, Expense>>,
    pub notifications: Mutex<HashMap<NotificationId, Notification>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut emails = self.emails.lock().await;
        let email = user.email.to_ascii_lowercase();
        if emails.contains_key(&email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        emails.insert(email, user.id.clone());
        self.users
            .lock()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .lock()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let id = self
            .emails
            .lock()
            .await
            .get(&email.to_ascii_lowercase())
            .cloned();
        match id {
            Some(id) => Ok(self.users.lock().await.get(&id).cloned()),
            None => Ok(None),
        }
    }

    async fn put_session(
        &self,
        token: &str,
        user: &UserId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .await
            .insert(token.to_string(), (user.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some((user, deadline)) if Instant::now() < *deadline => Ok(Some(user.clone())),
            Some(_) => {
                sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.lock().await.remove(token);
        Ok(())
    }

    async fn put_khata(&self, khata: &Khata) -> Result<(), StoreError> {
        self.khatas
            .lock()
            .await
            .insert(khata.id.clone(), khata.clone());
        Ok(())
    }

    async fn khata_by_id(&self, id: &KhataId) -> Result<Option<Khata>, StoreError> {
        Ok(self.khatas.lock().await.get(id).cloned())
    }

    async fn khata_member_ids(&self, id: &KhataId) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .members
            .lock()
            .await
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError> {
        self.members
            .lock()
            .await
            .entry(id.clone())
            .or_default()
            .insert(user.clone());
        Ok(())
    }

    async fn remove_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError> {
        if let Some(set) = self.members.lock().await.get_mut(id) {
            set.remove(user);
        }
        Ok(())
    }

    async fn put_bill(&self, bill: &Bill) -> Result<(), StoreError> {
        self.bills
            .lock()
            .await
            .insert(bill.id.clone(), bill.clone());
        Ok(())
    }

    async fn bill_by_id(&self, id: &BillId) -> Result<Option<Bill>, StoreError> {
        Ok(self.bills.lock().await.get(id).cloned())
    }

    async fn bills_by_khata(&self, khata: &KhataId) -> Result<Vec<Bill>, StoreError> {
        Ok(self
            .bills
            .lock()
            .await
            .values()
            .filter(|b| &b.khata == khata)
            .cloned()
            .collect())
    }

    async fn put_meal_day(&self, day: &MealDay) -> Result<(), StoreError> {
        self.meals.lock().await.insert(
            (day.khata.clone(), day.member.clone(), day.date),
            day.clone(),
        );
        Ok(())
    }

    async fn meal_days(&self, khata: &KhataId) -> Result<Vec<MealDay>, StoreError> {
        Ok(self
            .meals
            .lock()
            .await
            .values()
            .filter(|m| &m.khata == khata)
            .cloned()
            .collect())
    }

    async fn put_duty(&self, duty: &ShoppingDuty) -> Result<(), StoreError> {
        self.duties
            .lock()
            .await
            .insert((duty.khata.clone(), duty.date), duty.clone());
        Ok(())
    }

    async fn duties(&self, khata: &KhataId) -> Result<Vec<ShoppingDuty>, StoreError> {
        Ok(self
            .duties
            .lock()
            .await
            .values()
            .filter(|d| &d.khata == khata)
            .cloned()
            .collect())
    }

    async fn put_deposit(&self, deposit: &Deposit) -> Result<(), StoreError> {
        self.deposits
            .lock()
            .await
            .insert(deposit.id.clone(), deposit.clone());
        Ok(())
    }

    async fn deposit_by_id(&self, id: &DepositId) -> Result<Option<Deposit>, StoreError> {
        Ok(self.deposits.lock().await.get(id).cloned())
    }

    async fn deposits_by_khata(&self, khata: &KhataId) -> Result<Vec<Deposit>, StoreError> {
        Ok(self
            .deposits
            .lock()
            .await
            .values()
            .filter(|d| &d.khata == khata)
            .cloned()
            .collect())
    }

    async fn put_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.expenses
            .lock()
            .await
            .insert(expense.id.clone(), expense.clone());
        Ok(())
    }

    async fn expense_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, StoreError> {
        Ok(self.expenses.lock().await.get(id).cloned())
    }

    async fn expenses_by_khata(&self, khata: &KhataId) -> Result<Vec<Expense>, StoreError> {
        Ok(self
            .expenses
            .lock()
            .await
            .values()
            .filter(|e| &e.khata == khata)
            .cloned()
            .collect())
    }

    async fn push_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.notifications
            .lock()
            .await
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn notifications_for(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut out: Vec<Notification> = self
            .notifications
            .lock()
            .await
            .values()
            .filter(|n| &n.recipient == user && (!unread_only || !n.read))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, StoreError> {
        let mut notifications = self.notifications.lock().await;
        let mut updated = 0;
        for id in ids {
            if let Some(doc) = notifications.get_mut(id) {
                if &doc.recipient == user && !doc.read {
                    doc.read = true;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, email: &str) -> User {
        User {
            id: UserId::parse(id).expect("id"),
            name: id.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            membership: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_case_insensitively() {
        let store = MemoryStore::default();
        store.create_user(&user("u1", "a@b.c")).await.expect("first");
        let err = store
            .create_user(&user("u2", "A@B.C"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn expired_sessions_read_as_absent() {
        let store = MemoryStore::default();
        let uid = UserId::parse("u1").expect("id");
        store
            .put_session("tok", &uid, Duration::from_secs(0))
            .await
            .expect("put");
        assert!(store.session_user("tok").await.expect("get").is_none());
        store
            .put_session("tok2", &uid, Duration::from_secs(60))
            .await
            .expect("put");
        assert_eq!(store.session_user("tok2").await.expect("get"), Some(uid));
    }

    #[tokio::test]
    async fn mark_read_only_touches_the_callers_unread_rows() {
        let store = MemoryStore::default();
        let alice = UserId::parse("alice").expect("id");
        let bob = UserId::parse("bob").expect("id");
        let mk = |id: &str, recipient: &UserId| Notification {
            id: NotificationId::parse(id).expect("id"),
            recipient: recipient.clone(),
            kind: billkhata_model::NotificationKind::DepositDecided,
            body: "x".to_string(),
            read: false,
            created_at: Utc::now(),
        };
        store.push_notification(&mk("n1", &alice)).await.expect("n1");
        store.push_notification(&mk("n2", &bob)).await.expect("n2");
        let ids = [
            NotificationId::parse("n1").expect("id"),
            NotificationId::parse("n2").expect("id"),
        ];
        let updated = store
            .mark_notifications_read(&alice, &ids)
            .await
            .expect("mark");
        assert_eq!(updated, 1);
        assert_eq!(
            store
                .notifications_for(&alice, true)
                .await
                .expect("list")
                .len(),
            0
        );
        assert_eq!(
            store.notifications_for(&bob, true).await.expect("list").len(),
            1
        );
    }
}
