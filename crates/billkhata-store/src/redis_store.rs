// SPDX-License-Identifier: Apache-2.0

//! Redis-backed [`DocumentStore`]: JSON documents under prefixed keys,
//! per-khata index sets, and sessions as expiring keys so stale tokens
//! die server-side without a sweeper.

use crate::{keys, DocumentStore, StoreError};
use async_trait::async_trait;
use billkhata_model::{
    Bill, BillId, Deposit, DepositId, Expense, ExpenseId, Khata, KhataId, MealDay, Notification,
    NotificationId, ShoppingDuty, User, UserId,
};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    async fn get_doc<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    async fn set_doc<T: Serialize>(&self, key: &str, doc: &T) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let raw = serde_json::to_string(doc)?;
        let _: () = conn.set(key, raw).await?;
        Ok(())
    }

    async fn index_add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(set_key, member).await?;
        Ok(())
    }

    async fn index_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(set_key).await?)
    }

    /// Loads every document named by an index set, skipping entries whose
    /// document has vanished (the index is best-effort).
    async fn docs_from_index<T: DeserializeOwned>(
        &self,
        set_key: &str,
        doc_key: impl Fn(&str) -> String,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for id in self.index_members(set_key).await? {
            match self.get_doc::<T>(&doc_key(&id)).await? {
                Some(doc) => out.push(doc),
                None => warn!(index = %set_key, id = %id, "index entry without document"),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let email_key = keys::user_email(&self.prefix, &user.email);
        let claimed: bool = conn.set_nx(&email_key, user.id.as_str()).await?;
        if !claimed {
            // A claim without a document behind it is the residue of an
            // interrupted claim/write pair; treat the address as free.
            let holder: Option<String> = conn.get(&email_key).await?;
            let occupied = match holder {
                Some(id) => self
                    .get_doc::<User>(&keys::user(&self.prefix, &id))
                    .await?
                    .is_some(),
                None => false,
            };
            if occupied {
                return Err(StoreError::Conflict(format!(
                    "email already registered: {}",
                    user.email
                )));
            }
            warn!(email = %user.email, "reclaiming orphaned email key");
            let _: () = conn.set(&email_key, user.id.as_str()).await?;
        }
        if let Err(err) = self
            .set_doc(&keys::user(&self.prefix, user.id.as_str()), user)
            .await
        {
            // Release the claim so a later signup can retry the address.
            let released: Result<(), redis::RedisError> = conn.del(&email_key).await;
            if let Err(del_err) = released {
                warn!(email = %user.email, error = %del_err, "failed to release email claim");
            }
            return Err(err);
        }
        Ok(())
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.set_doc(&keys::user(&self.prefix, user.id.as_str()), user)
            .await
    }

    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.get_doc(&keys::user(&self.prefix, id.as_str())).await
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(keys::user_email(&self.prefix, email)).await?;
        match id {
            Some(id) => self.get_doc(&keys::user(&self.prefix, &id)).await,
            None => Ok(None),
        }
    }

    async fn put_session(
        &self,
        token: &str,
        user: &UserId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                keys::session(&self.prefix, token),
                user.as_str(),
                ttl.as_secs().max(1),
            )
            .await?;
        Ok(())
    }

    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(keys::session(&self.prefix, token)).await?;
        raw.map(|id| UserId::parse(&id).map_err(|e| StoreError::Corrupt(e.to_string())))
            .transpose()
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(keys::session(&self.prefix, token)).await?;
        Ok(())
    }

    async fn put_khata(&self, khata: &Khata) -> Result<(), StoreError> {
        self.set_doc(&keys::khata(&self.prefix, khata.id.as_str()), khata)
            .await
    }

    async fn khata_by_id(&self, id: &KhataId) -> Result<Option<Khata>, StoreError> {
        self.get_doc(&keys::khata(&self.prefix, id.as_str())).await
    }

    async fn khata_member_ids(&self, id: &KhataId) -> Result<Vec<UserId>, StoreError> {
        let raw = self
            .index_members(&keys::khata_members(&self.prefix, id.as_str()))
            .await?;
        raw.iter()
            .map(|id| UserId::parse(id).map_err(|e| StoreError::Corrupt(e.to_string())))
            .collect()
    }

    async fn add_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError> {
        self.index_add(
            &keys::khata_members(&self.prefix, id.as_str()),
            user.as_str(),
        )
        .await
    }

    async fn remove_khata_member(&self, id: &KhataId, user: &UserId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .srem(
                keys::khata_members(&self.prefix, id.as_str()),
                user.as_str(),
            )
            .await?;
        Ok(())
    }

    async fn put_bill(&self, bill: &Bill) -> Result<(), StoreError> {
        self.set_doc(&keys::bill(&self.prefix, bill.id.as_str()), bill)
            .await?;
        self.index_add(
            &keys::khata_bills(&self.prefix, bill.khata.as_str()),
            bill.id.as_str(),
        )
        .await
    }

    async fn bill_by_id(&self, id: &BillId) -> Result<Option<Bill>, StoreError> {
        self.get_doc(&keys::bill(&self.prefix, id.as_str())).await
    }

    async fn bills_by_khata(&self, khata: &KhataId) -> Result<Vec<Bill>, StoreError> {
        self.docs_from_index(&keys::khata_bills(&self.prefix, khata.as_str()), |id| {
            keys::bill(&self.prefix, id)
        })
        .await
    }

    async fn put_meal_day(&self, day: &MealDay) -> Result<(), StoreError> {
        let date = day.date.to_string();
        let doc_key = keys::meal(
            &self.prefix,
            day.khata.as_str(),
            day.member.as_str(),
            &date,
        );
        self.set_doc(&doc_key, day).await?;
        // Index holds "member:date" so the whole khata month is one scan.
        self.index_add(
            &keys::khata_meals(&self.prefix, day.khata.as_str()),
            &format!("{}:{date}", day.member.as_str()),
        )
        .await
    }

    async fn meal_days(&self, khata: &KhataId) -> Result<Vec<MealDay>, StoreError> {
        let mut out = Vec::new();
        for entry in self
            .index_members(&keys::khata_meals(&self.prefix, khata.as_str()))
            .await?
        {
            let Some((member, date)) = entry.rsplit_once(':') else {
                warn!(entry = %entry, "malformed meal index entry");
                continue;
            };
            let key = keys::meal(&self.prefix, khata.as_str(), member, date);
            if let Some(day) = self.get_doc::<MealDay>(&key).await? {
                out.push(day);
            }
        }
        Ok(out)
    }

    async fn put_duty(&self, duty: &ShoppingDuty) -> Result<(), StoreError> {
        let date = duty.date.to_string();
        self.set_doc(&keys::duty(&self.prefix, duty.khata.as_str(), &date), duty)
            .await?;
        self.index_add(
            &keys::khata_duties(&self.prefix, duty.khata.as_str()),
            &date,
        )
        .await
    }

    async fn duties(&self, khata: &KhataId) -> Result<Vec<ShoppingDuty>, StoreError> {
        self.docs_from_index(&keys::khata_duties(&self.prefix, khata.as_str()), |date| {
            keys::duty(&self.prefix, khata.as_str(), date)
        })
        .await
    }

    async fn put_deposit(&self, deposit: &Deposit) -> Result<(), StoreError> {
        self.set_doc(&keys::deposit(&self.prefix, deposit.id.as_str()), deposit)
            .await?;
        self.index_add(
            &keys::khata_deposits(&self.prefix, deposit.khata.as_str()),
            deposit.id.as_str(),
        )
        .await
    }

    async fn deposit_by_id(&self, id: &DepositId) -> Result<Option<Deposit>, StoreError> {
        self.get_doc(&keys::deposit(&self.prefix, id.as_str()))
            .await
    }

    async fn deposits_by_khata(&self, khata: &KhataId) -> Result<Vec<Deposit>, StoreError> {
        self.docs_from_index(&keys::khata_deposits(&self.prefix, khata.as_str()), |id| {
            keys::deposit(&self.prefix, id)
        })
        .await
    }

    async fn put_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.set_doc(&keys::expense(&self.prefix, expense.id.as_str()), expense)
            .await?;
        self.index_add(
            &keys::khata_expenses(&self.prefix, expense.khata.as_str()),
            expense.id.as_str(),
        )
        .await
    }

    async fn expense_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, StoreError> {
        self.get_doc(&keys::expense(&self.prefix, id.as_str()))
            .await
    }

    async fn expenses_by_khata(&self, khata: &KhataId) -> Result<Vec<Expense>, StoreError> {
        self.docs_from_index(&keys::khata_expenses(&self.prefix, khata.as_str()), |id| {
            keys::expense(&self.prefix, id)
        })
        .await
    }

    async fn push_notification(&self, notification: &Notification) -> Result<(), StoreError> {
        self.set_doc(
            &keys::notification(&self.prefix, notification.id.as_str()),
            notification,
        )
        .await?;
        self.index_add(
            &keys::user_notifications(&self.prefix, notification.recipient.as_str()),
            notification.id.as_str(),
        )
        .await
    }

    async fn notifications_for(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut all: Vec<Notification> = self
            .docs_from_index(
                &keys::user_notifications(&self.prefix, user.as_str()),
                |id| keys::notification(&self.prefix, id),
            )
            .await?;
        if unread_only {
            all.retain(|n| !n.read);
        }
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, StoreError> {
        let mut updated = 0;
        for id in ids {
            let key = keys::notification(&self.prefix, id.as_str());
            if let Some(mut doc) = self.get_doc::<Notification>(&key).await? {
                if &doc.recipient == user && !doc.read {
                    doc.read = true;
                    self.set_doc(&key, &doc).await?;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }
}
