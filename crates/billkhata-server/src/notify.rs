// SPDX-License-Identifier: Apache-2.0

//! Best-effort notification fan-out. Every event lands as a stored
//! notification; realtime push and email ride along and may fail without
//! affecting the request that triggered them.

use crate::mailer::Mailer;
use async_trait::async_trait;
use billkhata_model::{Notification, NotificationId, NotificationKind, User};
use billkhata_store::DocumentStore;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str);
}

/// Used when no pub/sub broker is configured (tests, single-node dev).
pub struct NoopPublisher;

#[async_trait]
impl RealtimePublisher for NoopPublisher {
    async fn publish(&self, _channel: &str, _payload: &str) {}
}

pub struct RedisPublisher {
    conn: ConnectionManager,
}

impl RedisPublisher {
    pub async fn connect(url: &str) -> Result<Self, String> {
        let client = redis::Client::open(url).map_err(|e| format!("redis open: {e}"))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| format!("redis connect: {e}"))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RealtimePublisher for RedisPublisher {
    async fn publish(&self, channel: &str, payload: &str) {
        let mut conn = self.conn.clone();
        let result: Result<(), redis::RedisError> = conn.publish(channel, payload).await;
        if let Err(e) = result {
            warn!(channel = %channel, error = %e, "realtime publish failed");
        }
    }
}

pub struct Notifier {
    store: Arc<dyn DocumentStore>,
    realtime: Arc<dyn RealtimePublisher>,
    mailer: Option<Arc<Mailer>>,
    channel_prefix: String,
}

impl Notifier {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        realtime: Arc<dyn RealtimePublisher>,
        mailer: Option<Arc<Mailer>>,
    ) -> Self {
        Self {
            store,
            realtime,
            mailer,
            channel_prefix: "billkhata:events".to_string(),
        }
    }

    /// Stores a notification for `recipient`, pushes it on their realtime
    /// channel, and emails them when a mailer is configured.
    pub async fn notify(&self, recipient: &User, kind: NotificationKind, body: &str) {
        let id = match NotificationId::parse(&uuid::Uuid::new_v4().simple().to_string()) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "notification id generation failed");
                return;
            }
        };
        let notification = Notification {
            id,
            recipient: recipient.id.clone(),
            kind,
            body: body.to_string(),
            read: false,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.push_notification(&notification).await {
            warn!(error = %e, recipient = %recipient.id, "notification store failed");
        }

        let channel = format!("{}:{}", self.channel_prefix, recipient.id);
        let payload = json!({
            "id": notification.id.as_str(),
            "kind": kind.as_str(),
            "body": body,
            "created_at": notification.created_at,
        })
        .to_string();
        self.realtime.publish(&channel, &payload).await;

        if let Some(mailer) = &self.mailer {
            let subject = format!("BillKhata: {}", kind.as_str().replace('_', " "));
            mailer.send(&recipient.email, &subject, body).await;
        }
    }
}
