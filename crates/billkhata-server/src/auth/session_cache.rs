// SPDX-License-Identifier: Apache-2.0

use billkhata_model::{User, UserId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CachedSession {
    user: User,
    created_at: Instant,
}

/// Token-to-user cache in front of the session store. Entries live for a
/// short TTL so role and membership changes propagate within a minute;
/// decisions that change a user's membership call `invalidate_user` to
/// propagate immediately.
pub struct SessionCache {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CachedSession>,
}

impl SessionCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
        }
    }

    pub fn get(&mut self, token: &str) -> Option<User> {
        self.entries
            .retain(|_, v| v.created_at.elapsed() <= self.ttl);
        self.entries.get(token).map(|v| v.user.clone())
    }

    pub fn insert(&mut self, token: String, user: User) {
        self.entries
            .retain(|_, v| v.created_at.elapsed() <= self.ttl);
        if self.entries.len() >= self.max_entries {
            if let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, v)| v.created_at)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(
            token,
            CachedSession {
                user,
                created_at: Instant::now(),
            },
        );
    }

    pub fn invalidate_token(&mut self, token: &str) {
        self.entries.remove(token);
    }

    /// Drops every cached session belonging to `user`.
    pub fn invalidate_user(&mut self, user: &UserId) {
        self.entries.retain(|_, v| &v.user.id != user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str) -> User {
        User {
            id: UserId::parse(id).expect("id"),
            name: id.to_string(),
            email: format!("{id}@x.tld"),
            password_hash: String::new(),
            membership: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expired_entries_vanish_on_read() {
        let mut cache = SessionCache::new(Duration::from_secs(0), 8);
        cache.insert("tok".to_string(), user("u1"));
        assert!(cache.get("tok").is_none());
    }

    #[test]
    fn capacity_evicts_the_oldest_entry() {
        let mut cache = SessionCache::new(Duration::from_secs(60), 2);
        cache.insert("t1".to_string(), user("u1"));
        cache.insert("t2".to_string(), user("u2"));
        cache.insert("t3".to_string(), user("u3"));
        assert!(cache.get("t1").is_none());
        assert!(cache.get("t2").is_some());
        assert!(cache.get("t3").is_some());
    }

    #[test]
    fn invalidate_user_drops_all_of_their_tokens() {
        let mut cache = SessionCache::new(Duration::from_secs(60), 8);
        cache.insert("t1".to_string(), user("u1"));
        cache.insert("t2".to_string(), user("u1"));
        cache.insert("t3".to_string(), user("u2"));
        cache.invalidate_user(&UserId::parse("u1").expect("id"));
        assert!(cache.get("t1").is_none());
        assert!(cache.get("t2").is_none());
        assert!(cache.get("t3").is_some());
    }
}
