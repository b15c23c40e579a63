// SPDX-License-Identifier: Apache-2.0

//! Exercises the Redis backend against a live server. Ignored by default;
//! run with `cargo test -- --ignored` and REDIS_URL set.

use billkhata_model::{User, UserId};
use billkhata_store::{DocumentStore, RedisStore, StoreError};
use chrono::Utc;
use redis::AsyncCommands;

fn test_user(id: &str, email: &str) -> User {
    User {
        id: UserId::parse(id).expect("user id"),
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "salt$hash".to_string(),
        membership: None,
        created_at: Utc::now(),
    }
}

fn live_redis() -> Option<(String, String)> {
    let url = match std::env::var("REDIS_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("skipping: REDIS_URL not set");
            return None;
        }
    };
    let reachable = match redis::Client::open(url.clone()) {
        Ok(client) => client.get_connection().is_ok(),
        Err(_) => false,
    };
    if !reachable {
        eprintln!("skipping: redis not reachable");
        return None;
    }
    let prefix = format!("billkhata-test-{}", std::process::id());
    Some((url, prefix))
}

#[tokio::test]
#[ignore = "requires REDIS_URL and local Redis; non-CI integration test"]
async fn duplicate_email_conflicts_but_an_orphaned_claim_is_reclaimed() {
    let Some((url, prefix)) = live_redis() else {
        return;
    };
    let store = RedisStore::connect(&url, &prefix).await.expect("connect");

    let first = test_user("u-orphan-1", "orphan@flat.tld");
    store.create_user(&first).await.expect("first signup");
    let second = test_user("u-orphan-2", "orphan@flat.tld");
    assert!(matches!(
        store.create_user(&second).await,
        Err(StoreError::Conflict(_))
    ));

    // Leave the email claim behind with no document, the state a write
    // failure between the claim and the document produces.
    let client = redis::Client::open(url.clone()).expect("client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("async conn");
    let _: () = conn
        .del(format!("{prefix}:users:{}", first.id.as_str()))
        .await
        .expect("drop document");

    assert!(store
        .user_by_email("orphan@flat.tld")
        .await
        .expect("lookup")
        .is_none());
    store
        .create_user(&second)
        .await
        .expect("orphaned claim must not block the address");
    let resolved = store
        .user_by_email("orphan@flat.tld")
        .await
        .expect("lookup")
        .expect("second user document");
    assert_eq!(resolved.id, second.id);
}
