#![allow(dead_code)]

use billkhata_server::{
    build_router, ApiConfig, AppState, NoopPublisher, Notifier, RateLimitConfig,
};
use billkhata_store::MemoryStore;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Serves the app on an ephemeral port with an in-memory store and a
/// rate limit high enough to stay out of the way.
pub async fn spawn_app() -> SocketAddr {
    spawn_app_with(test_config()).await.0
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        rate_limit_per_ip: RateLimitConfig {
            capacity: 10_000.0,
            refill_per_sec: 10_000.0,
        },
        ..ApiConfig::default()
    }
}

pub async fn spawn_app_with(api: ApiConfig) -> (SocketAddr, AppState) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(Notifier::new(store.clone(), Arc::new(NoopPublisher), None));
    let state = AppState::new(store, api, notifier);
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (addr, state)
}

pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        req.push_str("content-type: application/json\r\n");
        req.push_str(&format!("content-length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

pub async fn send_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (u16, Value) {
    let body_string = body.map(Value::to_string);
    let auth = token.map(|t| format!("Bearer {t}"));
    let mut headers: Vec<(&str, &str)> = Vec::new();
    if let Some(auth) = &auth {
        headers.push(("authorization", auth));
    }
    let (status, _, body) = send_raw(addr, method, path, &headers, body_string.as_deref()).await;
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).expect("json body")
    };
    (status, value)
}

/// Signs up a fresh user; returns (session token, user id).
pub async fn signup(addr: SocketAddr, name: &str, email: &str) -> (String, String) {
    let (status, body) = send_json(
        addr,
        "POST",
        "/v1/auth/signup",
        None,
        Some(&json!({"name": name, "email": email, "password": "correct-horse-battery"})),
    )
    .await;
    assert_eq!(status, 200, "signup failed: {body}");
    let token = body["token"].as_str().expect("token").to_string();
    let user_id = body["user"]["id"].as_str().expect("user id").to_string();
    (token, user_id)
}

/// Signs up a manager and creates a khata; returns (token, user id, khata id).
pub async fn signup_with_khata(
    addr: SocketAddr,
    name: &str,
    email: &str,
) -> (String, String, String) {
    let (token, user_id) = signup(addr, name, email).await;
    let (status, body) = send_json(
        addr,
        "POST",
        "/v1/khatas",
        Some(&token),
        Some(&json!({"name": format!("{name}'s flat")})),
    )
    .await;
    assert_eq!(status, 200, "khata creation failed: {body}");
    let khata_id = body["id"].as_str().expect("khata id").to_string();
    (token, user_id, khata_id)
}

/// Signs up a user, joins the khata, and has the manager approve them;
/// returns (token, user id).
pub async fn join_approved(
    addr: SocketAddr,
    manager_token: &str,
    khata_id: &str,
    name: &str,
    email: &str,
) -> (String, String) {
    let (token, user_id) = signup(addr, name, email).await;
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/join"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, 200, "join failed: {body}");
    let (status, body) = send_json(
        addr,
        "POST",
        &format!("/v1/khatas/{khata_id}/members/{user_id}/decision"),
        Some(manager_token),
        Some(&json!({"decision": "approve"})),
    )
    .await;
    assert_eq!(status, 200, "approval failed: {body}");
    (token, user_id)
}
