// SPDX-License-Identifier: Apache-2.0

//! Per-request span, request-id propagation, draining refusal, per-IP
//! rate limiting, and route metrics. Every `/v1` request passes through
//! here exactly once, so handlers never repeat these checks.

use crate::http::handlers::api_error_response;
use crate::AppState;
use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use billkhata_api::{ApiError, ApiErrorCode};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::Instrument;

#[derive(Debug, Clone)]
pub(crate) struct RequestId(pub String);

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    // Unmatched requests share one metrics label; cardinality stays bounded.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| {
            let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
            format!("req-{id:016x}")
        });
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );
    let started = Instant::now();

    let mut response = if path.starts_with("/v1")
        && !state.accepting_requests.load(Ordering::Relaxed)
    {
        api_error_response(ApiError::unavailable("server is draining", &request_id))
    } else if path.starts_with("/v1") && !rate_limit_allows(&state, request.headers()).await {
        api_error_response(ApiError::new(
            ApiErrorCode::RateLimited,
            "rate limit exceeded",
            json!({}),
            &request_id,
        ))
    } else {
        next.run(request).instrument(span).await
    };

    state
        .metrics
        .observe_request(&route, response.status(), started.elapsed())
        .await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

async fn rate_limit_allows(state: &AppState, headers: &axum::http::HeaderMap) -> bool {
    let key = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("local")
        .to_string();
    state
        .ip_limiter
        .allow(&key, &state.api.rate_limit_per_ip)
        .await
}
