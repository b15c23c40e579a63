// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! HTTP server for BillKhata: shared-living rooms ("khatas") of roommates
//! tracking bills, meals, shopping duties, deposits, and expenses, with
//! manager approval workflows and best-effort notifications.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use billkhata_store::DocumentStore;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

mod approvals;
mod auth;
mod config;
mod http;
mod mailer;
mod middleware;
mod notify;
mod telemetry;

pub use auth::session_cache::SessionCache;
pub use config::{validate_startup_config_contract, ApiConfig, RateLimitConfig};
pub use mailer::Mailer;
pub use notify::{NoopPublisher, Notifier, RealtimePublisher, RedisPublisher};

use telemetry::metrics::RequestMetrics;
use telemetry::rate_limiter::RateLimiter;

pub const CRATE_NAME: &str = "billkhata-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub api: Arc<ApiConfig>,
    pub sessions: Arc<Mutex<SessionCache>>,
    pub notifier: Arc<Notifier>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) ip_limiter: Arc<RateLimiter>,
    pub request_id_seed: Arc<AtomicU64>,
    pub accepting_requests: Arc<AtomicBool>,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, api: ApiConfig, notifier: Arc<Notifier>) -> Self {
        let sessions = SessionCache::new(api.session_cache_ttl, api.session_cache_max_entries);
        Self {
            store,
            api: Arc::new(api),
            sessions: Arc::new(Mutex::new(sessions)),
            notifier,
            metrics: Arc::new(RequestMetrics::default()),
            ip_limiter: Arc::new(RateLimiter::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(http::handlers::healthz))
        .route("/readyz", get(http::handlers::readyz))
        .route("/metrics", get(http::handlers::metrics))
        .route("/v1/version", get(http::handlers::version))
        .route("/v1/auth/signup", post(http::auth::signup))
        .route("/v1/auth/login", post(http::auth::login))
        .route("/v1/auth/logout", post(http::auth::logout))
        .route("/v1/me", get(http::auth::me))
        .route("/v1/khatas", post(http::khatas::create_khata))
        .route("/v1/khatas/:id", get(http::khatas::get_khata))
        .route("/v1/khatas/:id/members", get(http::khatas::list_members))
        .route("/v1/khatas/:id/join", post(http::khatas::join_khata))
        .route(
            "/v1/khatas/:id/members/:user_id/decision",
            post(http::khatas::decide_membership),
        )
        .route(
            "/v1/khatas/:id/members/:user_id",
            delete(http::khatas::remove_member),
        )
        .route("/v1/khatas/:id/meal-rate", put(http::khatas::set_meal_rate))
        .route(
            "/v1/khatas/:id/bills",
            post(http::bills::create_bill).get(http::bills::list_bills),
        )
        .route("/v1/bills/:id", get(http::bills::get_bill))
        .route(
            "/v1/bills/:id/shares/:member_id/decision",
            post(http::bills::decide_share),
        )
        .route("/v1/khatas/:id/meals/:date", put(http::meals::put_meal_day))
        .route("/v1/khatas/:id/meals", get(http::meals::list_meal_days))
        .route("/v1/khatas/:id/duties/:date", put(http::duties::assign_duty))
        .route("/v1/khatas/:id/duties", get(http::duties::list_duties))
        .route(
            "/v1/khatas/:id/deposits",
            post(http::deposits::submit_deposit).get(http::deposits::list_deposits),
        )
        .route(
            "/v1/deposits/:id/decision",
            post(http::deposits::decide_deposit),
        )
        .route(
            "/v1/khatas/:id/expenses",
            post(http::expenses::submit_expense).get(http::expenses::list_expenses),
        )
        .route(
            "/v1/expenses/:id/decision",
            post(http::expenses::decide_expense),
        )
        .route("/v1/khatas/:id/ledger", get(http::ledger::get_ledger))
        .route(
            "/v1/notifications",
            get(http::notifications::list_notifications),
        )
        .route("/v1/notifications/read", post(http::notifications::mark_read))
        .fallback(http::handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes));

    if !state.api.cors_allowed_origins.is_empty() {
        let origins: Vec<HeaderValue> = state
            .api
            .cors_allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }
    router.with_state(state)
}
