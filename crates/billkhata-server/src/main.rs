#![forbid(unsafe_code)]

use billkhata_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState, Mailer, NoopPublisher,
    Notifier, RateLimitConfig, RealtimePublisher, RedisPublisher,
};
use billkhata_store::{DocumentStore, MemoryStore, RedisStore};
use std::env;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_duration_secs(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_u64(name, default_secs))
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("BILLKHATA_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("BILLKHATA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let api_cfg = ApiConfig {
        max_body_bytes: env_usize("BILLKHATA_MAX_BODY_BYTES", 16 * 1024),
        session_ttl: env_duration_secs("BILLKHATA_SESSION_TTL_SECS", 7 * 24 * 3600),
        session_cache_ttl: env_duration_secs("BILLKHATA_SESSION_CACHE_TTL_SECS", 60),
        session_cache_max_entries: env_usize("BILLKHATA_SESSION_CACHE_MAX_ENTRIES", 4096),
        rate_limit_per_ip: RateLimitConfig {
            capacity: env_f64("BILLKHATA_RATE_LIMIT_CAPACITY", 30.0),
            refill_per_sec: env_f64("BILLKHATA_RATE_LIMIT_REFILL_PER_SEC", 10.0),
        },
        list_max_limit: env_usize("BILLKHATA_LIST_MAX_LIMIT", 200),
        min_password_len: env_usize("BILLKHATA_MIN_PASSWORD_LEN", 8),
        cors_allowed_origins: env_list("BILLKHATA_CORS_ALLOWED_ORIGINS"),
    };
    validate_startup_config_contract(&api_cfg)?;

    let redis_url = env::var("BILLKHATA_REDIS_URL").ok();
    let redis_prefix =
        env::var("BILLKHATA_REDIS_PREFIX").unwrap_or_else(|_| "billkhata".to_string());
    let store: Arc<dyn DocumentStore> = match &redis_url {
        Some(url) => {
            let store = RedisStore::connect(url, &redis_prefix)
                .await
                .map_err(|e| format!("redis store connect failed: {e}"))?;
            info!("using redis document store");
            Arc::new(store)
        }
        None => {
            warn!("BILLKHATA_REDIS_URL not set; using in-memory store, data will not survive restarts");
            Arc::new(MemoryStore::default())
        }
    };

    let realtime: Arc<dyn RealtimePublisher> = match &redis_url {
        Some(url) if env_bool("BILLKHATA_REALTIME_ENABLED", true) => Arc::new(
            RedisPublisher::connect(url)
                .await
                .map_err(|e| format!("redis publisher connect failed: {e}"))?,
        ),
        _ => Arc::new(NoopPublisher),
    };

    let mailer = match (
        env::var("BILLKHATA_EMAIL_API_URL").ok(),
        env::var("BILLKHATA_EMAIL_API_KEY").ok(),
    ) {
        (Some(api_url), Some(api_key)) => {
            let from = env::var("BILLKHATA_EMAIL_FROM")
                .unwrap_or_else(|_| "no-reply@billkhata.example".to_string());
            Some(Arc::new(Mailer::new(api_url, api_key, from)?))
        }
        _ => None,
    };

    let notifier = Arc::new(Notifier::new(store.clone(), realtime, mailer));
    let state = AppState::new(store, api_cfg, notifier);
    let app = build_router(state.clone());

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("billkhata-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            accepting.store(false, Ordering::Relaxed);
            let drain_ms = env_u64("BILLKHATA_SHUTDOWN_DRAIN_MS", 5000);
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
