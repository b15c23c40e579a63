use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 30.0,
            refill_per_sec: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    /// Server-side session lifetime.
    pub session_ttl: Duration,
    /// How long a resolved session may be served from the in-process cache
    /// before the store is consulted again.
    pub session_cache_ttl: Duration,
    pub session_cache_max_entries: usize,
    pub rate_limit_per_ip: RateLimitConfig,
    pub list_max_limit: usize,
    pub min_password_len: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            session_ttl: Duration::from_secs(7 * 24 * 3600),
            session_cache_ttl: Duration::from_secs(60),
            session_cache_max_entries: 4096,
            rate_limit_per_ip: RateLimitConfig::default(),
            list_max_limit: 200,
            min_password_len: 8,
            cors_allowed_origins: Vec::new(),
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if api.session_ttl.is_zero() || api.session_cache_ttl.is_zero() {
        return Err("session ttls must be > 0".to_string());
    }
    if api.session_cache_ttl > api.session_ttl {
        return Err("session_cache_ttl must not exceed session_ttl".to_string());
    }
    if api.session_cache_max_entries == 0 {
        return Err("session_cache_max_entries must be > 0".to_string());
    }
    if api.list_max_limit == 0 {
        return Err("list_max_limit must be > 0".to_string());
    }
    if api.rate_limit_per_ip.capacity < 1.0 {
        return Err("rate_limit_per_ip.capacity must be >= 1".to_string());
    }
    if api.min_password_len == 0 {
        return Err("min_password_len must be > 0".to_string());
    }
    Ok(())
}
