//! Fixed-window rate limiting per client and path.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::http::request::Parts;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::config::GatekeeperConfig;
use crate::error::GateError;
use crate::observability::metrics;
use crate::security::headers::client_ip_of;
use crate::security::Gate;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow { remaining: u32 },
    Deny { retry_after: u64 },
}

/// Counter for one (client, path) pair.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: SystemTime,
}

/// Shared window store.
///
/// Each check runs under the entry's shard lock, so read, compare and
/// increment happen as one step and concurrent requests cannot over-admit.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    windows: DashMap<String, RateWindow>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `key` and decide whether it is admitted.
    pub fn hit(&self, key: &str, now: SystemTime, max_requests: u32, window: Duration) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });
        let state = entry.value_mut();

        // A clock that went backwards counts as no time elapsed.
        let elapsed = now.duration_since(state.window_start).unwrap_or_default();

        if state.count == 0 || elapsed >= window {
            state.count = 1;
            state.window_start = now;
            return RateDecision::Allow {
                remaining: max_requests.saturating_sub(1),
            };
        }

        if state.count >= max_requests {
            let left = window - elapsed;
            let retry_after = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            return RateDecision::Deny {
                retry_after: retry_after.clamp(1, window.as_secs().max(1)),
            };
        }

        state.count += 1;
        RateDecision::Allow {
            remaining: max_requests - state.count,
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: SystemTime, window: Duration) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| {
            now.duration_since(w.window_start).unwrap_or_default() < window
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Store key for a (client, path) pair.
pub fn rate_key(client: &str, path: &str) -> String {
    let digest = Sha256::digest(format!("rate_limit:{}:{}", path, client).as_bytes());
    format!("rl:{:x}", digest)
}

/// The rate limiting gate. First in the chain.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<RateLimitStore>,
    enabled: bool,
    paths: Vec<String>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<RateLimitStore>,
        paths: Vec<String>,
        max_requests: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            enabled: true,
            paths,
            max_requests,
            window,
        }
    }

    /// Build from configuration. Disabled when `testing` is set.
    pub fn from_config(config: &GatekeeperConfig, store: Arc<RateLimitStore>) -> Self {
        let limits = &config.rate_limit;
        let mut limiter = Self::new(
            store,
            limits.paths.clone(),
            limits.max_requests,
            Duration::from_secs(limits.window_secs),
        );
        limiter.enabled = limits.enabled && !config.testing;
        limiter
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn applies_to(&self, path: &str) -> bool {
        self.paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn check(&self, client_ip: &str, path: &str) -> RateDecision {
        self.check_at(client_ip, path, SystemTime::now())
    }

    /// Check against an explicit clock reading.
    pub fn check_at(&self, client_ip: &str, path: &str, now: SystemTime) -> RateDecision {
        if !self.enabled || !self.applies_to(path) {
            return RateDecision::Allow {
                remaining: self.max_requests,
            };
        }
        self.store
            .hit(&rate_key(client_ip, path), now, self.max_requests, self.window)
    }

    pub fn store(&self) -> &Arc<RateLimitStore> {
        &self.store
    }
}

impl Gate for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn process(&self, request: &mut Parts) -> Result<(), GateError> {
        if !self.enabled {
            return Ok(());
        }
        let client = client_ip_of(request);
        match self.check(&client, request.uri.path()) {
            RateDecision::Allow { .. } => Ok(()),
            RateDecision::Deny { retry_after } => {
                tracing::warn!(client = %client, path = %request.uri.path(), retry_after, "Rate limit exceeded");
                metrics::record_rate_limited();
                Err(GateError::RateLimitExceeded { retry_after })
            }
        }
    }
}

/// Periodically purge elapsed windows until `shutdown` fires.
pub async fn run_sweeper(
    store: Arc<RateLimitStore>,
    window: Duration,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.purge_expired(SystemTime::now(), window);
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "Purged rate limit windows");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
