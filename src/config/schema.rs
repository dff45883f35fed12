//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::auth::{Capability, Role};

/// Root configuration for the gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Test mode. Disables the rate limiter.
    pub testing: bool,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Credential signing settings.
    pub token: TokenConfig,

    /// Authentication gate settings.
    pub authentication: AuthenticationConfig,

    /// Authorization gate settings.
    pub authorization: AuthorizationConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Accounts accepted by the login endpoint.
    pub users: Vec<UserConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Credential signing configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Shared HMAC secret.
    pub secret: String,

    /// Signing algorithm (HS256, HS384, HS512).
    pub algorithm: String,

    /// Credential lifetime in hours.
    pub ttl_hours: u64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

/// Placeholder secret used when none is configured. Publicly known.
pub const DEFAULT_TOKEN_SECRET: &str = "jwt-secret-key-change-in-production";

impl TokenConfig {
    /// True when the secret is still the shipped placeholder.
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_TOKEN_SECRET
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_TOKEN_SECRET.to_string(),
            algorithm: "HS256".to_string(),
            ttl_hours: 24,
        }
    }
}

/// Authentication gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// Only paths under this prefix require a credential.
    pub protected_prefix: String,

    /// Path prefixes that never require a credential.
    pub exempt_paths: Vec<String>,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            protected_prefix: "/api/".to_string(),
            exempt_paths: vec!["/api/auth/login".to_string()],
        }
    }
}

/// What the authorization gate does with a protected path no rule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    Allow,
    Deny,
}

/// A path prefix and the capability it requires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PermissionRule {
    pub path_prefix: String,
    pub capability: Capability,
}

impl PermissionRule {
    pub fn new(path_prefix: impl Into<String>, capability: Capability) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            capability,
        }
    }
}

/// Authorization gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Rules evaluated in order; first matching prefix wins.
    pub rules: Vec<PermissionRule>,

    /// Path prefixes that bypass authorization entirely.
    pub exempt_paths: Vec<String>,

    /// Behaviour for protected paths no rule matches.
    pub unmapped_policy: UnmappedPolicy,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        use Capability::*;
        Self {
            rules: vec![
                PermissionRule::new("/api/metrics/revenue", ViewRevenue),
                PermissionRule::new("/api/metrics/orders", ViewOrders),
                PermissionRule::new("/api/metrics/businesses", ViewBusinesses),
                PermissionRule::new("/api/metrics/customers", ViewCustomers),
                PermissionRule::new("/api/metrics/delivery", ViewDeliveryPartners),
                PermissionRule::new("/api/kyc/", ViewKycQueue),
                PermissionRule::new("/api/system/logs", ViewSystemLogs),
                PermissionRule::new("/api/system/api-analytics", ViewApiAnalytics),
                PermissionRule::new("/api/users", ManageUsers),
            ],
            exempt_paths: vec![
                "/api/auth/login".to_string(),
                "/api/auth/logout".to_string(),
                "/api/auth/verify".to_string(),
                // Filtered by role in the handler.
                "/api/metrics/overview".to_string(),
            ],
            unmapped_policy: UnmappedPolicy::Deny,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum admitted requests per client and path in one window.
    pub max_requests: u32,

    /// Fixed window length in seconds.
    pub window_secs: u64,

    /// Path prefixes the limiter applies to.
    pub paths: Vec<String>,

    /// How often elapsed windows are purged from the store.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_secs: 60,
            paths: vec!["/api/auth/login".to_string()],
            sweep_interval_secs: 60,
        }
    }
}

/// A login account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Stable subject identifier placed in issued credentials.
    pub id: String,

    pub username: String,

    /// PHC-format Argon2id hash (`gatekeeper-cli hash-password`).
    pub password_hash: String,

    pub role: Role,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
