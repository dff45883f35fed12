//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatekeeperConfig (validated, immutable)
//!     → gates and handlers built from it once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthenticationConfig, AuthorizationConfig, GatekeeperConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PermissionRule, RateLimitConfig, TimeoutConfig, TokenConfig,
    UnmappedPolicy, UserConfig,
};
