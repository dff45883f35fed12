//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, including role and
//!   capability names)
//! - Validate value ranges (ttl, window and limits > 0)
//! - Check that permission rules sit under the protected prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::auth::credentials::is_argon2id_hash;
use crate::auth::token::parse_algorithm;
use crate::config::schema::GatekeeperConfig;

/// Longest accepted credential lifetime: one year.
pub const MAX_TTL_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("token.secret must not be empty")]
    EmptySecret,

    #[error("token.algorithm '{0}' is not one of HS256, HS384, HS512")]
    Algorithm(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("token.ttl_hours {0} exceeds the maximum of {MAX_TTL_HOURS}")]
    TtlTooLarge(u64),

    #[error("authentication.protected_prefix must start with '/'")]
    ProtectedPrefix,

    #[error("authorization rule '{0}' is outside the protected prefix")]
    RuleOutsidePrefix(String),

    #[error("duplicate username '{0}'")]
    DuplicateUser(String),

    #[error("user '{0}' has no Argon2id password_hash")]
    PasswordHash(String),
}

pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.token.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if parse_algorithm(&config.token.algorithm).is_err() {
        errors.push(ValidationError::Algorithm(config.token.algorithm.clone()));
    }
    if config.token.ttl_hours == 0 {
        errors.push(ValidationError::Zero("token.ttl_hours"));
    } else if config.token.ttl_hours > MAX_TTL_HOURS {
        errors.push(ValidationError::TtlTooLarge(config.token.ttl_hours));
    }

    let prefix = &config.authentication.protected_prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::ProtectedPrefix);
    }
    for rule in &config.authorization.rules {
        if !rule.path_prefix.starts_with(prefix.as_str()) {
            errors.push(ValidationError::RuleOutsidePrefix(rule.path_prefix.clone()));
        }
    }

    let limits = &config.rate_limit;
    if limits.max_requests == 0 {
        errors.push(ValidationError::Zero("rate_limit.max_requests"));
    }
    if limits.window_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.window_secs"));
    }
    if limits.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("rate_limit.sweep_interval_secs"));
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::DuplicateUser(user.username.clone()));
        }
        if !is_argon2id_hash(&user.password_hash) {
            errors.push(ValidationError::PasswordHash(user.username.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
