//! Login credential checks.
//!
//! # Responsibilities
//! - Validate login input shape before touching the user directory
//! - Look up configured accounts and verify password hashes
//!
//! # Design Decisions
//! - Accounts come from configuration; there is no persistent user store
//! - Passwords are stored as PHC-format Argon2id hashes
//! - Unknown user and wrong password produce the same error

use std::collections::HashMap;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::auth::role::Role;
use crate::config::UserConfig;

/// Rejected login input. The message is safe to return to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidInput(pub &'static str);

/// Password hashing failed (bad parameters or salt generation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// A configured account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub role: Role,
    password_hash: String,
}

/// Hash a password with Argon2id and the default cost parameters.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    hash_with(&Argon2::default(), password)
}

/// Hash with explicit Argon2id costs (memory in KiB, iterations, lanes).
///
/// The costs are recorded in the PHC string, so verification needs no
/// matching configuration.
pub fn hash_password_with_params(
    password: &str,
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
) -> Result<String, HashError> {
    let params = Params::new(memory_cost, time_cost, parallelism, None)
        .map_err(|e| HashError(e.to_string()))?;
    hash_with(&Argon2::new(Algorithm::Argon2id, Version::V0x13, params), password)
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// True for a well-formed PHC string produced by Argon2id.
pub fn is_argon2id_hash(value: &str) -> bool {
    PasswordHash::new(value)
        .map(|hash| hash.algorithm.as_str() == "argon2id")
        .unwrap_or(false)
}

/// Remove control characters and surrounding whitespace.
pub fn sanitize(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\t' || *c == '\n' || *c == '\r')
        .collect()
}

/// 3-50 characters: alphanumeric runs joined by single `_` or `-`.
pub fn validate_username(username: &str) -> Result<(), InvalidInput> {
    if username.is_empty() {
        return Err(InvalidInput("Username is required"));
    }
    let len = username.chars().count();
    if len < 3 {
        return Err(InvalidInput("Username must be at least 3 characters"));
    }
    if len > 50 {
        return Err(InvalidInput("Username must not exceed 50 characters"));
    }

    let bytes = username.as_bytes();
    let is_sep = |b: u8| b == b'_' || b == b'-';
    let well_formed = bytes.iter().all(|b| b.is_ascii_alphanumeric() || is_sep(*b))
        && !is_sep(bytes[0])
        && !is_sep(bytes[bytes.len() - 1])
        && !bytes.windows(2).any(|w| is_sep(w[0]) && is_sep(w[1]));
    if !well_formed {
        return Err(InvalidInput(
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), InvalidInput> {
    if password.is_empty() {
        return Err(InvalidInput("Password is required"));
    }
    let len = password.chars().count();
    if len < 8 {
        return Err(InvalidInput("Password must be at least 8 characters"));
    }
    if len > 128 {
        return Err(InvalidInput("Password must not exceed 128 characters"));
    }
    Ok(())
}

/// Accounts keyed by username.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    accounts: HashMap<String, Account>,
}

impl UserDirectory {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let accounts = users
            .iter()
            .map(|u| {
                let account = Account {
                    id: u.id.clone(),
                    username: u.username.clone(),
                    role: u.role,
                    password_hash: u.password_hash.clone(),
                };
                (u.username.clone(), account)
            })
            .collect();
        Self { accounts }
    }

    /// Return the account if `password` verifies against its stored hash.
    ///
    /// CPU-bound; call from a blocking context.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Account> {
        let account = self.accounts.get(username)?;
        let parsed = match PasswordHash::new(&account.password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(username = %username, error = %e, "Stored password hash is unreadable");
                return None;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .ok()
            .map(|()| account)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
