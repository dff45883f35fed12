//! Signed credential issue and verification.
//!
//! Credentials are HMAC-signed JWTs carrying `user_id`, `username`, `role`,
//! `iat` and `exp`. Expiry is checked here rather than by `jsonwebtoken` so
//! that the signature and expiry failures stay distinguishable for logging,
//! and so that both can be exercised against an explicit clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::identity::Identity;
use crate::auth::role::Role;
use crate::config::TokenConfig;

/// Claims encoded in every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Why a credential was not accepted.
///
/// Only ever logged. Callers outside this module see a single opaque
/// rejection (`GateError::TokenRejected`).
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signature mismatch")]
    InvalidSignature,

    #[error("expired at {exp}")]
    Expired { exp: i64 },

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("credential lifetime out of range")]
    TtlOutOfRange,

    #[error("failed to sign credential: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short label used for log fields and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired { .. } => "expired",
            TokenError::Malformed(_) => "malformed",
            TokenError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            TokenError::TtlOutOfRange => "ttl_out_of_range",
            TokenError::Signing(_) => "signing",
        }
    }
}

/// Parse a symmetric signing algorithm name.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    match name {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Issues and verifies credentials with a shared secret.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        let algorithm = parse_algorithm(&config.algorithm)?;
        let ttl_secs = config
            .ttl_hours
            .checked_mul(3600)
            .filter(|secs| i64::try_from(*secs).is_ok())
            .ok_or(TokenError::TtlOutOfRange)?;
        Ok(Self::new(
            config.secret.as_bytes(),
            algorithm,
            Duration::from_secs(ttl_secs),
        ))
    }

    /// Issue a credential stamped with the current time.
    pub fn issue(&self, subject_id: &str, display_name: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject_id, display_name, role.as_str(), now_epoch_seconds())
    }

    /// Issue a credential as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject_id: &str,
        display_name: &str,
        role: &str,
        now: i64,
    ) -> Result<String, TokenError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::TtlOutOfRange)?;
        let claims = Claims {
            user_id: subject_id.to_string(),
            username: display_name.to_string(),
            role: role.to_string(),
            iat: now,
            exp,
        };
        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, now_epoch_seconds())
    }

    /// Verify a credential against an explicit clock reading.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = data.claims;
        if now > claims.exp {
            return Err(TokenError::Expired { exp: claims.exp });
        }

        Ok(Identity::new(claims.user_id, claims.username, claims.role))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

pub(crate) fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
