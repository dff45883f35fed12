//! Bearer credential verification.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::auth::TokenCodec;
use crate::config::AuthenticationConfig;
use crate::error::GateError;
use crate::security::headers::bearer_token;
use crate::security::Gate;

/// Verifies the bearer credential and attaches the resulting
/// [`Identity`](crate::auth::Identity) to the request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    codec: Arc<TokenCodec>,
    protected_prefix: String,
    exempt_paths: Vec<String>,
}

impl AuthenticationGate {
    pub fn new(codec: Arc<TokenCodec>, config: &AuthenticationConfig) -> Self {
        Self {
            codec,
            protected_prefix: config.protected_prefix.clone(),
            exempt_paths: config.exempt_paths.clone(),
        }
    }

    /// True when the path needs no credential.
    pub fn is_exempt(&self, path: &str) -> bool {
        !path.starts_with(self.protected_prefix.as_str())
            || self.exempt_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Gate for AuthenticationGate {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process(&self, request: &mut Parts) -> Result<(), GateError> {
        if self.is_exempt(request.uri.path()) {
            return Ok(());
        }

        let token = bearer_token(&request.headers)?;
        let identity = self.codec.verify(token).map_err(|e| {
            tracing::info!(
                path = %request.uri.path(),
                reason = e.reason(),
                error = %e,
                "Credential rejected"
            );
            GateError::TokenRejected
        })?;

        tracing::debug!(user = %identity.display_name, role = %identity.role_claim(), "Authenticated");
        request.extensions.insert(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::Request;
    use jsonwebtoken::Algorithm;

    use crate::auth::{Identity, Role};

    fn gate() -> (AuthenticationGate, Arc<TokenCodec>) {
        let codec = Arc::new(TokenCodec::new(
            b"test-secret",
            Algorithm::HS256,
            Duration::from_secs(3600),
        ));
        (AuthenticationGate::new(codec.clone(), &AuthenticationConfig::default()), codec)
    }

    fn parts(path: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_valid_token_attaches_identity() {
        let (gate, codec) = gate();
        let token = codec.issue("u-9", "ops", Role::Support).unwrap();
        let mut req = parts("/api/metrics/orders", Some(&format!("Bearer {}", token)));

        gate.process(&mut req).unwrap();
        let identity = req.extensions.get::<Identity>().unwrap();
        assert_eq!(identity.subject_id, "u-9");
        assert_eq!(identity.role(), Ok(Role::Support));
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        let (gate, _) = gate();
        assert_eq!(
            gate.process(&mut parts("/api/users", None)),
            Err(GateError::NoToken)
        );
        assert_eq!(
            gate.process(&mut parts("/api/users", Some("Token abc"))),
            Err(GateError::NoToken)
        );
        assert_eq!(
            gate.process(&mut parts("/api/users", Some("Bearer "))),
            Err(GateError::MalformedToken)
        );
    }

    #[test]
    fn test_bad_and_foreign_tokens_look_identical() {
        let (gate, _) = gate();
        let foreign = TokenCodec::new(b"other", Algorithm::HS256, Duration::from_secs(3600))
            .issue("u-1", "x", Role::SuperAdmin)
            .unwrap();
        let expired = TokenCodec::new(b"test-secret", Algorithm::HS256, Duration::from_secs(3600))
            .issue_at("u-1", "x", "super_admin", 1_000)
            .unwrap();

        for token in [foreign.as_str(), expired.as_str(), "garbage"] {
            let mut req = parts("/api/users", Some(&format!("Bearer {}", token)));
            assert_eq!(gate.process(&mut req), Err(GateError::TokenRejected));
            assert!(req.extensions.get::<Identity>().is_none());
        }
    }

    #[test]
    fn test_exempt_and_unprotected_paths_skip() {
        let (gate, _) = gate();
        assert!(gate.process(&mut parts("/api/auth/login", None)).is_ok());
        assert!(gate.process(&mut parts("/health", None)).is_ok());
        assert!(gate.process(&mut parts("/api/auth/logout", None)).is_err());
    }
}
