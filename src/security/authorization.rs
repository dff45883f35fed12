//! Role-based permission enforcement.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::auth::{Capability, Identity, RolePermissionTable};
use crate::config::{AuthorizationConfig, PermissionRule, UnmappedPolicy};
use crate::error::GateError;
use crate::security::Gate;

/// Maps the request path to a required capability and checks it against
/// the caller's role.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    table: Arc<RolePermissionTable>,
    protected_prefix: String,
    rules: Vec<PermissionRule>,
    exempt_paths: Vec<String>,
    unmapped_policy: UnmappedPolicy,
}

impl AuthorizationGate {
    pub fn new(
        table: Arc<RolePermissionTable>,
        protected_prefix: impl Into<String>,
        config: &AuthorizationConfig,
    ) -> Self {
        Self {
            table,
            protected_prefix: protected_prefix.into(),
            rules: config.rules.clone(),
            exempt_paths: config.exempt_paths.clone(),
            unmapped_policy: config.unmapped_policy,
        }
    }

    /// Capability of the first rule whose prefix matches.
    pub fn required_capability(&self, path: &str) -> Option<Capability> {
        self.rules
            .iter()
            .find(|rule| path.starts_with(rule.path_prefix.as_str()))
            .map(|rule| rule.capability)
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        !path.starts_with(self.protected_prefix.as_str())
            || self.exempt_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Gate for AuthorizationGate {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn process(&self, request: &mut Parts) -> Result<(), GateError> {
        let path = request.uri.path();
        if self.is_exempt(path) {
            return Ok(());
        }

        let identity = request
            .extensions
            .get::<Identity>()
            .ok_or(GateError::AuthenticationRequired)?;

        let required = match (self.required_capability(path), self.unmapped_policy) {
            (Some(capability), _) => capability,
            (None, UnmappedPolicy::Allow) => return Ok(()),
            (None, UnmappedPolicy::Deny) => {
                tracing::warn!(path = %path, "No capability rule covers protected path");
                return Err(GateError::PermissionDenied);
            }
        };

        let role = identity.role().map_err(|e| {
            tracing::warn!(user = %identity.display_name, error = %e, "Credential carries unknown role");
            GateError::UnknownRole
        })?;

        if !self.table.allows(role, required) {
            tracing::info!(
                user = %identity.display_name,
                role = %role,
                capability = %required,
                path = %path,
                "Capability not granted"
            );
            return Err(GateError::PermissionDenied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::auth::Role;

    fn gate(policy: UnmappedPolicy) -> AuthorizationGate {
        let config = AuthorizationConfig {
            unmapped_policy: policy,
            ..AuthorizationConfig::default()
        };
        AuthorizationGate::new(Arc::new(RolePermissionTable::new()), "/api/", &config)
    }

    fn parts(path: &str, role: Option<&str>) -> Parts {
        let mut parts = Request::builder().uri(path).body(()).unwrap().into_parts().0;
        if let Some(role) = role {
            parts.extensions.insert(Identity::new("u-1", "tester", role));
        }
        parts
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let config = AuthorizationConfig {
            rules: vec![
                PermissionRule::new("/api/kyc/verify", Capability::VerifyKyc),
                PermissionRule::new("/api/kyc/", Capability::ViewKycQueue),
            ],
            ..AuthorizationConfig::default()
        };
        let gate = AuthorizationGate::new(Arc::new(RolePermissionTable::new()), "/api/", &config);
        assert_eq!(gate.required_capability("/api/kyc/verify/42"), Some(Capability::VerifyKyc));
        assert_eq!(gate.required_capability("/api/kyc/pending"), Some(Capability::ViewKycQueue));
        assert_eq!(gate.required_capability("/api/other"), None);
    }

    #[test]
    fn test_finance_can_view_revenue_not_orders() {
        let gate = gate(UnmappedPolicy::Deny);
        assert!(gate.process(&mut parts("/api/metrics/revenue", Some("ca_finance"))).is_ok());
        assert_eq!(
            gate.process(&mut parts("/api/metrics/orders", Some("ca_finance"))),
            Err(GateError::PermissionDenied)
        );
    }

    #[test]
    fn test_admin_passes_every_rule() {
        let gate = gate(UnmappedPolicy::Deny);
        for rule in AuthorizationConfig::default().rules {
            let mut req = parts(&rule.path_prefix, Some(Role::SuperAdmin.as_str()));
            assert!(gate.process(&mut req).is_ok(), "{}", rule.path_prefix);
        }
    }

    #[test]
    fn test_missing_identity_and_unknown_role() {
        let gate = gate(UnmappedPolicy::Deny);
        assert_eq!(
            gate.process(&mut parts("/api/users", None)),
            Err(GateError::AuthenticationRequired)
        );
        assert_eq!(
            gate.process(&mut parts("/api/users", Some("root"))),
            Err(GateError::UnknownRole)
        );
    }

    #[test]
    fn test_exempt_paths_bypass() {
        let gate = gate(UnmappedPolicy::Deny);
        assert!(gate.process(&mut parts("/api/metrics/overview", None)).is_ok());
        assert!(gate.process(&mut parts("/api/auth/logout", None)).is_ok());
        assert!(gate.process(&mut parts("/static/app.js", None)).is_ok());
    }

    #[test]
    fn test_unmapped_policy() {
        let deny = gate(UnmappedPolicy::Deny);
        assert_eq!(
            deny.process(&mut parts("/api/reports/export", Some("super_admin"))),
            Err(GateError::PermissionDenied)
        );

        let allow = gate(UnmappedPolicy::Allow);
        assert!(allow.process(&mut parts("/api/reports/export", Some("support"))).is_ok());
    }
}
