//! Security subsystem: the gate chain.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per client+path fixed window)
//!     → authentication.rs (verify bearer credential, attach Identity)
//!     → authorization.rs (path → capability, check role)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Each check is a `Gate`; the chain is an ordered list driven by a loop
//! - First rejection short-circuits and becomes the response
//! - Gates are synchronous; the only shared mutable state is the rate store

pub mod authentication;
pub mod authorization;
pub mod headers;
pub mod rate_limit;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{RolePermissionTable, TokenCodec};
use crate::config::GatekeeperConfig;
use crate::error::GateError;
use crate::observability::metrics;

pub use authentication::AuthenticationGate;
pub use authorization::AuthorizationGate;
pub use rate_limit::{RateDecision, RateLimitStore, RateLimiter};

/// One check in the chain.
pub trait Gate: Send + Sync + std::fmt::Debug {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Inspect (and possibly annotate) the request head.
    fn process(&self, request: &mut Parts) -> Result<(), GateError>;
}

/// Ordered, short-circuiting list of gates.
#[derive(Debug, Default)]
pub struct GateChain {
    gates: Vec<Box<dyn Gate>>,
}

impl GateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate to the end of the chain.
    pub fn with(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    /// The standard chain: rate limit → authentication → authorization.
    pub fn from_config(
        config: &GatekeeperConfig,
        codec: Arc<TokenCodec>,
        table: Arc<RolePermissionTable>,
        store: Arc<RateLimitStore>,
    ) -> Self {
        Self::new()
            .with(RateLimiter::from_config(config, store))
            .with(AuthenticationGate::new(codec, &config.authentication))
            .with(AuthorizationGate::new(
                table,
                config.authentication.protected_prefix.clone(),
                &config.authorization,
            ))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Run every gate in order, stopping at the first rejection.
    pub fn evaluate(&self, request: &mut Parts) -> Result<(), GateError> {
        for gate in &self.gates {
            if let Err(err) = gate.process(request) {
                tracing::warn!(
                    gate = gate.name(),
                    method = %request.method,
                    path = %request.uri.path(),
                    reason = err.reason(),
                    status = err.status().as_u16(),
                    "Request rejected"
                );
                metrics::record_rejection(gate.name(), err.reason());
                return Err(err);
            }
        }
        metrics::record_admitted();
        Ok(())
    }
}

/// Axum middleware running the chain in front of the handlers.
pub async fn gate_middleware(
    State(chain): State<Arc<GateChain>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match chain.evaluate(&mut parts) {
        Ok(()) => next.run(Request::from_parts(parts, body)).await,
        Err(err) => err.into_response(),
    }
}
