//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the built-in handlers and the downstream
//! - Put the gate chain in front of every route
//! - Wire up middleware (tracing, request ID, timeout, panic rewriting)
//! - Run the rate limit sweeper alongside the server
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{RolePermissionTable, TokenCodec, TokenError, UserDirectory};
use crate::config::GatekeeperConfig;
use crate::http::handlers::{self, AppState};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::http::response::handle_panic;
use crate::security::rate_limit::run_sweeper;
use crate::security::{gate_middleware, GateChain, RateLimitStore};

/// Error type for server construction.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid token configuration: {0}")]
    Token(#[from] TokenError),
}

/// HTTP server for the gatekeeper.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
    store: Arc<RateLimitStore>,
}

impl HttpServer {
    /// Create a server whose protected paths are served by the placeholder
    /// resource handler.
    pub fn new(config: GatekeeperConfig) -> Result<Self, ServerError> {
        let downstream = Router::new().route("/api/{*rest}", get(handlers::resource));
        Self::with_downstream(config, downstream)
    }

    /// Create a server that forwards admitted requests to `downstream`.
    pub fn with_downstream(config: GatekeeperConfig, downstream: Router) -> Result<Self, ServerError> {
        let codec = Arc::new(TokenCodec::from_config(&config.token)?);
        let table = Arc::new(RolePermissionTable::new());
        let users = Arc::new(UserDirectory::from_config(&config.users));
        let store = Arc::new(RateLimitStore::new());

        let chain = Arc::new(GateChain::from_config(
            &config,
            codec.clone(),
            table.clone(),
            store.clone(),
        ));

        if config.testing {
            tracing::warn!("Testing mode: rate limiting disabled");
        }
        if config.token.uses_default_secret() {
            tracing::warn!("Token secret is the built-in placeholder; anyone can forge credentials");
        }
        if users.is_empty() {
            tracing::warn!("No users configured; login will always fail");
        } else {
            tracing::info!(users = users.len(), "User directory loaded");
        }

        let state = AppState {
            codec,
            users,
            table,
        };

        let router = Self::build_router(&config, state, chain, downstream);
        Ok(Self {
            router,
            config,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatekeeperConfig,
        state: AppState,
        chain: Arc<GateChain>,
        downstream: Router,
    ) -> Router {
        let builtin = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/logout", post(handlers::logout))
            .route("/api/auth/verify", get(handlers::verify))
            .route("/api/metrics/overview", get(handlers::overview))
            .with_state(state);

        builtin
            .merge(downstream)
            .layer(middleware::from_fn_with_state(chain, gate_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let limits = &self.config.rate_limit;
        tokio::spawn(run_sweeper(
            self.store.clone(),
            Duration::from_secs(limits.window_secs),
            Duration::from_secs(limits.sweep_interval_secs),
            shutdown.resubscribe(),
        ));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
