//! Request gatekeeper library.
//!
//! Rate limiting, bearer credential authentication and role-based
//! authorization in front of an Axum router.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatekeeperConfig;
pub use error::GateError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{Gate, GateChain};
