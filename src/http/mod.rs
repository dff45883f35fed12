//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID, open span)
//!     → security::GateChain (rate limit, authentication, authorization)
//!     → handlers.rs or the downstream router
//!     → response.rs (panics rewritten to a generic 500)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::{AppState, CurrentUser};
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
