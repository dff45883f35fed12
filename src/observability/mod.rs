//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gates and handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!     → request IDs from http::request flow through every span
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
