//! Identity and permission primitives.
//!
//! # Data Flow
//! ```text
//! login:    credentials.rs (check password) → token.rs (issue)
//! request:  token.rs (verify) → Identity → role.rs (table lookup)
//! ```

pub mod credentials;
pub mod identity;
pub mod role;
pub mod token;

pub use credentials::UserDirectory;
pub use identity::Identity;
pub use role::{Capability, Role, RolePermissionTable};
pub use token::{TokenCodec, TokenError};
