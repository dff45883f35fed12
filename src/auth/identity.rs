//! Verified caller identity attached to a request.

use serde::Serialize;

use crate::auth::role::{Role, UnknownRole};

/// The identity carried by a valid credential.
///
/// Inserted into the request extensions by the authentication gate and read
/// by the authorization gate and handlers. The role is kept as the raw claim
/// so an unrecognized value can be rejected where authorization happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub subject_id: String,
    #[serde(rename = "username")]
    pub display_name: String,
    #[serde(rename = "role")]
    role_claim: String,
}

impl Identity {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        role_claim: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            role_claim: role_claim.into(),
        }
    }

    /// The role claim exactly as it appeared in the token.
    pub fn role_claim(&self) -> &str {
        &self.role_claim
    }

    pub fn role(&self) -> Result<Role, UnknownRole> {
        self.role_claim.parse()
    }
}
