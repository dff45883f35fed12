//! Built-in handlers behind the gate chain.
//!
//! Login, logout and verify complete the credential lifecycle; the overview
//! filters itself by role; `resource` stands in for the downstream service on
//! every other protected path.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, Uri},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::credentials::{sanitize, validate_password, validate_username};
use crate::auth::{Capability, Identity, Role, RolePermissionTable, TokenCodec, UserDirectory};
use crate::error::{ApiError, GateError};
use crate::observability::metrics;

/// Shared state for the built-in handlers.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub users: Arc<UserDirectory>,
    pub table: Arc<RolePermissionTable>,
}

/// The identity attached by the authentication gate.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(GateError::AuthenticationRequired)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let required = || ApiError::BadRequest("Username and password are required".to_string());

    let Json(request) = body.map_err(|_| required())?;
    let (username, password) = match (request.username, request.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Err(required()),
    };

    let username = sanitize(&username);
    validate_username(&username).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_password(&password).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let users = state.users.clone();
    let candidate = username.clone();
    let account = tokio::task::spawn_blocking(move || {
        users.authenticate(&candidate, &password).cloned()
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password verification task failed: {}", e)))?;

    let Some(account) = account else {
        tracing::info!(username = %username, "Login failed");
        metrics::record_login("failure");
        return Err(ApiError::InvalidCredentials);
    };

    let token = state
        .codec
        .issue(&account.id, &account.username, account.role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(username = %account.username, role = %account.role, "Login succeeded");
    metrics::record_login("success");

    Ok(Json(LoginResponse {
        token,
        user: UserView {
            id: account.id,
            username: account.username,
            role: account.role.to_string(),
        },
    }))
}

/// `POST /api/auth/logout`. Credentials are stateless; the client drops it.
pub async fn logout(CurrentUser(identity): CurrentUser) -> Json<Value> {
    tracing::info!(username = %identity.display_name, "Logged out");
    Json(json!({ "message": "Logged out successfully" }))
}

/// `GET /api/auth/verify`
pub async fn verify(CurrentUser(identity): CurrentUser) -> Json<Value> {
    Json(json!({ "valid": true, "user": identity }))
}

/// `GET /api/metrics/overview`, filtered to what the caller's role may see.
pub async fn overview(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let role: Role = identity.role().map_err(|_| GateError::UnknownRole)?;
    let capabilities: Vec<Capability> = state.table.capabilities(role);
    let views: Vec<&str> = capabilities
        .iter()
        .map(|c| c.as_str())
        .filter(|name| name.starts_with("view_"))
        .collect();

    Ok(Json(json!({
        "user": identity,
        "role": role,
        "capabilities": capabilities,
        "views": views,
    })))
}

/// Placeholder downstream for protected resources.
pub async fn resource(CurrentUser(identity): CurrentUser, uri: Uri) -> Json<Value> {
    Json(json!({ "resource": uri.path(), "user": identity }))
}

/// `GET /health`, outside the protected prefix.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
