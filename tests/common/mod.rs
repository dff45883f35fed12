//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use gatekeeper::auth::credentials::hash_password_with_params;
use gatekeeper::auth::{Role, TokenCodec};
use gatekeeper::config::{GatekeeperConfig, UserConfig};

pub const SECRET: &str = "integration-test-secret";

/// (username, password, role) for every configured test account.
pub const ACCOUNTS: [(&str, &str, Role); 3] = [
    ("admin", "admin-pass-1", Role::SuperAdmin),
    ("finance", "finance-pass-1", Role::CaFinance),
    ("support", "support-pass-1", Role::Support),
];

pub fn test_config() -> GatekeeperConfig {
    let mut config = GatekeeperConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.token.secret = SECRET.to_string();
    config.users = ACCOUNTS
        .iter()
        .enumerate()
        .map(|(i, (username, password, role))| UserConfig {
            id: format!("user-{}", i),
            username: username.to_string(),
            // Minimal Argon2id costs; the PHC string carries them to verification.
            password_hash: hash_password_with_params(password, 1024, 1, 1).unwrap(),
            role: *role,
        })
        .collect();
    config
}

pub fn codec() -> TokenCodec {
    TokenCodec::from_config(&test_config().token).unwrap()
}

pub fn token_for(role: Role) -> String {
    codec().issue("user-x", role.as_str(), role).unwrap()
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn login_request(username: &str, password: &str, client: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

/// Send one request through the router and decode the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
