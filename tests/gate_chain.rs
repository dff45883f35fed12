//! Gate chain behaviour through the full router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use gatekeeper::auth::{Role, TokenCodec};
use gatekeeper::config::AuthorizationConfig;
use gatekeeper::HttpServer;

mod common;
use common::{get as get_req, login_request, send, test_config, token_for};

fn router() -> Router {
    HttpServer::new(test_config()).unwrap().router()
}

#[tokio::test]
async fn test_finance_scope() {
    let router = router();
    let token = token_for(Role::CaFinance);

    let (status, body) = send(&router, get_req("/api/metrics/revenue", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resource"], "/api/metrics/revenue");
    assert_eq!(body["user"]["role"], "ca_finance");

    let (status, body) = send(&router, get_req("/api/metrics/orders", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Access denied" }));
}

#[tokio::test]
async fn test_missing_header_is_401_everywhere_protected() {
    let router = router();
    for path in [
        "/api/metrics/revenue",
        "/api/users",
        "/api/metrics/overview",
        "/api/auth/verify",
        "/api/unknown",
    ] {
        let (status, body) = send(&router, get_req(path, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(body, json!({ "error": "No token provided" }), "{}", path);
    }
}

#[tokio::test]
async fn test_admin_reaches_every_rule() {
    let router = router();
    let token = token_for(Role::SuperAdmin);
    for rule in AuthorizationConfig::default().rules {
        let path = format!("{}/x", rule.path_prefix.trim_end_matches('/'));
        let (status, _) = send(&router, get_req(&path, Some(&token))).await;
        assert_eq!(status, StatusCode::OK, "{}", path);
    }
}

#[tokio::test]
async fn test_each_role_matches_table() {
    let router = router();
    let table = gatekeeper::auth::RolePermissionTable::new();
    for role in Role::ALL {
        let token = token_for(role);
        for rule in AuthorizationConfig::default().rules {
            let path = format!("{}/item", rule.path_prefix.trim_end_matches('/'));
            let (status, _) = send(&router, get_req(&path, Some(&token))).await;
            let expected = if table.allows(role, rule.capability) {
                StatusCode::OK
            } else {
                StatusCode::FORBIDDEN
            };
            assert_eq!(status, expected, "{} {}", role, path);
        }
    }
}

#[tokio::test]
async fn test_rejected_tokens_share_one_response() {
    let router = router();
    let codec = common::codec();
    let expired = codec.issue_at("u", "admin", "super_admin", 1_000).unwrap();
    let foreign = TokenCodec::new(
        b"someone-else",
        jsonwebtoken::Algorithm::HS256,
        std::time::Duration::from_secs(3600),
    )
    .issue("u", "admin", Role::SuperAdmin)
    .unwrap();

    for token in [expired.as_str(), foreign.as_str(), "a.b.c"] {
        let (status, body) = send(&router, get_req("/api/users", Some(token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid or expired token" }));
    }
}

#[tokio::test]
async fn test_malformed_bearer() {
    let router = router();
    let request = Request::builder()
        .uri("/api/users")
        .header("authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid token format" }));
}

#[tokio::test]
async fn test_unknown_role_claim() {
    let router = router();
    let token = common::codec()
        .issue_at("u", "root", "root", now())
        .unwrap();
    let (status, body) = send(&router, get_req("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Invalid user role" }));
}

#[tokio::test]
async fn test_unmapped_path_denied_by_default() {
    let router = router();
    let token = token_for(Role::SuperAdmin);
    let (status, _) = send(&router, get_req("/api/reports/export", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_issues_working_token() {
    let router = router();
    let (status, body) = send(&router, login_request("finance", "finance-pass-1", "10.0.0.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "finance");
    assert_eq!(body["user"]["role"], "ca_finance");
    assert_eq!(body["user"]["id"], "user-1");

    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = send(&router, get_req("/api/auth/verify", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["id"], "user-1");

    let (status, _) = send(&router, get_req("/api/metrics/revenue", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let logout = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_login_failures() {
    let router = router();

    let (status, body) = send(&router, login_request("finance", "wrong-password", "10.0.0.2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid credentials" }));

    let (status, body) = send(&router, login_request("nobody", "finance-pass-1", "10.0.0.3")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid credentials" }));

    let (status, body) = send(&router, login_request("finance", "short", "10.0.0.4")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters");

    let (status, body) = send(&router, login_request("fi nance", "finance-pass-1", "10.0.0.5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Username can only"));

    let empty = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username and password are required");
}

#[tokio::test]
async fn test_login_rate_limited_per_client() {
    let router = router();
    for _ in 0..5 {
        let (status, _) = send(&router, login_request("finance", "wrong-password", "192.0.2.10")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(&router, login_request("finance", "finance-pass-1", "192.0.2.10")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests. Please try again later.");
    let retry_after = body["retry_after"].as_u64().unwrap();
    assert!((1..=60).contains(&retry_after));

    // A different client is unaffected.
    let (status, _) = send(&router, login_request("finance", "finance-pass-1", "192.0.2.11")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_testing_mode_disables_rate_limit() {
    let mut config = test_config();
    config.testing = true;
    let router = HttpServer::new(config).unwrap().router();

    for _ in 0..10 {
        let (status, _) = send(&router, login_request("finance", "wrong-password", "192.0.2.20")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = send(&router, login_request("finance", "finance-pass-1", "192.0.2.20")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_overview_filters_by_role() {
    let router = router();

    let (status, body) = send(&router, get_req("/api/metrics/overview", Some(&token_for(Role::Developer)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "developer");
    assert_eq!(
        body["views"],
        json!(["view_delivery_partners", "view_system_logs", "view_api_analytics"])
    );

    let (status, body) = send(&router, get_req("/api/metrics/overview", Some(&token_for(Role::SuperAdmin)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capabilities"].as_array().unwrap().len(), 14);
}

#[tokio::test]
async fn test_unprotected_paths_pass() {
    let router = router();
    let (status, body) = send(&router, get_req("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_downstream_panic_is_generic_500() {
    async fn explode() -> &'static str {
        panic!("connection string postgresql://admin:hunter2@db/users")
    }

    let downstream = Router::new().route("/api/users/{id}", get(explode));
    let router = HttpServer::with_downstream(test_config(), downstream)
        .unwrap()
        .router();

    let (status, body) = send(&router, get_req("/api/users/7", Some(&token_for(Role::SuperAdmin)))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "An internal server error occurred. Please try again later.",
            "status_code": 500,
        })
    );
}

#[tokio::test]
async fn test_request_id_assigned_and_echoed() {
    let router = router();

    let response = router.clone().oneshot(get_req("/health", None)).await.unwrap();
    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);

    let request = Request::builder()
        .uri("/api/users")
        .header("x-request-id", "client-chosen-id")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-request-id"], "client-chosen-id");
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
