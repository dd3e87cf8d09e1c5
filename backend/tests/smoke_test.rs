use std::sync::Arc;

use axum::body::Body;
use http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use watchearn_backend::test_util::{
    admin_token, create_test_state, create_test_state_with, gated_config, test_config, token_for,
};
use watchearn_backend::{routes, AppState};
use watchearn_common::{Document, Role};

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut req_builder = Request::builder().method(method).uri(uri);

    if body.is_some() {
        req_builder = req_builder.header("Content-Type", "application/json");
    }
    if let Some(token) = token {
        req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
    }

    let req = req_builder
        .body(match body {
            Some(b) => Body::from(b.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn app(state: &Arc<AppState>) -> axum::Router {
    routes::app(state.clone())
}

async fn register(app: &axum::Router, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/register",
        Some(json!({"name": name, "email": email, "password": password})),
        None,
    )
    .await
}

async fn login(app: &axum::Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/login",
        Some(json!({"email": email, "password": password})),
        None,
    )
    .await
}

#[tokio::test]
async fn test_hello() {
    let state = create_test_state(test_config());
    let (status, body) = send(&app(&state), Method::GET, "/api/hello", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("working"));
}

#[tokio::test]
async fn test_health() {
    let state = create_test_state(test_config());
    let (status, body) = send(&app(&state), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let state = create_test_state(test_config());
    let (status, body) = send(&app(&state), Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found. Please check your URL.");
}

#[tokio::test]
async fn test_unknown_admin_route_is_404_not_401() {
    let state = create_test_state(test_config());
    let (status, _) = send(&app(&state), Method::GET, "/api/admin/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_then_duplicate() {
    let state = create_test_state(test_config());
    let app = app(&state);

    let (status, body) = register(&app, "Alice", "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert_eq!(body["user"]["role"], "user");

    let (status, body) = register(&app, "Alice", " ALICE@X.COM ", "pw2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let state = create_test_state(test_config());
    let (status, body) = send(
        &app(&state),
        Method::POST,
        "/api/register",
        Some(json!({"email": "alice@x.com", "password": "pw1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let state = create_test_state(test_config());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_token_and_no_password() {
    let state = create_test_state(test_config());
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;

    let (status, body) = login(&app, "Alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let token = body["token"].as_str().unwrap();
    let user = state.tokens.verify(token).unwrap();
    assert_eq!(user.email, "alice@x.com");
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn test_login_missing_fields_and_wrong_password() {
    let state = create_test_state(test_config());
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({"email": "alice@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");

    let (status, body) = login(&app, "alice@x.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_unprefixed_aliases() {
    let state = create_test_state(test_config());
    let app = app(&state);

    let (status, _) = send(
        &app,
        Method::POST,
        "/register",
        Some(json!({"name": "Alice", "email": "alice@x.com", "password": "pw1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({"email": "alice@x.com", "password": "pw1"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        "/purchase-plan",
        Some(json!({"planId": "basic"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_plan_requires_auth() {
    let state = create_test_state(test_config());
    let app = app(&state);

    let (status, body) = send(&app, Method::POST, "/api/plan", Some(json!({"planId": "pro"})), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "pro"})),
        Some("garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_plan_purchase_immediate() {
    let state = create_test_state(test_config());
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;
    let token = token_for(&state, "alice@x.com", Role::User);

    let (status, body) = send(&app, Method::POST, "/api/plan", Some(json!({})), Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "planId is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "pro"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Plan purchase successful");
    assert_eq!(body["purchase"]["planId"], "pro");

    let doc = state.db.read().unwrap();
    let alice = doc.user("alice@x.com").unwrap();
    assert_eq!(alice.purchases.len(), 1);
    assert_eq!(alice.plan_id.as_deref(), Some("pro"));
}

#[tokio::test]
async fn test_plan_for_deleted_user_is_404() {
    let state = create_test_state(test_config());
    let token = token_for(&state, "ghost@x.com", Role::User);

    let (status, body) = send(
        &app(&state),
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "pro"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_plan_without_tokens_takes_body_email() {
    let mut config = test_config();
    config.workflow.issue_tokens = false;
    let state = create_test_state(config);
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;

    let (status, body) = login(&app, "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "basic"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email is required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "basic", "email": "Alice@x.com"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchase"]["planId"], "basic");
}

#[tokio::test]
async fn test_plan_without_tokens_prefers_bearer_over_body_email() {
    let mut config = test_config();
    config.workflow.issue_tokens = false;
    let state = create_test_state(config);
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;
    register(&app, "Bob", "bob@x.com", "pw2").await;

    let alice_token = token_for(&state, "alice@x.com", Role::User);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "gold", "email": "bob@x.com"})),
        Some(&alice_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchase"]["planId"], "gold");

    let doc = state.db.read().unwrap();
    assert_eq!(doc.user("alice@x.com").unwrap().plan_id.as_deref(), Some("gold"));
    assert!(doc.user("bob@x.com").unwrap().purchases.is_empty());
    drop(doc);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "gold", "email": "bob@x.com"})),
        Some("not-a-token"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.db.read().unwrap().user("bob@x.com").unwrap().purchases.is_empty());
}

/// Gated approvals stay reachable when user logins get no token.
#[tokio::test]
async fn test_gated_without_tokens_admin_login_still_issues_token() {
    let mut config = gated_config();
    config.workflow.issue_tokens = false;
    let state = create_test_state(config);
    let app = app(&state);

    register(&app, "Root", "admin@watchearn.com", "adminpw").await;
    let (status, body) = register(&app, "Alice", "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["approved"], false);

    let (status, body) = login(&app, "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token").is_none());

    let (status, body) = login(&app, "admin@watchearn.com", "adminpw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/admin/approvals", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let signup_id = body["approvals"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["type"] == "signup")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": signup_id, "status": "approved"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.db.read().unwrap().user("alice@x.com").unwrap().approved);
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let state = create_test_state(test_config());
    let app = app(&state);
    let user_token = token_for(&state, "alice@x.com", Role::User);

    for uri in ["/api/admin/users", "/api/admin/approvals", "/admin/users"] {
        let (status, _) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);

        let (status, body) = send(&app, Method::GET, uri, None, Some(&user_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"], "Forbidden");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": "x", "status": "approved"})),
        Some(&user_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_users_strips_passwords_and_fills_roles() {
    let legacy: Document = serde_json::from_value(json!({
        "users": {
            "admin@watchearn.com": {"name": "Root", "email": "admin@watchearn.com", "password": "root", "createdAt": "2024-01-01T00:00:00Z"},
            "bob@x.com": {"name": "Bob", "email": "bob@x.com", "password": "bob", "createdAt": "2024-01-01T00:00:00Z"}
        }
    }))
    .unwrap();
    let state = create_test_state_with(test_config(), legacy);
    let token = admin_token(&state);

    let (status, body) = send(&app(&state), Method::GET, "/api/admin/users", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
    }
    let admin = users.iter().find(|u| u["email"] == "admin@watchearn.com").unwrap();
    assert_eq!(admin["role"], "admin");
}

#[tokio::test]
async fn test_legacy_admin_can_login_and_manage() {
    let legacy: Document = serde_json::from_value(json!({
        "users": {
            "admin@watchearn.com": {"name": "Root", "email": "admin@watchearn.com", "password": "root", "createdAt": "2024-01-01T00:00:00Z"}
        }
    }))
    .unwrap();
    let state = create_test_state_with(test_config(), legacy);
    let app = app(&state);

    let (status, body) = login(&app, "admin@watchearn.com", "root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/admin/approvals", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let doc = state.db.read().unwrap();
    let admin = doc.user("admin@watchearn.com").unwrap();
    assert!(admin.password.is_none());
    assert!(admin.password_hash.is_some());
}

#[tokio::test]
async fn test_approve_validation_and_unknown_id() {
    let state = create_test_state(gated_config());
    let app = app(&state);
    let token = admin_token(&state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": "abc"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "id and status are required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": "abc", "status": "maybe"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": "abc", "status": "approved"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Approval not found");
}

/// register → wrong login → login → admin approves signup.
#[tokio::test]
async fn test_signup_approval_scenario() {
    let state = create_test_state(gated_config());
    let app = app(&state);

    let (status, body) = register(&app, "Alice", "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["approved"], false);

    let (status, _) = login(&app, "alice@x.com", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert_eq!(body["user"]["role"], "user");

    let token = admin_token(&state);
    let (status, body) = send(&app, Method::GET, "/api/admin/approvals", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let approvals = body["approvals"].as_array().unwrap();
    assert_eq!(approvals.len(), 2);
    assert_eq!(approvals[0]["type"], "signup");
    assert_eq!(approvals[1]["type"], "login");
    let signup_id = approvals[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": signup_id, "status": "approved"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approval"]["status"], "approved");
    assert!(body["approval"].get("updatedAt").is_some());

    let doc = state.db.read().unwrap();
    assert!(doc.user("alice@x.com").unwrap().approved);
    drop(doc);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": signup_id, "status": "rejected"})),
        Some(&token),
    )
    .await;
    assert_eq!(body["approval"]["status"], "rejected");
    assert!(!state.db.read().unwrap().user("alice@x.com").unwrap().approved);
}

#[tokio::test]
async fn test_gated_plan_purchase_scenario() {
    let state = create_test_state(gated_config());
    let app = app(&state);
    register(&app, "Alice", "alice@x.com", "pw1").await;
    let user_token = token_for(&state, "alice@x.com", Role::User);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/plan",
        Some(json!({"planId": "gold"})),
        Some(&user_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Plan purchase pending approval");
    assert_eq!(body["planId"], "gold");
    assert!(body.get("purchase").is_none());
    let approval_id = body["approval"]["id"].as_str().unwrap().to_string();
    assert!(state.db.read().unwrap().user("alice@x.com").unwrap().purchases.is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/approve",
        Some(json!({"id": approval_id, "status": "approved"})),
        Some(&admin_token(&state)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["approval"]["purchaseId"].is_string());

    let doc = state.db.read().unwrap();
    let alice = doc.user("alice@x.com").unwrap();
    assert_eq!(alice.purchases.len(), 1);
    assert_eq!(alice.plan_id.as_deref(), Some("gold"));
}
