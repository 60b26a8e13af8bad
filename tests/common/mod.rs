#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use chem_inventory::{AppState, config::Config, inventory_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut cfg = Config::default();
    cfg.database_url = format!("sqlite:{}", dir.path().join("inventory.sqlite").display());
    cfg.jwt_secret = "test-secret".to_string();
    cfg.bcrypt_cost = 4;
    tweak(&mut cfg);

    let pool = chem_inventory::db::connect(&cfg.database_url)
        .await
        .expect("failed to open database");
    let state = AppState::new(pool, &cfg).expect("invalid config");
    let app = inventory_router(state.clone());
    TestApp {
        app,
        state,
        _dir: dir,
    }
}

pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, headers, bytes.to_vec())
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub fn token_of(body: &Value) -> String {
    body["token"]
        .as_str()
        .expect("response carries a token")
        .to_string()
}

pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("response carries an id").to_string()
}

/// Register the first user, who becomes admin. Returns its token.
pub async fn bootstrap_admin(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "admin@lab.test", "name": "Admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "bootstrap failed: {body}");
    token_of(&body)
}

/// Register a user through the admin and leave it with exactly `role`.
/// Returns `(user_id, token)`.
pub async fn user_with_role(app: &Router, admin: &str, email: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        Some(admin),
        Some(json!({ "email": email, "name": email, "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let id = body["user"]["id"].as_str().unwrap().to_string();
    let token = token_of(&body);

    if role != "user_edit" {
        let (status, _) = send(
            app,
            "POST",
            &format!("/users/{id}/roles"),
            Some(admin),
            Some(json!({ "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            app,
            "DELETE",
            &format!("/users/{id}/roles/user_edit"),
            Some(admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    (id, token)
}

pub async fn add_item(app: &Router, token: &str, item: Value) -> Value {
    let (status, body) = send(app, "POST", "/inventory", Some(token), Some(item)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}
