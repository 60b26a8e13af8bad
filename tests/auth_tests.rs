mod common;

use axum::http::StatusCode;
use common::{bootstrap_admin, send, spawn_app, spawn_app_with, token_of, user_with_role};
use serde_json::json;

#[tokio::test]
async fn first_registered_user_becomes_admin() {
    let t = spawn_app().await;
    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "First@Lab.test", "name": "First", "password": "pw123456" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "first@lab.test");
    assert_eq!(body["user"]["roles"], json!(["admin"]));
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
    assert!(!token_of(&body).is_empty());
}

#[tokio::test]
async fn registration_after_bootstrap_needs_admin() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let payload = json!({ "email": "bob@lab.test", "name": "Bob", "password": "pw123456" });

    let (status, _) = send(&t.app, "POST", "/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, editor) = user_with_role(&t.app, &admin, "editor@lab.test", "user_edit").await;
    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/register",
        Some(&editor),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, "POST", "/auth/register", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["roles"], json!(["user_edit"]));
}

#[tokio::test]
async fn open_registration_lets_anyone_sign_up() {
    let t = spawn_app_with(|cfg| cfg.open_registration = true).await;
    bootstrap_admin(&t.app).await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "walkin@lab.test", "name": "Walk In", "password": "pw123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["roles"], json!(["user_edit"]));
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_creates_nothing() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let before = t.state.users.count().await.unwrap();

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/register",
        Some(&admin),
        Some(json!({ "email": "ADMIN@lab.test", "name": "Again", "password": "pw123456" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "User already exists");
    assert_eq!(t.state.users.count().await.unwrap(), before);
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let t = spawn_app().await;
    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "nobody@lab.test", "name": "" , "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.state.users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn login_round_trip() {
    let t = spawn_app().await;
    bootstrap_admin(&t.app).await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "admin@lab.test", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = token_of(&body);

    let claims = t.state.tokens.verify(&token).expect("token verifies");
    assert_eq!(claims.email, "admin@lab.test");
    assert_eq!(claims.roles, vec!["admin".to_string()]);

    let (status, _) = send(&t.app, "GET", "/inventory", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let t = spawn_app().await;
    bootstrap_admin(&t.app).await;

    let (status, wrong_pw) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "admin@lab.test", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(wrong_pw.get("token").is_none());

    let (status, unknown) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@lab.test", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
}

#[tokio::test]
async fn unknown_email_login_still_checks_a_hash() {
    let t = spawn_app_with(|cfg| cfg.bcrypt_cost = 5).await;
    bootstrap_admin(&t.app).await;

    // the padding hash is made at the configured cost, so unknown emails cost the same
    assert!(t.state.dummy_password_hash.starts_with("$2b$05$"));
    assert!(!bcrypt::verify("admin123", &t.state.dummy_password_hash).unwrap());

    let (status, body) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ghost@lab.test", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let t = spawn_app().await;
    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "admin@lab.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let t = spawn_app().await;
    bootstrap_admin(&t.app).await;

    let (status, body) = send(&t.app, "GET", "/inventory", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "No token provided");

    let (status, body) = send(&t.app, "GET", "/inventory", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid token");
}

#[tokio::test]
async fn deactivated_user_loses_access() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let (id, token) = user_with_role(&t.app, &admin, "leaver@lab.test", "user_edit").await;

    let (status, body) = send(
        &t.app,
        "PUT",
        &format!("/users/{id}/active"),
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    let (status, body) = send(&t.app, "GET", "/inventory", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "User not found or inactive");

    let (status, _) = send(
        &t.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "leaver@lab.test", "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_database_connected() {
    let t = spawn_app().await;
    let (status, body) = send(&t.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}
