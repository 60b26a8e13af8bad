mod common;

use axum::http::StatusCode;
use common::{bootstrap_admin, send, spawn_app, user_with_role};
use serde_json::json;

#[tokio::test]
async fn admin_lists_users_with_roles() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    user_with_role(&t.app, &admin, "viewer@lab.test", "view_only").await;

    let (status, list) = send(&t.app, "GET", "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    let viewer = list
        .iter()
        .find(|u| u["email"] == "viewer@lab.test")
        .expect("viewer listed");
    assert_eq!(viewer["roles"], json!(["view_only"]));
    assert!(viewer.get("passwordHash").is_none());
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let (id, editor) = user_with_role(&t.app, &admin, "editor@lab.test", "user_edit").await;

    let (status, _) = send(&t.app, "GET", "/users", Some(&editor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/users/{id}/roles"),
        Some(&editor),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn granted_roles_take_effect_immediately() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let (id, editor) = user_with_role(&t.app, &admin, "editor@lab.test", "user_edit").await;

    let (status, user) = send(
        &t.app,
        "POST",
        &format!("/users/{id}/roles"),
        Some(&admin),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mut roles: Vec<String> = serde_json::from_value(user["roles"].clone()).unwrap();
    roles.sort();
    assert_eq!(roles, ["admin", "user_edit"]);

    // the token issued before the grant still works, roles are read per request
    let (status, _) = send(&t.app, "GET", "/users", Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/users/{id}/roles"),
        Some(&admin),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_roles_and_users_are_rejected() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let (id, _) = user_with_role(&t.app, &admin, "editor@lab.test", "user_edit").await;

    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/users/{id}/roles"),
        Some(&admin),
        Some(json!({ "role": "superuser" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let ghost = uuid::Uuid::new_v4();
    let (status, _) = send(
        &t.app,
        "POST",
        &format!("/users/{ghost}/roles"),
        Some(&admin),
        Some(json!({ "role": "view_only" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/users/{id}/roles/admin"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_without_roles_falls_back_to_view_only() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let (id, token) = user_with_role(&t.app, &admin, "bare@lab.test", "user_edit").await;

    let (status, user) = send(
        &t.app,
        "DELETE",
        &format!("/users/{id}/roles/user_edit"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["roles"], json!([]));

    let (status, _) = send(&t.app, "GET", "/inventory", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &t.app,
        "POST",
        "/inventory",
        Some(&token),
        Some(json!({ "chemicalName": "Water", "quantity": 1, "unit": "L" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let t = spawn_app().await;
    let admin = bootstrap_admin(&t.app).await;
    let me = t
        .state
        .tokens
        .verify(&admin)
        .expect("admin token verifies")
        .user_id;

    let (status, _) = send(
        &t.app,
        "DELETE",
        &format!("/users/{me}/roles/admin"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &t.app,
        "PUT",
        &format!("/users/{me}/active"),
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
