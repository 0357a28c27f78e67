mod common;

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use common::{PASSWORD, obtain_token, register_user, send_json, setup_user, spawn_app};
use recipe_backend::db::entities::{auth_token, user};

#[tokio::test]
async fn create_user_success() {
    let test = spawn_app().await;

    let body = register_user(&test.app, "test@example.com").await;

    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Test Name");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let stored = user::Entity::find()
        .filter(user::Column::Email.eq("test@example.com"))
        .one(&test.db)
        .await
        .unwrap()
        .expect("user stored");
    assert!(bcrypt::verify(PASSWORD, &stored.password_hash).unwrap());
}

#[tokio::test]
async fn create_user_normalizes_email_domain() {
    let test = spawn_app().await;

    let body = register_user(&test.app, "Test.User@EXAMPLE.Com").await;

    assert_eq!(body["email"], "Test.User@example.com");
}

#[tokio::test]
async fn create_user_duplicate_email_fails() {
    let test = spawn_app().await;
    register_user(&test.app, "test@example.com").await;

    let (status, _) = send_json(
        &test.app,
        "POST",
        "/users/create/",
        None,
        Some(json!({ "email": "test@EXAMPLE.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_user_short_password_fails() {
    let test = spawn_app().await;

    let (status, _) = send_json(
        &test.app,
        "POST",
        "/users/create/",
        None,
        Some(json!({ "email": "test@example.com", "password": "pwpw" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let count = user::Entity::find().all(&test.db).await.unwrap().len();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn create_user_rejected_when_authenticated() {
    let test = spawn_app().await;
    let token = setup_user(&test.app, "test@example.com").await;

    let (status, _) = send_json(
        &test.app,
        "POST",
        "/users/create/",
        Some(&token),
        Some(json!({ "email": "test2@example.com", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let exists = user::Entity::find()
        .filter(user::Column::Email.eq("test2@example.com"))
        .one(&test.db)
        .await
        .unwrap();
    assert!(exists.is_none());
}

#[tokio::test]
async fn obtain_token_success_and_is_stable() {
    let test = spawn_app().await;
    register_user(&test.app, "test@example.com").await;

    let first = obtain_token(&test.app, "test@example.com").await;
    let second = obtain_token(&test.app, "test@example.com").await;

    assert_eq!(first.len(), 40);
    // One token row per user: repeated logins return the same key.
    assert_eq!(first, second);
}

#[tokio::test]
async fn obtain_token_bad_credentials_fails() {
    let test = spawn_app().await;
    register_user(&test.app, "test@example.com").await;

    let (status, body) = send_json(
        &test.app,
        "POST",
        "/users/token/create/",
        None,
        Some(json!({ "email": "test@example.com", "password": "wrongpass" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn obtain_token_blank_password_fails() {
    let test = spawn_app().await;
    register_user(&test.app, "test@example.com").await;

    let (status, body) = send_json(
        &test.app,
        "POST",
        "/users/token/create/",
        None,
        Some(json!({ "email": "test@example.com", "password": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn discard_token_requires_authentication() {
    let test = spawn_app().await;

    let (status, _) = send_json(&test.app, "POST", "/users/token/discard/", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn discard_token_revokes_it() {
    let test = spawn_app().await;
    let token = setup_user(&test.app, "test@example.com").await;

    let (status, _) =
        send_json(&test.app, "POST", "/users/token/discard/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let remaining = auth_token::Entity::find().all(&test.db).await.unwrap();
    assert!(remaining.is_empty());

    // The old key no longer authenticates anything.
    let (status, _) = send_json(&test.app, "GET", "/recipes/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let test = spawn_app().await;
    setup_user(&test.app, "test@example.com").await;

    let (status, _) = send_json(
        &test.app,
        "GET",
        "/recipes/",
        Some("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
