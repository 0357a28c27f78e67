#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use recipe_backend::db::entities::{
    auth_token, ingredient, recipe, recipe_ingredient, recipe_tag, tag, user,
};
use recipe_backend::server::config::ServerConfig;
use recipe_backend::web;

pub const PASSWORD: &str = "testpass1234";

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub media_root: TempDir,
}

/// In-memory SQLite database with the schema derived from the entities,
/// plus the (user_id, name) unique indexes the reconciliation logic
/// depends on. A single pooled connection keeps the memory DB shared.
pub async fn spawn_app() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.expect("connect sqlite");
    create_schema(&db).await;

    let media_root = tempfile::tempdir().expect("create media tempdir");
    let config = Arc::new(ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        media_root: media_root.path().to_path_buf(),
    });
    let app = web::create_router(db.clone(), config);
    TestApp {
        app,
        db,
        media_root,
    }
}

async fn create_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let tables = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(auth_token::Entity),
        schema.create_table_from_entity(tag::Entity),
        schema.create_table_from_entity(ingredient::Entity),
        schema.create_table_from_entity(recipe::Entity),
        schema.create_table_from_entity(recipe_tag::Entity),
        schema.create_table_from_entity(recipe_ingredient::Entity),
    ];
    for stmt in tables {
        db.execute(backend.build(&stmt)).await.expect("create table");
    }

    let indexes = [
        Index::create()
            .name("ux_tags_user_id_name")
            .table(tag::Entity)
            .col(tag::Column::UserId)
            .col(tag::Column::Name)
            .unique()
            .to_owned(),
        Index::create()
            .name("ux_ingredients_user_id_name")
            .table(ingredient::Entity)
            .col(ingredient::Column::UserId)
            .col(ingredient::Column::Name)
            .unique()
            .to_owned(),
    ];
    for stmt in indexes {
        db.execute(backend.build(&stmt)).await.expect("create index");
    }
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };
    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn send_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    field_name: &str,
    file_name: &str,
    bytes: &[u8],
) -> (StatusCode, Value) {
    let boundary = "x-test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn register_user(app: &Router, email: &str) -> Value {
    let (status, body) = send_json(
        app,
        "POST",
        "/users/create/",
        None,
        Some(json!({ "email": email, "password": PASSWORD, "name": "Test Name" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

pub async fn obtain_token(app: &Router, email: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/users/token/create/",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "token obtain failed: {body}");
    body["token"].as_str().expect("token in body").to_owned()
}

/// Registers a user and returns an API token for it.
pub async fn setup_user(app: &Router, email: &str) -> String {
    register_user(app, email).await;
    obtain_token(app, email).await
}

/// A tiny but fully valid PNG, for upload tests.
pub fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
    let mut cursor = std::io::Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode png");
    cursor.into_inner()
}

/// Prices come back as JSON strings but may lose trailing zeros through
/// SQLite, so compare them as decimals.
pub fn decimal_value(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal value: {other}"),
    }
}
