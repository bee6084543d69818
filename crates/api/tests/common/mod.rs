//! Shared harness for the HTTP integration tests.
//!
//! Every test gets its own database (via `#[sqlx::test]`) and its own media
//! directory, and drives the production router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use folio_api::auth::jwt::issue_access_token;
use folio_api::auth::password::hash_password;
use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_db::models::account::{AdminAccount, NewAccount};
use folio_db::repositories::AccountRepo;

/// Upload limit used by the tests; small so oversize cases stay cheap.
pub const TEST_UPLOAD_MAX_BYTES: usize = 256 * 1024;

/// Password of accounts created by [`create_account`].
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Router plus the temporary media root it writes to.
pub struct TestApp {
    pub router: Router,
    pub config: ServerConfig,
    /// Dropped (and deleted) with the app.
    pub media: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn media_root(&self) -> &Path {
        self.media.path()
    }
}

/// Build a test `ServerConfig` rooted at `media_root`.
pub fn test_config(media_root: &Path) -> ServerConfig {
    let root = media_root.display().to_string();
    ServerConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("integration-test-secret".into()),
        "MEDIA_ROOT" => Some(root.clone()),
        "UPLOAD_MAX_BYTES" => Some(TEST_UPLOAD_MAX_BYTES.to_string()),
        "IMAGE_MAX_WIDTH" => Some("400".into()),
        "IMAGE_MAX_HEIGHT" => Some("300".into()),
        "SITE_BASE_URL" => Some("https://example.com".into()),
        "SITE_NAME" => Some("Example Folio".into()),
        "TRUST_PROXY_HEADERS" => Some("true".into()),
        _ => None,
    })
    .expect("test configuration is valid")
}

/// Build the full application router using the given database pool.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, |state| state)
}

/// Like [`build_test_app`], letting the caller attach optional services
/// (notifier, GitHub stats) to the state.
pub fn build_test_app_with(pool: PgPool, customize: impl FnOnce(AppState) -> AppState) -> TestApp {
    let media = tempfile::tempdir().expect("create media dir");
    let config = test_config(media.path());
    let state = customize(AppState::new(pool, config.clone()));
    let router = build_app_router(state, &config).expect("router builds");
    TestApp {
        router,
        config,
        media,
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Insert an account with [`TEST_PASSWORD`].
pub async fn create_account(pool: &PgPool, username: &str) -> AdminAccount {
    let input = NewAccount {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role: "admin".to_string(),
    };
    AccountRepo::create(pool, &input)
        .await
        .expect("account creation should succeed")
}

/// Insert an admin and return a bearer token for it.
pub async fn admin_token(pool: &PgPool, app: &TestApp) -> String {
    let account = create_account(pool, "admin").await;
    issue_access_token(account.id, &account.role, &app.config.jwt)
        .expect("token")
        .token
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should not fail")
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    builder(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        builder(Method::GET, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

/// POST as the client at `client_ip`, as a reverse proxy would report it.
pub async fn post_json_from(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    client_ip: &str,
) -> Response {
    let mut request = json_request(Method::POST, uri, None, body);
    request.headers_mut().insert(
        "x-forwarded-for",
        client_ip.parse().expect("valid header value"),
    );
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        builder(Method::DELETE, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

/// POST a multipart body with a single `file` part.
pub async fn upload_auth(
    app: Router,
    uri: &str,
    bytes: &[u8],
    content_type: &str,
    token: &str,
) -> Response {
    let boundary = "folio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\n",
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = builder(Method::POST, uri, Some(token))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("valid request");
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png");
    out
}

/// Create a post through the API and return its JSON representation.
pub async fn create_post(app: Router, token: &str, title: &str, body: &str) -> serde_json::Value {
    create_entity(app, token, "posts", serde_json::json!({ "title": title, "body": body })).await
}

pub async fn create_entity(
    app: Router,
    token: &str,
    kind: &str,
    input: serde_json::Value,
) -> serde_json::Value {
    let response = post_json_auth(app, &format!("/api/v1/admin/{kind}"), input, token).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Move an entity to `target`, echoing its current `updated_at`.
pub async fn transition(
    app: Router,
    token: &str,
    kind: &str,
    entity: &serde_json::Value,
    target: &str,
) -> Response {
    let uri = format!("/api/v1/admin/{kind}/{}/transition", entity["id"]);
    let body = serde_json::json!({
        "target": target,
        "expected_updated_at": entity["updated_at"],
    });
    post_json_auth(app, &uri, body, token).await
}

/// Publish an entity and return its new representation.
pub async fn publish(
    app: Router,
    token: &str,
    kind: &str,
    entity: &serde_json::Value,
) -> serde_json::Value {
    let response = transition(app, token, kind, entity, "published").await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"].clone()
}
