#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use entities::user_local_model::UserModel;
use mediaport::config::Config;
use mediaport::dxl::context::Claims;
use mediaport::{router, AppState};

pub const SECRET: &str = "integration-secret";
pub const BOUNDARY: &str = "mediaport-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // keeps the database and upload root alive
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

/// Like [`setup`], with a chance to adjust the config before the router is built.
pub async fn setup_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let mut options = ConnectOptions::new(url.to_owned());
    options.max_connections(1).sqlx_logging(false);
    let connection = Database::connect(options).await.unwrap();
    Migrator::up(&connection, None).await.unwrap();

    let mut config = Config::with_database(url);
    config.upload_root = dir.path().join("uploads");
    config.jwt_secret = SECRET.to_string();
    config.public_url = "http://media.test".to_string();
    config.tenant = Some("acme".to_string());
    configure(&mut config);

    let state = AppState {
        connection,
        config: Arc::new(config),
    };
    TestApp {
        router: router(state.to_owned()),
        state,
        dir,
    }
}

impl TestApp {
    pub async fn seed_user(&self, id: &str, role: &str) {
        let now = Utc::now();
        queries::users::add_user(
            &self.state.connection,
            UserModel {
                id: id.to_string(),
                email: format!("{id}@example.com"),
                username: Some(id.to_string()),
                name: Some(format!("Artist {id}")),
                first_name: None,
                last_name: None,
                password_hash: String::new(),
                email_verified: true,
                role: role.to_string(),
                tenant: None,
                ref_code: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().to_owned();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// One dispatch call; returns the status and the envelope.
    pub async fn dxl(
        &self,
        method: Method,
        action: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/dxl/v3?@={action}"));
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.send(request).await;
        (response.status, response.json())
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub fn token(user_id: &str, role: &str, api_class: Option<i64>) -> String {
    signed_token(SECRET, user_id, role, api_class)
}

pub fn signed_token(secret: &str, user_id: &str, role: &str, api_class: Option<i64>) -> String {
    let claims = Claims {
        user_id: Some(user_id.to_string()),
        sub: None,
        role: Some(role.to_string()),
        api_class,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub data: &'a [u8],
}

pub fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        file: None,
        data: value.as_bytes(),
    }
}

pub fn file_part<'a>(filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        file: Some((filename, content_type)),
        data,
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file {
            Some((filename, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    part.name, filename, content_type
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(user_id: Option<&str>, parts: &[Part]) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/upload/file")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

/// MPEG-1 Layer III frames at 128 kbps / 44.1 kHz, 417 bytes each.
pub fn mp3_frames(count: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(417 * count);
    for _ in 0..count {
        data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        data.resize(data.len() + 413, 0);
    }
    data
}

pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0, 0, 0, 13]);
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&width.to_be_bytes());
    png.extend_from_slice(&height.to_be_bytes());
    png.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    png
}
