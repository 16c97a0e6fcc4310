#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use printshop_api::{
    auth::{ActorRole, AuthUser},
    config::AppConfig,
    db::{self, DbConfig},
    repositories::PrintOrderRepository,
    services::print_orders::{CreatePrintOrderRequest, PrintOrderService},
    storage::{FileStore, LocalFileStore, StoredFile},
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;
pub const MULTIPART_BOUNDARY: &str = "printshop-test-boundary";

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const ADMIN: &str = "staff-1";

/// Helper harness for spinning up an application state backed by an
/// in-memory SQLite database and a temporary upload directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub files: Arc<LocalFileStore>,
    _upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application after letting the caller tweak the config.
    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let upload_dir = TempDir::new().expect("create upload dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.upload_dir = upload_dir.path().to_string_lossy().into_owned();
        cfg.max_upload_bytes = MAX_UPLOAD_BYTES;
        cfg.api_default_page_size = 20;
        cfg.api_max_page_size = 50;
        tweak(&mut cfg);

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let files = Arc::new(
            LocalFileStore::open(upload_dir.path())
                .await
                .expect("open file store"),
        );
        let state = AppState::new(Arc::new(pool), cfg, files.clone());
        let router = printshop_api::build_router(state.clone());

        Self {
            router,
            state,
            files,
            _upload_dir: upload_dir,
        }
    }

    pub fn service(&self) -> Arc<PrintOrderService> {
        self.state.services.print_orders.clone()
    }

    pub fn repository(&self) -> PrintOrderRepository {
        PrintOrderRepository::new(self.state.db.clone(), self.files.clone())
    }

    pub fn token_for(&self, user_id: &str, role: ActorRole) -> String {
        self.state
            .auth
            .issue_token(user_id, role)
            .expect("issue test token")
    }

    pub fn client_token(&self, user_id: &str) -> String {
        self.token_for(user_id, ActorRole::Client)
    }

    pub fn admin_token(&self) -> String {
        self.token_for(ADMIN, ActorRole::Admin)
    }

    /// Uploads a small design file on behalf of `owner`.
    pub async fn stored_design(&self, owner: &str, name: &str) -> StoredFile {
        self.service()
            .upload_design(&client(owner), name, b"%PDF-1.4 test")
            .await
            .expect("store design file")
    }

    pub async fn file_exists(&self, key: &str) -> bool {
        self.files.exists(key).await.expect("check file")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Same as [`TestApp::request`] but decodes the body as JSON.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        json_body(response).await
    }

    /// Multipart upload with the design in the `file` field.
    pub async fn upload(&self, token: &str, file_name: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let body = multipart_body("file", file_name, bytes);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/print-orders/upload-file")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(body))
            .expect("failed to build upload request");
        json_body(self.send(request).await).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub fn client(user_id: &str) -> AuthUser {
    AuthUser::new(user_id, ActorRole::Client)
}

pub fn admin() -> AuthUser {
    AuthUser::new(ADMIN, ActorRole::Admin)
}

/// Valid order body for the given stored design; 20x30x2 cm oak, five pieces.
pub fn order_json(file_path: &str) -> Value {
    json!({
        "material_type": "oak",
        "dimensions": { "width": 20.0, "height": 30.0, "depth": 2.0 },
        "quantity": 5,
        "print_style": "engraving",
        "color_preferences": { "finish": "natural" },
        "file_path": file_path,
        "contact_name": "Ana Ruiz",
        "contact_email": "ana@example.com",
        "contact_phone": "+34 600 000 000",
        "shipping_address": "Calle Mayor 12, 28013 Madrid",
        "customer_notes": "Please sand the edges"
    })
}

pub fn order_request(file_path: &str) -> CreatePrintOrderRequest {
    serde_json::from_value(order_json(file_path)).expect("valid order request")
}

/// Reads a money field regardless of how many decimal places it was rendered with.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a money value, got {other}"),
    }
}
