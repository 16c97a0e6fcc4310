//! Printshop API Library
//!
//! Order intake, pricing and lifecycle tracking for custom print jobs.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod tracing;

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use utoipa::ToSchema;

use crate::auth::{AuthConfig, AuthService};
use crate::db::DbPool;
use crate::handlers::AppServices;
use crate::storage::FileStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig, files: Arc<dyn FileStore>) -> Self {
        let services = AppServices::new(db.clone(), files.clone(), &config);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        Self {
            db,
            config,
            services,
            auth,
            files,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!response.success);
    }
}

/// Full HTTP application: print-order API behind bearer auth, plus the
/// unauthenticated health check and API docs. CORS is left to the binary.
pub fn build_router(state: AppState) -> Router {
    let print_orders = handlers::print_orders::print_order_routes(state.config.max_upload_bytes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.auth.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(print_orders)
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness plus database connectivity
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service and database reachable", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = HealthStatus),
    ),
    tag = "Health"
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let (code, database) = match db::ping(&state.db).await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            ::tracing::warn!(error = %e, "health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let status = HealthStatus {
        status: if code == StatusCode::OK {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    (code, Json(status))
}

pub mod prelude {
    pub use crate::auth::{ActorRole, AuthUser};
    pub use crate::errors::*;
    pub use crate::models::*;
    pub use crate::services::pricing::{quote, PriceBreakdown};
    pub use crate::services::print_orders::PrintOrderService;
    pub use crate::{build_router, AppState};
}
