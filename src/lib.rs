//! Tradedesk API library
//!
//! Document workflow backend for an equipment trading desk: quotations,
//! invoices, delivery notes and imports with branch-scoped access and
//! warehouse stock.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod commands;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};
use crate::entities::document::DocumentKind;

pub use axum::Json;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(auth::AuthConfig::from_app_config(&config)));
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            auth,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
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

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
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
        assert!(!meta.timestamp.is_empty());
    }

    #[test]
    fn metadata_has_no_request_id_outside_a_request() {
        let response = ApiResponse::success(1);
        assert!(response.meta.and_then(|m| m.request_id).is_none());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ApiError>;

/// CRUD and lifecycle routes for one document kind, each gated by
/// `<resource>:<action>`.
fn document_routes(kind: DocumentKind) -> Router<AppState> {
    use handlers::documents as h;

    let collection = format!("/{}", kind.route_segment());
    let member = format!("/{}/:id", kind.route_segment());
    let action = format!("/{}/:id/:action", kind.route_segment());

    let read = Router::new()
        .route(&collection, get(h::list_documents))
        .route(&member, get(h::get_document))
        .with_permission(&kind.permission(auth::Actions::READ));

    let create = Router::new()
        .route(&collection, post(h::create_document))
        .with_permission(&kind.permission(auth::Actions::CREATE));

    let update = Router::new()
        .route(&member, axum::routing::put(h::update_document))
        .with_permission(&kind.permission(auth::Actions::UPDATE));

    let delete = Router::new()
        .route(&member, axum::routing::delete(h::delete_document))
        .with_permission(&kind.permission(auth::Actions::DELETE));

    // The action permission depends on the path segment and is checked in
    // the handler.
    let transition = Router::new()
        .route(&action, post(h::transition_document))
        .with_auth();

    Router::new()
        .merge(read)
        .merge(create)
        .merge(update)
        .merge(delete)
        .merge(transition)
        .layer(Extension(kind))
}

pub fn api_v1_routes() -> Router<AppState> {
    let documents = DocumentKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| router.merge(document_routes(kind)));

    let reference_read = Router::new()
        .route("/branches", get(handlers::reference::list_branches))
        .route("/warehouses", get(handlers::reference::list_warehouses))
        .route("/products", get(handlers::reference::list_products))
        .route("/customers", get(handlers::reference::list_customers))
        .route("/suppliers", get(handlers::reference::list_suppliers))
        .with_permission(perm::REFERENCE_READ);

    let reference_manage = Router::new()
        .route("/branches", post(handlers::reference::create_branch))
        .route("/warehouses", post(handlers::reference::create_warehouse))
        .route("/products", post(handlers::reference::create_product))
        .route("/customers", post(handlers::reference::create_customer))
        .route("/suppliers", post(handlers::reference::create_supplier))
        .with_permission(perm::REFERENCE_MANAGE);

    let stock_read = Router::new()
        .route("/stock", get(handlers::inventory::list_stock))
        .with_permission(perm::INVENTORY_READ);

    let stock_transfer = Router::new()
        .route("/stock/transfers", post(handlers::inventory::transfer_stock))
        .with_permission(perm::INVENTORY_TRANSFER);

    let dashboard = Router::new()
        .route("/dashboard/board", get(handlers::dashboard::board))
        .with_permission(perm::DASHBOARD_READ);

    Router::new()
        .merge(documents)
        .merge(reference_read)
        .merge(reference_manage)
        .merge(stock_read)
        .merge(stock_transfer)
        .merge(dashboard)
}

/// Full application router: versioned API, status/health, metrics and the
/// OpenAPI document, wrapped in request id and HTTP tracing layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .route("/status", get(handlers::health::api_status))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .layer(Extension(state.auth.clone()))
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
