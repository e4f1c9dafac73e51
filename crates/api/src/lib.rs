//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Attachment routes over [`AttachmentStorageService`]
//! - A health check
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, COOKIE};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use unidata_core::storage::AttachmentStorageService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage service for file attachments.
    pub storage: Arc<AttachmentStorageService>,
}

impl AppState {
    /// Wrap a storage service.
    pub fn new(storage: AttachmentStorageService) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }
}

/// Creates the main application router.
///
/// Request bodies larger than `body_limit` bytes are rejected with 413.
pub fn create_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
