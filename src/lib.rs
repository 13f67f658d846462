//! carlot-media - vehicle photo storage for a multi-tenant car dealership backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - POST/DELETE /api/vehicles/:vehicle_id/images             │
//! │  - /health, /metrics                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Image batches, primary image selection                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Storage Layer                            │
//! │  - SigV4 signing (hand-rolled, no vendor SDK)               │
//! │  - Region / addressing-style fallback                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `storage`: S3-compatible object storage client
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus collectors

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Request bodies may carry several base64 images per batch
const BODY_LIMIT_FACTOR: usize = 8;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Object storage client
    pub storage: Arc<storage::ObjectStorage>,

    /// Vehicle image service
    pub images: Arc<service::ImageService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built. Missing credentials
    /// are not an error here; they are reported by each upload.
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let storage = storage::ObjectStorage::from_config(&config.storage)?;
        Ok(Self::with_storage(config, storage))
    }

    /// Build state around an already constructed storage client
    pub fn with_storage(config: config::AppConfig, storage: storage::ObjectStorage) -> Self {
        let storage = Arc::new(storage);
        let images = Arc::new(service::ImageService::new(storage.clone()));

        tracing::info!(
            service = ?config.storage.service,
            bucket = %config.storage.bucket,
            region = %config.storage.region,
            force_path_style = config.storage.force_path_style,
            "Object storage initialized"
        );

        Self {
            config: Arc::new(config),
            storage,
            images,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit};
    use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

    let body_limit = state
        .config
        .storage
        .max_image_bytes
        .saturating_mul(BODY_LIMIT_FACTOR);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::images_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
