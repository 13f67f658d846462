//! API layer
//!
//! HTTP handlers for:
//! - Vehicle images (attach, delete)
//! - Metrics (Prometheus)

mod images;
pub mod metrics;

use axum::{Router, routing::post};

use crate::AppState;

pub use images::{TENANT_HEADER, TenantId};
pub use metrics::metrics_router;

/// Routes under `/api`
pub fn images_router() -> Router<AppState> {
    Router::new().route(
        "/vehicles/:vehicle_id/images",
        post(images::attach_images).delete(images::delete_image),
    )
}
