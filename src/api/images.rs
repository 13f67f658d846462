//! Vehicle image endpoints

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{ImageInput, VehicleImage};

/// Header carrying the tenant the request acts for
pub const TENANT_HEADER: &str = "x-tenant-id";

const IMAGES_ENDPOINT: &str = "/api/vehicles/:vehicle_id/images";

/// Tenant resolved from the `X-Tenant-Id` header
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| TenantId(value.to_string()))
            .ok_or_else(|| AppError::Validation("Missing X-Tenant-Id header".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachImagesRequest {
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

#[derive(Debug, Serialize)]
pub struct AttachImagesResponse {
    pub message: &'static str,
    pub images: Vec<VehicleImage>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn record_request<T>(method: &str, result: &Result<T, AppError>, success: StatusCode) {
    let status = match result {
        Ok(_) => success.as_u16().to_string(),
        Err(AppError::Validation(_)) => "400".to_string(),
        Err(_) => "error".to_string(),
    };
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, IMAGES_ENDPOINT, status.as_str()])
        .inc();
}

/// POST /api/vehicles/:vehicle_id/images
pub async fn attach_images(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(vehicle_id): Path<String>,
    Json(request): Json<AttachImagesRequest>,
) -> Result<(StatusCode, Json<AttachImagesResponse>), AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", IMAGES_ENDPOINT])
        .start_timer();

    let result = state
        .images
        .attach_images(&tenant_id, &vehicle_id, request.images)
        .await;
    record_request("POST", &result, StatusCode::CREATED);

    Ok((
        StatusCode::CREATED,
        Json(AttachImagesResponse {
            message: "Images uploaded",
            images: result?,
        }),
    ))
}

/// DELETE /api/vehicles/:vehicle_id/images?url=...
///
/// The stored object is removed on a best-effort basis; the response does
/// not depend on what the object store answered.
pub async fn delete_image(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(vehicle_id): Path<String>,
    Query(query): Query<DeleteImageQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["DELETE", IMAGES_ENDPOINT])
        .start_timer();

    let result = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Missing url query parameter".to_string()));
    record_request("DELETE", &result, StatusCode::OK);
    let image_url = result?;

    tracing::debug!(tenant_id = %tenant_id, vehicle_id = %vehicle_id, "Deleting vehicle image");
    state
        .images
        .remove_image(&tenant_id, &vehicle_id, &image_url)
        .await;

    Ok(Json(MessageResponse {
        message: "Image deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<TenantId, AppError> {
        let (mut parts, _) = request.into_parts();
        TenantId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn tenant_header_is_required() {
        let request = Request::builder().uri("/").body(()).unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_tenant_header_is_rejected() {
        let request = Request::builder()
            .uri("/")
            .header("X-Tenant-Id", "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn tenant_header_is_trimmed() {
        let request = Request::builder()
            .uri("/")
            .header("X-Tenant-Id", " t1 ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().0, "t1");
    }

    #[test]
    fn request_without_images_field_defaults_to_empty() {
        let request: AttachImagesRequest = serde_json::from_str("{}").unwrap();
        assert!(request.images.is_empty());
    }

    #[test]
    fn image_input_accepts_frontend_shape() {
        let request: AttachImagesRequest = serde_json::from_str(
            r#"{"images":[{"filename":"a.png","mime_type":"image/png","data":"AAAA","is_primary":true}]}"#,
        )
        .unwrap();
        let image = &request.images[0];
        assert_eq!(image.filename.as_deref(), Some("a.png"));
        assert!(image.is_primary);
        assert!(image.url.is_none());
    }
}
