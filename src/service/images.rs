//! Vehicle image service
//!
//! Turns a batch of image inputs into image records. Pre-hosted URLs are
//! kept as they are; inline images are uploaded to object storage first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::{DeleteOutcome, ImagePayload, ObjectStorage};

/// Filename assumed when an inline image arrives without one
pub const DEFAULT_FILENAME: &str = "image.jpg";

/// One entry of an image batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageInput {
    /// Already hosted image; stored as-is
    pub url: Option<String>,
    /// Base64 image data, optionally a `data:` URL
    pub data: Option<String>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Image record handed back to the caller for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleImage {
    pub id: String,
    pub vehicle_id: String,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
}

/// Image service
pub struct ImageService {
    storage: Arc<ObjectStorage>,
}

impl ImageService {
    /// Create new image service
    pub fn new(storage: Arc<ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Attach a batch of images to a vehicle
    ///
    /// # Arguments
    /// * `tenant_id` - Owning tenant, first key segment
    /// * `vehicle_id` - Vehicle the images belong to
    /// * `images` - Inputs in display order
    ///
    /// # Returns
    /// One record per input, in input order. At most one record is
    /// primary: the first input that asks for it.
    ///
    /// # Errors
    /// - `AppError::Validation` for an empty batch or an entry with neither
    ///   `url` nor `data`
    /// - `AppError::Storage` from the first upload that fails; later
    ///   entries are not attempted
    pub async fn attach_images(
        &self,
        tenant_id: &str,
        vehicle_id: &str,
        images: Vec<ImageInput>,
    ) -> Result<Vec<VehicleImage>, AppError> {
        if images.is_empty() {
            return Err(AppError::Validation("No images provided".to_string()));
        }

        // Reject malformed entries before anything is uploaded
        let sources = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                image_source(image).ok_or_else(|| {
                    AppError::Validation(format!(
                        "Image {} must have either url or data",
                        index + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(images.len());
        let mut primary_taken = false;

        // Sequential on purpose: the store sees one upload at a time per request
        for (image, source) in images.iter().zip(sources) {
            let image_url = match source {
                ImageSource::Hosted(url) => url.to_string(),
                ImageSource::Inline(data) => {
                    let payload = ImagePayload {
                        data_base64: data.to_string(),
                        filename: image
                            .filename
                            .as_deref()
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .unwrap_or(DEFAULT_FILENAME)
                            .to_string(),
                        content_type: image.mime_type.clone(),
                    };
                    self.storage
                        .upload(tenant_id, vehicle_id, &payload)
                        .await?
                        .stored_url
                }
            };

            let is_primary = image.is_primary && !primary_taken;
            primary_taken |= is_primary;

            records.push(VehicleImage {
                id: Uuid::new_v4().to_string(),
                vehicle_id: vehicle_id.to_string(),
                image_url,
                alt_text: image.alt_text.clone(),
                is_primary,
            });
        }

        tracing::info!(
            tenant_id,
            vehicle_id,
            count = records.len(),
            "Vehicle images attached"
        );

        Ok(records)
    }

    /// Remove the stored object behind an image URL.
    ///
    /// Best effort: storage failures are logged and swallowed so the caller
    /// can always drop its own record.
    pub async fn remove_image(&self, tenant_id: &str, vehicle_id: &str, image_url: &str) {
        match self.storage.delete(tenant_id, vehicle_id, image_url).await {
            Ok(DeleteOutcome::Skipped) => {
                tracing::debug!(tenant_id, vehicle_id, url = %image_url, "Image not hosted for this vehicle; nothing to delete");
            }
            Ok(DeleteOutcome::Issued { status }) => {
                tracing::debug!(vehicle_id, status, "Image delete issued");
            }
            Err(error) => {
                tracing::warn!(%error, vehicle_id, url = %image_url, "Failed to delete image object");
            }
        }
    }
}

enum ImageSource<'a> {
    Hosted(&'a str),
    Inline(&'a str),
}

/// A non-blank `url` wins over `data`
fn image_source(image: &ImageInput) -> Option<ImageSource<'_>> {
    fn non_blank(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    non_blank(&image.url)
        .map(ImageSource::Hosted)
        .or_else(|| non_blank(&image.data).map(ImageSource::Inline))
}
