//! Upload/delete driver with region and addressing-style fallback
//!
//! There is no single authoritative answer for which region and addressing
//! style an S3-compatible store expects, so uploads walk an ordered
//! candidate list and stop at the first 2xx.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::StorageError;
use super::canonical::{AddressingStyle, EMPTY_PAYLOAD_SHA256, SigningContext, SigningMethod};
use super::credentials::{Endpoint, StorageCredentials};
use super::key;
use super::signer;
use super::transport::{ObjectTransport, ReqwestTransport};
use crate::config::{StorageConfig, StorageService};
use crate::metrics::{
    STORAGE_ATTEMPTS_TOTAL, STORAGE_BYTES_UPLOADED, STORAGE_DELETES_TOTAL, STORAGE_UPLOADS_TOTAL,
};

/// Regions tried after the configured one
pub const FALLBACK_REGIONS: [&str; 2] = ["sa-east-1", "us-east-1"];

/// Default ceiling on decoded image size (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Diagnostic body excerpts are cut to this many characters
const MAX_DIAGNOSTIC_BODY_CHARS: usize = 512;

/// One (region, addressing style) combination to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub region: String,
    pub style: AddressingStyle,
}

/// Ordered candidates: regions outer, styles inner.
///
/// Regions are `[configured, "sa-east-1", "us-east-1"]` with duplicates and
/// blanks removed; styles are `[path]` when path style is forced, otherwise
/// `[path, virtual-host]`.
pub fn candidates(credentials: &StorageCredentials) -> Vec<Candidate> {
    let mut regions: Vec<&str> = Vec::with_capacity(1 + FALLBACK_REGIONS.len());
    for region in std::iter::once(credentials.default_region.as_str()).chain(FALLBACK_REGIONS) {
        if !region.is_empty() && !regions.contains(&region) {
            regions.push(region);
        }
    }

    let styles: &[AddressingStyle] = if credentials.force_path_style {
        &[AddressingStyle::Path]
    } else {
        &[AddressingStyle::Path, AddressingStyle::VirtualHost]
    };

    regions
        .into_iter()
        .flat_map(|region| {
            styles.iter().map(move |style| Candidate {
                region: region.to_string(),
                style: *style,
            })
        })
        .collect()
}

/// Last failed attempt of an exhausted upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadDiagnostic {
    /// HTTP status, or `None` when no response arrived
    pub status: Option<u16>,
    pub region: String,
    pub style: AddressingStyle,
    /// Response body excerpt or transport error text
    pub body: String,
    /// Number of candidates attempted
    pub attempts: usize,
}

impl fmt::Display for UploadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}")?,
            None => f.write_str("no response")?,
        }
        write!(
            f,
            " (region {}, style {}, after {} attempts): {}",
            self.region, self.style, self.attempts, self.body
        )
    }
}

/// Inline image as received from the caller
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64 data, optionally as a `data:<mime>;base64,` URL
    pub data_base64: String,
    pub filename: String,
    pub content_type: Option<String>,
}

/// Successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Public URL `{endpoint}/{bucket}/{key}`, persisted by the caller
    pub stored_url: String,
    pub object_key: String,
    pub region: String,
    pub style: AddressingStyle,
    pub attempts: usize,
}

/// Result of a best-effort delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// URL is not under this store's endpoint and bucket; nothing was sent
    Skipped,
    /// DELETE was issued; status is reported but not enforced
    Issued { status: u16 },
}

/// Vehicle photo storage on an S3-compatible object store
pub struct ObjectStorage {
    credentials: Arc<StorageCredentials>,
    transport: Arc<dyn ObjectTransport>,
    service: StorageService,
    max_image_bytes: usize,
}

impl ObjectStorage {
    pub fn new(credentials: Arc<StorageCredentials>, transport: Arc<dyn ObjectTransport>) -> Self {
        Self {
            credentials,
            transport,
            service: StorageService::S3,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Build storage with the reqwest transport from configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.attempt_timeout_secs))
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::new(
            Arc::new(StorageCredentials::from_config(config)),
            Arc::new(transport),
        )
        .with_service(config.service)
        .with_max_image_bytes(config.max_image_bytes))
    }

    pub fn with_service(mut self, service: StorageService) -> Self {
        self.service = service;
        self
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn credentials(&self) -> &StorageCredentials {
        &self.credentials
    }

    /// Public URL for an object key
    pub fn public_url(&self, object_key: &str) -> String {
        format!(
            "{}{}",
            self.credentials.public_prefix(),
            super::canonical::encode_object_key(object_key)
        )
    }

    fn checked_endpoint(&self) -> Result<Endpoint, StorageError> {
        if self.service == StorageService::Disabled {
            return Err(StorageError::Config(
                "object storage is disabled (storage.service = disabled)".to_string(),
            ));
        }
        self.credentials.validate()
    }

    /// Upload one vehicle photo.
    ///
    /// # Steps
    /// 1. Fail fast if credentials are incomplete
    /// 2. Allocate the object key
    /// 3. Decode the payload and hash it once
    /// 4. Try each candidate in order; the first 2xx wins
    ///
    /// # Errors
    /// - `StorageError::Config` when credentials/endpoint are unusable
    /// - `StorageError::InvalidPayload` for bad base64, empty or oversized images
    /// - `StorageError::Upload` with the last diagnostic when every candidate fails
    pub async fn upload(
        &self,
        tenant_id: &str,
        vehicle_id: &str,
        image: &ImagePayload,
    ) -> Result<UploadOutcome, StorageError> {
        let endpoint = self.checked_endpoint().inspect_err(|_| {
            STORAGE_UPLOADS_TOTAL.with_label_values(&["config_error"]).inc();
        })?;

        let object_key = key::allocate(tenant_id, vehicle_id, &image.filename)?;
        let payload = self.decode_payload(&image.data_base64)?;
        let payload_sha256_hex = hex::encode(Sha256::digest(&payload));

        let content_type = image
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let candidates = candidates(&self.credentials);
        let total = candidates.len();
        let mut last: Option<UploadDiagnostic> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let attempt = index + 1;
            let ctx = SigningContext {
                method: SigningMethod::Put,
                object_key: &object_key,
                payload_sha256_hex: &payload_sha256_hex,
                content_type,
                region: &candidate.region,
                style: candidate.style,
            };
            let request = signer::sign(&self.credentials, &endpoint, &ctx, Utc::now());

            tracing::debug!(
                region = %candidate.region,
                style = %candidate.style,
                url = %request.url,
                attempt,
                total,
                "Uploading object"
            );

            match self.transport.send(request, payload.clone()).await {
                Ok(response) if response.is_success() => {
                    STORAGE_ATTEMPTS_TOTAL
                        .with_label_values(&[
                            candidate.region.as_str(),
                            candidate.style.as_str(),
                            "success",
                        ])
                        .inc();
                    STORAGE_UPLOADS_TOTAL.with_label_values(&["success"]).inc();
                    STORAGE_BYTES_UPLOADED.inc_by(payload.len() as f64);

                    let stored_url = self.public_url(&object_key);
                    tracing::info!(
                        key = %object_key,
                        region = %candidate.region,
                        style = %candidate.style,
                        attempts = attempt,
                        bytes = payload.len(),
                        "Image stored"
                    );

                    return Ok(UploadOutcome {
                        stored_url,
                        object_key,
                        region: candidate.region.clone(),
                        style: candidate.style,
                        attempts: attempt,
                    });
                }
                Ok(response) => {
                    STORAGE_ATTEMPTS_TOTAL
                        .with_label_values(&[
                            candidate.region.as_str(),
                            candidate.style.as_str(),
                            "rejected",
                        ])
                        .inc();
                    tracing::warn!(
                        status = response.status,
                        region = %candidate.region,
                        style = %candidate.style,
                        attempt,
                        "Object store rejected upload"
                    );
                    last = Some(UploadDiagnostic {
                        status: Some(response.status),
                        region: candidate.region.clone(),
                        style: candidate.style,
                        body: truncate_body(&response.body),
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    STORAGE_ATTEMPTS_TOTAL
                        .with_label_values(&[
                            candidate.region.as_str(),
                            candidate.style.as_str(),
                            "transport_error",
                        ])
                        .inc();
                    tracing::warn!(
                        %error,
                        region = %candidate.region,
                        style = %candidate.style,
                        attempt,
                        "Object store call failed"
                    );
                    last = Some(UploadDiagnostic {
                        status: None,
                        region: candidate.region.clone(),
                        style: candidate.style,
                        body: truncate_body(&error.0),
                        attempts: attempt,
                    });
                }
            }
        }

        STORAGE_UPLOADS_TOTAL.with_label_values(&["exhausted"]).inc();

        // candidates() always yields at least one entry (the fallback regions)
        let diagnostic = last.unwrap_or_else(|| UploadDiagnostic {
            status: None,
            region: String::new(),
            style: AddressingStyle::Path,
            body: "no upload candidates".to_string(),
            attempts: 0,
        });
        tracing::error!(
            status = ?diagnostic.status,
            region = %diagnostic.region,
            style = %diagnostic.style,
            attempts = diagnostic.attempts,
            "Every upload candidate failed"
        );
        Err(StorageError::Upload(diagnostic))
    }

    /// Delete an object previously stored by `upload` for this vehicle.
    ///
    /// Nothing is sent, and `Skipped` is returned, when the URL is outside
    /// `{endpoint}/{bucket}/`, when its key is not under
    /// `vehicles/{tenant}/{vehicle}/`, or when the key has empty, `.` or `..`
    /// segments. The response status is logged, not enforced.
    ///
    /// # Errors
    /// `StorageError::Config` for unusable credentials and
    /// `StorageError::Delete` when the URL cannot be mapped back to a key or
    /// the call produced no response. Callers log these and carry on.
    pub async fn delete(
        &self,
        tenant_id: &str,
        vehicle_id: &str,
        image_url: &str,
    ) -> Result<DeleteOutcome, StorageError> {
        let prefix = self.credentials.public_prefix();
        let Some(encoded_key) = image_url.strip_prefix(&prefix) else {
            tracing::debug!(url = %image_url, "Image URL is not hosted by this store; skipping delete");
            STORAGE_DELETES_TOTAL.with_label_values(&["skipped"]).inc();
            return Ok(DeleteOutcome::Skipped);
        };

        let object_key = urlencoding::decode(encoded_key)
            .map_err(|e| StorageError::Delete(format!("object key is not valid UTF-8: {e}")))?
            .into_owned();

        let in_scope = key::vehicle_prefix(tenant_id, vehicle_id)
            .map(|owned| object_key.starts_with(&owned))
            .unwrap_or(false);
        if !in_scope || !key::has_plain_segments(&object_key) {
            tracing::warn!(
                tenant_id,
                vehicle_id,
                key = %object_key,
                "Image key is outside the caller's vehicle; skipping delete"
            );
            STORAGE_DELETES_TOTAL.with_label_values(&["skipped"]).inc();
            return Ok(DeleteOutcome::Skipped);
        }

        let endpoint = self.checked_endpoint()?;

        let ctx = SigningContext {
            method: SigningMethod::Delete,
            object_key: &object_key,
            payload_sha256_hex: EMPTY_PAYLOAD_SHA256,
            content_type: None,
            region: self.delete_region(),
            style: AddressingStyle::Path,
        };
        let request = signer::sign(&self.credentials, &endpoint, &ctx, Utc::now());

        match self.transport.send(request, Bytes::new()).await {
            Ok(response) if response.is_success() => {
                STORAGE_DELETES_TOTAL.with_label_values(&["deleted"]).inc();
                tracing::info!(key = %object_key, status = response.status, "Image object deleted");
                Ok(DeleteOutcome::Issued {
                    status: response.status,
                })
            }
            Ok(response) => {
                STORAGE_DELETES_TOTAL.with_label_values(&["rejected"]).inc();
                tracing::warn!(
                    key = %object_key,
                    status = response.status,
                    "Object store returned non-success status for delete"
                );
                Ok(DeleteOutcome::Issued {
                    status: response.status,
                })
            }
            Err(error) => {
                STORAGE_DELETES_TOTAL.with_label_values(&["failed"]).inc();
                Err(StorageError::Delete(format!(
                    "delete of {object_key} failed: {error}"
                )))
            }
        }
    }

    fn delete_region(&self) -> &str {
        if self.credentials.default_region.is_empty() {
            FALLBACK_REGIONS[0]
        } else {
            &self.credentials.default_region
        }
    }

    fn decode_payload(&self, data: &str) -> Result<Bytes, StorageError> {
        let data = data.trim();
        // Accept `data:image/jpeg;base64,....` as sent by browsers
        let data = match data.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, encoded)| encoded)
                .ok_or_else(|| StorageError::InvalidPayload("malformed data URL".to_string()))?,
            None => data,
        };

        let bytes = BASE64
            .decode(data)
            .map_err(|e| StorageError::InvalidPayload(format!("image data is not base64: {e}")))?;

        if bytes.is_empty() {
            return Err(StorageError::InvalidPayload("image data is empty".to_string()));
        }
        if bytes.len() > self.max_image_bytes {
            return Err(StorageError::InvalidPayload(format!(
                "image exceeds {} bytes",
                self.max_image_bytes
            )));
        }

        Ok(Bytes::from(bytes))
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_DIAGNOSTIC_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
