//! Process-wide object store credentials

use std::fmt;

use super::StorageError;
use crate::config::StorageConfig;

/// Immutable credentials and addressing configuration for the object store.
///
/// Built once at startup and shared read-only (behind `Arc`) by every
/// signing attempt.
#[derive(Clone)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub default_region: String,
    pub bucket_name: String,
    /// Endpoint base URL without trailing slash
    pub endpoint_base_url: String,
    pub force_path_style: bool,
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("default_region", &self.default_region)
            .field("bucket_name", &self.bucket_name)
            .field("endpoint_base_url", &self.endpoint_base_url)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Parsed endpoint, derived from a validated credential set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// e.g. "https://s3.example.com" or "http://127.0.0.1:9000"
    pub base_url: String,
    /// Host header value; carries the port only when it is not the scheme default
    pub host: String,
    /// Path prefix of the endpoint, "" when the endpoint has none
    pub base_path: String,
}

impl StorageCredentials {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            access_key_id: config.access_key_id.trim().to_string(),
            secret_access_key: config.secret_access_key.trim().to_string(),
            default_region: config.region.trim().to_string(),
            bucket_name: config.bucket.trim().to_string(),
            endpoint_base_url: config.endpoint.trim().trim_end_matches('/').to_string(),
            force_path_style: config.force_path_style,
        }
    }

    /// Check that every required field is present and parse the endpoint.
    ///
    /// # Errors
    /// `StorageError::Config` naming the missing fields, or describing why
    /// the endpoint cannot be used.
    pub fn validate(&self) -> Result<Endpoint, StorageError> {
        let missing: Vec<&str> = [
            ("endpoint", &self.endpoint_base_url),
            ("bucket", &self.bucket_name),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(StorageError::Config(format!(
                "missing object storage settings: {}",
                missing.join(", ")
            )));
        }

        let parsed = url::Url::parse(&self.endpoint_base_url)
            .map_err(|e| StorageError::Config(format!("invalid storage endpoint: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StorageError::Config(format!(
                "unsupported storage endpoint scheme: {}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| StorageError::Config("storage endpoint has no host".to_string()))?;
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Endpoint {
            base_url: self.endpoint_base_url.clone(),
            host,
            base_path: parsed.path().trim_end_matches('/').to_string(),
        })
    }

    /// URL prefix every object stored through this configuration starts with
    pub fn public_prefix(&self) -> String {
        format!("{}/{}/", self.endpoint_base_url, self.bucket_name)
    }
}
