//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage-service selector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageService {
    /// S3-compatible object store (AWS S3, MinIO, ...)
    #[default]
    S3,
    /// Inline uploads are rejected; pre-hosted URLs still pass through.
    Disabled,
}

/// Object storage configuration
///
/// Credential fields default to empty strings. Missing values are reported
/// per upload rather than at startup.
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub service: StorageService,
    /// Bucket name (e.g., "cars")
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Preferred signing region; fallbacks are tried after it.
    pub region: String,
    /// Endpoint base URL (e.g., "https://minio.example.com")
    #[serde(default)]
    pub endpoint: String,
    /// Only try path-style addressing
    pub force_path_style: bool,
    /// Timeout for a single signed HTTP call, in seconds
    pub attempt_timeout_secs: u64,
    /// Maximum decoded image size in bytes
    pub max_image_bytes: usize,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("service", &self.service)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field("attempt_timeout_secs", &self.attempt_timeout_secs)
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}

impl StorageConfig {
    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("endpoint", &self.endpoint),
            ("bucket", &self.bucket),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        let level = self.level.trim();
        format!("carlot_media={level},tower_http={level}")
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (CARLOT__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("storage.service", "s3")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.force_path_style", false)?
            .set_default("storage.attempt_timeout_secs", 30)?
            .set_default("storage.max_image_bytes", 10 * 1024 * 1024)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("CARLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.storage.attempt_timeout_secs == 0 {
            return Err(crate::error::AppError::Config(
                "storage.attempt_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_image_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "storage.max_image_bytes must be greater than 0".to_string(),
            ));
        }

        let endpoint = self.storage.endpoint.trim();
        if !endpoint.is_empty() {
            let parsed = url::Url::parse(endpoint).map_err(|e| {
                crate::error::AppError::Config(format!("storage.endpoint is not a valid URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(crate::error::AppError::Config(
                    "storage.endpoint must be an absolute http(s) URL".to_string(),
                ));
            }
        }

        let missing = self.storage.missing_fields();
        if self.storage.service == StorageService::S3 && !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Object storage credentials are incomplete; inline image uploads will be rejected"
            );
        }

        Ok(())
    }
}
