//! S3-compatible object storage
//!
//! Handles:
//! - Object key allocation for vehicle photos
//! - AWS Signature Version 4 request signing (no vendor SDK)
//! - Upload/delete with region and addressing-style fallback
//!
//! # Flow
//!
//! ```text
//! image bytes ─► key::allocate ─► for each (region, style):
//!                                   canonical ─► signing_key ─► signer
//!                                   ─► transport ─► 2xx? done : next
//! ```

pub mod canonical;
mod credentials;
mod driver;
pub mod key;
pub mod signer;
pub mod signing_key;
mod transport;

pub use canonical::{AddressingStyle, SigningContext, SigningMethod};
pub use credentials::{Endpoint, StorageCredentials};
pub use driver::{
    Candidate, DeleteOutcome, ImagePayload, ObjectStorage, UploadDiagnostic, UploadOutcome,
    candidates,
};
pub use signer::SignedRequest;
pub use transport::{ObjectTransport, ReqwestTransport, TransportError, TransportResponse};

use thiserror::Error;

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Required credential or endpoint fields are missing or unusable.
    /// Never retried.
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// The image payload could not be decoded or is out of bounds
    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    /// Every (region, style) candidate failed
    #[error("Storage upload failed: {0}")]
    Upload(UploadDiagnostic),

    /// Object deletion failed (callers log and ignore this)
    #[error("Storage delete failed: {0}")]
    Delete(String),
}
