//! Object key allocation for vehicle photos

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StorageError;

/// Extension used when the filename carries none
pub const DEFAULT_EXTENSION: &str = "jpg";

const MAX_EXTENSION_LEN: usize = 10;

/// Allocate a fresh object key for an uploaded vehicle photo.
///
/// Layout: `vehicles/{tenant}/{vehicle}/{unix_millis}-{uuid_v4}.{ext}`.
/// The timestamp plus random suffix keeps concurrent uploads for the same
/// vehicle apart. Ids are used verbatim and must already be valid key
/// segments, so two distinct ids never share a prefix.
///
/// # Errors
/// `StorageError::InvalidPayload` if either id is not a valid segment
///
/// # Example
/// ```ignore
/// let key = allocate("t1", "v1", "photo.JPG")?;
/// // vehicles/t1/v1/1705321845000-0f8fad5b-d9cb-469f-a165-70867728950e.jpg
/// ```
pub fn allocate(tenant_id: &str, vehicle_id: &str, filename: &str) -> Result<String, StorageError> {
    allocate_at(tenant_id, vehicle_id, filename, Utc::now(), Uuid::new_v4())
}

pub(crate) fn allocate_at(
    tenant_id: &str,
    vehicle_id: &str,
    filename: &str,
    now: DateTime<Utc>,
    suffix: Uuid,
) -> Result<String, StorageError> {
    Ok(format!(
        "{}{}-{}.{}",
        vehicle_prefix(tenant_id, vehicle_id)?,
        now.timestamp_millis(),
        suffix,
        sanitize_extension(filename)
    ))
}

/// `vehicles/{tenant}/{vehicle}/`, the prefix every key of one vehicle shares
///
/// # Errors
/// `StorageError::InvalidPayload` if either id is not a valid segment
pub fn vehicle_prefix(tenant_id: &str, vehicle_id: &str) -> Result<String, StorageError> {
    Ok(format!(
        "vehicles/{}/{}/",
        validate_segment("tenant id", tenant_id)?,
        validate_segment("vehicle id", vehicle_id)?
    ))
}

/// Accept an id only if it is non-empty and made of `[A-Za-z0-9_-]`.
///
/// Ids are rejected rather than stripped: stripping would map `t.1` and
/// `t1` onto the same prefix.
pub fn validate_segment<'a>(kind: &str, id: &'a str) -> Result<&'a str, StorageError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(StorageError::InvalidPayload(format!(
            "{kind} must be non-empty and contain only letters, digits, '-' or '_'"
        )))
    }
}

/// True when no `/`-separated segment of `key` is empty, `.` or `..`
pub fn has_plain_segments(key: &str) -> bool {
    key.split('/')
        .all(|segment| !matches!(segment, "" | "." | ".."))
}

/// Lower-cased alphanumeric extension of `filename`, or `jpg`.
pub fn sanitize_extension(filename: &str) -> String {
    let raw = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let ext: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}
