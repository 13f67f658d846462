//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate object storage on behalf of the API.

mod images;

pub use images::{ImageInput, ImageService, VehicleImage};
