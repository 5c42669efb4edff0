//! Image processing seam and shared types.
//!
//! The [`ImageProcessor`] trait is everything the lifecycle code needs from an
//! image library: read dimensions, and run one [`ProcessRequest`] over raw
//! bytes. The production implementation is
//! [`RustProcessor`](super::rust_backend::RustProcessor).

use super::params::{OutputFormat, ProcessRequest};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Cannot decode image: {0}")]
    Decode(String),
    #[error("Cannot encode {format} image: {reason}")]
    Encode {
        format: OutputFormat,
        reason: String,
    },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Output of one processing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub dimensions: Dimensions,
}

/// Trait for image processing implementations.
///
/// `Send + Sync` so one processor can be shared by every record of a field
/// and driven from rayon's pool.
pub trait ImageProcessor: Send + Sync {
    /// Get image dimensions without a full processing pass.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, ImagingError>;

    /// Decode, resize, filter, and re-encode.
    fn process(&self, bytes: &[u8], request: &ProcessRequest) -> Result<Processed, ImagingError>;
}
