//! High-level image operations.
//!
//! These functions resolve processing options against the thumbnail
//! settings, build a [`ProcessRequest`], and call the processor.

use super::backend::{Dimensions, ImageProcessor, ImagingError, Processed};
use super::params::{ProcessRequest, Quality};
use crate::config::ThumbnailSettings;
use crate::options::ProcessingOptions;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Plan a processing pass without executing it.
///
/// The output format falls back to `settings.format`; quality always comes
/// from `settings.quality`.
pub fn plan_request(options: &ProcessingOptions, settings: &ThumbnailSettings) -> ProcessRequest {
    ProcessRequest {
        size: options.size,
        sharpen: options.sharpen,
        detail: options.detail,
        upscale: options.upscale,
        format: options.resolve_format(settings.format),
        quality: Quality::new(settings.quality),
    }
}

/// Process `content` with `options`.
pub fn process_image(
    processor: &dyn ImageProcessor,
    content: &[u8],
    options: &ProcessingOptions,
    settings: &ThumbnailSettings,
) -> Result<Processed> {
    let request = plan_request(options, settings);
    processor.process(content, &request)
}

/// Get image dimensions using the processor.
pub fn get_dimensions(processor: &dyn ImageProcessor, content: &[u8]) -> Result<Dimensions> {
    processor.identify(content)
}
