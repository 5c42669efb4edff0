//! Pure Rust image processor built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (any compiled-in format) | `image::load_from_memory` |
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Sharpen / detail | `DynamicImage::filter3x3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with configured quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → other | `DynamicImage::write_to` |

use super::backend::{Dimensions, ImageProcessor, ImagingError, Processed};
use super::calculations::{ResizePlan, plan_resize};
use super::params::{OutputFormat, ProcessRequest, Quality};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// 3x3 sharpen kernel. `filter3x3` normalizes by the kernel sum (16).
const SHARPEN_KERNEL: [f32; 9] = [
    -2.0, -2.0, -2.0, //
    -2.0, 32.0, -2.0, //
    -2.0, -2.0, -2.0,
];

/// 3x3 detail-enhance kernel. Normalized by its sum (6).
const DETAIL_KERNEL: [f32; 9] = [
    0.0, -1.0, 0.0, //
    -1.0, 10.0, -1.0, //
    0.0, -1.0, 0.0,
];

/// Pure Rust processor using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustProcessor;

impl RustProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
    image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))
}

fn resize(img: DynamicImage, target: (u32, u32), upscale: bool) -> DynamicImage {
    match plan_resize((img.width(), img.height()), target, upscale) {
        ResizePlan::Keep => img,
        ResizePlan::Fit { width, height } | ResizePlan::Exact { width, height } => {
            img.resize_exact(width, height, FilterType::Lanczos3)
        }
    }
}

/// Encode into `format`. JPEG drops alpha; WebP and GIF are written as RGBA8.
fn encode(img: &DynamicImage, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Avif => {
            let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
                &mut buf,
                6,
                quality.value() as u8,
            );
            img.write_with_encoder(encoder)
        }
        OutputFormat::WebP | OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, format.image_format())
        }
        other => img.write_to(&mut buf, other.image_format()),
    };
    result.map_err(|e| ImagingError::Encode {
        format,
        reason: e.to_string(),
    })?;
    Ok(buf.into_inner())
}

impl ImageProcessor for RustProcessor {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, ImagingError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImagingError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ImagingError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn process(&self, bytes: &[u8], request: &ProcessRequest) -> Result<Processed, ImagingError> {
        let mut img = decode(bytes)?;

        if let Some(target) = request.size {
            img = resize(img, target, request.upscale);
        }
        if request.sharpen {
            img = img.filter3x3(&SHARPEN_KERNEL);
        }
        if request.detail {
            img = img.filter3x3(&DETAIL_KERNEL);
        }

        let dimensions = Dimensions {
            width: img.width(),
            height: img.height(),
        };
        let bytes = encode(&img, request.format, request.quality)?;
        Ok(Processed {
            bytes,
            format: request.format,
            dimensions,
        })
    }
}
