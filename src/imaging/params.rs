//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which resolves
//! options against settings, and the [`backend`](super::backend), which does
//! the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`OutputFormat`]: Encodable output formats, parsed from names like `"JPEG"`.
//! - [`ProcessRequest`]: everything one processing pass needs.

use super::backend::ImagingError;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Output image format.
///
/// Parsed case-insensitively from the usual format names (`"JPEG"`, `"png"`,
/// `"WebP"`) and the common aliases `JPG` and `TIF`. Serialized as the
/// canonical upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    WebP,
    Avif,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Gif,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
        OutputFormat::WebP,
        OutputFormat::Avif,
    ];

    /// Canonical upper-case name, e.g. `"JPEG"`.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Gif => "GIF",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::WebP => "WEBP",
            OutputFormat::Avif => "AVIF",
        }
    }

    /// Filename extension: the lower-cased format name.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// Inverse of [`extension`](Self::extension). Exact match only, no aliases.
    pub fn from_extension(ext: &str) -> Option<Self> {
        OutputFormat::ALL.into_iter().find(|f| f.extension() == ext)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Avif => ImageFormat::Avif,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("jpg") {
            return Ok(OutputFormat::Jpeg);
        }
        if wanted.eq_ignore_ascii_case("tif") {
            return Ok(OutputFormat::Tiff);
        }
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ImagingError::UnsupportedFormat(s.to_string()))
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ImagingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.name().to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One processing pass: optional resize, optional filters, then encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    /// Bounding box, or the exact size when `upscale` is set.
    pub size: Option<(u32, u32)>,
    pub sharpen: bool,
    pub detail: bool,
    pub upscale: bool,
    pub format: OutputFormat,
    /// Only used by lossy encoders.
    pub quality: Quality,
}
