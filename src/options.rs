//! Image processing options.
//!
//! Options come in two shapes:
//!
//! - [`OptionsSpec`] is what a `thumbnails.toml` table deserializes into. It
//!   keeps `size` as a raw TOML value so that a non-string size is reported as
//!   an [`ImageSizeError`] rather than a generic parse failure.
//! - [`ProcessingOptions`] is the validated form used everywhere else.
//!
//! ```toml
//! [thumbnails.avatar]
//! size = "80x60"     # WIDTHxHEIGHT
//! sharpen = true
//! detail = false
//! upscale = false
//! format = "PNG"     # falls back to settings.format
//! ```

use crate::error::Result;
use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageSizeError {
    #[error("size must be a string of the form WIDTHxHEIGHT")]
    Shape,
    #[error("size's WIDTH and HEIGHT must be integers")]
    NotIntegers,
    #[error("size's WIDTH and HEIGHT must be positive")]
    OutOfRange,
}

/// Parse a `WIDTHxHEIGHT` string.
///
/// Splits on the first `x` only, so `"32x32x3"` fails on its height part.
/// Surrounding whitespace around each number is accepted.
///
/// ```
/// # use thumbnail_works::options::parse_size;
/// assert_eq!(parse_size("80x60"), Ok((80, 60)));
/// assert!(parse_size("80").is_err());
/// ```
pub fn parse_size(size: &str) -> std::result::Result<(u32, u32), ImageSizeError> {
    let (width, height) = size.split_once('x').ok_or(ImageSizeError::Shape)?;
    Ok((parse_dimension(width)?, parse_dimension(height)?))
}

/// Parse a size given as an arbitrary TOML value. Only strings are accepted.
pub fn parse_size_value(value: &toml::Value) -> std::result::Result<(u32, u32), ImageSizeError> {
    value
        .as_str()
        .ok_or(ImageSizeError::Shape)
        .and_then(parse_size)
}

fn parse_dimension(bit: &str) -> std::result::Result<u32, ImageSizeError> {
    let value: i64 = bit
        .trim()
        .parse()
        .map_err(|_| ImageSizeError::NotIntegers)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ImageSizeError::OutOfRange)
}

/// Options as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<toml::Value>,
    pub sharpen: bool,
    pub detail: bool,
    pub upscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl OptionsSpec {
    /// Validate into [`ProcessingOptions`].
    pub fn resolve(&self) -> Result<ProcessingOptions> {
        let size = self.size.as_ref().map(parse_size_value).transpose()?;
        let format = self
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()?;
        Ok(ProcessingOptions {
            size,
            sharpen: self.sharpen,
            detail: self.detail,
            upscale: self.upscale,
            format,
        })
    }
}

/// Validated processing options for a source image or a thumbnail.
///
/// An empty value is meaningful: it still re-encodes the image into the
/// default format, without resizing or filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingOptions {
    /// Bounding box `(width, height)`.
    pub size: Option<(u32, u32)>,
    pub sharpen: bool,
    pub detail: bool,
    /// Resize to exactly `size`, even when that enlarges the image.
    pub upscale: bool,
    /// Output format; `None` means the configured default.
    pub format: Option<OutputFormat>,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn sharpen(mut self) -> Self {
        self.sharpen = true;
        self
    }

    pub fn detail(mut self) -> Self {
        self.detail = true;
        self
    }

    pub fn upscale(mut self) -> Self {
        self.upscale = true;
        self
    }

    /// The format these options produce under the given default.
    pub fn resolve_format(&self, default: OutputFormat) -> OutputFormat {
        self.format.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThumbnailError;

    #[test]
    fn parses_width_by_height() {
        assert_eq!(parse_size("32x32"), Ok((32, 32)));
        assert_eq!(parse_size("512x384"), Ok((512, 384)));
        assert_eq!(parse_size("1x1"), Ok((1, 1)));
    }

    #[test]
    fn tolerates_whitespace_around_numbers() {
        assert_eq!(parse_size(" 80 x 60 "), Ok((80, 60)));
    }

    #[test]
    fn missing_separator_is_a_shape_error() {
        assert_eq!(parse_size("80"), Err(ImageSizeError::Shape));
        assert_eq!(parse_size(""), Err(ImageSizeError::Shape));
        assert_eq!(parse_size("80X60"), Err(ImageSizeError::Shape));
    }

    #[test]
    fn splits_on_first_separator_only() {
        assert_eq!(parse_size("32x32x3"), Err(ImageSizeError::NotIntegers));
    }

    #[test]
    fn non_numeric_parts_are_rejected() {
        assert_eq!(parse_size("axb"), Err(ImageSizeError::NotIntegers));
        assert_eq!(parse_size("32x"), Err(ImageSizeError::NotIntegers));
        assert_eq!(parse_size("x32"), Err(ImageSizeError::NotIntegers));
        assert_eq!(parse_size("3.5x2"), Err(ImageSizeError::NotIntegers));
    }

    #[test]
    fn zero_and_negative_are_out_of_range() {
        assert_eq!(parse_size("0x10"), Err(ImageSizeError::OutOfRange));
        assert_eq!(parse_size("10x-4"), Err(ImageSizeError::OutOfRange));
        assert_eq!(parse_size("99999999999x1"), Err(ImageSizeError::OutOfRange));
    }

    #[test]
    fn non_string_values_are_rejected() {
        assert_eq!(
            parse_size_value(&toml::Value::Integer(32)),
            Err(ImageSizeError::Shape)
        );
        let array = toml::Value::Array(vec![toml::Value::Integer(32), toml::Value::Integer(32)]);
        assert_eq!(parse_size_value(&array), Err(ImageSizeError::Shape));
        assert_eq!(
            parse_size_value(&toml::Value::String("16x9".into())),
            Ok((16, 9))
        );
    }

    #[test]
    fn spec_resolves_into_options() {
        let spec: OptionsSpec = toml::from_str(
            r#"
            size = "80x60"
            sharpen = true
            format = "png"
            "#,
        )
        .unwrap();
        let options = spec.resolve().unwrap();
        assert_eq!(options.size, Some((80, 60)));
        assert!(options.sharpen);
        assert!(!options.detail);
        assert!(!options.upscale);
        assert_eq!(options.format, Some(OutputFormat::Png));
    }

    #[test]
    fn spec_with_integer_size_fails_with_size_error() {
        let spec: OptionsSpec = toml::from_str("size = 80").unwrap();
        assert!(matches!(
            spec.resolve(),
            Err(ThumbnailError::ImageSize(ImageSizeError::Shape))
        ));
    }

    #[test]
    fn spec_with_unknown_format_fails() {
        let spec: OptionsSpec = toml::from_str(r#"format = "XCF""#).unwrap();
        assert!(matches!(spec.resolve(), Err(ThumbnailError::Imaging(_))));
    }

    #[test]
    fn spec_rejects_unknown_keys() {
        let result: std::result::Result<OptionsSpec, _> = toml::from_str("crop = true");
        assert!(result.is_err());
    }

    #[test]
    fn format_falls_back_to_default() {
        let options = ProcessingOptions::new().with_size(10, 10);
        assert_eq!(options.resolve_format(OutputFormat::Jpeg), OutputFormat::Jpeg);
        let options = options.with_format(OutputFormat::WebP);
        assert_eq!(options.resolve_format(OutputFormat::Jpeg), OutputFormat::WebP);
    }
}
