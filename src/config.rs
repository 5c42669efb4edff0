//! Field configuration module.
//!
//! Handles loading, validating, and merging a `thumbnails.toml` file. The file
//! carries the process-wide [`ThumbnailSettings`] and the definitions of one
//! image field: optional source processing plus named thumbnails.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [settings]
//! format = "JPEG"              # Default output format
//! quality = 85                 # JPEG/AVIF quality (0-100)
//! dirname = "thumbs"           # Thumbnail subdirectory next to each source
//! delayed_generation = true    # Generate thumbnails on first access
//!
//! [process_source]             # Omit to store sources untouched
//! size = "512x384"
//!
//! [thumbnails.avatar]
//! size = "80x60"
//!
//! [thumbnails.medium]
//! size = "256x192"
//! detail = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use crate::options::OptionsSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Process-wide thumbnail settings.
///
/// Snapshotted into every source image when it is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    /// Output format when options don't name one.
    pub format: OutputFormat,
    /// Lossy encoding quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Name of the thumbnail subdirectory created next to each source.
    pub dirname: String,
    /// Generate thumbnails on first access instead of when the source is saved.
    pub delayed_generation: bool,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 85,
            dirname: "thumbs".to_string(),
            delayed_generation: true,
        }
    }
}

impl ThumbnailSettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quality > 100 {
            return Err(ConfigError::Validation(
                "settings.quality must be 0-100".into(),
            ));
        }
        let dirname = self.dirname.as_str();
        if dirname.is_empty()
            || dirname == "."
            || dirname == ".."
            || dirname.contains(['/', '\\'])
        {
            return Err(ConfigError::Validation(format!(
                "settings.dirname must be a single directory name, got \"{dirname}\""
            )));
        }
        Ok(())
    }
}

/// Everything a `thumbnails.toml` describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    pub settings: ThumbnailSettings,
    /// Processing applied to the source before it is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_source: Option<OptionsSpec>,
    /// Thumbnail definitions keyed by identifier.
    pub thumbnails: BTreeMap<String, OptionsSpec>,
}

impl FieldConfig {
    /// Validate settings. Definitions are validated when the field is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FieldConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<FieldConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FieldConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<FieldConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `thumbnails.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Thumbnail Works Configuration
# =============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Settings shared by every image of the field
# ---------------------------------------------------------------------------
[settings]
# Output format used when a definition does not name one.
# One of: JPEG, PNG, GIF, BMP, TIFF, WEBP, AVIF.
format = "JPEG"

# Lossy encoding quality (0 = worst, 100 = best). Used for JPEG and AVIF.
quality = 85

# Subdirectory, next to each source image, that holds its thumbnails.
dirname = "thumbs"

# Generate thumbnails the first time they are accessed rather than when the
# source image is saved.
delayed_generation = true

# ---------------------------------------------------------------------------
# Source processing (optional)
# ---------------------------------------------------------------------------
# When present, the uploaded image is processed before it is stored, and its
# extension follows the output format. An empty table still re-encodes the
# image into the default format.
#
# [process_source]
# size = "512x384"
# sharpen = true
# upscale = true

# ---------------------------------------------------------------------------
# Thumbnail definitions
# ---------------------------------------------------------------------------
# One table per thumbnail, keyed by identifier. Spaces in identifiers become
# underscores. Options:
#   size    = "WIDTHxHEIGHT"  bounding box
#   sharpen = true            apply a sharpen filter
#   detail  = true            apply a detail filter
#   upscale = true            resize to exactly `size`, even if larger
#   format  = "PNG"           output format (defaults to settings.format)
#
# [thumbnails.avatar]
# size = "80x60"
#
# [thumbnails.medium]
# size = "256x192"
# detail = true
"##
}
