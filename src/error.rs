//! Crate-level error type.
//!
//! Each module owns a narrow error enum; [`ThumbnailError`] folds them
//! together for the record layer so lifecycle code can use `?` throughout.

use crate::config::ConfigError;
use crate::imaging::ImagingError;
use crate::naming::NameError;
use crate::options::ImageSizeError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("Invalid image size: {0}")]
    ImageSize(#[from] ImageSizeError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Invalid thumbnail option: {0}")]
    ThumbnailOption(String),
    /// A thumbnail operation was attempted without its preconditions.
    /// Indicates a caller bug, not a runtime condition.
    #[error("Internal thumbnail error: {0}")]
    Configuration(String),
    #[error("No thumbnail named `{0}`")]
    AttributeNotFound(String),
    #[error("The `{0}` image has no file associated with it")]
    NoFile(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;
