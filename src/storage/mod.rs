//! Storage backends.
//!
//! The [`Storage`] trait is the only shared mutable resource of the crate.
//! Paths are `/`-separated and relative to the backend's root; see
//! [`validate_path`].
//!
//! `save` overwrites: saving twice under one path leaves the second content,
//! and the returned committed path equals the requested one for both
//! backends shipped here. Callers must still use the returned path.
//!
//! `delete` reports [`StorageError::NotFound`] for missing paths. Whether
//! that matters is the caller's decision; the record layer ignores it.

mod filesystem;
mod memory;

pub use filesystem::FileSystemStorage;
pub use memory::{MemoryStorage, StorageOp};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Not found: `{0}`")]
    NotFound(String),
    #[error("Invalid storage path: `{0}`")]
    InvalidPath(String),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Trait for storage backends.
pub trait Storage: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Read the full content stored under `path`.
    fn open(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Write `content` under `path` and return the committed path.
    fn save(&self, path: &str, content: &[u8]) -> Result<String, StorageError>;

    fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Size in bytes of the content stored under `path`.
    fn size(&self, path: &str) -> Result<u64, StorageError>;
}

/// Reject paths that could escape the storage root.
///
/// A valid path is non-empty, relative, and has no empty, `.` or `..`
/// components.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
    if invalid {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_valid() {
        assert!(validate_path("cat.jpg").is_ok());
        assert!(validate_path("photos/thumbs/cat.small.png").is_ok());
        assert!(validate_path(".hidden").is_ok());
    }

    #[test]
    fn escaping_paths_are_invalid() {
        for bad in ["", "/etc/passwd", "a/../b", "./a", "a//b", "a/", "a\\b"] {
            assert!(
                matches!(validate_path(bad), Err(StorageError::InvalidPath(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn not_found_is_recognized() {
        assert!(StorageError::NotFound("x".into()).is_not_found());
        assert!(!StorageError::InvalidPath("x".into()).is_not_found());
    }
}
