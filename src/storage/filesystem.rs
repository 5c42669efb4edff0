//! Filesystem storage backend rooted at a directory.
//!
//! ## Orphan sweep
//!
//! Deleting a source deletes its thumbnails first. If that cascade is
//! interrupted, thumbnail files can outlive their source with nothing
//! pointing at them. [`FileSystemStorage::sweep_orphans`] finds them by name:
//! a file `<dir>/<thumbs>/<source>.<identifier>.<ext>` is an orphan when
//! `<identifier>` is declared, `<ext>` is an output format extension, and
//! `<dir>/<source>` no longer exists. Anything else in a `<thumbs>` directory
//! is left alone.

use super::{Storage, StorageError, validate_path};
use crate::naming::parse_thumbnail_file_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    /// Delete thumbnail files whose source is gone.
    ///
    /// `dirname` is the thumbnail subdirectory name and `identifiers` the
    /// declared thumbnail identifiers. Returns the removed paths, relative to
    /// the root, in walk order.
    pub fn sweep_orphans(
        &self,
        dirname: &str,
        identifiers: &[&str],
    ) -> Result<Vec<String>, StorageError> {
        let mut removed = Vec::new();
        if !self.root.is_dir() {
            return Ok(removed);
        }

        let entries = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        for entry in entries {
            // Thumbnails live at least one directory below the root
            if entry.depth() < 2 || !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(thumbs_dir) = path.parent() else {
                continue;
            };
            if thumbs_dir.file_name().is_none_or(|name| name != dirname) {
                continue;
            }
            let Some(parsed) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_thumbnail_file_name)
            else {
                continue;
            };
            if !identifiers.contains(&parsed.identifier) {
                continue;
            }
            let Some(source_dir) = thumbs_dir.parent() else {
                continue;
            };
            if source_dir.join(parsed.source).is_file() {
                continue;
            }

            let relative = self.relative(path);
            fs::remove_file(path).map_err(|e| io_error(&relative, e))?;
            warn!(path = %relative, "Removed orphaned thumbnail");
            removed.push(relative);
        }

        debug!(count = removed.len(), "Orphan sweep finished");
        Ok(removed)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn io_error(path: &str, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io {
            path: path.to_string(),
            source: err,
        }
    }
}

impl Storage for FileSystemStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn open(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.resolve(path)?).map_err(|e| io_error(path, e))
    }

    fn save(&self, path: &str, content: &[u8]) -> Result<String, StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
        fs::write(&full, content).map_err(|e| io_error(path, e))?;
        Ok(path.to_string())
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.resolve(path)?).map_err(|e| io_error(path, e))
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        fs::metadata(self.resolve(path)?)
            .map(|m| m.len())
            .map_err(|e| io_error(path, e))
    }
}
