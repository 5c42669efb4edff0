//! In-memory storage backend.
//!
//! Keeps objects in a `BTreeMap` behind a mutex and records every call, so
//! tests can assert on storage traffic (for example, that eager thumbnail
//! generation never reads the source back).

use super::{Storage, StorageError, validate_path};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One recorded storage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Exists(String),
    Open(String),
    Save(String),
    Delete(String),
    Size(String),
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    operations: Mutex<Vec<StorageOp>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }

    /// Content stored under `path`, without recording an operation.
    pub fn peek(&self, path: &str) -> Option<Vec<u8>> {
        self.objects().get(path).cloned()
    }

    pub fn operations(&self) -> Vec<StorageOp> {
        lock(&self.operations).clone()
    }

    pub fn clear_operations(&self) {
        lock(&self.operations).clear();
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        lock(&self.objects)
    }

    fn record(&self, op: StorageOp) {
        lock(&self.operations).push(op);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(StorageOp::Exists(path.to_string()));
        validate_path(path)?;
        Ok(self.objects().contains_key(path))
    }

    fn open(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.record(StorageOp::Open(path.to_string()));
        validate_path(path)?;
        self.objects()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn save(&self, path: &str, content: &[u8]) -> Result<String, StorageError> {
        self.record(StorageOp::Save(path.to_string()));
        validate_path(path)?;
        self.objects().insert(path.to_string(), content.to_vec());
        Ok(path.to_string())
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.record(StorageOp::Delete(path.to_string()));
        validate_path(path)?;
        self.objects()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn size(&self, path: &str) -> Result<u64, StorageError> {
        self.record(StorageOp::Size(path.to_string()));
        validate_path(path)?;
        self.objects()
            .get(path)
            .map(|content| content.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_open_round_trips() {
        let storage = MemoryStorage::new();
        let committed = storage.save("a/b.png", b"data").unwrap();
        assert_eq!(committed, "a/b.png");
        assert!(storage.exists("a/b.png").unwrap());
        assert_eq!(storage.open("a/b.png").unwrap(), b"data");
        assert_eq!(storage.size("a/b.png").unwrap(), 4);
    }

    #[test]
    fn save_overwrites() {
        let storage = MemoryStorage::new();
        storage.save("x.png", b"first").unwrap();
        storage.save("x.png", b"second").unwrap();
        assert_eq!(storage.peek("x.png").unwrap(), b"second");
        assert_eq!(storage.paths(), vec!["x.png".to_string()]);
    }

    #[test]
    fn delete_missing_reports_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.delete("missing.png").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn records_operations_in_order() {
        let storage = MemoryStorage::new();
        storage.save("x.png", b"1").unwrap();
        storage.exists("x.png").unwrap();
        storage.delete("x.png").unwrap();

        assert_eq!(
            storage.operations(),
            vec![
                StorageOp::Save("x.png".into()),
                StorageOp::Exists("x.png".into()),
                StorageOp::Delete("x.png".into()),
            ]
        );
        storage.clear_operations();
        assert!(storage.operations().is_empty());
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.save("../escape.png", b"x"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
