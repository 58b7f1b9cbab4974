//! Content source (component C) — abstract byte read for a path.
//! Failure is non-fatal: the caller skips the file (spec.md §4.C, §7).
//!
//! Grounded on `server/src/services`'s general "thin IO trait +
//! filesystem impl" layering (e.g. its `FileClassifier`/
//! `ContentProvider`-style helpers); the in-memory variant exists for
//! tests and for inspecting git blobs without a checkout.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::EngineError;

pub trait ContentSource: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>, EngineError>;
}

/// Reads directly from the local filesystem.
#[derive(Default)]
pub struct FilesystemSource;

impl ContentSource for FilesystemSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, EngineError> {
        std::fs::read(Path::new(path)).map_err(|source| EngineError::IoFailure {
            path: path.into(),
            source,
        })
    }
}

/// An in-memory source keyed by path, for tests and for analyzing blobs
/// pulled from a VCS without touching the working tree.
#[derive(Default, Clone)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl ContentSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, EngineError> {
        self.files.get(path).cloned().ok_or_else(|| EngineError::IoFailure {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory source"),
        })
    }
}

/// Wraps another source with a shared read cache, so churn and
/// duplicate-detection passes over the same tree don't re-read a file
/// from disk once per analyzer. Unbounded: callers that analyze huge
/// trees repeatedly in one process should build a fresh instance per run.
pub struct CachedContentSource<'a> {
    inner: &'a dyn ContentSource,
    cache: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl<'a> CachedContentSource<'a> {
    pub fn new(inner: &'a dyn ContentSource) -> Self {
        CachedContentSource { inner, cache: RwLock::new(HashMap::new()) }
    }
}

impl<'a> ContentSource for CachedContentSource<'a> {
    fn read(&self, path: &str) -> Result<Vec<u8>, EngineError> {
        if let Some(hit) = self.cache.read().get(path) {
            return Ok((**hit).clone());
        }
        let bytes = self.inner.read(path)?;
        self.cache.write().insert(path.to_string(), Arc::new(bytes.clone()));
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_round_trips() {
        let src = MemorySource::new().with_file("a.rs", b"fn main() {}".to_vec());
        assert_eq!(src.read("a.rs").unwrap(), b"fn main() {}");
    }

    #[test]
    fn memory_source_missing_file_is_io_failure() {
        let src = MemorySource::new();
        assert!(src.read("missing.rs").is_err());
    }

    #[test]
    fn cached_source_only_hits_inner_once() {
        let inner = MemorySource::new().with_file("a.rs", b"one".to_vec());
        let cached = CachedContentSource::new(&inner);
        assert_eq!(cached.read("a.rs").unwrap(), b"one");
        assert_eq!(cached.read("a.rs").unwrap(), b"one");
        assert_eq!(cached.cache.read().len(), 1);
    }
}
