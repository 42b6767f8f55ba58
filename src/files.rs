//! File store collaborators
//!
//! The router only needs an existence check and a whole-file read for a
//! relative path. `DirectoryStore` serves from disk, `MemoryStore` from a map.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;

pub trait FileStore: Send + Sync + 'static {
    /// Whether `path` (relative to the store root) names a regular file.
    fn exists(&self, path: &str) -> impl Future<Output = bool> + Send;

    /// Read the whole file at `path`.
    fn read(&self, path: &str) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// Files under a root directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for DirectoryStore {
    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(self.root.join(path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(path)).await
    }
}

/// In-memory files keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileStore for MemoryStore {
    async fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    async fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}
