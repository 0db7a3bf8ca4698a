// ABOUTME: Named disk abstraction used for theme file checks
// ABOUTME: Provides the Disk trait, a local filesystem disk and the named disk registry

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Disk not configured: {0}")]
    DiskNotFound(String),

    #[error("File not found on disk: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A storage root addressed by relative paths.
pub trait Disk: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    /// Last modification time in unix seconds
    fn last_modified(&self, path: &str) -> Result<i64>;
}

/// Disk rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Disk for LocalDisk {
    fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    fn last_modified(&self, path: &str) -> Result<i64> {
        let full_path = self.full_path(path);
        if !full_path.exists() {
            return Err(StorageError::FileNotFound(full_path.display().to_string()));
        }

        let modified = std::fs::metadata(&full_path)?.modified()?;
        let seconds = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Ok(seconds)
    }
}

/// Registry of named disks, e.g. `theme`.
#[derive(Clone, Default)]
pub struct Filesystems {
    disks: HashMap<String, Arc<dyn Disk>>,
}

impl Filesystems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disk(mut self, name: &str, disk: Arc<dyn Disk>) -> Self {
        self.disks.insert(name.to_string(), disk);
        self
    }

    pub fn disk(&self, name: &str) -> Result<Arc<dyn Disk>> {
        self.disks
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::DiskNotFound(name.to_string()))
    }
}

impl fmt::Debug for Filesystems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.disks.keys().collect();
        names.sort();
        f.debug_struct("Filesystems").field("disks", &names).finish()
    }
}
