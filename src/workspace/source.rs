//! File access used by every index
//!
//! The workspace never touches `std::fs` directly for project files. Reads and
//! existence probes go through a [`SourceProvider`] so tests can run against an
//! in-memory tree and observe the order in which paths are probed.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to project files.
pub trait SourceProvider: Send + Sync {
    /// Whether a regular file exists at `path`
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Files on the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSource;

impl SourceProvider for DiskSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// In-memory file tree that records every existence probe.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<PathBuf, String>>,
    probes: Mutex<Vec<PathBuf>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.write().remove(path)
    }

    /// Paths passed to [`SourceProvider::exists`], oldest first
    pub fn probes(&self) -> Vec<PathBuf> {
        self.probes.lock().clone()
    }

    pub fn clear_probes(&self) {
        self.probes.lock().clear();
    }
}

impl SourceProvider for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.probes.lock().push(path.to_path_buf());
        self.files.read().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not in memory source", path.display()),
            )
        })
    }
}
