//! Persisted builtin catalog
//!
//! One JSON file per framework version under the cache directory:
//! `<cache_dir>/builtin_<version>.json`. A file whose embedded version differs
//! from the requested one is rejected.

use crate::class_model::BuiltinCatalog;
use crate::error::{CacheError, CacheResult};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "builtin_";

#[derive(Debug, Clone)]
pub struct BuiltinCache {
    dir: PathBuf,
}

impl BuiltinCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a version tag
    pub fn path_for(&self, version: &str) -> PathBuf {
        let sanitized: String = version
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{FILE_PREFIX}{sanitized}.json"))
    }

    /// Cached catalog for `version`, `None` if nothing is cached yet
    pub fn load(&self, version: &str) -> CacheResult<Option<BuiltinCatalog>> {
        let path = self.path_for(version);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| CacheError::io(path.clone(), e))?;
        let catalog: BuiltinCatalog = serde_json::from_str(&content)
            .map_err(|e| CacheError::invalid(format!("{}: {e}", path.display())))?;

        if catalog.version != version {
            return Err(CacheError::invalid(format!(
                "Incompatible cache version: expected {version}, got {}",
                catalog.version
            )));
        }
        Ok(Some(catalog))
    }

    pub fn save(&self, catalog: &BuiltinCatalog) -> CacheResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(self.dir.clone(), e))?;

        let path = self.path_for(&catalog.version);
        let content = serde_json::to_string_pretty(catalog)
            .map_err(|e| CacheError::invalid(format!("Failed to serialize catalog: {e}")))?;
        fs::write(&path, content).map_err(|e| CacheError::io(path.clone(), e))?;
        Ok(path)
    }

    /// Delete every cached catalog. Returns the number of files removed.
    pub fn clear(&self) -> CacheResult<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::io(self.dir.clone(), e))?;
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(".json"));
            if is_cache_file {
                fs::remove_file(&path).map_err(|e| CacheError::io(path.clone(), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
