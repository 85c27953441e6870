//! Error types for the workspace model
//!
//! Most lookups in this crate degrade to "not found" instead of failing. The
//! errors below are reserved for operations whose caller asked for something
//! concrete (register this manifest, read that file, persist a cache).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for workspace operations
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Manifest descriptor could not be parsed
    #[error("Failed to parse manifest '{path}': {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    /// Script source could not be turned into a syntax tree
    #[error("Failed to parse script '{path}': {reason}")]
    ScriptParse { path: PathBuf, reason: String },

    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("No renameable member at offset {offset} in '{path}'")]
    NothingToRename { path: PathBuf, offset: usize },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl WorkspaceError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::ManifestParse { .. } => "MANIFEST_PARSE_ERROR",
            Self::ScriptParse { .. } => "SCRIPT_PARSE_ERROR",
            Self::ParserInit { .. } => "PARSER_INIT_ERROR",
            Self::NothingToRename { .. } => "NOTHING_TO_RENAME",
            Self::Cache(e) => return e.status_code(),
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::ManifestParse { .. } => vec![
                "Check that manifest.json is valid JSON and declares sap.app.id",
                "The remaining manifests of the workspace are still indexed",
            ],
            Self::NothingToRename { .. } => vec![
                "Place the cursor on a member declaration, a member access or a handler binding",
                "Members inherited from framework classes cannot be renamed",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Cache(e) => e.recovery_suggestions(),
            _ => vec![],
        }
    }
}

/// Errors raised by the persisted builtin-class cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error reading/writing cache files on disk
    #[error("cache io error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache format is invalid or incompatible
    #[error("invalid cache: {details}")]
    Invalid { details: String },
}

impl CacheError {
    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io { path, source }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::Invalid {
            details: details.into(),
        }
    }

    pub fn status_code(&self) -> String {
        match self {
            Self::Io { .. } => "CACHE_IO",
            Self::Invalid { .. } => "CACHE_INVALID",
        }
        .to_string()
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Io { .. } => vec![
                "Ensure the cache directory exists and is writable",
                "Delete the cache directory to force a rebuild",
            ],
            Self::Invalid { .. } => vec![
                "Run 'ui5-atlas clear-cache' to rebuild the builtin cache",
                "Verify the framework version in settings matches the metadata file",
            ],
        }
    }
}

/// Result type alias for workspace operations
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
