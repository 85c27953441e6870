//! Configuration module for the workspace model.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ATLAS_` and use double underscores
//! to separate nested levels:
//! - `ATLAS_FRAMEWORK__VERSION=1.120.0` sets `framework.version`
//! - `ATLAS_RESOLUTION__MAX_INHERITANCE_HOPS=16` sets `resolution.max_inheritance_hops`
//! - `ATLAS_CACHE__ENABLED=false` sets `cache.enabled`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-project configuration directory
pub const CONFIG_DIR: &str = ".ui5atlas";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .ui5atlas is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Framework metadata settings
    #[serde(default)]
    pub framework: FrameworkConfig,

    /// Workspace scanning settings
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Type resolution limits
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Persisted builtin cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrameworkConfig {
    /// Framework version tag; keys the persisted builtin cache
    #[serde(default = "default_framework_version")]
    pub version: String,

    /// Optional JSON metadata file with additional builtin classes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<PathBuf>,

    /// Class every inheritance chain terminates at
    #[serde(default = "default_root_class")]
    pub root_class: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Patterns (gitignore syntax) excluded from the workspace scan
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Follow symbolic links while scanning
    #[serde(default = "default_false")]
    pub follow_links: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolutionConfig {
    /// Upper bound on parent hops when walking an inheritance chain
    #[serde(default = "default_max_inheritance_hops")]
    pub max_inheritance_hops: usize,

    /// Upper bound on nested variable/return-type resolution
    #[serde(default = "default_max_resolution_depth")]
    pub max_resolution_depth: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Persist the builtin catalog between runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for persisted caches (defaults to the user cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_framework_version() -> String {
    "1.120.0".to_string()
}
fn default_root_class() -> String {
    "sap.ui.base.Object".to_string()
}
fn default_max_inheritance_hops() -> usize {
    32
}
fn default_max_resolution_depth() -> usize {
    24
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            framework: FrameworkConfig::default(),
            indexing: IndexingConfig::default(),
            resolution: ResolutionConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            version: default_framework_version(),
            metadata_path: None,
            root_class: default_root_class(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                "node_modules/**".to_string(),
                "dist/**".to_string(),
                ".git/**".to_string(),
                "**/test-resources/**".to_string(),
            ],
            follow_links: false,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_inheritance_hops: default_max_inheritance_hops(),
            max_resolution_depth: default_max_resolution_depth(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Effective cache directory
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("ui5-atlas")
        })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("ATLAS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the workspace config by looking for the config directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .ui5atlas is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# ui5-atlas configuration

version = 1

# Global debug mode
debug = false

[framework]
# Framework version; the persisted builtin cache is keyed by it
version = "{}"

# Additional builtin class metadata (JSON), optional
# metadata_path = "framework-metadata.json"

# Every inheritance chain ends at this class
root_class = "{}"

[indexing]
# Patterns excluded from the workspace scan (gitignore syntax)
exclude_patterns = ["node_modules/**", "dist/**", ".git/**", "**/test-resources/**"]
follow_links = false

[resolution]
max_inheritance_hops = {}
max_resolution_depth = {}

[cache]
enabled = true
# dir = "/tmp/ui5-atlas"
"#,
            default_framework_version(),
            default_root_class(),
            default_max_inheritance_hops(),
            default_max_resolution_depth(),
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
