//! File system walker for discovering workspace files
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules
//! - `.ui5atlasignore` files
//! - Exclude patterns from configuration
//! - Filtering to manifests, markup and scripts

use crate::Settings;
use crate::workspace::{DocumentKind, FileRole};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Custom ignore file honoured next to `.gitignore`
pub const IGNORE_FILE_NAME: &str = ".ui5atlasignore";

/// Files found under one root, grouped by role
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkspaceFiles {
    pub manifests: Vec<PathBuf>,
    pub fragments: Vec<PathBuf>,
    pub views: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
}

impl WorkspaceFiles {
    pub fn len(&self) -> usize {
        self.manifests.len() + self.fragments.len() + self.views.len() + self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sort(&mut self) {
        self.manifests.sort();
        self.fragments.sort();
        self.views.sort();
        self.scripts.sort();
    }
}

/// Walks directories to find workspace files
#[derive(Debug)]
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Exclude patterns as negated overrides; `ignore` treats `!glob` as
    /// "skip what matches"
    fn exclude_overrides(&self, root: &Path) -> Option<Override> {
        let patterns = &self.settings.indexing.exclude_patterns;
        if patterns.is_empty() {
            return None;
        }

        let mut builder = OverrideBuilder::new(root);
        for pattern in patterns {
            if let Err(e) = builder.add(&format!("!{pattern}")) {
                warn!("Ignoring exclude pattern '{pattern}': {e}");
            }
        }
        match builder.build() {
            Ok(overrides) => Some(overrides),
            Err(e) => {
                warn!("Exclude patterns disabled: {e}");
                None
            }
        }
    }

    /// Walk a directory and return every manifest, markup and script file
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(self.settings.indexing.follow_links)
            .max_depth(None)
            .require_git(false); // Allow gitignore to work in non-git directories

        builder.add_custom_ignore_filename(IGNORE_FILE_NAME);

        if let Some(overrides) = self.exclude_overrides(root) {
            builder.overrides(overrides);
        }

        builder
            .build()
            .filter_map(Result::ok) // Skip files we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| FileRole::of(path) != FileRole::Other)
    }

    /// Walk `root` and group the files by role, each group sorted by path
    pub fn collect(&self, root: &Path) -> WorkspaceFiles {
        let mut files = WorkspaceFiles::default();
        for path in self.walk(root) {
            match FileRole::of(&path) {
                FileRole::Manifest => files.manifests.push(path),
                FileRole::Markup => match DocumentKind::from_path(&path) {
                    Some(DocumentKind::Fragment) => files.fragments.push(path),
                    Some(DocumentKind::View) => files.views.push(path),
                    None => {}
                },
                FileRole::Script => files.scripts.push(path),
                FileRole::Other => {}
            }
        }
        files.sort();
        files
    }
}
