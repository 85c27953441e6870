//! Manifest registry and markup document cache
//!
//! Turns dotted class names into file paths and back, and owns every cached
//! view/fragment document. Documents are stored as `Arc`s; replacing an entry
//! swaps the whole value so readers see either the old or the new document.

use super::document::{DocumentKind, MarkupDocument};
use super::manifest::Manifest;
use super::source::SourceProvider;
use crate::error::{WorkspaceError, WorkspaceResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File flavours a class name can be backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Plain script; falls back to the controller file name
    Script,
    ControllerScript,
    FragmentMarkup,
    ViewMarkup,
}

impl SourceKind {
    /// Extensions probed for this kind, in order
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Script => &[".js", ".controller.js"],
            Self::ControllerScript => &[".controller.js"],
            Self::FragmentMarkup => &[".fragment.xml"],
            Self::ViewMarkup => &[".view.xml"],
        }
    }
}

/// Suffixes removed when turning a path back into a class name, longest first
const KNOWN_SUFFIXES: &[&str] = &[".controller.js", ".fragment.xml", ".view.xml", ".js", ".xml"];

pub struct WorkspaceIndex {
    source: Arc<dyn SourceProvider>,
    manifests: RwLock<Vec<Arc<Manifest>>>,
    documents: RwLock<HashMap<PathBuf, Arc<MarkupDocument>>>,
}

impl std::fmt::Debug for WorkspaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceIndex")
            .field("manifests", &self.manifests.read().len())
            .field("documents", &self.documents.read().len())
            .finish()
    }
}

impl WorkspaceIndex {
    pub fn new(source: Arc<dyn SourceProvider>) -> Self {
        Self {
            source,
            manifests: RwLock::new(Vec::new()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &Arc<dyn SourceProvider> {
        &self.source
    }

    // ---- manifests ----

    /// Parse and register a descriptor, replacing any entry with the same path
    /// or component name.
    ///
    /// A descriptor that fails to parse is logged and left out of the index;
    /// other manifests are not affected.
    pub fn register_manifest(&self, manifest_path: &Path, text: &str) -> WorkspaceResult<Arc<Manifest>> {
        let manifest = match Manifest::parse(manifest_path, text) {
            Ok(m) => Arc::new(m),
            Err(e) => {
                warn!("Skipping manifest: {e}");
                // A previously valid version of this file must not linger
                self.remove_manifest(manifest_path);
                return Err(e);
            }
        };

        let mut manifests = self.manifests.write();
        manifests.retain(|m| {
            m.manifest_path != manifest.manifest_path && m.component_name != manifest.component_name
        });
        manifests.push(Arc::clone(&manifest));
        debug!(
            "Registered component '{}' at {}",
            manifest.component_name,
            manifest.root_path.display()
        );
        Ok(manifest)
    }

    /// Read a descriptor through the source provider and register it
    pub fn load_manifest(&self, manifest_path: &Path) -> WorkspaceResult<Arc<Manifest>> {
        let text = self
            .source
            .read_to_string(manifest_path)
            .map_err(|source| WorkspaceError::FileRead {
                path: manifest_path.to_path_buf(),
                source,
            })?;
        self.register_manifest(manifest_path, &text)
    }

    pub fn remove_manifest(&self, manifest_path: &Path) -> bool {
        let mut manifests = self.manifests.write();
        let before = manifests.len();
        manifests.retain(|m| m.manifest_path != manifest_path);
        manifests.len() != before
    }

    pub fn manifests(&self) -> Vec<Arc<Manifest>> {
        self.manifests.read().clone()
    }

    pub fn clear_manifests(&self) {
        self.manifests.write().clear();
    }

    /// Longest component prefix owning `class_name`
    pub fn resolve_manifest_for_class(&self, class_name: &str) -> Option<Arc<Manifest>> {
        self.manifests
            .read()
            .iter()
            .filter(|m| m.owns_class(class_name))
            .max_by_key(|m| m.component_name.len())
            .cloned()
    }

    /// Manifest whose root contains `fs_path` (deepest root wins)
    pub fn manifest_for_path(&self, fs_path: &Path) -> Option<Arc<Manifest>> {
        self.manifests
            .read()
            .iter()
            .filter(|m| fs_path.starts_with(&m.root_path))
            .max_by_key(|m| m.root_path.components().count())
            .cloned()
    }

    // ---- class name <-> path ----

    /// Path `class_name` would live at with the given file suffix. No
    /// existence check.
    pub fn candidate_path(&self, class_name: &str, suffix: &str) -> Option<PathBuf> {
        let manifest = self.resolve_manifest_for_class(class_name)?;
        let relative = &class_name[manifest.component_name.len() + 1..];

        let mut segments: Vec<&str> = relative.split('.').collect();
        let file_stem = segments.pop().filter(|s| !s.is_empty())?;

        let mut path = manifest.root_path.clone();
        for segment in segments {
            path.push(segment);
        }
        path.push(format!("{file_stem}{suffix}"));
        Some(path)
    }

    /// Existing file backing `class_name`, probing candidates in order
    pub fn resolve_fs_path(&self, class_name: &str, kind: SourceKind) -> Option<PathBuf> {
        kind.extensions()
            .iter()
            .filter_map(|ext| self.candidate_path(class_name, ext))
            .find(|candidate| self.source.exists(candidate))
    }

    /// Class name for a file under a registered manifest root
    pub fn resolve_class_name_for_path(&self, fs_path: &Path) -> Option<String> {
        let manifest = self.manifest_for_path(fs_path)?;
        let relative = fs_path.strip_prefix(&manifest.root_path).ok()?;

        let mut segments = vec![manifest.component_name.clone()];
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?.to_string()),
                _ => return None,
            }
        }
        if segments.len() < 2 {
            return None;
        }

        let joined = segments.join(".");
        let stripped = KNOWN_SUFFIXES
            .iter()
            .find_map(|suffix| joined.strip_suffix(suffix))
            .unwrap_or(&joined);
        Some(stripped.to_string())
    }

    // ---- documents ----

    /// Cached document, loading it through the source provider on first use
    pub fn document(&self, fs_path: &Path) -> Option<Arc<MarkupDocument>> {
        if let Some(doc) = self.documents.read().get(fs_path) {
            return Some(Arc::clone(doc));
        }
        self.load_document(fs_path)
    }

    /// Read `fs_path` and cache it. Missing or non-markup files yield `None`.
    pub fn load_document(&self, fs_path: &Path) -> Option<Arc<MarkupDocument>> {
        DocumentKind::from_path(fs_path)?;
        match self.source.read_to_string(fs_path) {
            Ok(content) => self.set_document(fs_path, content),
            Err(e) => {
                debug!("Cannot read {}: {e}", fs_path.display());
                None
            }
        }
    }

    /// Replace the content of a document. Every derived map of the previous
    /// content goes with it.
    pub fn set_document(&self, fs_path: &Path, content: impl Into<String>) -> Option<Arc<MarkupDocument>> {
        let kind = DocumentKind::from_path(fs_path)?;
        let doc = Arc::new(MarkupDocument::new(fs_path, kind, content));
        self.documents
            .write()
            .insert(fs_path.to_path_buf(), Arc::clone(&doc));
        Some(doc)
    }

    /// Drop the cached document for `fs_path`
    pub fn invalidate(&self, fs_path: &Path) -> bool {
        self.documents.write().remove(fs_path).is_some()
    }

    pub fn clear_documents(&self) {
        self.documents.write().clear();
    }

    /// Snapshot of every cached document, ordered by path
    pub fn documents(&self) -> Vec<Arc<MarkupDocument>> {
        let mut docs: Vec<_> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| a.fs_path.cmp(&b.fs_path));
        docs
    }

    pub fn views(&self) -> Vec<Arc<MarkupDocument>> {
        self.documents()
            .into_iter()
            .filter(|d| d.kind == DocumentKind::View)
            .collect()
    }

    pub fn fragments(&self) -> Vec<Arc<MarkupDocument>> {
        self.documents()
            .into_iter()
            .filter(|d| d.kind == DocumentKind::Fragment)
            .collect()
    }

    /// Cached views bound to `controller_name`
    pub fn views_for_controller(&self, controller_name: &str) -> Vec<Arc<MarkupDocument>> {
        self.views()
            .into_iter()
            .filter(|v| v.controller_name.as_deref() == Some(controller_name))
            .collect()
    }

    /// Fragment document for a dotted fragment name
    pub fn fragment_by_name(&self, fragment_name: &str) -> Option<Arc<MarkupDocument>> {
        if let Some(path) = self.candidate_path(fragment_name, ".fragment.xml") {
            if let Some(doc) = self.documents.read().get(&path) {
                return Some(Arc::clone(doc));
            }
        }
        let path = self.resolve_fs_path(fragment_name, SourceKind::FragmentMarkup)?;
        self.document(&path)
    }

    /// Class name of a cached document
    pub fn document_name(&self, doc: &MarkupDocument) -> Option<String> {
        self.resolve_class_name_for_path(&doc.fs_path)
    }
}
