//! The workspace context
//!
//! [`Workspace`] owns every index of an open project: manifests and markup
//! documents ([`WorkspaceIndex`]), class definitions
//! ([`ClassRegistry`](crate::class_model::ClassRegistry)), the member-type
//! memo and the cross-reference memo. Components receive `&Workspace`; there
//! is no global state.
//!
//! File notifications enter through [`Workspace::handle_event`]. Invalidation
//! is complete when the call returns, so the next query always reads the new
//! content.

pub mod document;
pub mod index;
pub mod manifest;
pub mod source;

pub use document::{DocumentKind, MarkupDocument};
pub use index::{SourceKind, WorkspaceIndex};
pub use manifest::{Manifest, ViewExtension};
pub use source::{DiskSource, MemorySource, SourceProvider};

use crate::class_model::{BuiltinCatalog, ClassDefinition, ClassRegistry};
use crate::config::Settings;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::rename::{self, RenameTarget};
use crate::resolution::{TypeMemo, TypeResolver, WalkLimits};
use crate::storage::BuiltinCache;
use crate::types::{ByteRange, Edit, Location, MemberKind, TypeResolution};
use crate::xref::{CrossReference, XrefMemo};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File notification delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    /// Editor buffer changed; `content` is the full new text
    Changed { path: PathBuf, content: String },
    Opened { path: PathBuf, content: String },
    /// File created on disk
    Created { path: PathBuf },
    Deleted { path: PathBuf },
    Renamed { from: PathBuf, to: PathBuf },
    ConfigurationChanged,
}

/// Role of a file in the workspace, decided by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Manifest,
    Markup,
    Script,
    Other,
}

impl FileRole {
    pub fn of(path: &Path) -> Self {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Self::Other;
        };
        if name == "manifest.json" {
            Self::Manifest
        } else if DocumentKind::from_path(path).is_some() {
            Self::Markup
        } else if name.ends_with(".js") {
            Self::Script
        } else {
            Self::Other
        }
    }
}

/// One entry of a reflection query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub declaration_range: Option<ByteRange>,
    /// Bound from markup of the class or of a subclass inheriting it
    pub is_event_handler: bool,
    pub inferred_type: TypeResolution,
}

pub struct Workspace {
    settings: Arc<Settings>,
    index: WorkspaceIndex,
    classes: ClassRegistry,
    type_memo: TypeMemo,
    xref_memo: XrefMemo,
    builtins: RwLock<Arc<BuiltinCatalog>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("index", &self.index)
            .field("classes", &self.classes)
            .field("type_memo", &self.type_memo.len())
            .field("builtins", &self.builtins.read().len())
            .finish()
    }
}

impl Workspace {
    /// Open a workspace reading files from disk
    pub fn open(settings: Settings) -> WorkspaceResult<Self> {
        Self::with_source(settings, Arc::new(DiskSource))
    }

    pub fn with_source(settings: Settings, source: Arc<dyn SourceProvider>) -> WorkspaceResult<Self> {
        let builtins = load_builtins(&settings);
        debug!(
            "Builtin catalog {} with {} classes",
            builtins.version,
            builtins.len()
        );
        Ok(Self {
            settings: Arc::new(settings),
            index: WorkspaceIndex::new(source),
            classes: ClassRegistry::new()?,
            type_memo: TypeMemo::new(),
            xref_memo: XrefMemo::new(),
            builtins: RwLock::new(Arc::new(builtins)),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shared_settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings)
    }

    pub fn index(&self) -> &WorkspaceIndex {
        &self.index
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn type_memo(&self) -> &TypeMemo {
        &self.type_memo
    }

    pub fn xref_memo(&self) -> &XrefMemo {
        &self.xref_memo
    }

    pub fn builtins(&self) -> Arc<BuiltinCatalog> {
        Arc::clone(&self.builtins.read())
    }

    pub fn walk_limits(&self) -> WalkLimits<'_> {
        WalkLimits {
            max_hops: self.settings.resolution.max_inheritance_hops,
            root_class: &self.settings.framework.root_class,
        }
    }

    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self)
    }

    pub fn xref(&self) -> CrossReference<'_> {
        CrossReference::new(self)
    }

    /// Project or builtin class by name; `None` when neither exists
    pub fn class(&self, class_name: &str) -> Option<Arc<ClassDefinition>> {
        let builtins = self.builtins();
        self.classes.get_class(&self.index, &builtins, class_name)
    }

    /// Project class backed by the script at `fs_path`
    pub fn class_for_path(&self, fs_path: &Path) -> Option<Arc<ClassDefinition>> {
        let class_name = self.index.resolve_class_name_for_path(fs_path)?;
        self.class(&class_name).filter(|def| def.is_project())
    }

    // ---- events ----

    pub fn handle_event(&self, event: WorkspaceEvent) -> WorkspaceResult<()> {
        match event {
            WorkspaceEvent::Changed { path, content } | WorkspaceEvent::Opened { path, content } => {
                self.apply_content(&path, Some(content))
            }
            WorkspaceEvent::Created { path } => self.apply_content(&path, None),
            WorkspaceEvent::Deleted { path } => {
                self.forget(&path);
                Ok(())
            }
            WorkspaceEvent::Renamed { from, to } => {
                self.forget(&from);
                self.apply_content(&to, None)
            }
            WorkspaceEvent::ConfigurationChanged => self.clear_caches(),
        }
    }

    fn read(&self, path: &Path) -> WorkspaceResult<String> {
        self.index
            .source()
            .read_to_string(path)
            .map_err(|source| WorkspaceError::FileRead {
                path: path.to_path_buf(),
                source,
            })
    }

    /// New content for `path`; `None` reads it through the source provider
    fn apply_content(&self, path: &Path, content: Option<String>) -> WorkspaceResult<()> {
        match FileRole::of(path) {
            FileRole::Manifest => {
                let text = match content {
                    Some(text) => text,
                    None => self.read(path)?,
                };
                // A broken descriptor is logged and left out by the index
                let _ = self.index.register_manifest(path, &text);
                self.reset_class_models();
            }
            FileRole::Markup => {
                let before = self.controllers_of(path);
                let doc = match content {
                    Some(text) => self.index.set_document(path, text),
                    None => self.index.load_document(path),
                };
                if doc.is_none() {
                    self.index.invalidate(path);
                }
                let after = self.controllers_of(path);
                self.markup_changed(before.into_iter().chain(after));
            }
            FileRole::Script => {
                let Some(class_name) = self.index.resolve_class_name_for_path(path) else {
                    debug!("{} is outside every manifest root", path.display());
                    return Ok(());
                };
                let text = match content {
                    Some(text) => text,
                    None => self.read(path)?,
                };
                let update = self.classes.set_new_source(&class_name, path, text)?;
                if update.rebuilt {
                    let dropped = self.type_memo.invalidate_class(&class_name);
                    self.xref_memo.clear();
                    debug!("{class_name} rebuilt, {dropped} memo entries dropped");
                }
            }
            FileRole::Other => {}
        }
        Ok(())
    }

    fn forget(&self, path: &Path) {
        match FileRole::of(path) {
            FileRole::Manifest => {
                self.index.remove_manifest(path);
                self.reset_class_models();
            }
            FileRole::Markup => {
                let before = self.controllers_of(path);
                self.index.invalidate(path);
                self.markup_changed(before);
            }
            FileRole::Script => {
                if let Some(class_name) = self.index.resolve_class_name_for_path(path) {
                    self.classes.remove_class(&class_name);
                    self.type_memo.invalidate_class(&class_name);
                    self.xref_memo.clear();
                }
            }
            FileRole::Other => {}
        }
    }

    /// Controllers responsible for the cached document at `path`
    fn controllers_of(&self, path: &Path) -> Vec<String> {
        let Some(doc) = self.index.documents().into_iter().find(|d| d.fs_path == path) else {
            return Vec::new();
        };
        self.xref().responsible_controller(&doc).into_iter().collect()
    }

    fn markup_changed(&self, controllers: impl IntoIterator<Item = String>) {
        self.xref_memo.clear();
        let controllers: BTreeSet<String> = controllers.into_iter().collect();
        for controller in controllers {
            self.type_memo.invalidate_class(&controller);
        }
    }

    /// Class names depend on manifests, so every derived model goes
    pub(crate) fn reset_class_models(&self) {
        self.classes.clear();
        self.type_memo.clear();
        self.xref_memo.clear();
    }

    /// Drop classes, memos and the persisted builtin cache. Cached documents
    /// are re-read from their source.
    pub fn clear_caches(&self) -> WorkspaceResult<()> {
        self.reset_class_models();

        let paths: Vec<PathBuf> = self
            .index
            .documents()
            .iter()
            .map(|d| d.fs_path.clone())
            .collect();
        self.index.clear_documents();
        for path in &paths {
            self.index.load_document(path);
        }

        if self.settings.cache.enabled {
            let removed = BuiltinCache::new(self.settings.cache.resolved_dir()).clear()?;
            debug!("Removed {removed} builtin cache files");
        }
        *self.builtins.write() = Arc::new(build_catalog(&self.settings));
        info!("Workspace caches cleared");
        Ok(())
    }

    // ---- queries ----

    /// Members of `class_name` in declaration order, with event-handler
    /// flags and inferred types filled in
    pub fn members_of(&self, class_name: &str) -> Option<Vec<MemberInfo>> {
        let def = self.class(class_name)?;
        let resolver = self.resolver();
        let handlers = if def.is_project() {
            self.xref().event_handlers(class_name)
        } else {
            Arc::new(HashSet::new())
        };

        let members = def
            .members
            .iter()
            .map(|member| MemberInfo {
                name: member.name.clone(),
                kind: member.kind,
                declaration_range: member.declaration_range,
                is_event_handler: handlers.contains(&member.name),
                inferred_type: match member.kind {
                    MemberKind::Method => resolver.method_return_type(class_name, &member.name),
                    MemberKind::Field => resolver.field_type(class_name, &member.name),
                },
            })
            .collect();
        Some(members)
    }

    /// Declaration of the member referenced at `offset`. Builtin members
    /// have no location.
    pub fn find_definition(&self, fs_path: &Path, offset: usize) -> Option<Location> {
        let (class_name, member_name) = match FileRole::of(fs_path) {
            FileRole::Markup => {
                let doc = self.index.document(fs_path)?;
                let reference = doc
                    .handler_references()
                    .into_iter()
                    .find(|r| r.range.contains(offset))?;
                let controller = self.xref().responsible_controller(&doc)?;
                (controller, reference.name)
            }
            FileRole::Script => {
                let def = self.class_for_path(fs_path)?;
                if let Some(member) = def
                    .members
                    .iter()
                    .find(|m| m.declaration_range.is_some_and(|r| r.contains(offset)))
                {
                    (def.class_name.clone(), member.name.clone())
                } else {
                    let access = self.resolver().member_access_at(&def.class_name, offset)?;
                    (access.object_type, access.name)
                }
            }
            FileRole::Manifest | FileRole::Other => return None,
        };

        let (declaring, index) = self.resolver().find_member(&class_name, &member_name).found?;
        let range = declaring.members[index].declaration_range?;
        Some(Location {
            file_path: declaring.fs_path()?.to_path_buf(),
            offset: range.start,
        })
    }

    /// Controller responsible for the view or fragment at `fs_path`
    pub fn responsible_controller(&self, fs_path: &Path) -> Option<String> {
        let doc = self.index.document(fs_path)?;
        self.xref().responsible_controller(&doc)
    }

    pub fn prepare_rename(&self, fs_path: &Path, offset: usize) -> WorkspaceResult<RenameTarget> {
        rename::prepare_rename(self, fs_path, offset)
    }

    pub fn rename(&self, target: &RenameTarget, new_name: &str) -> Vec<Edit> {
        rename::rename_member(self, target, new_name)
    }
}

/// Bundled catalog tagged with the configured version, extended by the
/// metadata file if one is configured
fn build_catalog(settings: &Settings) -> BuiltinCatalog {
    let mut catalog = BuiltinCatalog::bundled().unwrap_or_else(|e| {
        warn!("{e}");
        BuiltinCatalog::default()
    });
    catalog.version = settings.framework.version.clone();

    if let Some(path) = &settings.framework.metadata_path {
        match BuiltinCatalog::from_file(path) {
            Ok(extra) => {
                debug!("Merging {} builtin classes from {}", extra.len(), path.display());
                catalog.merge(extra);
            }
            Err(e) => warn!("Ignoring framework metadata: {e}"),
        }
    }
    catalog
}

/// Persisted catalog for the configured version, or a freshly built one
/// that is then persisted
fn load_builtins(settings: &Settings) -> BuiltinCatalog {
    if !settings.cache.enabled {
        return build_catalog(settings);
    }

    let cache = BuiltinCache::new(settings.cache.resolved_dir());
    match cache.load(&settings.framework.version) {
        Ok(Some(catalog)) => return catalog,
        Ok(None) => {}
        Err(e) => warn!("Rebuilding builtin cache: {e}"),
    }

    let catalog = build_catalog(settings);
    if let Err(e) = cache.save(&catalog) {
        warn!("Failed to persist builtin cache: {e}");
    }
    catalog
}
