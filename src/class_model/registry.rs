//! Class registry: the single owner of class definitions
//!
//! Definitions are handed out as `Arc<ClassDefinition>`. Rebuilding a class
//! swaps the slot for a new `Arc`, so a reader holding the old definition
//! keeps a complete, consistent value.

use super::builtin::BuiltinCatalog;
use super::definition::{ClassDefinition, ClassOrigin, ProjectSource};
use super::sha::compute_sha256;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::parsing::javascript::JavaScriptParser;
use crate::workspace::{SourceKind, WorkspaceIndex};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ClassDefinition>>>,
    parser: Mutex<JavaScriptParser>,
    builds: AtomicUsize,
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.classes.read().len())
            .field("builds", &self.build_count())
            .finish()
    }
}

/// Outcome of [`ClassRegistry::set_new_source`]
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    pub definition: Arc<ClassDefinition>,
    /// False when the text hashed the same as the cached source
    pub rebuilt: bool,
}

impl ClassRegistry {
    pub fn new() -> WorkspaceResult<Self> {
        Ok(Self {
            classes: RwLock::new(HashMap::new()),
            parser: Mutex::new(JavaScriptParser::new()?),
            builds: AtomicUsize::new(0),
        })
    }

    /// Number of project classes parsed so far
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Cached definition, without loading anything
    pub fn cached(&self, class_name: &str) -> Option<Arc<ClassDefinition>> {
        self.classes.read().get(class_name).cloned()
    }

    /// Definition of `class_name`, parsing the project source or creating a
    /// builtin stub on first access. Project sources shadow builtins.
    pub fn get_class(
        &self,
        index: &WorkspaceIndex,
        builtins: &BuiltinCatalog,
        class_name: &str,
    ) -> Option<Arc<ClassDefinition>> {
        if let Some(def) = self.cached(class_name) {
            return Some(def);
        }

        let definition = match index.resolve_fs_path(class_name, SourceKind::Script) {
            Some(fs_path) => match index.source().read_to_string(&fs_path) {
                Ok(text) => match self.build_project_class(class_name, &fs_path, text) {
                    Ok(def) => def,
                    Err(e) => {
                        warn!("{e}");
                        return None;
                    }
                },
                Err(e) => {
                    debug!("Cannot read {}: {e}", fs_path.display());
                    return None;
                }
            },
            None => builtins.definition(class_name)?,
        };

        let definition = Arc::new(definition);
        // Another lookup may have filled the slot while we were parsing
        let mut classes = self.classes.write();
        let slot = classes
            .entry(class_name.to_string())
            .or_insert_with(|| Arc::clone(&definition));
        Some(Arc::clone(slot))
    }

    /// Replace the source of a project class.
    ///
    /// The whole definition is rebuilt; members, ranges and seeded types of
    /// the old text do not survive. Unchanged text is detected by hash and
    /// keeps the cached definition.
    pub fn set_new_source(
        &self,
        class_name: &str,
        fs_path: &Path,
        text: String,
    ) -> WorkspaceResult<SourceUpdate> {
        if let Some(current) = self.cached(class_name) {
            let unchanged = current
                .project()
                .is_some_and(|p| p.fs_path == fs_path && p.content_hash == compute_sha256(&text));
            if unchanged {
                return Ok(SourceUpdate {
                    definition: current,
                    rebuilt: false,
                });
            }
        }

        let definition = Arc::new(self.build_project_class(class_name, fs_path, text)?);
        self.classes
            .write()
            .insert(class_name.to_string(), Arc::clone(&definition));
        debug!("Rebuilt class {class_name}");
        Ok(SourceUpdate {
            definition,
            rebuilt: true,
        })
    }

    /// Evict a class; later lookups go back to the source
    pub fn remove_class(&self, class_name: &str) -> bool {
        self.classes.write().remove(class_name).is_some()
    }

    pub fn clear(&self) {
        self.classes.write().clear();
    }

    /// Names of the project classes currently known, sorted
    pub fn project_class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .read()
            .iter()
            .filter(|(_, def)| def.is_project())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    fn build_project_class(
        &self,
        class_name: &str,
        fs_path: &Path,
        text: String,
    ) -> WorkspaceResult<ClassDefinition> {
        let parsed = self
            .parser
            .lock()
            .parse_class(class_name, &text)
            .ok_or_else(|| WorkspaceError::ScriptParse {
                path: fs_path.to_path_buf(),
                reason: "parser produced no tree".to_string(),
            })?;
        self.builds.fetch_add(1, Ordering::Relaxed);

        if let Some(declared) = parsed.declared_name.as_deref() {
            if declared != class_name {
                debug!("{} declares '{declared}' but is indexed as '{class_name}'", fs_path.display());
            }
        }

        Ok(ClassDefinition {
            class_name: class_name.to_string(),
            parent_class_name: parsed.parent_class_name,
            members: parsed.members,
            aliases: parsed.aliases,
            origin: ClassOrigin::Project(ProjectSource {
                fs_path: fs_path.to_path_buf(),
                content_hash: compute_sha256(&text),
                text,
                tree: parsed.tree,
                imports: parsed.imports,
                factory_range: parsed.factory_range,
                body_range: parsed.body_range,
                declared_name: parsed.declared_name,
            }),
        })
    }
}
