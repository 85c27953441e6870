//! Cross-references between markup and controllers
//!
//! Answers which controller is responsible for a view or fragment, which
//! controller methods are bound as event handlers, and which control class a
//! `byId` lookup returns.

use crate::types::Edit;
use crate::workspace::{MarkupDocument, SourceKind, Workspace};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Handler names per controller. Any change to markup, classes or manifests
/// clears it as a whole.
#[derive(Debug, Default)]
pub struct XrefMemo {
    handlers: RwLock<HashMap<String, Arc<HashSet<String>>>>,
}

impl XrefMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

pub struct CrossReference<'w> {
    ws: &'w Workspace,
}

impl<'w> CrossReference<'w> {
    pub fn new(ws: &'w Workspace) -> Self {
        Self { ws }
    }

    /// Controller class bound to a view, or resolved for a fragment
    pub fn responsible_controller(&self, doc: &MarkupDocument) -> Option<String> {
        if let Some(controller) = &doc.controller_name {
            return Some(controller.clone());
        }
        let name = self.ws.index().document_name(doc)?;
        self.fragment_controller(&name, &mut HashSet::new())
    }

    /// Controller of a fragment. The first rule that yields a name wins:
    /// an including view, an including fragment (recursively), a project
    /// class mentioning the fragment, a manifest view extension.
    pub fn fragment_controller(&self, fragment_name: &str, visited: &mut HashSet<String>) -> Option<String> {
        if !visited.insert(fragment_name.to_string()) {
            return None;
        }
        let index = self.ws.index();

        if let Some(controller) = index
            .views()
            .iter()
            .filter(|v| v.includes_fragment(fragment_name))
            .find_map(|v| v.controller_name.clone())
        {
            return Some(controller);
        }

        for outer in index.fragments() {
            if !outer.includes_fragment(fragment_name) {
                continue;
            }
            let Some(outer_name) = index.document_name(&outer) else {
                continue;
            };
            if let Some(controller) = self.fragment_controller(&outer_name, visited) {
                return Some(controller);
            }
        }

        for class_name in self.ws.classes().project_class_names() {
            let mentions = self
                .ws
                .class(&class_name)
                .and_then(|def| def.source_text().map(|text| mentions_name(text, fragment_name)))
                .unwrap_or(false);
            if mentions {
                return Some(class_name);
            }
        }

        self.extension_controller(fragment_name)
    }

    fn extension_controller(&self, fragment_name: &str) -> Option<String> {
        let index = self.ws.index();
        for manifest in index.manifests() {
            for extension in manifest.view_extensions() {
                if extension.fragment_name != fragment_name {
                    continue;
                }
                let Some(view) = index
                    .resolve_fs_path(&extension.view_name, SourceKind::ViewMarkup)
                    .and_then(|path| index.document(&path))
                else {
                    debug!("Extended view {} not found", extension.view_name);
                    continue;
                };
                let Some(controller) = view.controller_name.clone() else {
                    continue;
                };
                let replaced = manifest.controller_replacement(&controller);
                return Some(replaced.unwrap_or(controller));
            }
        }
        None
    }

    /// Every cached view or fragment whose responsible controller is
    /// `controller`, ordered by path
    pub fn documents_for_controller(&self, controller: &str) -> Vec<Arc<MarkupDocument>> {
        self.controlled_documents()
            .into_iter()
            .filter(|(owner, _)| owner == controller)
            .map(|(_, doc)| doc)
            .collect()
    }

    /// Cached documents paired with their responsible controller
    fn controlled_documents(&self) -> Vec<(String, Arc<MarkupDocument>)> {
        self.ws
            .index()
            .documents()
            .into_iter()
            .filter_map(|doc| Some((self.responsible_controller(&doc)?, doc)))
            .collect()
    }

    /// Whether a binding of `name` in a document of `controller` calls a
    /// method that `class_name` owns. That holds for the controller itself
    /// and for its subclasses inheriting the method from `class_name`.
    fn binds_method_of(&self, controller: &str, name: &str, class_name: &str) -> bool {
        let walk = self.ws.resolver().find_member(controller, name);
        match walk.found {
            Some((def, i)) if def.members[i].is_method() => {
                controller == class_name || def.class_name == class_name
            }
            _ => false,
        }
    }

    /// Methods of `class_name` bound from event attributes, both in its own
    /// documents and in those of subclasses that inherit the method
    pub fn event_handlers(&self, class_name: &str) -> Arc<HashSet<String>> {
        if let Some(cached) = self.ws.xref_memo().handlers.read().get(class_name) {
            return Arc::clone(cached);
        }

        let mut handlers = HashSet::new();
        for (controller, doc) in self.controlled_documents() {
            for reference in doc.handler_references() {
                if handlers.contains(&reference.name) {
                    continue;
                }
                if self.binds_method_of(&controller, &reference.name, class_name) {
                    handlers.insert(reference.name);
                }
            }
        }

        let handlers = Arc::new(handlers);
        self.ws
            .xref_memo()
            .handlers
            .write()
            .insert(class_name.to_string(), Arc::clone(&handlers));
        handlers
    }

    pub fn is_event_handler(&self, class_name: &str, member: &str) -> bool {
        self.event_handlers(class_name).contains(member)
    }

    /// Class of the control with `id` in the markup reachable from
    /// `controller`: its views, fragments embedded in them, and fragments
    /// its source mentions.
    pub fn control_class_for_id(&self, controller: &str, id: &str) -> Option<String> {
        let index = self.ws.index();
        let mut queue: Vec<Arc<MarkupDocument>> = index.views_for_controller(controller);

        if let Some(text) = self
            .ws
            .class(controller)
            .and_then(|def| def.source_text().map(str::to_string))
        {
            for fragment in index.fragments() {
                let mentioned = index
                    .document_name(&fragment)
                    .is_some_and(|name| mentions_name(&text, &name));
                if mentioned {
                    queue.push(fragment);
                }
            }
        }

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut i = 0;
        while i < queue.len() {
            let doc = Arc::clone(&queue[i]);
            i += 1;
            if !seen.insert(doc.fs_path.clone()) {
                continue;
            }
            if let Some(class_name) = doc.class_for_id(id) {
                return Some(class_name.to_string());
            }
            for fragment_name in &doc.fragment_names {
                if let Some(fragment) = index.fragment_by_name(fragment_name) {
                    queue.push(fragment);
                }
            }
        }
        None
    }

    /// Edits renaming the bindings of `old_name` that reach the method
    /// declared by `declaring_class`, in its documents and in the documents
    /// of subclasses inheriting it
    pub fn handler_edits(&self, declaring_class: &str, old_name: &str, new_name: &str) -> Vec<Edit> {
        let mut edits = Vec::new();
        for (controller, doc) in self.controlled_documents() {
            let references: Vec<_> = doc
                .handler_references()
                .into_iter()
                .filter(|r| r.name == old_name)
                .collect();
            if references.is_empty() {
                continue;
            }
            let walk = self.ws.resolver().find_member(&controller, old_name);
            if walk.declaring_class() != Some(declaring_class) {
                continue;
            }
            for reference in references {
                edits.push(Edit::new(&doc.fs_path, reference.range, new_name));
            }
        }
        edits
    }
}

/// Whether `text` names `name` as a string literal
fn mentions_name(text: &str, name: &str) -> bool {
    text.contains(&format!("\"{name}\"")) || text.contains(&format!("'{name}'"))
}
