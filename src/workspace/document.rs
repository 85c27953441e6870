//! Cached view and fragment documents
//!
//! A [`MarkupDocument`] is immutable once built. Editing a file replaces the
//! whole `Arc<MarkupDocument>` in the index, which also drops the lazily built
//! tag list and id map of the previous content.

use crate::parsing::xml::{self, HandlerReference, XmlTag};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, OnceLock};

static CONTROLLER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"controllerName\s*=\s*["']([^"']+)["']"#).expect("Invalid regex")
});

static FRAGMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"fragmentName\s*=\s*["']([^"']+)["']"#).expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    View,
    Fragment,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".fragment.xml") {
            Some(Self::Fragment)
        } else if name.ends_with(".view.xml") {
            Some(Self::View)
        } else {
            None
        }
    }
}

/// A view or fragment with its derived, lazily computed maps.
#[derive(Debug)]
pub struct MarkupDocument {
    pub fs_path: PathBuf,
    pub kind: DocumentKind,
    pub content: String,
    /// `controllerName` of a view; always `None` for fragments
    pub controller_name: Option<String>,
    /// Fragments included by this document, in order of appearance
    pub fragment_names: Vec<String>,
    tags: OnceLock<Vec<XmlTag>>,
    id_map: OnceLock<HashMap<String, String>>,
    parse_count: AtomicUsize,
}

impl MarkupDocument {
    pub fn new(fs_path: impl Into<PathBuf>, kind: DocumentKind, content: impl Into<String>) -> Self {
        let content = content.into();

        let controller_name = match kind {
            DocumentKind::View => CONTROLLER_NAME
                .captures(&content)
                .map(|c| c[1].trim().to_string()),
            DocumentKind::Fragment => None,
        };

        let mut fragment_names: Vec<String> = Vec::new();
        for caps in FRAGMENT_NAME.captures_iter(&content) {
            let name = caps[1].trim().to_string();
            if !fragment_names.contains(&name) {
                fragment_names.push(name);
            }
        }

        Self {
            fs_path: fs_path.into(),
            kind,
            content,
            controller_name,
            fragment_names,
            tags: OnceLock::new(),
            id_map: OnceLock::new(),
            parse_count: AtomicUsize::new(0),
        }
    }

    /// Tag list, tokenized on first use
    pub fn tags(&self) -> &[XmlTag] {
        self.tags.get_or_init(|| {
            self.parse_count.fetch_add(1, Ordering::Relaxed);
            xml::tokenize(&self.content)
        })
    }

    /// How many times the content was tokenized. Stays at most 1 for the
    /// lifetime of a document.
    pub fn parse_count(&self) -> usize {
        self.parse_count.load(Ordering::Relaxed)
    }

    /// Namespace prefix declarations; the empty key holds the default namespace.
    /// The first declaration of a prefix wins.
    pub fn namespaces(&self) -> HashMap<String, String> {
        let mut namespaces = HashMap::new();
        for tag in self.tags() {
            for attr in &tag.attributes {
                let prefix = if attr.name == "xmlns" {
                    ""
                } else if let Some(prefix) = attr.name.strip_prefix("xmlns:") {
                    prefix
                } else {
                    continue;
                };
                namespaces
                    .entry(prefix.to_string())
                    .or_insert_with(|| attr.value.clone());
            }
        }
        namespaces
    }

    /// Control id to fully qualified class name, built on first use
    pub fn id_class_map(&self) -> &HashMap<String, String> {
        self.id_map.get_or_init(|| {
            let namespaces = self.namespaces();
            let mut map = HashMap::new();
            for tag in self.tags().iter().filter(|t| !t.is_closing) {
                let Some(id) = tag.attribute_value("id") else {
                    continue;
                };
                let Some(namespace) = namespaces.get(tag.prefix().unwrap_or("")) else {
                    continue;
                };
                map.entry(id.to_string())
                    .or_insert_with(|| format!("{namespace}.{}", tag.local_name()));
            }
            map
        })
    }

    pub fn class_for_id(&self, id: &str) -> Option<&str> {
        self.id_class_map().get(id).map(String::as_str)
    }

    /// Handler-shaped attribute values
    pub fn handler_references(&self) -> Vec<HandlerReference> {
        xml::handler_references(self.tags())
    }

    pub fn includes_fragment(&self, fragment_name: &str) -> bool {
        self.fragment_names.iter().any(|f| f == fragment_name)
    }
}
