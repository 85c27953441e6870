//! Framework classes known only by metadata

use super::definition::{ClassDefinition, ClassOrigin, Member};
use crate::error::{CacheError, CacheResult};
use crate::types::MemberKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Catalog shipped with the crate
const BUNDLED_CATALOG: &str = include_str!("builtin_catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinMethod {
    pub name: String,
    #[serde(default, rename = "returnType", skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinField {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinClass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub methods: Vec<BuiltinMethod>,
    #[serde(default)]
    pub fields: Vec<BuiltinField>,
}

/// Member tables of framework classes, tagged with the framework version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinCatalog {
    pub version: String,
    #[serde(default)]
    pub classes: BTreeMap<String, BuiltinClass>,
}

impl BuiltinCatalog {
    pub fn bundled() -> CacheResult<Self> {
        serde_json::from_str(BUNDLED_CATALOG)
            .map_err(|e| CacheError::invalid(format!("bundled catalog: {e}")))
    }

    /// Load a metadata file in catalog format
    pub fn from_file(path: &Path) -> CacheResult<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| CacheError::io(path.to_path_buf(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| CacheError::invalid(format!("{}: {e}", path.display())))
    }

    /// Add the classes of `other`; classes present in both are replaced.
    pub fn merge(&mut self, other: BuiltinCatalog) {
        self.classes.extend(other.classes);
    }

    pub fn get(&self, class_name: &str) -> Option<&BuiltinClass> {
        self.classes.get(class_name)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Immutable stub definition for a builtin class
    pub fn definition(&self, class_name: &str) -> Option<ClassDefinition> {
        let class = self.get(class_name)?;

        let methods = class.methods.iter().map(|m| {
            Member::new(&m.name, MemberKind::Method).with_inferred_type(m.return_type.clone())
        });
        let fields = class.fields.iter().map(|f| {
            Member::new(&f.name, MemberKind::Field).with_inferred_type(f.field_type.clone())
        });

        Some(ClassDefinition {
            class_name: class_name.to_string(),
            parent_class_name: class.parent.clone(),
            members: methods.chain(fields).collect(),
            aliases: HashMap::new(),
            origin: ClassOrigin::Builtin,
        })
    }
}
