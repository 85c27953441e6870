//! Class definitions shared by every index

use crate::parsing::javascript::Import;
use crate::types::{ByteRange, MemberKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tree_sitter::Tree;

/// A declared method or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    /// Range of the member name at its declaration; `None` for builtin members
    pub declaration_range: Option<ByteRange>,
    /// Type known from the declaration alone (JSDoc tag, `new` initializer,
    /// builtin metadata). Resolution may still find a type when this is `None`.
    pub inferred_type: Option<String>,
    /// Function node of a method
    pub body_range: Option<ByteRange>,
    /// Initializer expression of a field declared in the class body
    pub value_range: Option<ByteRange>,
    /// Right-hand sides of `this.<name> = ...` assignments
    pub assignment_ranges: Vec<ByteRange>,
}

impl Member {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declaration_range: None,
            inferred_type: None,
            body_range: None,
            value_range: None,
            assignment_ranges: Vec::new(),
        }
    }

    pub fn with_declaration(mut self, range: ByteRange) -> Self {
        self.declaration_range = Some(range);
        self
    }

    pub fn with_inferred_type(mut self, type_name: Option<String>) -> Self {
        self.inferred_type = type_name;
        self
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }
}

/// Source backing a project-owned class.
#[derive(Debug)]
pub struct ProjectSource {
    pub fs_path: PathBuf,
    pub text: String,
    pub tree: Tree,
    /// SHA-256 of `text`
    pub content_hash: String,
    pub imports: Vec<Import>,
    /// Factory function of `sap.ui.define`; its parameters are aliases
    pub factory_range: Option<ByteRange>,
    /// Object literal holding the members
    pub body_range: Option<ByteRange>,
    /// Name passed to `extend`, if the file declares a class
    pub declared_name: Option<String>,
}

#[derive(Debug)]
pub enum ClassOrigin {
    Project(ProjectSource),
    Builtin,
}

/// A class known to the workspace.
#[derive(Debug)]
pub struct ClassDefinition {
    pub class_name: String,
    pub parent_class_name: Option<String>,
    pub members: Vec<Member>,
    /// Short name to fully qualified class name
    pub aliases: HashMap<String, String>,
    pub origin: ClassOrigin,
}

impl ClassDefinition {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    pub fn is_project(&self) -> bool {
        matches!(self.origin, ClassOrigin::Project(_))
    }

    pub fn project(&self) -> Option<&ProjectSource> {
        match &self.origin {
            ClassOrigin::Project(source) => Some(source),
            ClassOrigin::Builtin => None,
        }
    }

    pub fn source_text(&self) -> Option<&str> {
        self.project().map(|p| p.text.as_str())
    }

    pub fn fs_path(&self) -> Option<&Path> {
        self.project().map(|p| p.fs_path.as_path())
    }

    /// Fully qualified name for a short name used in this class
    pub fn resolve_alias(&self, short_name: &str) -> Option<&str> {
        self.aliases.get(short_name).map(String::as_str)
    }
}
