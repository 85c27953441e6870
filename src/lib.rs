//! Source model and static type resolution for UI5 workspaces
//!
//! The crate indexes component manifests, XML views and fragments, and
//! `sap.ui.define` modules, then answers editor-style queries over them:
//! the static type of an expression, the declaration of a member, the
//! controller behind a view, and the edit set of a member rename.

pub mod class_model;
pub mod config;
pub mod error;
pub mod indexing;
pub mod parsing;
pub mod rename;
pub mod resolution;
pub mod storage;
pub mod types;
pub mod workspace;
pub mod xref;

// Explicit exports for better API clarity
pub use class_model::{BuiltinCatalog, ClassDefinition, ClassOrigin, ClassRegistry, Member};
pub use config::Settings;
pub use error::{CacheError, CacheResult, WorkspaceError, WorkspaceResult};
pub use indexing::{IndexStats, scan_workspace};
pub use rename::{RenameTarget, apply_edits};
pub use resolution::{TypeMemo, TypeResolver};
pub use types::{ByteRange, Edit, Location, MemberKind, TypeResolution};
pub use workspace::{MemberInfo, Workspace, WorkspaceEvent};
pub use xref::CrossReference;
