//! Class model: project classes parsed from source, builtin stubs from metadata

pub mod builtin;
pub mod definition;
pub mod registry;
pub mod sha;

pub use builtin::{BuiltinCatalog, BuiltinClass, BuiltinField, BuiltinMethod};
pub use definition::{ClassDefinition, ClassOrigin, Member, ProjectSource};
pub use registry::{ClassRegistry, SourceUpdate};
pub use sha::compute_sha256;
