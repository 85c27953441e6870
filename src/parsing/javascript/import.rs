//! Module dependencies of `sap.ui.define` / `sap.ui.require`
//!
//! Dependencies are module paths (`sap/m/Button`, `./BaseController`). Paired
//! positionally with the factory parameters they form the alias table used to
//! turn short names in a file into fully qualified class names.

use crate::types::ByteRange;
use std::collections::HashMap;

/// One entry of the dependency array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module path as written
    pub path: String,
    /// Dotted class name the path stands for
    pub class_name: String,
    /// Factory parameter bound to this dependency
    pub alias: Option<String>,
    /// Range of the string literal contents
    pub range: ByteRange,
}

/// Convert a module path into a dotted class name.
///
/// Relative paths are resolved against `current_module`, the dotted name of
/// the file declaring the dependency. A relative path without a current
/// module cannot be resolved.
pub fn module_to_class_name(path: &str, current_module: Option<&str>) -> Option<String> {
    let path = path.trim().trim_end_matches(".js");
    if path.is_empty() {
        return None;
    }

    if !(path.starts_with("./") || path.starts_with("../")) {
        return Some(path.replace('/', "."));
    }

    let mut segments: Vec<&str> = current_module?.split('.').collect();
    // The module itself is not a directory
    segments.pop();

    for part in path.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

/// Short name to class name, for every dependency bound to a parameter
pub fn alias_table(imports: &[Import]) -> HashMap<String, String> {
    imports
        .iter()
        .filter_map(|import| {
            import
                .alias
                .as_ref()
                .map(|alias| (alias.clone(), import.class_name.clone()))
        })
        .collect()
}
