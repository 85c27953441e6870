//! Member rename propagation
//!
//! A rename produces edits for the declaration, for every member access
//! whose object resolves to the renamed member's class, and for event-handler
//! bindings in the views and fragments of the class and of subclasses that
//! inherit the member. Accesses whose owner cannot be resolved are left
//! alone.

use crate::error::{WorkspaceError, WorkspaceResult};
use crate::parsing::javascript::parser::{node_text, walk_preorder};
use crate::types::{ByteRange, Edit};
use crate::workspace::{FileRole, Workspace};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The member a rename applies to and where it is declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameTarget {
    pub class_name: String,
    pub member_name: String,
    pub fs_path: PathBuf,
    /// Range of the member name at its declaration
    pub range: ByteRange,
}

/// Resolve the member under the cursor to its project declaration.
///
/// Works on a declaration, on a member access whose owner resolves, and on
/// an event-handler binding in markup.
pub fn prepare_rename(ws: &Workspace, fs_path: &Path, offset: usize) -> WorkspaceResult<RenameTarget> {
    let nothing = || WorkspaceError::NothingToRename {
        path: fs_path.to_path_buf(),
        offset,
    };

    let (class_name, member_name) = match FileRole::of(fs_path) {
        FileRole::Script => {
            let def = ws.class_for_path(fs_path).ok_or_else(nothing)?;
            let declared = def
                .members
                .iter()
                .find(|m| m.declaration_range.is_some_and(|r| r.contains(offset)));
            match declared {
                Some(member) => (def.class_name.clone(), member.name.clone()),
                None => {
                    let access = ws
                        .resolver()
                        .member_access_at(&def.class_name, offset)
                        .ok_or_else(nothing)?;
                    (access.object_type, access.name)
                }
            }
        }
        FileRole::Markup => {
            let doc = ws.index().document(fs_path).ok_or_else(nothing)?;
            let reference = doc
                .handler_references()
                .into_iter()
                .find(|r| r.range.contains(offset))
                .ok_or_else(nothing)?;
            let controller = ws.xref().responsible_controller(&doc).ok_or_else(nothing)?;
            (controller, reference.name)
        }
        FileRole::Manifest | FileRole::Other => return Err(nothing()),
    };

    let (declaring, index) = ws
        .resolver()
        .find_member(&class_name, &member_name)
        .found
        .ok_or_else(nothing)?;
    let member = &declaring.members[index];
    match (declaring.fs_path(), member.declaration_range) {
        (Some(path), Some(range)) => Ok(RenameTarget {
            class_name: declaring.class_name.clone(),
            member_name: member.name.clone(),
            fs_path: path.to_path_buf(),
            range,
        }),
        // Builtin members cannot be renamed
        _ => Err(nothing()),
    }
}

/// Edits renaming `target` to `new_name`, deduplicated by file and range
/// in order of discovery.
pub fn rename_member(ws: &Workspace, target: &RenameTarget, new_name: &str) -> Vec<Edit> {
    let old_name = target.member_name.as_str();
    let mut edits = vec![Edit::new(&target.fs_path, target.range, new_name)];

    // Classes parsed while resolving below do not join this rename
    let snapshot: Vec<_> = ws
        .classes()
        .project_class_names()
        .iter()
        .filter_map(|name| ws.classes().cached(name))
        .collect();

    let resolver = ws.resolver();
    for def in &snapshot {
        let Some(project) = def.project() else {
            continue;
        };

        let mut accesses = Vec::new();
        walk_preorder(project.tree.root_node(), &mut |node| {
            if node.kind() == "member_expression" {
                let named_old = node
                    .child_by_field_name("property")
                    .is_some_and(|p| node_text(p, &project.text) == old_name);
                if named_old {
                    accesses.push(node);
                }
            }
            true
        });

        for access in accesses {
            let Some(resolved) = resolver.member_access(def, access) else {
                debug!("Skipping unresolved access in {}", def.class_name);
                continue;
            };
            if resolved.declaring_class.as_deref() == Some(target.class_name.as_str()) {
                edits.push(Edit::new(&project.fs_path, resolved.range, new_name));
            }
        }
    }

    edits.extend(ws.xref().handler_edits(&target.class_name, old_name, new_name));

    dedup_edits(edits)
}

/// Keep the first edit per `(file, range)`
pub fn dedup_edits(edits: Vec<Edit>) -> Vec<Edit> {
    let mut seen = HashSet::new();
    edits
        .into_iter()
        .filter(|edit| seen.insert((edit.file_path.clone(), edit.range)))
        .collect()
}

/// Edits grouped per file, files in path order
pub fn group_by_file(edits: &[Edit]) -> BTreeMap<PathBuf, Vec<Edit>> {
    let mut groups: BTreeMap<PathBuf, Vec<Edit>> = BTreeMap::new();
    for edit in edits {
        groups
            .entry(edit.file_path.clone())
            .or_default()
            .push(edit.clone());
    }
    groups
}

/// Apply one file's edits to its text. Edits are applied back to front so
/// earlier ranges stay valid; edits outside the text are skipped.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    let mut result = text.to_string();
    for edit in ordered {
        let range = edit.range.start..edit.range.end;
        if result.get(range.clone()).is_some() {
            result.replace_range(range, &edit.replacement);
        }
    }
    result
}
