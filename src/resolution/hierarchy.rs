//! Parent-chain walks
//!
//! Chains are walked iteratively. A class is visited at most once and the
//! number of parent hops is bounded, so a cyclic or runaway chain ends the
//! walk instead of looping.

use crate::class_model::ClassDefinition;
use std::collections::HashSet;
use std::sync::Arc;

/// Result of looking a member up along a parent chain
#[derive(Debug, Clone)]
pub struct HierarchyWalk {
    /// Class declaring the member and the member's index in it
    pub found: Option<(Arc<ClassDefinition>, usize)>,
    /// Classes visited in order, starting with the queried class
    pub visited: Vec<String>,
}

impl HierarchyWalk {
    pub fn declaring_class(&self) -> Option<&str> {
        self.found.as_ref().map(|(def, _)| def.class_name.as_str())
    }
}

/// Limits of a walk
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits<'a> {
    pub max_hops: usize,
    /// The walk never continues past this class
    pub root_class: &'a str,
}

/// Find the class declaring `member`, starting at `class_name`.
pub fn find_member<F>(class_name: &str, member: &str, limits: WalkLimits<'_>, mut load: F) -> HierarchyWalk
where
    F: FnMut(&str) -> Option<Arc<ClassDefinition>>,
{
    let mut visited = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(class_name.to_string());
    let mut hops = 0;

    while let Some(name) = current.take() {
        if !seen.insert(name.clone()) {
            break;
        }
        visited.push(name.clone());

        let Some(def) = load(&name) else {
            break;
        };
        if let Some(index) = def.members.iter().position(|m| m.name == member) {
            return HierarchyWalk {
                found: Some((def, index)),
                visited,
            };
        }
        if name == limits.root_class || hops >= limits.max_hops {
            break;
        }
        hops += 1;
        current = def.parent_class_name.clone();
    }

    HierarchyWalk {
        found: None,
        visited,
    }
}

/// `class_name` followed by its ancestors, nearest first
pub fn ancestors<F>(class_name: &str, limits: WalkLimits<'_>, mut load: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<Arc<ClassDefinition>>,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(class_name.to_string());

    while let Some(name) = current.take() {
        if chain.len() > limits.max_hops || !seen.insert(name.clone()) {
            break;
        }
        chain.push(name.clone());
        if name == limits.root_class {
            break;
        }
        current = load(&name).and_then(|def| def.parent_class_name.clone());
    }
    chain
}

/// Whether `class_name` is `ancestor` or inherits from it
pub fn is_subclass_of<F>(class_name: &str, ancestor: &str, limits: WalkLimits<'_>, load: F) -> bool
where
    F: FnMut(&str) -> Option<Arc<ClassDefinition>>,
{
    ancestors(class_name, limits, load).iter().any(|c| c == ancestor)
}
