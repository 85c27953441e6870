//! Type resolution over the class model
//!
//! - [`hierarchy`]: bounded parent-chain walks
//! - [`memo`]: member-type memo with dependency tracking
//! - [`engine`]: expression chains to class names

pub mod engine;
pub mod hierarchy;
pub mod memo;

pub use engine::{MemberAccess, TypeResolver};
pub use hierarchy::{HierarchyWalk, WalkLimits, ancestors, find_member, is_subclass_of};
pub use memo::{MemoKey, MemoLookup, TypeMemo};
