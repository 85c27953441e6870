use crate::types::{MemberKind, TypeResolution};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Memoized member type, keyed by the declaring class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub class_name: String,
    pub member: String,
    pub kind: MemberKind,
}

impl MemoKey {
    pub fn new(class_name: &str, member: &str, kind: MemberKind) -> Self {
        Self {
            class_name: class_name.to_string(),
            member: member.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot {
    /// Being computed; a request reaching it again is self-referential
    InProgress,
    Done {
        value: TypeResolution,
        /// Classes consulted while computing the value
        depends_on: Arc<HashSet<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoLookup {
    Missing,
    InProgress,
    Done {
        value: TypeResolution,
        depends_on: Arc<HashSet<String>>,
    },
}

/// Thread-safe member-type memo with dependency-based invalidation.
#[derive(Debug, Default)]
pub struct TypeMemo {
    inner: RwLock<HashMap<MemoKey, Slot>>,
}

impl TypeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &MemoKey) -> MemoLookup {
        match self.inner.read().get(key) {
            None => MemoLookup::Missing,
            Some(Slot::InProgress) => MemoLookup::InProgress,
            Some(Slot::Done { value, depends_on }) => MemoLookup::Done {
                value: value.clone(),
                depends_on: Arc::clone(depends_on),
            },
        }
    }

    /// Mark `key` as being computed
    pub fn begin(&self, key: MemoKey) {
        self.inner.write().insert(key, Slot::InProgress);
    }

    pub fn finish(&self, key: MemoKey, value: TypeResolution, depends_on: HashSet<String>) {
        self.inner.write().insert(
            key,
            Slot::Done {
                value,
                depends_on: Arc::new(depends_on),
            },
        );
    }

    /// Forget an in-progress marker without storing a value
    pub fn abandon(&self, key: &MemoKey) {
        let mut map = self.inner.write();
        if matches!(map.get(key), Some(Slot::InProgress)) {
            map.remove(key);
        }
    }

    /// Drop every entry of `class_name` and every entry computed from it.
    /// Returns the number of entries removed.
    pub fn invalidate_class(&self, class_name: &str) -> usize {
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|key, slot| {
            if key.class_name == class_name {
                return false;
            }
            match slot {
                Slot::Done { depends_on, .. } => !depends_on.contains(class_name),
                Slot::InProgress => true,
            }
        });
        before - map.len()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
