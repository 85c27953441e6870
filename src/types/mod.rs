use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Half-open byte range `[start, end)` into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Inclusive on both ends so a cursor placed right after a name still hits it.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl From<std::ops::Range<usize>> for ByteRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Kind of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Field,
}

impl FromStr for MemberKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "method" => Ok(MemberKind::Method),
            "field" => Ok(MemberKind::Field),
            _ => Err("Unknown member kind"),
        }
    }
}

/// Outcome of a static type query. Never a guess.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeResolution {
    Resolved(String),
    Unresolved,
}

impl TypeResolution {
    pub fn resolved(class_name: impl Into<String>) -> Self {
        Self::Resolved(class_name.into())
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Resolved(name) => Some(name),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Resolved(name) => Some(name),
            Self::Unresolved => None,
        }
    }
}

impl From<Option<String>> for TypeResolution {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => Self::Resolved(name),
            None => Self::Unresolved,
        }
    }
}

impl fmt::Display for TypeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(name) => f.write_str(name),
            Self::Unresolved => f.write_str("<unresolved>"),
        }
    }
}

/// A single text replacement in one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edit {
    pub file_path: PathBuf,
    pub range: ByteRange,
    pub replacement: String,
}

impl Edit {
    pub fn new(file_path: impl Into<PathBuf>, range: ByteRange, replacement: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            range,
            replacement: replacement.into(),
        }
    }

    /// Identity used for de-duplication: file plus range, replacement ignored.
    pub fn site(&self) -> (&Path, ByteRange) {
        (self.file_path.as_path(), self.range)
    }
}

/// A navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file_path: PathBuf,
    pub offset: usize,
}
