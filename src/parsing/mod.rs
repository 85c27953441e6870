//! Source parsing for scripts and markup
//!
//! Scripts are parsed with tree-sitter; markup goes through a lenient tag
//! tokenizer that survives malformed documents.

pub mod javascript;
pub mod xml;

pub use javascript::{ExpressionChain, JavaScriptParser};
pub use xml::{XmlTag, tokenize};
