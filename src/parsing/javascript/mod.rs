//! JavaScript support: class extraction, expression chains and scopes

pub mod chain;
pub mod import;
pub mod parser;
pub mod scope;

pub use chain::{ChainHead, ChainSegment, ExpressionChain, expression_at};
pub use import::{Import, alias_table, module_to_class_name};
pub use parser::{JavaScriptParser, ParsedClass};
pub use scope::{Binding, find_binding};
