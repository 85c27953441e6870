//! Member-access chains
//!
//! `this.getView().byId("b1").getText` is represented as a head (`this`)
//! followed by segments: property `getView`, call, property `byId`, call with
//! string argument `"b1"`, property `getText`. Only expressions made of these
//! pieces have a chain; anything else is left unresolved.
//!
//! # Examples
//!
//! ```rust
//! use ui5_atlas::parsing::javascript::{ChainHead, ExpressionChain};
//!
//! let chain = ExpressionChain::this()
//!     .property("getView")
//!     .call(None)
//!     .property("byId")
//!     .call(Some("b1"));
//! assert_eq!(chain.head, ChainHead::This);
//! assert_eq!(chain.segments.len(), 4);
//! ```

use super::parser::{node_range, node_text, string_contents};
use crate::types::ByteRange;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainHead {
    This,
    Identifier(String),
    /// `new <constructor>(...)`; the constructor expression as written
    New(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSegment {
    Property { name: String, range: Option<ByteRange> },
    /// Call of the preceding segment; the first argument when it is a string
    Call { first_string_arg: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionChain {
    pub head: ChainHead,
    pub segments: Vec<ChainSegment>,
    /// Range of the whole expression, when built from source
    pub range: Option<ByteRange>,
}

impl ExpressionChain {
    pub fn new(head: ChainHead) -> Self {
        Self {
            head,
            segments: Vec::new(),
            range: None,
        }
    }

    pub fn this() -> Self {
        Self::new(ChainHead::This)
    }

    pub fn identifier(name: &str) -> Self {
        Self::new(ChainHead::Identifier(name.to_string()))
    }

    /// Appends a property access
    pub fn property(mut self, name: &str) -> Self {
        self.segments.push(ChainSegment::Property {
            name: name.to_string(),
            range: None,
        });
        self
    }

    /// Appends a call of the preceding segment
    pub fn call(mut self, first_string_arg: Option<&str>) -> Self {
        self.segments.push(ChainSegment::Call {
            first_string_arg: first_string_arg.map(str::to_string),
        });
        self
    }

    /// Name of the last property segment
    pub fn last_property(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            ChainSegment::Property { name, .. } => Some(name.as_str()),
            ChainSegment::Call { .. } => None,
        })
    }

    /// Build the chain for an expression node.
    pub fn from_node(node: Node, code: &str) -> Option<Self> {
        let mut chain = Self::build(node, code)?;
        chain.range = Some(node_range(node));
        Some(chain)
    }

    fn build(node: Node, code: &str) -> Option<Self> {
        match node.kind() {
            "this" => Some(Self::this()),
            "identifier" => Some(Self::identifier(node_text(node, code))),
            "new_expression" => {
                let constructor = node.child_by_field_name("constructor")?;
                let text: String = node_text(constructor, code)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                Some(Self::new(ChainHead::New(text)))
            }
            "parenthesized_expression" => Self::build(node.named_child(0)?, code),
            "member_expression" => {
                let object = node.child_by_field_name("object")?;
                let property = node.child_by_field_name("property")?;
                let mut chain = Self::build(object, code)?;
                chain.segments.push(ChainSegment::Property {
                    name: node_text(property, code).to_string(),
                    range: Some(node_range(property)),
                });
                Some(chain)
            }
            "call_expression" => {
                let function = node.child_by_field_name("function")?;
                let arguments = node.child_by_field_name("arguments")?;
                let mut chain = Self::build(function, code)?;
                let first_string_arg = arguments
                    .named_child(0)
                    .and_then(|arg| string_contents(arg, code))
                    .map(|(text, _)| text.to_string());
                chain.segments.push(ChainSegment::Call { first_string_arg });
                Some(chain)
            }
            _ => None,
        }
    }
}

/// The expression a cursor at `offset` designates: the innermost identifier,
/// `this` or member access containing the offset, extended by a call that
/// directly applies it.
pub fn expression_at(root: Node, offset: usize) -> Option<Node> {
    let mut node = super::parser::node_at(root, offset);

    if node.kind() == "property_identifier" {
        node = node.parent().filter(|p| p.kind() == "member_expression")?;
    } else if !matches!(node.kind(), "identifier" | "this") {
        return None;
    }

    if let Some(parent) = node.parent() {
        if parent.kind() == "call_expression"
            && parent.child_by_field_name("function").is_some_and(|f| f == node)
        {
            return Some(parent);
        }
    }
    Some(node)
}
