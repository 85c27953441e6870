//! Event-handler bindings in markup attributes
//!
//! An attribute value names a controller method when it has one of the forms
//! `name`, `.name`, `name(...)` or `.name(...)`. Binding expressions in curly
//! braces never do. Whether the name is actually a handler is decided later
//! against the responsible controller's methods.

use super::tags::XmlTag;
use crate::types::ByteRange;

/// A candidate handler name inside an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReference {
    pub attribute: String,
    pub name: String,
    /// Absolute range of `name` in the document
    pub range: ByteRange,
}

/// Attributes that carry names but never bind events
fn is_structural_attribute(name: &str) -> bool {
    name == "id"
        || name == "controllerName"
        || name == "fragmentName"
        || name == "viewName"
        || name == "xmlns"
        || name.starts_with("xmlns:")
        || name.contains(":require")
}

/// Offsets `(start, end)` of the handler name within `value`, if the value
/// has a handler form.
pub fn handler_name_span(value: &str) -> Option<(usize, usize)> {
    let trimmed_start = value.len() - value.trim_start().len();
    let rest = value.trim();
    if rest.is_empty() || rest.starts_with('{') {
        return None;
    }

    let mut start = trimmed_start;
    let mut body = rest;
    if let Some(stripped) = body.strip_prefix('.') {
        start += 1;
        body = stripped;
    }

    let name_len = body
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    if name_len == 0 || body.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let tail = &body[name_len..];
    if !(tail.is_empty() || (tail.starts_with('(') && tail.ends_with(')'))) {
        return None;
    }

    Some((start, start + name_len))
}

/// Every attribute value in `tags` shaped like a handler reference.
pub fn handler_references(tags: &[XmlTag]) -> Vec<HandlerReference> {
    let mut refs = Vec::new();
    for tag in tags.iter().filter(|t| !t.is_closing) {
        for attr in &tag.attributes {
            if is_structural_attribute(&attr.name) {
                continue;
            }
            if let Some((start, end)) = handler_name_span(&attr.value) {
                refs.push(HandlerReference {
                    attribute: attr.name.clone(),
                    name: attr.value[start..end].to_string(),
                    range: ByteRange::new(attr.value_range.start + start, attr.value_range.start + end),
                });
            }
        }
    }
    refs
}
