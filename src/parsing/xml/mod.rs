//! Markup scanning for XML views and fragments

pub mod handlers;
pub mod tags;

pub use handlers::{HandlerReference, handler_name_span, handler_references};
pub use tags::{XmlAttribute, XmlTag, tokenize};
