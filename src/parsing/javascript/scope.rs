//! Lexical variable lookup
//!
//! Function bodies form a stack of scopes around an offset, innermost first,
//! with the program as the outermost. A name is looked up scope by scope; the
//! first scope that declares it wins and hides every outer declaration.
//! Block scoping of `let`/`const` is not modelled: a declaration anywhere in
//! a function body (outside nested functions) belongs to that function.

use super::parser::{is_function_node, leading_doc_comment, node_at, node_text, parameter_nodes, walk_preorder};
use crate::types::ByteRange;
use tree_sitter::Node;

/// What a name refers to at some offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding<'t> {
    /// Parameter of the module factory, bound to a dependency
    FactoryParameter,
    /// Parameter of any other function, with its JSDoc type if documented
    Parameter { doc_type: Option<String> },
    /// Local variable with the expressions assigned to it before the offset,
    /// in source order. Empty when declared without a value.
    Variable { values: Vec<Node<'t>> },
    Unbound,
}

/// Enclosing function nodes of `offset`, innermost first
pub fn enclosing_functions(root: Node, offset: usize) -> Vec<Node> {
    let mut scopes = Vec::new();
    let mut current = Some(node_at(root, offset));
    while let Some(node) = current {
        if is_function_node(node) {
            scopes.push(node);
        }
        current = node.parent();
    }
    scopes
}

/// Resolve `name` at `offset`.
pub fn find_binding<'t>(
    root: Node<'t>,
    code: &str,
    offset: usize,
    name: &str,
    factory_range: Option<ByteRange>,
) -> Binding<'t> {
    let mut scopes = enclosing_functions(root, offset);
    scopes.push(root);

    for scope in scopes {
        if let Some(values) = declared_values(scope, code, offset, name) {
            return Binding::Variable { values };
        }

        if !is_function_node(scope) {
            continue;
        }
        let declares_param = parameter_nodes(scope)
            .into_iter()
            .flatten()
            .any(|p| node_text(p, code) == name);
        if declares_param {
            if factory_range == Some(scope.byte_range().into()) {
                return Binding::FactoryParameter;
            }
            let doc_type = leading_doc_comment(scope, code)
                .and_then(|doc| super::parser::jsdoc_param_type(doc, name))
                .map(str::to_string);
            return Binding::Parameter { doc_type };
        }
    }

    Binding::Unbound
}

/// Values bound to `name` in `scope` before `offset`, or `None` when the
/// scope does not declare it.
fn declared_values<'t>(scope: Node<'t>, code: &str, offset: usize, name: &str) -> Option<Vec<Node<'t>>> {
    let body = if is_function_node(scope) {
        scope.child_by_field_name("body")?
    } else {
        scope
    };

    let mut declared = false;
    let mut values = Vec::new();
    walk_preorder(body, &mut |node| {
        if node.start_byte() >= offset {
            return false;
        }
        if is_function_node(node) {
            // A function declaration binds its name in the enclosing scope
            if node.kind() == "function_declaration"
                && node
                    .child_by_field_name("name")
                    .is_some_and(|n| node_text(n, code) == name)
            {
                declared = true;
            }
            return false;
        }
        match node.kind() {
            "variable_declarator" => {
                let matches = node
                    .child_by_field_name("name")
                    .is_some_and(|n| n.kind() == "identifier" && node_text(n, code) == name);
                if matches {
                    declared = true;
                    if let Some(value) = node.child_by_field_name("value") {
                        values.push(value);
                    }
                }
            }
            "assignment_expression" => {
                let matches = node
                    .child_by_field_name("left")
                    .is_some_and(|l| l.kind() == "identifier" && node_text(l, code) == name);
                if matches {
                    if let Some(value) = node.child_by_field_name("right") {
                        values.push(value);
                    }
                }
            }
            _ => {}
        }
        true
    });

    declared.then_some(values)
}
