//! JavaScript class extraction
//!
//! Recognizes the framework's class idiom:
//!
//! ```js
//! sap.ui.define(["sap/ui/core/mvc/Controller"], function (Controller) {
//!     return Controller.extend("App.controller.Main", {
//!         onPress: function (oEvent) {}
//!     });
//! });
//! ```
//!
//! and plain modules returning an object literal (formatters, utilities).
//! Everything here is syntactic; types that need other classes are left to
//! the resolution engine.

use super::import::{Import, alias_table, module_to_class_name};
use crate::class_model::Member;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::types::{ByteRange, MemberKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tree_sitter::{Language, Node, Parser, Tree};

const FUNCTION_KINDS: &[&str] = &[
    "function_expression",
    "function",
    "function_declaration",
    "arrow_function",
    "method_definition",
    "generator_function",
    "generator_function_declaration",
];

const DEFINE_CALLEES: &[&str] = &["sap.ui.define", "sap.ui.require"];

/// Type names that never denote a framework or project class
const NON_CLASS_TYPES: &[&str] = &[
    "any", "array", "Array", "bigint", "boolean", "Boolean", "Date", "Error", "float", "function",
    "Function", "int", "Map", "null", "number", "Number", "object", "Object", "Promise", "RegExp",
    "Set", "string", "String", "symbol", "this", "undefined", "void", "*",
];

static JSDOC_RETURNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@returns?\s*\{([^}]+)\}").expect("Invalid regex"));

static JSDOC_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@type\s*\{([^}]+)\}").expect("Invalid regex"));

static JSDOC_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@param\s*\{([^}]+)\}\s*\[?([A-Za-z_$][\w$]*)").expect("Invalid regex")
});

pub fn is_function_node(node: Node) -> bool {
    FUNCTION_KINDS.contains(&node.kind())
}

pub fn node_text<'a>(node: Node, code: &'a str) -> &'a str {
    code.get(node.byte_range()).unwrap_or("")
}

pub fn node_range(node: Node) -> ByteRange {
    node.byte_range().into()
}

/// Contents of a string literal without its quotes
pub fn string_contents<'a>(node: Node, code: &'a str) -> Option<(&'a str, ByteRange)> {
    if node.kind() != "string" || node.end_byte() < node.start_byte() + 2 {
        return None;
    }
    let range = ByteRange::new(node.start_byte() + 1, node.end_byte() - 1);
    range.slice(code).map(|text| (text, range))
}

/// Smallest node covering `offset`
pub fn node_at(root: Node, offset: usize) -> Node {
    root.descendant_for_byte_range(offset, offset).unwrap_or(root)
}

/// Visit `node` and its descendants in source order. Returning `false` from
/// `visit` skips the children of that node.
pub fn walk_preorder<'t>(node: Node<'t>, visit: &mut impl FnMut(Node<'t>) -> bool) {
    if !visit(node) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_preorder(child, &mut *visit);
    }
}

/// Expressions returned by a function, excluding those of nested functions.
/// An arrow function with an expression body returns that expression.
pub fn returned_expressions(function: Node) -> Vec<Node> {
    let Some(body) = function.child_by_field_name("body") else {
        return Vec::new();
    };
    if body.kind() != "statement_block" {
        return vec![body];
    }

    let mut found = Vec::new();
    walk_preorder(body, &mut |node| {
        if is_function_node(node) || node.kind() == "class_declaration" {
            return false;
        }
        if node.kind() == "return_statement" {
            if let Some(expr) = node.named_child(0) {
                found.push(expr);
            }
            return false;
        }
        true
    });
    found
}

/// `/** ... */` comment directly preceding a declaration.
///
/// For a function used as a pair value the comment sits before the pair;
/// for a function in a variable declaration it sits before the statement.
pub fn leading_doc_comment<'a>(node: Node, code: &'a str) -> Option<&'a str> {
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        match parent.kind() {
            "pair" | "variable_declarator" | "lexical_declaration" | "variable_declaration"
            | "expression_statement" | "assignment_expression" => anchor = parent,
            _ => break,
        }
        if matches!(anchor.kind(), "pair" | "lexical_declaration" | "variable_declaration") {
            break;
        }
    }

    let prev = anchor.prev_named_sibling()?;
    let text = node_text(prev, code);
    (prev.kind() == "comment" && text.starts_with("/**")).then_some(text)
}

/// Class name for a JSDoc type expression, if it denotes exactly one class.
pub fn normalize_type_name(raw: &str, aliases: &HashMap<String, String>) -> Option<String> {
    let raw = raw.trim().trim_start_matches("module:");
    if raw.is_empty()
        || raw.contains(['|', '<', '(', '[', '{', ' ', '?', '!'])
        || NON_CLASS_TYPES.contains(&raw)
    {
        return None;
    }
    let raw = raw.replace('/', ".");
    if let Some(full) = aliases.get(&raw) {
        return Some(full.clone());
    }
    raw.contains('.').then_some(raw)
}

/// `@returns {T}` / `@return {T}`
pub fn jsdoc_return_type(doc: &str) -> Option<&str> {
    JSDOC_RETURNS.captures(doc).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// `@type {T}`
pub fn jsdoc_field_type(doc: &str) -> Option<&str> {
    JSDOC_TYPE.captures(doc).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// `@param {T} name`
pub fn jsdoc_param_type<'a>(doc: &'a str, param: &str) -> Option<&'a str> {
    JSDOC_PARAM
        .captures_iter(doc)
        .find(|c| c.get(2).is_some_and(|m| m.as_str() == param))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Dotted name of a constructor or class reference expression
/// (`Button`, `sap.m.Button`), resolved through `aliases`.
pub fn class_reference(node: Node, code: &str, aliases: &HashMap<String, String>) -> Option<String> {
    match node.kind() {
        "identifier" => aliases.get(node_text(node, code)).cloned(),
        "member_expression" => {
            let text: String = node_text(node, code)
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let valid = text
                .split('.')
                .all(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'));
            valid.then_some(text)
        }
        "parenthesized_expression" => node
            .named_child(0)
            .and_then(|inner| class_reference(inner, code, aliases)),
        _ => None,
    }
}

/// Syntactic facts about one script file.
#[derive(Debug)]
pub struct ParsedClass {
    pub tree: Tree,
    pub declared_name: Option<String>,
    pub parent_class_name: Option<String>,
    pub imports: Vec<Import>,
    pub aliases: HashMap<String, String>,
    pub members: Vec<Member>,
    pub factory_range: Option<ByteRange>,
    pub body_range: Option<ByteRange>,
}

/// tree-sitter based parser for project scripts
pub struct JavaScriptParser {
    parser: Parser,
}

impl std::fmt::Debug for JavaScriptParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaScriptParser").finish_non_exhaustive()
    }
}

impl JavaScriptParser {
    pub fn new() -> WorkspaceResult<Self> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_javascript::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| WorkspaceError::ParserInit {
                language: "javascript".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { parser })
    }

    pub fn parse_tree(&mut self, code: &str) -> Option<Tree> {
        self.parser.parse(code, None)
    }

    /// Extract the class model of a script. `module_name` is the dotted
    /// name derived from the file path; relative dependencies resolve
    /// against it.
    pub fn parse_class(&mut self, module_name: &str, code: &str) -> Option<ParsedClass> {
        let tree = self.parse_tree(code)?;
        let root = tree.root_node();

        let (imports, factory) = match find_define_call(root, code) {
            Some(call) => extract_define(call, code, module_name),
            None => (Vec::new(), None),
        };
        let aliases = alias_table(&imports);

        let scope = factory.unwrap_or(root);
        let mut parent_class_name = None;
        let mut declared_name = None;
        let body = match find_extend_call(scope, code) {
            Some(extend) => {
                declared_name = Some(extend.class_name.to_string());
                parent_class_name = class_reference(extend.parent, code, &aliases);
                extend.body
            }
            None => factory.and_then(|f| returned_object(f, code)),
        };

        let mut members = Vec::new();
        if let Some(body) = body {
            collect_declared_members(body, code, &aliases, &mut members);
            collect_this_assignments(body, code, &mut members);
        }

        Some(ParsedClass {
            declared_name,
            parent_class_name,
            imports,
            aliases,
            members,
            factory_range: factory.map(node_range),
            body_range: body.map(node_range),
            tree,
        })
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn find_define_call<'t>(root: Node<'t>, code: &str) -> Option<Node<'t>> {
    let mut found = None;
    walk_preorder(root, &mut |node| {
        if found.is_some() {
            return false;
        }
        if node.kind() == "call_expression" {
            if let Some(callee) = node.child_by_field_name("function") {
                if DEFINE_CALLEES.contains(&compact(node_text(callee, code)).as_str()) {
                    found = Some(node);
                    return false;
                }
            }
        }
        true
    });
    found
}

/// Dependencies paired with factory parameters, and the factory itself
fn extract_define<'t>(call: Node<'t>, code: &str, module_name: &str) -> (Vec<Import>, Option<Node<'t>>) {
    let Some(args) = call.child_by_field_name("arguments") else {
        return (Vec::new(), None);
    };

    let mut cursor = args.walk();
    let named: Vec<Node> = args.named_children(&mut cursor).collect();
    let deps = named.iter().find(|n| n.kind() == "array").copied();
    let factory = named.iter().find(|n| is_function_node(**n)).copied();

    let params: Vec<String> = factory
        .map(|f| parameter_names(f, code))
        .unwrap_or_default();

    let mut imports = Vec::new();
    if let Some(deps) = deps {
        let mut cursor = deps.walk();
        for (position, dep) in deps.named_children(&mut cursor).enumerate() {
            let Some((path, range)) = string_contents(dep, code) else {
                continue;
            };
            let Some(class_name) = module_to_class_name(path, Some(module_name)) else {
                continue;
            };
            imports.push(Import {
                path: path.to_string(),
                class_name,
                alias: params.get(position).cloned(),
                range,
            });
        }
    }

    (imports, factory)
}

/// Parameter identifiers of a function, in order. Destructured parameters
/// keep their position with an empty name.
pub fn parameter_names(function: Node, code: &str) -> Vec<String> {
    parameter_nodes(function)
        .into_iter()
        .map(|p| p.map(|n| node_text(n, code).to_string()).unwrap_or_default())
        .collect()
}

/// Identifier node of each parameter; `None` for patterns without one
pub fn parameter_nodes(function: Node) -> Vec<Option<Node>> {
    if let Some(single) = function.child_by_field_name("parameter") {
        return vec![Some(single)];
    }
    let Some(params) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "comment")
        .map(|p| match p.kind() {
            "identifier" => Some(p),
            "assignment_pattern" => p
                .child_by_field_name("left")
                .filter(|l| l.kind() == "identifier"),
            "rest_pattern" => p.named_child(0).filter(|n| n.kind() == "identifier"),
            _ => None,
        })
        .collect()
}

struct ExtendCall<'t> {
    class_name: &'t str,
    parent: Node<'t>,
    body: Option<Node<'t>>,
}

fn find_extend_call<'t>(scope: Node<'t>, code: &'t str) -> Option<ExtendCall<'t>> {
    let mut found = None;
    walk_preorder(scope, &mut |node| {
        if found.is_some() {
            return false;
        }
        if node.kind() != "call_expression" {
            return true;
        }
        let Some(callee) = node.child_by_field_name("function") else {
            return true;
        };
        if callee.kind() != "member_expression" {
            return true;
        }
        let is_extend = callee
            .child_by_field_name("property")
            .is_some_and(|p| node_text(p, code) == "extend");
        let (Some(parent), Some(args)) = (
            callee.child_by_field_name("object"),
            node.child_by_field_name("arguments"),
        ) else {
            return true;
        };
        if !is_extend {
            return true;
        }

        let mut cursor = args.walk();
        let named: Vec<Node> = args.named_children(&mut cursor).collect();
        if let Some((class_name, _)) = named.first().and_then(|n| string_contents(*n, code)) {
            found = Some(ExtendCall {
                class_name,
                parent,
                body: named.get(1).copied().filter(|n| n.kind() == "object"),
            });
            return false;
        }
        true
    });
    found
}

/// Object literal a plain module returns, directly or through a variable
fn returned_object<'t>(factory: Node<'t>, code: &str) -> Option<Node<'t>> {
    for expr in returned_expressions(factory) {
        match expr.kind() {
            "object" => return Some(expr),
            "identifier" => {
                let name = node_text(expr, code);
                let body = factory.child_by_field_name("body")?;
                let mut found = None;
                walk_preorder(body, &mut |node| {
                    if found.is_some() || (is_function_node(node) && node != factory) {
                        return false;
                    }
                    if node.kind() == "variable_declarator"
                        && node
                            .child_by_field_name("name")
                            .is_some_and(|n| node_text(n, code) == name)
                    {
                        found = node
                            .child_by_field_name("value")
                            .filter(|v| v.kind() == "object");
                    }
                    true
                });
                if found.is_some() {
                    return found;
                }
            }
            _ => {}
        }
    }
    None
}

/// Name and name range of a pair key
fn key_name<'a>(key: Node, code: &'a str) -> Option<(&'a str, ByteRange)> {
    match key.kind() {
        "property_identifier" | "identifier" => Some((node_text(key, code), node_range(key))),
        "string" => string_contents(key, code),
        _ => None,
    }
}

fn collect_declared_members(
    body: Node,
    code: &str,
    aliases: &HashMap<String, String>,
    members: &mut Vec<Member>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let (name, range, value, function) = match child.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (
                    child.child_by_field_name("key"),
                    child.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let Some((name, range)) = key_name(key, code) else {
                    continue;
                };
                let function = is_function_node(value).then_some(value);
                (name, range, Some(value), function)
            }
            "method_definition" => {
                let Some((name, range)) = child
                    .child_by_field_name("name")
                    .and_then(|n| key_name(n, code))
                else {
                    continue;
                };
                (name, range, None, Some(child))
            }
            _ => continue,
        };

        if members.iter().any(|m: &Member| m.name == name) {
            continue;
        }

        let doc = leading_doc_comment(function.unwrap_or(child), code)
            .or_else(|| leading_doc_comment(child, code));

        let member = if let Some(function) = function {
            let mut member = Member::new(name, MemberKind::Method)
                .with_declaration(range)
                .with_inferred_type(
                    doc.and_then(jsdoc_return_type)
                        .and_then(|t| normalize_type_name(t, aliases)),
                );
            member.body_range = Some(node_range(function));
            member
        } else {
            let initializer_type = value
                .filter(|v| v.kind() == "new_expression")
                .and_then(|v| v.child_by_field_name("constructor"))
                .and_then(|c| class_reference(c, code, aliases));
            let doc_type = doc
                .and_then(jsdoc_field_type)
                .and_then(|t| normalize_type_name(t, aliases));
            let mut member = Member::new(name, MemberKind::Field)
                .with_declaration(range)
                .with_inferred_type(doc_type.or(initializer_type));
            member.value_range = value.map(node_range);
            member
        };
        members.push(member);
    }
}

/// `this.<name> = <expr>` anywhere inside the class body
fn collect_this_assignments(body: Node, code: &str, members: &mut Vec<Member>) {
    walk_preorder(body, &mut |node| {
        if node.kind() != "assignment_expression" {
            return true;
        }
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return true;
        };
        if left.kind() != "member_expression"
            || !left
                .child_by_field_name("object")
                .is_some_and(|o| o.kind() == "this")
        {
            return true;
        }
        let Some(property) = left.child_by_field_name("property") else {
            return true;
        };
        let name = node_text(property, code);

        match members.iter_mut().find(|m| m.name == name) {
            Some(member) => member.assignment_ranges.push(node_range(right)),
            None => {
                let mut member =
                    Member::new(name, MemberKind::Field).with_declaration(node_range(property));
                member.assignment_ranges.push(node_range(right));
                members.push(member);
            }
        }
        true
    });
}
