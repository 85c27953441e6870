//! Static type resolution for expression chains
//!
//! Resolution is best effort and never guesses: an expression gets a type
//! only when every piece of evidence agrees on one class. Conflicting or
//! missing evidence yields [`TypeResolution::Unresolved`].
//!
//! Member types (method return types, field types) are memoized per declaring
//! class in the workspace [`TypeMemo`](super::TypeMemo), together with the
//! set of classes consulted while computing them, so that editing a class
//! drops exactly the entries that were derived from it.

use super::hierarchy::{self, HierarchyWalk};
use super::memo::{MemoKey, MemoLookup};
use crate::class_model::{ClassDefinition, Member};
use crate::parsing::javascript::parser::{
    is_function_node, node_at, node_range, node_text, normalize_type_name, returned_expressions,
};
use crate::parsing::javascript::{Binding, ChainHead, ChainSegment, ExpressionChain, expression_at, find_binding};
use crate::types::{ByteRange, MemberKind, TypeResolution};
use crate::workspace::Workspace;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use tree_sitter::Node;

/// A `<object>.<name>` access whose object type is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub name: String,
    /// Range of `name`
    pub range: ByteRange,
    /// Static type of the object expression
    pub object_type: String,
    /// Class along `object_type`'s parent chain that declares `name`
    pub declaring_class: Option<String>,
}

/// A memo entry being computed.
#[derive(Debug, Default)]
struct Frame {
    /// Classes consulted so far
    depends_on: HashSet<String>,
    /// An entry still in progress was read as `Unresolved`
    cyclic: bool,
    /// The depth limit cut part of the computation off
    depth_limited: bool,
}

/// Resolver for one query. Cheap to create; all caching lives in the
/// workspace.
pub struct TypeResolver<'w> {
    ws: &'w Workspace,
    /// Memo entries being computed, outermost first
    frames: RefCell<Vec<Frame>>,
    depth: Cell<usize>,
}

impl<'w> TypeResolver<'w> {
    pub fn new(ws: &'w Workspace) -> Self {
        Self {
            ws,
            frames: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    fn record(&self, class_name: &str) {
        for frame in self.frames.borrow_mut().iter_mut() {
            if !frame.depends_on.contains(class_name) {
                frame.depends_on.insert(class_name.to_string());
            }
        }
    }

    fn mark_frames(&self, mark: impl Fn(&mut Frame)) {
        self.frames.borrow_mut().iter_mut().for_each(mark);
    }

    /// Class lookup that counts as a dependency of the entries in progress
    fn class(&self, class_name: &str) -> Option<Arc<ClassDefinition>> {
        self.record(class_name);
        self.ws.class(class_name)
    }

    fn is_project_class(&self, class_name: &str) -> bool {
        self.class(class_name).is_some_and(|def| def.is_project())
    }

    fn with_depth(&self, f: impl FnOnce() -> TypeResolution) -> TypeResolution {
        let depth = self.depth.get();
        if depth >= self.ws.settings().resolution.max_resolution_depth {
            debug!("Resolution depth limit reached");
            self.mark_frames(|frame| frame.depth_limited = true);
            return TypeResolution::Unresolved;
        }
        self.depth.set(depth + 1);
        let result = f();
        self.depth.set(depth);
        result
    }

    /// Walk the parent chain of `class_name` looking for `member`
    pub fn find_member(&self, class_name: &str, member: &str) -> HierarchyWalk {
        hierarchy::find_member(class_name, member, self.ws.walk_limits(), |name| self.class(name))
    }

    pub fn declaring_class(&self, class_name: &str, member: &str) -> Option<String> {
        self.find_member(class_name, member)
            .declaring_class()
            .map(str::to_string)
    }

    /// Resolve `chain` as written at `offset` inside `class_name`.
    pub fn resolve_chain(&self, class_name: &str, chain: &ExpressionChain, offset: usize) -> TypeResolution {
        let Some(def) = self.class(class_name) else {
            return TypeResolution::Unresolved;
        };
        self.with_depth(|| self.resolve_chain_in(&def, chain, offset))
    }

    /// Type of the expression under the cursor
    pub fn type_of_expression_at(&self, class_name: &str, offset: usize) -> TypeResolution {
        let Some(def) = self.class(class_name) else {
            return TypeResolution::Unresolved;
        };
        let Some(project) = def.project() else {
            return TypeResolution::Unresolved;
        };
        let root = project.tree.root_node();
        let Some(expr) = expression_at(root, offset) else {
            return TypeResolution::Unresolved;
        };

        // The name of a declaration has the type of its value
        if let Some(parent) = expr.parent() {
            if parent.kind() == "variable_declarator"
                && parent.child_by_field_name("name").is_some_and(|n| n == expr)
            {
                return parent
                    .child_by_field_name("value")
                    .map(|value| self.resolve_node(&def, value))
                    .unwrap_or(TypeResolution::Unresolved);
            }
        }
        self.resolve_node(&def, expr)
    }

    /// The member access whose property name covers `offset`
    pub fn member_access_at(&self, class_name: &str, offset: usize) -> Option<MemberAccess> {
        let def = self.class(class_name)?;
        let project = def.project()?;
        let node = node_at(project.tree.root_node(), offset);
        if node.kind() != "property_identifier" {
            return None;
        }
        let access = node.parent().filter(|p| p.kind() == "member_expression")?;
        self.member_access(&def, access)
    }

    /// Owner of a `member_expression` node taken from `def`'s tree
    pub fn member_access(&self, def: &ClassDefinition, access: Node) -> Option<MemberAccess> {
        let project = def.project()?;
        let object = access.child_by_field_name("object")?;
        let property = access.child_by_field_name("property")?;
        let name = node_text(property, &project.text).to_string();

        let object_type = self.resolve_node(def, object).into_option()?;
        let declaring_class = self.declaring_class(&object_type, &name);
        Some(MemberAccess {
            name,
            range: node_range(property),
            object_type,
            declaring_class,
        })
    }

    /// Return type of a method or type of a field, looked up along the
    /// parent chain
    pub fn member_type(&self, class_name: &str, member: &str) -> TypeResolution {
        let walk = self.find_member(class_name, member);
        match walk.found {
            Some((def, index)) if def.members[index].is_method() => {
                self.method_return_type(class_name, member)
            }
            Some(_) => self.field_type(class_name, member),
            None => TypeResolution::Unresolved,
        }
    }

    pub fn method_return_type(&self, class_name: &str, method: &str) -> TypeResolution {
        let Some((decl, index)) = self.find_member(class_name, method).found else {
            return TypeResolution::Unresolved;
        };
        let member = &decl.members[index];
        if member.kind != MemberKind::Method {
            return TypeResolution::Unresolved;
        }
        let key = MemoKey::new(&decl.class_name, method, MemberKind::Method);
        self.memoized(key, |r| r.compute_return_type(&decl, member))
    }

    pub fn field_type(&self, class_name: &str, field: &str) -> TypeResolution {
        let Some((decl, index)) = self.find_member(class_name, field).found else {
            return TypeResolution::Unresolved;
        };
        let member = &decl.members[index];
        if member.kind != MemberKind::Field {
            // A method read as a value is a function, not an instance
            return TypeResolution::Unresolved;
        }
        let key = MemoKey::new(&decl.class_name, field, MemberKind::Field);
        self.memoized(key, |r| r.compute_field_type(&decl, member))
    }

    /// Look `key` up in the workspace memo, computing it on a miss.
    ///
    /// A value that read an in-progress entry is only partial unless it is
    /// the outermost one of this query, and a value cut off by the depth
    /// limit is partial at any level. Partial values are returned but never
    /// stored, so the memo does not depend on query order.
    fn memoized(&self, key: MemoKey, compute: impl FnOnce(&Self) -> TypeResolution) -> TypeResolution {
        let memo = self.ws.type_memo();
        match memo.lookup(&key) {
            MemoLookup::Done { value, depends_on } => {
                for class_name in depends_on.iter() {
                    self.record(class_name);
                }
                return value;
            }
            MemoLookup::InProgress => {
                debug!("Recursive type of {}.{}", key.class_name, key.member);
                self.mark_frames(|frame| frame.cyclic = true);
                return TypeResolution::Unresolved;
            }
            MemoLookup::Missing => {}
        }

        memo.begin(key.clone());
        self.frames.borrow_mut().push(Frame {
            depends_on: HashSet::from([key.class_name.clone()]),
            ..Frame::default()
        });
        let value = compute(self);
        let (frame, outermost) = {
            let mut frames = self.frames.borrow_mut();
            let frame = frames.pop().unwrap_or_default();
            (frame, frames.is_empty())
        };

        if frame.depth_limited || (frame.cyclic && !outermost) {
            debug!("Not storing partial type of {}.{}", key.class_name, key.member);
            memo.abandon(&key);
        } else {
            memo.finish(key, value.clone(), frame.depends_on);
        }
        value
    }

    fn compute_return_type(&self, decl: &ClassDefinition, member: &Member) -> TypeResolution {
        if let Some(seeded) = &member.inferred_type {
            return TypeResolution::resolved(seeded.clone());
        }
        let (Some(project), Some(body)) = (decl.project(), member.body_range) else {
            return TypeResolution::Unresolved;
        };
        let Some(function) = project
            .tree
            .root_node()
            .descendant_for_byte_range(body.start, body.end)
            .filter(|n| is_function_node(*n))
        else {
            return TypeResolution::Unresolved;
        };

        let returned = returned_expressions(function);
        agree(returned.into_iter().map(|expr| self.resolve_node(decl, expr)))
    }

    fn compute_field_type(&self, decl: &ClassDefinition, member: &Member) -> TypeResolution {
        if let Some(seeded) = &member.inferred_type {
            return TypeResolution::resolved(seeded.clone());
        }
        let Some(project) = decl.project() else {
            return TypeResolution::Unresolved;
        };
        let root = project.tree.root_node();
        let values = member
            .value_range
            .iter()
            .chain(member.assignment_ranges.iter())
            .filter_map(|range| root.descendant_for_byte_range(range.start, range.end))
            .collect::<Vec<_>>();
        agree(values.into_iter().map(|value| self.resolve_node(decl, value)))
    }

    /// Type of an expression node from `def`'s syntax tree
    pub fn resolve_node(&self, def: &ClassDefinition, node: Node) -> TypeResolution {
        let Some(project) = def.project() else {
            return TypeResolution::Unresolved;
        };
        match node.kind() {
            "parenthesized_expression" => node
                .named_child(0)
                .map(|inner| self.resolve_node(def, inner))
                .unwrap_or(TypeResolution::Unresolved),
            "assignment_expression" => node
                .child_by_field_name("right")
                .map(|right| self.resolve_node(def, right))
                .unwrap_or(TypeResolution::Unresolved),
            "ternary_expression" => agree(
                ["consequence", "alternative"]
                    .into_iter()
                    .filter_map(|field| node.child_by_field_name(field))
                    .map(|branch| self.resolve_node(def, branch)),
            ),
            _ => match ExpressionChain::from_node(node, &project.text) {
                Some(chain) => self.with_depth(|| self.resolve_chain_in(def, &chain, node.start_byte())),
                None => TypeResolution::Unresolved,
            },
        }
    }

    fn resolve_chain_in(&self, def: &ClassDefinition, chain: &ExpressionChain, offset: usize) -> TypeResolution {
        let (mut current, rest) = match &chain.head {
            ChainHead::This => (Some(def.class_name.clone()), &chain.segments[..]),
            ChainHead::New(constructor) => (constructor_type(def, constructor), &chain.segments[..]),
            ChainHead::Identifier(name) => {
                let (head, consumed) = self.resolve_identifier(def, name, offset, &chain.segments);
                (head.into_option(), &chain.segments[consumed..])
            }
        };

        // Controller whose view was obtained by the previous call
        let mut view_of: Option<String> = None;
        let mut i = 0;
        while i < rest.len() {
            let Some(owner) = current.take() else {
                return TypeResolution::Unresolved;
            };
            match &rest[i] {
                ChainSegment::Property { name, .. } => {
                    if let Some(ChainSegment::Call { first_string_arg }) = rest.get(i + 1) {
                        current = self
                            .call_result(&owner, name, first_string_arg.as_deref(), &mut view_of)
                            .into_option();
                        i += 2;
                    } else {
                        view_of = None;
                        current = self.field_type(&owner, name).into_option();
                        i += 1;
                    }
                }
                ChainSegment::Call { .. } => return TypeResolution::Unresolved,
            }
        }
        current.into()
    }

    fn call_result(
        &self,
        owner: &str,
        method: &str,
        first_string_arg: Option<&str>,
        view_of: &mut Option<String>,
    ) -> TypeResolution {
        let view_controller = view_of.take();

        if method == "byId" {
            if let Some(id) = first_string_arg {
                let controller = view_controller
                    .or_else(|| self.is_project_class(owner).then(|| owner.to_string()));
                if let Some(controller) = controller {
                    self.record(&controller);
                    if let Some(class_name) = self.ws.xref().control_class_for_id(&controller, id) {
                        return TypeResolution::Resolved(class_name);
                    }
                }
            }
        }

        let result = self.method_return_type(owner, method);
        if method == "getView" && self.is_project_class(owner) {
            *view_of = Some(owner.to_string());
        }
        result
    }

    /// Head identifier: local bindings, then the alias table, then a dotted
    /// global name. Returns the number of segments consumed by a dotted name.
    fn resolve_identifier(
        &self,
        def: &ClassDefinition,
        name: &str,
        offset: usize,
        segments: &[ChainSegment],
    ) -> (TypeResolution, usize) {
        if let Some(project) = def.project() {
            let root = project.tree.root_node();
            match find_binding(root, &project.text, offset, name, project.factory_range) {
                Binding::Variable { values } => {
                    let resolved = agree(values.into_iter().map(|v| self.resolve_node(def, v)));
                    return (resolved, 0);
                }
                Binding::Parameter { doc_type } => {
                    let resolved = doc_type.and_then(|t| normalize_type_name(&t, &def.aliases));
                    return (resolved.into(), 0);
                }
                Binding::FactoryParameter | Binding::Unbound => {}
            }
        }

        if let Some(full) = def.resolve_alias(name) {
            return (TypeResolution::resolved(full), 0);
        }

        let mut candidate = name.to_string();
        for (i, segment) in segments.iter().enumerate() {
            let ChainSegment::Property { name: part, .. } = segment else {
                break;
            };
            candidate.push('.');
            candidate.push_str(part);
            if self.class(&candidate).is_some() {
                return (TypeResolution::Resolved(candidate), i + 1);
            }
        }
        (TypeResolution::Unresolved, 0)
    }
}

/// The single class all resolved candidates agree on. Unresolved candidates
/// carry no evidence; two different classes make the result unresolved.
fn agree(candidates: impl IntoIterator<Item = TypeResolution>) -> TypeResolution {
    let mut found: Option<String> = None;
    for candidate in candidates {
        let TypeResolution::Resolved(name) = candidate else {
            continue;
        };
        match &found {
            None => found = Some(name),
            Some(existing) if *existing == name => {}
            Some(_) => return TypeResolution::Unresolved,
        }
    }
    found.into()
}

/// Class instantiated by `new <constructor>(...)`
fn constructor_type(def: &ClassDefinition, constructor: &str) -> Option<String> {
    if let Some(full) = def.resolve_alias(constructor) {
        return Some(full.to_string());
    }
    constructor.contains('.').then(|| constructor.to_string())
}
