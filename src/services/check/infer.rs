//! Expression typing
//!
//! Enough typing to resolve selectors: declared types, composite literals,
//! `&`/`*`/`<-`, `new`/`make`/`append`, conversions and assertions, call
//! results by position, index and slice expressions, field selections and
//! method expressions. Everything else is `Ty::Unknown`.

use tree_sitter::Node;

use super::{Checker, Member, ObjectId, Ty};
use crate::infra::ast::named_children;
use crate::infra::ast::node_types as kind;
use crate::models::symbol::{ObjectKind, Owner};

impl<'a> Checker<'a> {
    /// Type denoted by a type expression.
    pub(super) fn type_of(&mut self, node: Node<'a>) -> Ty {
        match node.kind() {
            kind::TYPE_IDENTIFIER | kind::IDENTIFIER => self.named_type(node),
            kind::QUALIFIED_TYPE => self
                .qualified_member(node, ObjectKind::TypeName)
                .map_or(Ty::Unknown, Ty::Named),
            kind::POINTER_TYPE => match named_children(node).first() {
                Some(inner) => Ty::Pointer(Box::new(self.type_of(*inner))),
                None => Ty::Unknown,
            },
            kind::PARENTHESIZED_TYPE | kind::TYPE_ELEM => match named_children(node).first() {
                Some(inner) => self.type_of(*inner),
                None => Ty::Unknown,
            },
            kind::GENERIC_TYPE => match node.child_by_field_name("type") {
                Some(base) => self.type_of(base),
                None => Ty::Unknown,
            },
            kind::STRUCT_TYPE => Ty::Struct(self.struct_fields(node)),
            kind::SLICE_TYPE | kind::ARRAY_TYPE | kind::IMPLICIT_LENGTH_ARRAY_TYPE => {
                Ty::Slice(Box::new(self.field_type(node, "element")))
            }
            kind::MAP_TYPE => Ty::Map(
                Box::new(self.field_type(node, "key")),
                Box::new(self.field_type(node, "value")),
            ),
            kind::CHANNEL_TYPE => Ty::Chan(Box::new(self.field_type(node, "value"))),
            _ => Ty::Unknown,
        }
    }

    fn field_type(&mut self, node: Node<'a>, field: &str) -> Ty {
        node.child_by_field_name(field)
            .map_or(Ty::Unknown, |ty| self.type_of(ty))
    }

    /// Whether an expression denotes a type, as in `T.M` or `(*T).M`.
    fn denotes_type(&mut self, node: Node<'a>) -> bool {
        match node.kind() {
            kind::IDENTIFIER => self
                .lookup(self.text(node))
                .is_some_and(|id| self.object(id).kind == ObjectKind::TypeName),
            kind::PARENTHESIZED_EXPRESSION => named_children(node)
                .first()
                .is_some_and(|inner| self.denotes_type(*inner)),
            kind::UNARY_EXPRESSION => {
                node.child_by_field_name("operator").map(|op| self.text(op)) == Some("*")
                    && node
                        .child_by_field_name("operand")
                        .is_some_and(|operand| self.denotes_type(operand))
            }
            _ => false,
        }
    }

    fn named_type(&mut self, node: Node<'a>) -> Ty {
        match self.lookup(self.text(node)) {
            Some(id) if self.object(id).kind == ObjectKind::TypeName => Ty::Named(id),
            _ => Ty::Unknown,
        }
    }

    /// Member object for `pkg.Name` when `pkg` names an import.
    pub(super) fn qualified_member(&mut self, node: Node<'a>, kind: ObjectKind) -> Option<ObjectId> {
        let package = node.child_by_field_name("package")?;
        let name = node.child_by_field_name("name")?;
        let (_, path) = self.package_qualifier(package)?;
        Some(self.member(Owner::Imported(path), self.text(name), kind))
    }

    /// The import an operand identifier names, with its path.
    pub(super) fn package_qualifier(&mut self, operand: Node<'a>) -> Option<(ObjectId, String)> {
        if !matches!(operand.kind(), kind::IDENTIFIER | kind::PACKAGE_IDENTIFIER) {
            return None;
        }
        let id = self.lookup(self.text(operand))?;
        let path = self.object(id).imported.clone()?;
        Some((id, path))
    }

    /// Type of a value expression.
    pub(super) fn infer(&mut self, expr: Node<'a>) -> Ty {
        match expr.kind() {
            kind::IDENTIFIER => match self.lookup(self.text(expr)) {
                Some(id) if self.object(id).kind == ObjectKind::Var => {
                    self.var_types.get(&id).cloned().unwrap_or(Ty::Unknown)
                }
                // operand of a method expression
                Some(id) if self.object(id).kind == ObjectKind::TypeName => Ty::Named(id),
                _ => Ty::Unknown,
            },
            kind::PARENTHESIZED_EXPRESSION => match named_children(expr).first() {
                Some(inner) => self.infer(*inner),
                None => Ty::Unknown,
            },
            kind::COMPOSITE_LITERAL
            | kind::TYPE_CONVERSION_EXPRESSION
            | kind::TYPE_ASSERTION_EXPRESSION => {
                match expr.child_by_field_name("type") {
                    Some(ty) => self.type_of(ty),
                    None => Ty::Unknown,
                }
            }
            kind::UNARY_EXPRESSION => {
                let Some(operand) = expr.child_by_field_name("operand") else {
                    return Ty::Unknown;
                };
                let operator = expr.child_by_field_name("operator").map(|op| self.text(op));
                match operator {
                    Some("&") => Ty::Pointer(Box::new(self.infer(operand))),
                    Some("*") if self.denotes_type(operand) => {
                        Ty::Pointer(Box::new(self.conversion_type(operand)))
                    }
                    Some("*") => match self.infer(operand) {
                        Ty::Pointer(inner) => *inner,
                        _ => Ty::Unknown,
                    },
                    Some("<-") => {
                        let channel = self.infer(operand);
                        match self.underlying(&channel) {
                            Ty::Chan(elem) => *elem,
                            _ => Ty::Unknown,
                        }
                    }
                    _ => Ty::Unknown,
                }
            }
            kind::INDEX_EXPRESSION => match expr.child_by_field_name("operand") {
                Some(operand) => {
                    let container = self.infer(operand);
                    self.element(&container)
                }
                None => Ty::Unknown,
            },
            kind::SLICE_EXPRESSION => match expr.child_by_field_name("operand") {
                Some(operand) => match self.infer(operand) {
                    Ty::Pointer(array) => self.underlying(&array),
                    ty => ty,
                },
                None => Ty::Unknown,
            },
            kind::PARENTHESIZED_TYPE | kind::POINTER_TYPE => self.type_of(expr),
            kind::CALL_EXPRESSION => self.infer_call(expr),
            kind::SELECTOR_EXPRESSION => match self.selected(expr) {
                Some(id) if self.object(id).kind == ObjectKind::Var => {
                    self.var_types.get(&id).cloned().unwrap_or(Ty::Unknown)
                }
                _ => Ty::Unknown,
            },
            _ => Ty::Unknown,
        }
    }

    /// Types of the values a var spec, `:=` or assignment right-hand side
    /// produces for `count` names.
    pub(super) fn infer_values(&mut self, values: &[Node<'a>], count: usize) -> Vec<Ty> {
        if values.len() == count {
            return values.iter().map(|value| self.infer(*value)).collect();
        }
        let types = match values {
            [call] if call.kind() == kind::CALL_EXPRESSION => self.call_results(*call),
            // comma-ok forms: v, ok := m[k], x.(T), <-ch
            [value] if count == 2 => vec![self.infer(*value), Ty::Unknown],
            _ => Vec::new(),
        };
        if types.len() == count {
            types
        } else {
            vec![Ty::Unknown; count]
        }
    }

    fn infer_call(&mut self, call: Node<'a>) -> Ty {
        let mut results = self.call_results(call);
        match results.len() {
            1 => results.remove(0),
            _ => Ty::Unknown,
        }
    }

    /// Result types of a call, conversions and builtins included.
    fn call_results(&mut self, call: Node<'a>) -> Vec<Ty> {
        let Some(function) = call.child_by_field_name("function") else {
            return Vec::new();
        };
        let first_argument = call
            .child_by_field_name("arguments")
            .and_then(|args| named_children(args).first().copied());
        match function.kind() {
            kind::IDENTIFIER => {
                let Some(id) = self.lookup(self.text(function)) else {
                    return Vec::new();
                };
                let object = self.object(id);
                let (object_kind, name) = (object.kind, object.name.clone());
                match (object_kind, name.as_str()) {
                    (ObjectKind::Builtin, "new") => match first_argument {
                        Some(ty) => vec![Ty::Pointer(Box::new(self.type_of(ty)))],
                        None => Vec::new(),
                    },
                    (ObjectKind::Builtin, "make") => match first_argument {
                        Some(ty) => vec![self.type_of(ty)],
                        None => Vec::new(),
                    },
                    (ObjectKind::Builtin, "append") => match first_argument {
                        Some(slice) => vec![self.infer(slice)],
                        None => Vec::new(),
                    },
                    (ObjectKind::Func, _) => self.results.get(&id).cloned().unwrap_or_default(),
                    (ObjectKind::TypeName, _) => vec![Ty::Named(id)],
                    _ => Vec::new(),
                }
            }
            kind::SELECTOR_EXPRESSION => match self.selected(function) {
                Some(id) if self.object(id).kind == ObjectKind::Func => {
                    self.results.get(&id).cloned().unwrap_or_default()
                }
                _ => Vec::new(),
            },
            kind::PARENTHESIZED_EXPRESSION | kind::PARENTHESIZED_TYPE => {
                match named_children(function).first() {
                    Some(inner) => vec![self.conversion_type(*inner)],
                    None => Vec::new(),
                }
            }
            kind::SLICE_TYPE | kind::ARRAY_TYPE | kind::MAP_TYPE | kind::CHANNEL_TYPE => {
                vec![self.type_of(function)]
            }
            _ => Vec::new(),
        }
    }

    /// `(*T)` in a conversion parses as an expression.
    fn conversion_type(&mut self, node: Node<'a>) -> Ty {
        match node.kind() {
            kind::UNARY_EXPRESSION => {
                let operator = node.child_by_field_name("operator").map(|op| self.text(op));
                match (operator, node.child_by_field_name("operand")) {
                    (Some("*"), Some(operand)) => {
                        Ty::Pointer(Box::new(self.conversion_type(operand)))
                    }
                    _ => Ty::Unknown,
                }
            }
            kind::PARENTHESIZED_EXPRESSION => match named_children(node).first() {
                Some(inner) => self.conversion_type(*inner),
                None => Ty::Unknown,
            },
            _ => self.type_of(node),
        }
    }

    /// Object a non-package selector selects, without recording anything.
    fn selected(&mut self, selector: Node<'a>) -> Option<ObjectId> {
        let operand = selector.child_by_field_name("operand")?;
        let field = selector.child_by_field_name("field")?;
        if self.package_qualifier(operand).is_some() {
            return None;
        }
        let ty = self.infer(operand);
        match self.lookup_member(&ty, self.text(field), 0) {
            Member::Found(id) => Some(id),
            Member::Unknown(_) | Member::Missing => None,
        }
    }
}
