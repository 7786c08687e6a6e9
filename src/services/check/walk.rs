//! Second pass: function bodies and type expressions
//!
//! Visits every file with a stack of block scopes and records a use for each
//! identifier in expression or type position.

use std::collections::HashMap;
use std::ops::ControlFlow;

use tree_sitter::Node;

use super::collect::{generic_receiver, receiver_type_params, specs, type_specs};
use super::{Checker, Member, Ty};
use crate::infra::ast::node_types as kind;
use crate::infra::ast::parser::default_package_name;
use crate::infra::ast::{self, Visit, field_children, has_token, named_children};
use crate::models::symbol::{Object, ObjectKind, Owner, is_exported};

impl<'a> Checker<'a> {
    pub(super) fn walk(&mut self) {
        for file in 0..self.files.len() {
            self.file = file;
            for decl in named_children(self.root(file)) {
                self.walk_top_level(decl);
            }
            self.report_unused_imports();
        }
    }

    fn walk_top_level(&mut self, decl: Node<'a>) {
        match decl.kind() {
            kind::PACKAGE_CLAUSE | kind::IMPORT_DECLARATION | kind::COMMENT => {}
            kind::FUNCTION_DECLARATION | kind::METHOD_DECLARATION => self.visit_func(decl),
            kind::TYPE_DECLARATION => {
                for spec in type_specs(decl) {
                    self.visit_type_spec(spec);
                }
            }
            kind::CONST_DECLARATION => {
                for spec in specs(decl, kind::CONST_SPEC) {
                    self.visit_spec_values(spec);
                }
            }
            kind::VAR_DECLARATION => {
                for spec in specs(decl, kind::VAR_SPEC) {
                    self.visit_spec_values(spec);
                }
            }
            _ => self.visit(decl),
        }
    }

    fn visit(&mut self, node: Node<'a>) {
        match node.kind() {
            kind::IDENTIFIER
            | kind::TYPE_IDENTIFIER
            | kind::PACKAGE_IDENTIFIER
            | kind::TRUE
            | kind::FALSE
            | kind::NIL
            | kind::IOTA => self.use_name(node),
            kind::LABEL_NAME => self.use_label(node),
            kind::FIELD_IDENTIFIER | kind::BLANK_IDENTIFIER | kind::COMMENT => {}
            kind::FUNC_LITERAL => self.visit_func(node),
            kind::FUNCTION_TYPE => self.with_scope(|this| this.declare_signature(node)),
            kind::TYPE_SWITCH_STATEMENT => self.visit_type_switch(node),
            k if kind::opens_scope(k) => self.with_scope(|this| this.visit_children(node)),
            kind::SHORT_VAR_DECLARATION => self.visit_short_var(node),
            kind::RANGE_CLAUSE | kind::RECEIVE_STATEMENT => self.visit_range(node),
            kind::LABELED_STATEMENT => {
                for child in named_children(node) {
                    if child.kind() != kind::LABEL_NAME {
                        self.visit(child);
                    }
                }
            }
            kind::CONST_DECLARATION => {
                for spec in specs(node, kind::CONST_SPEC) {
                    self.visit_local_spec(spec, ObjectKind::Const);
                }
            }
            kind::VAR_DECLARATION => {
                for spec in specs(node, kind::VAR_SPEC) {
                    self.visit_local_spec(spec, ObjectKind::Var);
                }
            }
            kind::TYPE_DECLARATION => {
                for spec in type_specs(node) {
                    self.visit_local_type(spec);
                }
            }
            kind::SELECTOR_EXPRESSION => self.visit_selector(node),
            kind::QUALIFIED_TYPE => self.visit_qualified(node),
            kind::COMPOSITE_LITERAL => self.visit_composite(node),
            kind::STRUCT_TYPE => {
                self.struct_fields(node);
                self.visit_children(node);
            }
            kind::FIELD_DECLARATION => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty);
                }
            }
            kind::METHOD_ELEM | kind::METHOD_SPEC => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.interface_method(node, name);
                }
                self.with_scope(|this| this.declare_signature(node));
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node<'a>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn use_name(&mut self, node: Node<'a>) {
        let name = self.text(node);
        if name == "_" {
            return;
        }
        if let Some(id) = self.lookup(name) {
            self.record_use(node, id);
            return;
        }
        // Without export data a name can only be attributed to a dot
        // import when there is exactly one.
        match self.file_scopes[self.file].dot_imports.as_slice() {
            [path] => {
                let owner = Owner::Imported(path.clone());
                let id = self.member(owner, name, guess_kind(node));
                self.record_use(node, id);
            }
            [] => self.warn(node, format!("undefined: {name}")),
            _ => self.warn(node, format!("undefined: {name} (ambiguous dot imports)")),
        }
    }

    /// Functions, methods and function literals share one scope for
    /// receiver, type parameters, parameters, results and body.
    fn visit_func(&mut self, func: Node<'a>) {
        let body = func.child_by_field_name("body");
        self.labels.push(HashMap::new());
        if let Some(body) = body {
            self.declare_labels(body);
        }
        self.with_scope(|this| {
            if let Some(receiver) = func.child_by_field_name("receiver") {
                this.declare_receiver(receiver);
            }
            this.declare_type_params(func.child_by_field_name("type_parameters"));
            this.declare_signature(func);
            if let Some(body) = body {
                this.visit_children(body);
            }
        });
        self.labels.pop();
    }

    fn declare_signature(&mut self, func: Node<'a>) {
        if let Some(params) = func.child_by_field_name("parameters") {
            self.declare_params(params);
        }
        match func.child_by_field_name("result") {
            Some(result) if result.kind() == kind::PARAMETER_LIST => self.declare_params(result),
            Some(result) => self.visit(result),
            None => {}
        }
    }

    /// Parameter types resolve in the enclosing scope, so all types are
    /// visited before any name is declared.
    fn declare_params(&mut self, list: Node<'a>) {
        let params: Vec<_> = named_children(list)
            .into_iter()
            .filter(|p| {
                matches!(
                    p.kind(),
                    kind::PARAMETER_DECLARATION | kind::VARIADIC_PARAMETER_DECLARATION
                )
            })
            .collect();

        let mut types = Vec::with_capacity(params.len());
        for param in &params {
            let ty = match param.child_by_field_name("type") {
                Some(ty) => {
                    self.visit(ty);
                    let declared = self.type_of(ty);
                    if param.kind() == kind::VARIADIC_PARAMETER_DECLARATION {
                        Ty::Slice(Box::new(declared))
                    } else {
                        declared
                    }
                }
                None => Ty::Unknown,
            };
            types.push(ty);
        }

        for (param, ty) in params.into_iter().zip(types) {
            for name in field_children(param, "name") {
                let id = self.declare(name, ObjectKind::Var);
                self.var_types.insert(id, ty.clone());
            }
        }
    }

    fn declare_receiver(&mut self, receiver: Node<'a>) {
        for param in named_children(receiver) {
            if param.kind() != kind::PARAMETER_DECLARATION {
                continue;
            }
            let Some(ty) = param.child_by_field_name("type") else {
                continue;
            };
            match generic_receiver(ty) {
                Some(generic) => {
                    for name in receiver_type_params(generic) {
                        self.declare(name, ObjectKind::TypeName);
                    }
                    if let Some(base) = generic.child_by_field_name("type") {
                        self.visit(base);
                    }
                }
                None => self.visit(ty),
            }
            let receiver_type = self.type_of(ty);
            for name in field_children(param, "name") {
                let id = self.declare(name, ObjectKind::Var);
                self.var_types.insert(id, receiver_type.clone());
            }
        }
    }

    fn declare_type_params(&mut self, list: Option<Node<'a>>) {
        let Some(list) = list else {
            return;
        };
        let decls: Vec<_> = named_children(list)
            .into_iter()
            .filter(|d| d.kind() == kind::TYPE_PARAMETER_DECLARATION)
            .collect();
        for decl in &decls {
            for name in field_children(*decl, "name") {
                self.declare(name, ObjectKind::TypeName);
            }
        }
        for decl in decls {
            if let Some(constraint) = decl.child_by_field_name("type") {
                self.visit(constraint);
            }
        }
    }

    /// Labels are visible in the whole function body, nested function
    /// literals excluded.
    fn declare_labels(&mut self, body: Node<'a>) {
        let mut labels = Vec::new();
        let _: Option<()> = ast::walk(body, |node| {
            match node.kind() {
                kind::FUNC_LITERAL => return ControlFlow::Continue(Visit::Skip),
                kind::LABELED_STATEMENT => labels.extend(node.child_by_field_name("label")),
                _ => {}
            }
            ControlFlow::Continue(Visit::Descend)
        });

        for label in labels {
            let name = self.text(label);
            let id = self.new_object(Object::new(ObjectKind::Label, name, Owner::Local));
            self.define(label, id);
            let Some(scope) = self.labels.last_mut() else {
                continue;
            };
            if scope.contains_key(name) {
                self.warn(label, format!("label {name} already defined"));
            } else {
                scope.insert(name.to_string(), id);
            }
        }
    }

    fn use_label(&mut self, node: Node<'a>) {
        let name = self.text(node);
        match self.labels.last().and_then(|labels| labels.get(name)).copied() {
            Some(id) => self.record_use(node, id),
            None => self.warn(node, format!("label {name} not defined")),
        }
    }

    fn visit_type_spec(&mut self, spec: Node<'a>) {
        self.with_scope(|this| {
            this.declare_type_params(spec.child_by_field_name("type_parameters"));
            if let Some(ty) = spec.child_by_field_name("type") {
                this.visit(ty);
            }
        });
    }

    /// Local types are in scope from their name on, so they may refer to
    /// themselves.
    fn visit_local_type(&mut self, spec: Node<'a>) {
        let Some(name) = spec.child_by_field_name("name") else {
            return;
        };
        let id = self.declare(name, ObjectKind::TypeName);
        self.collect_type(spec, id);
        self.visit_type_spec(spec);
    }

    fn visit_spec_values(&mut self, spec: Node<'a>) {
        if let Some(ty) = spec.child_by_field_name("type") {
            self.visit(ty);
        }
        if let Some(value) = spec.child_by_field_name("value") {
            self.visit(value);
        }
    }

    /// Local constants and variables are in scope after their spec.
    fn visit_local_spec(&mut self, spec: Node<'a>, object_kind: ObjectKind) {
        self.visit_spec_values(spec);
        let types = self.spec_types(spec);
        for (name, ty) in field_children(spec, "name").into_iter().zip(types) {
            let id = self.declare(name, object_kind);
            if object_kind == ObjectKind::Var {
                self.var_types.insert(id, ty);
            }
        }
    }

    fn visit_short_var(&mut self, node: Node<'a>) {
        let right = node.child_by_field_name("right");
        if let Some(right) = right {
            self.visit(right);
        }
        let values = right.map(named_children).unwrap_or_default();
        let names = node
            .child_by_field_name("left")
            .map(named_children)
            .unwrap_or_default();
        let types = self.infer_values(&values, names.len());

        let mut fresh = 0;
        for (name, ty) in names.into_iter().zip(types) {
            if name.kind() != kind::IDENTIFIER {
                self.visit(name);
                continue;
            }
            let text = self.text(name);
            if text == "_" {
                continue;
            }
            let existing = self.scopes.last().and_then(|scope| scope.get(text)).copied();
            match existing {
                Some(id) => self.record_use(name, id),
                None => {
                    let id = self.declare(name, ObjectKind::Var);
                    self.var_types.insert(id, ty);
                    fresh += 1;
                }
            }
        }
        if fresh == 0 {
            self.warn(node, "no new variables on left side of :=".to_string());
        }
    }

    fn visit_range(&mut self, node: Node<'a>) {
        let right = node.child_by_field_name("right");
        if let Some(right) = right {
            self.visit(right);
        }
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if !has_token(node, ":=") {
            self.visit(left);
            return;
        }

        let names = named_children(left);
        let mut types = match right {
            Some(right) if node.kind() == kind::RANGE_CLAUSE => self.range_types(right),
            Some(right) => vec![self.infer(right), Ty::Unknown],
            None => Vec::new(),
        };
        types.resize(names.len(), Ty::Unknown);
        for (name, ty) in names.into_iter().zip(types) {
            if name.kind() == kind::IDENTIFIER {
                let id = self.declare(name, ObjectKind::Var);
                self.var_types.insert(id, ty);
            }
        }
    }

    /// Key and value types of `range expr`.
    fn range_types(&mut self, expr: Node<'a>) -> Vec<Ty> {
        let ranged = self.infer(expr);
        let ranged = match self.underlying(&ranged) {
            Ty::Pointer(array) => self.underlying(&array),
            ty => ty,
        };
        match ranged {
            Ty::Slice(elem) => vec![Ty::Unknown, *elem],
            Ty::Map(key, value) => vec![*key, *value],
            Ty::Chan(elem) => vec![*elem],
            _ => Vec::new(),
        }
    }

    /// `switch v := x.(type)` binds one `v` per clause. All clauses share a
    /// single object whose type is reset for each single-type clause.
    fn visit_type_switch(&mut self, node: Node<'a>) {
        self.with_scope(|this| {
            if let Some(init) = node.child_by_field_name("initializer") {
                this.visit(init);
            }
            if let Some(value) = node.child_by_field_name("value") {
                this.visit(value);
            }

            let alias = node
                .child_by_field_name("alias")
                .and_then(|list| named_children(list).first().copied())
                .filter(|alias| this.text(*alias) != "_")
                .map(|alias| {
                    let name = this.text(alias);
                    let id = this.new_object(Object::new(ObjectKind::Var, name, Owner::Local));
                    this.define(alias, id);
                    (name, id)
                });

            for clause in named_children(node) {
                if !matches!(clause.kind(), kind::TYPE_CASE | kind::DEFAULT_CASE) {
                    continue;
                }
                this.with_scope(|this| {
                    let types = field_children(clause, "type");
                    for ty in &types {
                        this.visit(*ty);
                    }
                    if let Some((name, id)) = alias {
                        let alias_type = match types.as_slice() {
                            [only] => this.type_of(*only),
                            _ => Ty::Unknown,
                        };
                        this.var_types.insert(id, alias_type);
                        this.bind(name, id);
                    }
                    for child in named_children(clause) {
                        if !types.contains(&child) {
                            this.visit(child);
                        }
                    }
                });
            }
        });
    }

    fn visit_selector(&mut self, node: Node<'a>) {
        let (Some(operand), Some(field)) = (
            node.child_by_field_name("operand"),
            node.child_by_field_name("field"),
        ) else {
            return self.visit_children(node);
        };
        let name = self.text(field);

        if let Some((package, path)) = self.package_qualifier(operand) {
            self.record_use(operand, package);
            self.use_imported(field, &path, guess_kind(node));
            return;
        }

        self.visit(operand);
        // `T.M` and `(*T).M` select from the type itself
        let ty = self.infer(operand);
        match self.lookup_member(&ty, name, 0) {
            Member::Found(id) => self.record_use(field, id),
            Member::Unknown(owner) => {
                let owner = match owner {
                    Owner::Imported(path) => Owner::Imported(path),
                    _ => Owner::Foreign,
                };
                let id = self.member(owner, name, guess_kind(node));
                self.record_use(field, id);
            }
            Member::Missing => {
                let type_name = self.type_name(&ty);
                self.warn(
                    field,
                    format!("{type_name}.{name} undefined (type {type_name} has no field or method {name})"),
                );
            }
        }
    }

    fn visit_qualified(&mut self, node: Node<'a>) {
        let (Some(package), Some(name)) = (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) else {
            return;
        };
        match self.package_qualifier(package) {
            Some((id, path)) => {
                self.record_use(package, id);
                self.use_imported(name, &path, ObjectKind::TypeName);
            }
            None => {
                let text = self.text(package);
                self.warn(package, format!("undefined: {text}"));
            }
        }
    }

    fn use_imported(&mut self, name: Node<'a>, path: &str, object_kind: ObjectKind) {
        let text = self.text(name);
        if !is_exported(text) {
            let package = default_package_name(path);
            self.warn(name, format!("name {text} not exported by package {package}"));
            return;
        }
        let id = self.member(Owner::Imported(path.to_string()), text, object_kind);
        self.record_use(name, id);
    }

    fn visit_composite(&mut self, node: Node<'a>) {
        let ty_node = node.child_by_field_name("type");
        if let Some(ty) = ty_node {
            self.visit(ty);
        }
        let ty = ty_node.map_or(Ty::Unknown, |ty| self.type_of(ty));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_literal(body, &ty);
        }
    }

    /// Keys of a struct literal name fields; other keys are expressions.
    /// Elided element types of slice, array and map literals are filled in.
    fn visit_literal(&mut self, body: Node<'a>, ty: &Ty) {
        let is_struct = self.is_struct(ty, 0);
        let (key_ty, elem_ty) = match self.underlying(ty) {
            Ty::Slice(elem) => (Ty::Unknown, elided(*elem)),
            Ty::Map(key, value) => (elided(*key), elided(*value)),
            _ => (Ty::Unknown, Ty::Unknown),
        };
        for element in named_children(body) {
            if element.kind() != kind::KEYED_ELEMENT {
                self.visit_element(element, &elem_ty);
                continue;
            }
            let parts = named_children(element);
            let key = element
                .child_by_field_name("key")
                .or_else(|| parts.first().copied())
                .map(unwrap_element);
            let value = element
                .child_by_field_name("value")
                .or_else(|| parts.get(1).copied());

            match key {
                Some(key) if is_field_name(key) && is_struct => self.use_field(key, ty),
                Some(key) if key.kind() == kind::IDENTIFIER && *ty == Ty::Unknown => {
                    // possibly a field of an elided struct type
                    if let Some(id) = self.lookup(self.text(key)) {
                        self.record_use(key, id);
                    }
                }
                Some(key) => self.visit_element(key, &key_ty),
                None => {}
            }
            if let Some(value) = value {
                self.visit_element(value, &elem_ty);
            }
        }
    }

    /// `ty` is the type of an elided composite literal in this position.
    fn visit_element(&mut self, element: Node<'a>, ty: &Ty) {
        let element = unwrap_element(element);
        if element.kind() == kind::LITERAL_VALUE {
            self.visit_literal(element, ty);
        } else {
            self.visit(element);
        }
    }

    fn use_field(&mut self, key: Node<'a>, ty: &Ty) {
        let name = self.text(key);
        match self.lookup_member(ty, name, 0) {
            Member::Found(id) => self.record_use(key, id),
            Member::Unknown(owner) => {
                let owner = match owner {
                    Owner::Imported(path) => Owner::Imported(path),
                    _ => Owner::Foreign,
                };
                let id = self.member(owner, name, ObjectKind::Var);
                self.record_use(key, id);
            }
            Member::Missing => {
                let type_name = self.type_name(ty);
                self.warn(key, format!("unknown field {name} in struct literal of type {type_name}"));
            }
        }
    }

    fn report_unused_imports(&mut self) {
        let scope = &self.file_scopes[self.file];
        let unused: Vec<_> = scope
            .named
            .iter()
            .filter(|(id, _, _)| !scope.used.contains(id))
            .cloned()
            .collect();
        for (id, path, start) in unused {
            let name = self.object(id).name.clone();
            let message = if name == default_package_name(&path) {
                format!("{path:?} imported and not used")
            } else {
                format!("{path:?} imported as {name} and not used")
            };
            self.warn_at(start, message);
        }
    }
}

/// `{...}` for a `*T` element abbreviates `&T{...}`.
fn elided(ty: Ty) -> Ty {
    match ty {
        Ty::Pointer(inner) => *inner,
        ty => ty,
    }
}

fn is_field_name(node: Node<'_>) -> bool {
    matches!(node.kind(), kind::IDENTIFIER | kind::FIELD_IDENTIFIER)
}

/// `literal_element` wraps keys and values in newer grammars.
fn unwrap_element(node: Node<'_>) -> Node<'_> {
    if node.kind() == kind::LITERAL_ELEMENT {
        named_children(node).first().copied().unwrap_or(node)
    } else {
        node
    }
}

/// Kind assumed for a member of a package whose declarations are not
/// loaded.
fn guess_kind(node: Node<'_>) -> ObjectKind {
    if node.kind() == kind::TYPE_IDENTIFIER {
        return ObjectKind::TypeName;
    }
    let called = node.parent().is_some_and(|parent| {
        parent.kind() == kind::CALL_EXPRESSION
            && parent.child_by_field_name("function") == Some(node)
    });
    if called { ObjectKind::Func } else { ObjectKind::Var }
}
