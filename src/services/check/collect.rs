//! First pass: package-level declarations
//!
//! Declares every top-level name before any body is walked, so uses may
//! precede declarations across the whole package.

use tree_sitter::Node;

use super::{Checker, IdentKey, ObjectId, Ty, TypeInfo, universe};
use crate::infra::ast::node_types as kind;
use crate::infra::ast::parser::default_package_name;
use crate::infra::ast::{ImportName, field_children, has_token, named_children};
use crate::models::symbol::{Object, ObjectKind, Owner};

impl<'a> Checker<'a> {
    pub(super) fn collect(&mut self) {
        for file in 0..self.files.len() {
            self.file = file;
            self.collect_imports();
        }
        self.each_declaration(|this, decl| this.declare_top_level(decl));
        self.each_declaration(|this, decl| {
            if decl.kind() == kind::TYPE_DECLARATION {
                for spec in type_specs(decl) {
                    let name = spec.child_by_field_name("name");
                    if let Some(id) = name.and_then(|name| this.defined(name)) {
                        this.collect_type(spec, id);
                    }
                }
            }
        });
        self.each_declaration(|this, decl| match decl.kind() {
            kind::FUNCTION_DECLARATION => this.collect_signature(decl),
            kind::METHOD_DECLARATION => this.collect_method(decl),
            _ => {}
        });
        self.each_declaration(|this, decl| {
            if decl.kind() == kind::VAR_DECLARATION {
                for spec in specs(decl, kind::VAR_SPEC) {
                    let types = this.spec_types(spec);
                    for (name, ty) in field_children(spec, "name").into_iter().zip(types) {
                        if let Some(id) = this.defined(name) {
                            this.var_types.insert(id, ty);
                        }
                    }
                }
            }
        });
    }

    fn each_declaration(&mut self, mut f: impl FnMut(&mut Self, Node<'a>)) {
        for file in 0..self.files.len() {
            self.file = file;
            for decl in named_children(self.root(file)) {
                f(self, decl);
            }
        }
    }

    fn collect_imports(&mut self) {
        let files = self.files;
        for spec in files[self.file].syntax.imports() {
            let name = match &spec.name {
                ImportName::Dot => {
                    self.file_scopes[self.file].dot_imports.push(spec.path.clone());
                    continue;
                }
                ImportName::Blank => continue,
                ImportName::Alias(alias, _) => alias.clone(),
                ImportName::Implicit => default_package_name(&spec.path).to_string(),
            };

            let id = self.new_object(Object::package(name.clone(), spec.path.clone()));
            if let ImportName::Alias(_, span) = &spec.name {
                let key = IdentKey {
                    file: self.file,
                    start: span.start,
                    end: span.end,
                };
                self.info.defs.insert(key, id);
            }

            if self.file_scopes[self.file].names.contains_key(&name) {
                self.error_at(spec.span.start, format!("{name} redeclared in this block"));
                continue;
            }
            let scope = &mut self.file_scopes[self.file];
            scope.names.insert(name, id);
            scope.named.push((id, spec.path, spec.span.start));
        }
    }

    fn declare_top_level(&mut self, decl: Node<'a>) {
        match decl.kind() {
            kind::FUNCTION_DECLARATION => {
                let Some(name) = decl.child_by_field_name("name") else {
                    return;
                };
                if self.text(name) == "init" {
                    // init functions cannot be referred to
                    let id = self.new_object(Object::new(ObjectKind::Func, "init", Owner::Local));
                    self.define(name, id);
                } else {
                    self.declare_package(name, ObjectKind::Func);
                }
            }
            kind::TYPE_DECLARATION => {
                for spec in type_specs(decl) {
                    if let Some(name) = spec.child_by_field_name("name") {
                        self.declare_package(name, ObjectKind::TypeName);
                    }
                }
            }
            kind::CONST_DECLARATION => self.declare_specs(decl, kind::CONST_SPEC, ObjectKind::Const),
            kind::VAR_DECLARATION => self.declare_specs(decl, kind::VAR_SPEC, ObjectKind::Var),
            _ => {}
        }
    }

    fn declare_specs(&mut self, decl: Node<'a>, spec_kind: &str, object_kind: ObjectKind) {
        for spec in specs(decl, spec_kind) {
            for name in field_children(spec, "name") {
                self.declare_package(name, object_kind);
            }
        }
    }

    fn declare_package(&mut self, name: Node<'a>, object_kind: ObjectKind) -> ObjectId {
        let id = self.declare(name, object_kind);
        let text = self.text(name);
        if text == "_" {
            return id;
        }
        let import = self
            .file_scopes
            .iter()
            .find_map(|scope| scope.names.get(text))
            .and_then(|import| self.object(*import).imported.clone());
        if let Some(path) = import {
            self.error(
                name,
                format!("{text} already declared through import of package {path}"),
            );
        }
        id
    }

    /// Record fields, methods and underlying type of the named type `id`.
    pub(super) fn collect_type(&mut self, spec: Node<'a>, id: ObjectId) {
        let Some(ty) = spec.child_by_field_name("type") else {
            return;
        };
        let params = type_parameter_names(spec.child_by_field_name("type_parameters"));
        self.with_placeholders(&params, |this| {
            let mut info = this.type_info(ty);
            if let Some(existing) = this.types.remove(&id) {
                info.methods.extend(existing.methods);
            }
            this.types.insert(id, info);
        });
    }

    fn type_info(&mut self, ty: Node<'a>) -> TypeInfo {
        let mut info = TypeInfo::default();
        match ty.kind() {
            kind::STRUCT_TYPE => {
                info.is_struct = true;
                info.fields = self.struct_fields(ty);
            }
            kind::INTERFACE_TYPE => {
                for elem in named_children(ty) {
                    match elem.kind() {
                        kind::METHOD_ELEM | kind::METHOD_SPEC => {
                            if let Some(name) = elem.child_by_field_name("name") {
                                let method = self.interface_method(elem, name);
                                info.methods.insert(self.text(name).to_string(), method);
                            }
                        }
                        kind::TYPE_ELEM => {
                            for embedded in named_children(elem) {
                                let embedded = self.type_of(embedded);
                                info.embedded.push(embedded);
                            }
                        }
                        kind::COMMENT => {}
                        _ => {
                            let embedded = self.type_of(elem);
                            info.embedded.push(embedded);
                        }
                    }
                }
            }
            _ => info.underlying = Some(self.type_of(ty)),
        }
        info
    }

    /// Method object of an interface method element, created on first sight.
    pub(super) fn interface_method(&mut self, elem: Node<'a>, name: Node<'a>) -> ObjectId {
        if let Some(id) = self.defined(name) {
            return id;
        }
        let id = self.new_object(Object::new(ObjectKind::Func, self.text(name), Owner::Local));
        self.define(name, id);
        let results = self.result_types(elem);
        self.results.insert(id, results);
        id
    }

    /// Field objects of a struct type node. Each node's fields are created
    /// once, whichever pass sees the node first.
    pub(super) fn struct_fields(&mut self, node: Node<'a>) -> Vec<ObjectId> {
        let key = self.key(node);
        if let Some(fields) = self.struct_fields.get(&key) {
            return fields.clone();
        }

        let mut fields = Vec::new();
        for list in named_children(node) {
            for decl in named_children(list) {
                if decl.kind() != kind::FIELD_DECLARATION {
                    continue;
                }
                let Some(ty_node) = decl.child_by_field_name("type") else {
                    continue;
                };
                let names = field_children(decl, "name");
                if names.is_empty() {
                    let Some(name) = embedded_name(ty_node) else {
                        continue;
                    };
                    let mut ty = self.type_of(ty_node);
                    if has_token(decl, "*") {
                        ty = Ty::Pointer(Box::new(ty));
                    }
                    let field = self.new_field(name, ty);
                    self.embedded_fields.insert(field);
                    fields.push(field);
                } else {
                    let ty = self.type_of(ty_node);
                    for name in names {
                        fields.push(self.new_field(name, ty.clone()));
                    }
                }
            }
        }
        self.struct_fields.insert(key, fields.clone());
        fields
    }

    fn new_field(&mut self, name: Node<'a>, ty: Ty) -> ObjectId {
        let id = self.new_object(Object::new(ObjectKind::Var, self.text(name), Owner::Local));
        self.define(name, id);
        self.var_types.insert(id, ty);
        id
    }

    fn collect_signature(&mut self, decl: Node<'a>) {
        let Some(id) = decl.child_by_field_name("name").and_then(|n| self.defined(n)) else {
            return;
        };
        let params = type_parameter_names(decl.child_by_field_name("type_parameters"));
        self.with_placeholders(&params, |this| {
            let results = this.result_types(decl);
            this.results.insert(id, results);
        });
    }

    fn collect_method(&mut self, decl: Node<'a>) {
        let Some(name) = decl.child_by_field_name("name") else {
            return;
        };
        let Some(receiver) = decl
            .child_by_field_name("receiver")
            .and_then(receiver_type)
        else {
            return;
        };

        let method = self.new_object(Object::new(ObjectKind::Func, self.text(name), Owner::Local));
        self.define(name, method);
        let params = generic_receiver(receiver)
            .map(receiver_type_params)
            .unwrap_or_default();
        self.with_placeholders(&params, |this| {
            let results = this.result_types(decl);
            this.results.insert(method, results);
        });

        let Some(base) = receiver_base(receiver) else {
            self.error(receiver, format!("invalid receiver type {}", self.text(receiver)));
            return;
        };
        let base_name = self.text(base);
        if base.kind() == kind::QUALIFIED_TYPE {
            self.error(base, format!("cannot define new methods on non-local type {base_name}"));
            return;
        }
        match self.package.get(base_name).copied() {
            Some(ty) if self.object(ty).kind == ObjectKind::TypeName => {
                self.add_method(ty, name, method);
            }
            Some(_) => self.error(base, format!("{base_name} is not a type")),
            None if universe::lookup(base_name).is_some() => self.error(
                base,
                format!("cannot define new methods on non-local type {base_name}"),
            ),
            None => self.error(base, format!("undefined: {base_name}")),
        }
    }

    fn add_method(&mut self, ty: ObjectId, name: Node<'a>, method: ObjectId) {
        let method_name = self.text(name);
        if method_name == "_" {
            return;
        }
        let type_name = self.object(ty).name.clone();
        let info = self.types.entry(ty).or_default();
        let duplicate = info.methods.contains_key(method_name);
        let fields = info.fields.clone();
        if duplicate {
            self.error(name, format!("method {type_name}.{method_name} already declared"));
        } else if fields.iter().any(|f| self.object(*f).name == method_name) {
            self.error(name, format!("field and method with the same name {method_name}"));
        } else if let Some(info) = self.types.get_mut(&ty) {
            info.methods.insert(method_name.to_string(), method);
        }
    }

    /// Result types of a function, method or method element, one per
    /// result value.
    pub(super) fn result_types(&mut self, func: Node<'a>) -> Vec<Ty> {
        let Some(result) = func.child_by_field_name("result") else {
            return Vec::new();
        };
        if result.kind() != kind::PARAMETER_LIST {
            return vec![self.type_of(result)];
        }
        let mut types = Vec::new();
        for param in named_children(result) {
            if param.kind() != kind::PARAMETER_DECLARATION {
                continue;
            }
            let ty = param
                .child_by_field_name("type")
                .map_or(Ty::Unknown, |ty| self.type_of(ty));
            let count = field_children(param, "name").len().max(1);
            types.extend(std::iter::repeat_n(ty, count));
        }
        types
    }

    /// Declared or inferred type of each name of a var or const spec.
    pub(super) fn spec_types(&mut self, spec: Node<'a>) -> Vec<Ty> {
        let count = field_children(spec, "name").len();
        if let Some(ty) = spec.child_by_field_name("type") {
            let ty = self.type_of(ty);
            return vec![ty; count];
        }
        let values = spec
            .child_by_field_name("value")
            .map(named_children)
            .unwrap_or_default();
        self.infer_values(&values, count)
    }

    /// Run `f` with `names` bound to opaque type names. Used where type
    /// parameters must shadow package types without being recorded.
    fn with_placeholders(&mut self, names: &[Node<'a>], f: impl FnOnce(&mut Self)) {
        self.with_scope(|this| {
            for name in names {
                let text = this.text(*name);
                let id = this.new_object(Object::new(ObjectKind::TypeName, text, Owner::Foreign));
                this.bind(text, id);
            }
            f(this);
        });
    }
}

/// Specs of a declaration, looking through a parenthesized spec list.
pub(super) fn specs<'t>(decl: Node<'t>, spec_kind: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    for child in named_children(decl) {
        if child.kind() == spec_kind {
            found.push(child);
        } else if child.kind().ends_with("_spec_list") {
            found.extend(
                named_children(child)
                    .into_iter()
                    .filter(|spec| spec.kind() == spec_kind),
            );
        }
    }
    found
}

pub(super) fn type_specs(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut found = specs(decl, kind::TYPE_SPEC);
    found.extend(specs(decl, kind::TYPE_ALIAS));
    found.sort_by_key(|spec| spec.start_byte());
    found
}

pub(super) fn type_parameter_names(list: Option<Node<'_>>) -> Vec<Node<'_>> {
    list.map(named_children)
        .unwrap_or_default()
        .into_iter()
        .filter(|decl| decl.kind() == kind::TYPE_PARAMETER_DECLARATION)
        .flat_map(|decl| field_children(decl, "name"))
        .collect()
}

/// Type node of the first receiver parameter.
pub(super) fn receiver_type(receiver: Node<'_>) -> Option<Node<'_>> {
    named_children(receiver)
        .into_iter()
        .find(|param| param.kind() == kind::PARAMETER_DECLARATION)
        .and_then(|param| param.child_by_field_name("type"))
}

fn strip_receiver(mut ty: Node<'_>) -> Option<Node<'_>> {
    while matches!(ty.kind(), kind::POINTER_TYPE | kind::PARENTHESIZED_TYPE) {
        ty = *named_children(ty).first()?;
    }
    Some(ty)
}

/// `List[T]` in `func (l *List[T]) ...`
pub(super) fn generic_receiver(ty: Node<'_>) -> Option<Node<'_>> {
    strip_receiver(ty).filter(|ty| ty.kind() == kind::GENERIC_TYPE)
}

/// Type parameter names a generic receiver declares.
pub(super) fn receiver_type_params(generic: Node<'_>) -> Vec<Node<'_>> {
    let Some(args) = generic.child_by_field_name("type_arguments") else {
        return Vec::new();
    };
    named_children(args)
        .into_iter()
        .filter_map(|arg| {
            if arg.kind() == kind::TYPE_ELEM {
                named_children(arg).first().copied()
            } else {
                Some(arg)
            }
        })
        .filter(|arg| arg.kind() == kind::TYPE_IDENTIFIER)
        .collect()
}

/// Named type a method is declared on: `T` in `*T`, `(T)` or `T[P]`.
fn receiver_base(ty: Node<'_>) -> Option<Node<'_>> {
    let ty = strip_receiver(ty)?;
    let ty = match ty.kind() {
        kind::GENERIC_TYPE => ty.child_by_field_name("type")?,
        _ => ty,
    };
    matches!(ty.kind(), kind::TYPE_IDENTIFIER | kind::QUALIFIED_TYPE).then_some(ty)
}

/// Identifier naming an embedded field: `T`, `pkg.T` or `T[P]`.
fn embedded_name(ty: Node<'_>) -> Option<Node<'_>> {
    match ty.kind() {
        kind::TYPE_IDENTIFIER => Some(ty),
        kind::QUALIFIED_TYPE => ty.child_by_field_name("name"),
        kind::GENERIC_TYPE => embedded_name(ty.child_by_field_name("type")?),
        kind::POINTER_TYPE => embedded_name(*named_children(ty).first()?),
        _ => None,
    }
}
