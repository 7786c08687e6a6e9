//! Package-wide name resolution
//!
//! Resolves every identifier of a Go package to the object it denotes and
//! records the result in definition and use tables keyed by the identifier's
//! span. Runs in two passes: `collect` declares package-level objects, `walk`
//! visits bodies with a scope stack.
//!
//! Conflicting declarations are fatal. Everything else the checker notices
//! (undefined names, unused imports, unknown members) is kept as a warning so
//! half-edited buffers still resolve.

mod collect;
mod infer;
mod universe;
mod walk;

use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::error::TypeError;
use crate::models::symbol::{Object, ObjectKind, Owner};
use crate::services::loader::SourceFile;

/// Identifies an identifier token by file and byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentKey {
    pub file: usize,
    pub start: usize,
    pub end: usize,
}

impl IdentKey {
    pub fn new(file: usize, node: Node<'_>) -> Self {
        Self {
            file,
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Which table an identifier was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Use,
    Def,
}

/// Definition and use tables of a checked package.
#[derive(Debug, Default)]
pub struct Info {
    objects: Vec<Object>,
    defs: HashMap<IdentKey, ObjectId>,
    uses: HashMap<IdentKey, ObjectId>,
    /// Non-fatal diagnostics
    pub warnings: Vec<TypeError>,
}

impl Info {
    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn def(&self, key: &IdentKey) -> Option<&Object> {
        self.defs.get(key).map(|id| self.object(*id))
    }

    pub fn use_of(&self, key: &IdentKey) -> Option<&Object> {
        self.uses.get(key).map(|id| self.object(*id))
    }

    /// Uses take precedence: an embedded field both defines the field and
    /// uses the embedded type.
    pub fn lookup(&self, key: &IdentKey) -> Option<(&Object, Recorded)> {
        self.use_of(key)
            .map(|obj| (obj, Recorded::Use))
            .or_else(|| self.def(key).map(|obj| (obj, Recorded::Def)))
    }

    pub fn defs_len(&self) -> usize {
        self.defs.len()
    }

    pub fn uses_len(&self) -> usize {
        self.uses.len()
    }
}

/// Type of an expression, as far as resolution needs to know it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Ty {
    Named(ObjectId),
    Pointer(Box<Ty>),
    /// Slices and arrays
    Slice(Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Chan(Box<Ty>),
    Struct(Vec<ObjectId>),
    Unknown,
}

/// Members of a package-local named type.
#[derive(Debug, Default)]
struct TypeInfo {
    fields: Vec<ObjectId>,
    embedded: Vec<Ty>,
    methods: HashMap<String, ObjectId>,
    underlying: Option<Ty>,
    is_struct: bool,
}

enum Member {
    Found(ObjectId),
    /// The type's members are not known; the member belongs to `Owner`.
    Unknown(Owner),
    Missing,
}

/// Imports visible in one file.
#[derive(Debug, Default)]
struct FileScope {
    names: HashMap<String, ObjectId>,
    dot_imports: Vec<String>,
    /// Import name, path, and spec start for "imported and not used"
    named: Vec<(ObjectId, String, usize)>,
    used: HashSet<ObjectId>,
}

const MAX_EMBEDDING_DEPTH: usize = 8;

/// Resolve all identifiers of `files`, which form one package.
pub fn check(files: &[SourceFile]) -> Result<Info, Vec<TypeError>> {
    let mut checker = Checker::new(files);
    checker.collect();
    checker.walk();

    if !checker.errors.is_empty() {
        return Err(checker.errors);
    }
    for warning in &checker.info.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(
        "Checked {} files: {} definitions, {} uses",
        files.len(),
        checker.info.defs_len(),
        checker.info.uses_len()
    );
    Ok(checker.info)
}

struct Checker<'a> {
    files: &'a [SourceFile],
    info: Info,
    errors: Vec<TypeError>,

    universe: HashMap<String, ObjectId>,
    package: HashMap<String, ObjectId>,
    file_scopes: Vec<FileScope>,
    members: HashMap<(Owner, String), ObjectId>,

    types: HashMap<ObjectId, TypeInfo>,
    var_types: HashMap<ObjectId, Ty>,
    /// Result types of functions and methods, in order
    results: HashMap<ObjectId, Vec<Ty>>,
    embedded_fields: HashSet<ObjectId>,
    /// Field objects of every struct type node seen so far
    struct_fields: HashMap<IdentKey, Vec<ObjectId>>,

    /// File being checked
    file: usize,
    scopes: Vec<HashMap<String, ObjectId>>,
    labels: Vec<HashMap<String, ObjectId>>,
}

impl<'a> Checker<'a> {
    fn new(files: &'a [SourceFile]) -> Self {
        Self {
            files,
            info: Info::default(),
            errors: Vec::new(),
            universe: HashMap::new(),
            package: HashMap::new(),
            file_scopes: files.iter().map(|_| FileScope::default()).collect(),
            members: HashMap::new(),
            types: HashMap::new(),
            var_types: HashMap::new(),
            results: HashMap::new(),
            embedded_fields: HashSet::new(),
            struct_fields: HashMap::new(),
            file: 0,
            scopes: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn root(&self, file: usize) -> Node<'a> {
        let files: &'a [SourceFile] = self.files;
        files[file].syntax.root()
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        let files: &'a [SourceFile] = self.files;
        &files[self.file].syntax.source()[node.byte_range()]
    }

    fn key(&self, node: Node<'_>) -> IdentKey {
        IdentKey::new(self.file, node)
    }

    fn new_object(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.info.objects.len());
        self.info.objects.push(object);
        id
    }

    fn object(&self, id: ObjectId) -> &Object {
        self.info.object(id)
    }

    fn define(&mut self, node: Node<'_>, id: ObjectId) {
        let key = self.key(node);
        self.info.defs.entry(key).or_insert(id);
    }

    fn defined(&self, node: Node<'_>) -> Option<ObjectId> {
        self.info.defs.get(&self.key(node)).copied()
    }

    fn record_use(&mut self, node: Node<'_>, id: ObjectId) {
        let key = self.key(node);
        self.info.uses.insert(key, id);
        if self.object(id).kind == ObjectKind::PkgName {
            self.file_scopes[self.file].used.insert(id);
        }
    }

    /// Create an object for `node`, record its definition, and declare it in
    /// the innermost scope (the package scope when no block is open).
    fn declare(&mut self, node: Node<'_>, kind: ObjectKind) -> ObjectId {
        let name = self.text(node);
        let id = self.new_object(Object::new(kind, name, Owner::Local));
        self.define(node, id);
        if name == "_" {
            return id;
        }

        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.package,
        };
        if scope.contains_key(name) {
            self.error(node, format!("{name} redeclared in this block"));
        } else {
            scope.insert(name.to_string(), id);
        }
        id
    }

    /// Insert an existing object into the innermost block scope.
    fn bind(&mut self, name: &str, id: ObjectId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    /// Look a name up from the innermost scope outwards.
    fn lookup(&mut self, name: &str) -> Option<ObjectId> {
        if let Some(id) = self.scopes.iter().rev().find_map(|s| s.get(name)) {
            return Some(*id);
        }
        if let Some(id) = self.file_scopes[self.file].names.get(name) {
            return Some(*id);
        }
        if let Some(id) = self.package.get(name) {
            return Some(*id);
        }
        self.universe_object(name)
    }

    fn universe_object(&mut self, name: &str) -> Option<ObjectId> {
        if let Some(id) = self.universe.get(name) {
            return Some(*id);
        }
        let kind = universe::lookup(name)?;
        let id = self.new_object(Object::new(kind, name, Owner::Universe));
        self.universe.insert(name.to_string(), id);
        Some(id)
    }

    /// Object for a member of a package or type whose declarations are not
    /// loaded; one object per owner and name.
    fn member(&mut self, owner: Owner, name: &str, kind: ObjectKind) -> ObjectId {
        let key = (owner, name.to_string());
        if let Some(id) = self.members.get(&key) {
            return *id;
        }
        let id = self.new_object(Object::new(kind, name, key.0.clone()));
        self.members.insert(key, id);
        id
    }

    /// Find field or method `name` of a value of type `ty`.
    fn lookup_member(&mut self, ty: &Ty, name: &str, depth: usize) -> Member {
        if depth > MAX_EMBEDDING_DEPTH {
            return Member::Missing;
        }
        match ty {
            Ty::Pointer(inner) => self.lookup_member(inner, name, depth),
            Ty::Unknown => Member::Unknown(Owner::Foreign),
            Ty::Slice(_) | Ty::Map(..) | Ty::Chan(_) => Member::Missing,
            Ty::Struct(fields) => {
                let fields = fields.clone();
                self.lookup_fields(&fields, &[], name, depth)
            }
            Ty::Named(id) => {
                let id = *id;
                let object = self.object(id).clone();
                match object.owner {
                    Owner::Universe if universe::method(&object.name, name) => {
                        Member::Found(self.member(Owner::Universe, name, ObjectKind::Func))
                    }
                    Owner::Universe => Member::Missing,
                    Owner::Imported(_) | Owner::Foreign => Member::Unknown(object.owner),
                    Owner::Local => {
                        let Some(info) = self.types.get(&id) else {
                            // Type parameters have no known members.
                            return Member::Unknown(Owner::Foreign);
                        };
                        if let Some(method) = info.methods.get(name) {
                            return Member::Found(*method);
                        }
                        let fields = info.fields.clone();
                        let mut embedded = info.embedded.clone();
                        if let Some(underlying) = &info.underlying {
                            embedded.push(underlying.clone());
                        }
                        self.lookup_fields(&fields, &embedded, name, depth)
                    }
                }
            }
        }
    }

    fn lookup_fields(
        &mut self,
        fields: &[ObjectId],
        embedded: &[Ty],
        name: &str,
        depth: usize,
    ) -> Member {
        if let Some(field) = fields.iter().find(|f| self.object(**f).name == name) {
            return Member::Found(*field);
        }

        let mut promoted: Vec<Ty> = fields
            .iter()
            .filter(|f| self.embedded_fields.contains(f))
            .filter_map(|f| self.var_types.get(f).cloned())
            .collect();
        promoted.extend(embedded.iter().cloned());

        let mut unknown = None;
        for ty in promoted {
            match self.lookup_member(&ty, name, depth + 1) {
                Member::Found(id) => return Member::Found(id),
                Member::Unknown(owner) => {
                    unknown.get_or_insert(owner);
                }
                Member::Missing => {}
            }
        }
        unknown.map_or(Member::Missing, Member::Unknown)
    }

    fn is_struct(&self, ty: &Ty, depth: usize) -> bool {
        if depth > MAX_EMBEDDING_DEPTH {
            return false;
        }
        match ty {
            Ty::Struct(_) => true,
            Ty::Named(id) => match &self.object(*id).owner {
                Owner::Imported(_) => true,
                Owner::Local => self.types.get(id).is_some_and(|info| {
                    info.is_struct
                        || info
                            .underlying
                            .as_ref()
                            .is_some_and(|u| self.is_struct(u, depth + 1))
                }),
                _ => false,
            },
            Ty::Pointer(_) | Ty::Slice(_) | Ty::Map(..) | Ty::Chan(_) | Ty::Unknown => false,
        }
    }

    /// `ty` with local named types replaced by their underlying type.
    fn underlying(&self, ty: &Ty) -> Ty {
        let mut ty = ty.clone();
        for _ in 0..=MAX_EMBEDDING_DEPTH {
            let Ty::Named(id) = ty else {
                return ty;
            };
            match self.types.get(&id).and_then(|info| info.underlying.clone()) {
                Some(underlying) => ty = underlying,
                None => return Ty::Named(id),
            }
        }
        Ty::Unknown
    }

    /// Element type yielded by indexing `ty`.
    fn element(&self, ty: &Ty) -> Ty {
        match self.underlying(ty) {
            Ty::Slice(elem) => *elem,
            Ty::Map(_, value) => *value,
            Ty::Pointer(inner) => match self.underlying(&inner) {
                Ty::Slice(elem) => *elem,
                _ => Ty::Unknown,
            },
            _ => Ty::Unknown,
        }
    }

    fn type_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Named(id) => self.object(*id).name.clone(),
            Ty::Pointer(inner) => format!("*{}", self.type_name(inner)),
            Ty::Slice(elem) => format!("[]{}", self.type_name(elem)),
            Ty::Map(key, value) => format!("map[{}]{}", self.type_name(key), self.type_name(value)),
            Ty::Chan(elem) => format!("chan {}", self.type_name(elem)),
            Ty::Struct(_) => "struct{...}".to_string(),
            Ty::Unknown => "unknown".to_string(),
        }
    }

    fn diagnostic(&self, byte: usize, message: String) -> TypeError {
        let syntax = &self.files[self.file].syntax;
        let (line, column) = syntax.position(byte);
        TypeError {
            file: syntax.name().to_string(),
            line,
            column,
            message,
        }
    }

    fn error(&mut self, node: Node<'_>, message: String) {
        self.error_at(node.start_byte(), message);
    }

    fn error_at(&mut self, byte: usize, message: String) {
        let error = self.diagnostic(byte, message);
        self.errors.push(error);
    }

    fn warn(&mut self, node: Node<'_>, message: String) {
        self.warn_at(node.start_byte(), message);
    }

    fn warn_at(&mut self, byte: usize, message: String) {
        let warning = self.diagnostic(byte, message);
        self.info.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::parse_source;

    fn check_sources(sources: &[&str]) -> Result<Info, Vec<TypeError>> {
        let files: Vec<SourceFile> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| parse_source(&format!("f{i}.go"), src.to_string()).unwrap())
            .collect();
        check(&files)
    }

    fn object_at<'i>(info: &'i Info, source: &str, needle: &str, nth: usize) -> Option<&'i Object> {
        let start = source.match_indices(needle).nth(nth)?.0;
        let key = IdentKey {
            file: 0,
            start,
            end: start + needle.len(),
        };
        info.lookup(&key).map(|(obj, _)| obj)
    }

    #[test]
    fn test_local_scopes_shadow_package_names() {
        let src = "package p\nvar x int\nfunc f() { x := \"s\"; _ = x }\n";
        let info = check_sources(&[src]).unwrap();
        let package_x = object_at(&info, src, "x", 0).unwrap();
        let local_x = object_at(&info, src, "x", 2).unwrap();
        assert_eq!(package_x.kind, ObjectKind::Var);
        assert_eq!(local_x.kind, ObjectKind::Var);
        assert!(!std::ptr::eq(package_x, local_x));
        assert!(std::ptr::eq(local_x, object_at(&info, src, "x", 1).unwrap()));
    }

    #[test]
    fn test_method_on_pointer_receiver() {
        let src = "package p\ntype T struct{ count int }\nfunc (t *T) Get() int { return t.count }\nfunc f() { v := &T{}; _ = v.Get() }\n";
        let info = check_sources(&[src]).unwrap();
        let field = object_at(&info, src, "count", 1).unwrap();
        assert_eq!(field.kind, ObjectKind::Var);
        let method = object_at(&info, src, "Get", 1).unwrap();
        assert_eq!(method.kind, ObjectKind::Func);
        assert_eq!(method.owner, Owner::Local);
    }

    #[test]
    fn test_promoted_field_through_embedding() {
        let src = "package p\ntype A struct{ Name string }\ntype B struct{ A }\nfunc f(b B) string { return b.Name }\n";
        let info = check_sources(&[src]).unwrap();
        assert!(info.warnings.is_empty(), "{:?}", info.warnings);
        let name = object_at(&info, src, "Name", 1).unwrap();
        assert_eq!(name.owner, Owner::Local);
    }

    #[test]
    fn test_struct_literal_keys_are_fields() {
        let src = "package p\ntype T struct{ Size int }\nvar Size = 3\nvar t = T{Size: Size}\n";
        let info = check_sources(&[src]).unwrap();
        let key = object_at(&info, src, "Size", 2).unwrap();
        let value = object_at(&info, src, "Size", 3).unwrap();
        assert!(std::ptr::eq(key, object_at(&info, src, "Size", 0).unwrap()));
        assert!(std::ptr::eq(value, object_at(&info, src, "Size", 1).unwrap()));
    }

    #[test]
    fn test_labels() {
        let src = "package p\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n";
        let info = check_sources(&[src]).unwrap();
        let label = object_at(&info, src, "outer", 1).unwrap();
        assert_eq!(label.kind, ObjectKind::Label);
    }

    #[test]
    fn test_type_switch_alias() {
        let src = "package p\nfunc f(x any) { switch v := x.(type) { case int: _ = v; default: _ = v } }\n";
        let info = check_sources(&[src]).unwrap();
        assert!(info.warnings.is_empty(), "{:?}", info.warnings);
        let def = object_at(&info, src, "v", 0).unwrap();
        assert!(std::ptr::eq(def, object_at(&info, src, "v", 1).unwrap()));
        assert!(std::ptr::eq(def, object_at(&info, src, "v", 2).unwrap()));
    }

    #[test]
    fn test_cross_file_resolution() {
        let a = "package p\nfunc f() { g() }\n";
        let b = "package p\nfunc g() {}\n";
        let info = check_sources(&[a, b]).unwrap();
        let g = object_at(&info, a, "g", 0).unwrap();
        assert_eq!(g.kind, ObjectKind::Func);
        assert_eq!(g.owner, Owner::Local);
    }

    #[test]
    fn test_redeclaration_across_files_is_fatal() {
        let errors = check_sources(&["package p\nvar X int\n", "package p\nfunc X() {}\n"])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "X redeclared in this block");
        assert_eq!(errors[0].file, "f1.go");
    }

    #[test]
    fn test_import_conflict_is_fatal() {
        let errors =
            check_sources(&["package p\nimport \"io\"\nvar io = 1\nvar _ io.Reader\n"]).unwrap_err();
        assert!(errors[0].message.contains("already declared through import"));
    }

    #[test]
    fn test_duplicate_method_is_fatal() {
        let errors = check_sources(&["package p\ntype T int\nfunc (T) M() {}\nfunc (*T) M() {}\n"])
            .unwrap_err();
        assert_eq!(errors[0].message, "method T.M already declared");
    }

    #[test]
    fn test_soft_diagnostics() {
        let info = check_sources(&[
            "package p\nimport \"fmt\"\nimport \"io\"\nfunc f() { _ = y; _ = io.reader }\n",
        ])
        .unwrap();
        let messages: Vec<_> = info.warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.contains(&"undefined: y"));
        assert!(messages.contains(&"name reader not exported by package io"));
        assert!(messages.contains(&"\"fmt\" imported and not used"));
    }

    #[test]
    fn test_no_new_variables() {
        let info = check_sources(&["package p\nfunc f() { a := 1; a := 2; _ = a }\n"]).unwrap();
        assert_eq!(
            info.warnings[0].message,
            "no new variables on left side of :="
        );
    }

    #[test]
    fn test_generic_type_parameters() {
        let src = "package p\ntype List[T any] struct{ items []T }\nfunc (l *List[T]) Push(v T) { l.items = append(l.items, v) }\nfunc Map[K comparable, V any](m map[K]V) {}\n";
        let info = check_sources(&[src]).unwrap();
        assert!(info.warnings.is_empty(), "{:?}", info.warnings);
        let param = object_at(&info, src, "K", 1).unwrap();
        assert_eq!(param.kind, ObjectKind::TypeName);
    }
}
