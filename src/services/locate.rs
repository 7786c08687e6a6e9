//! Identifier locator
//!
//! Finds what the cursor points at in the edited file: an import spec or the
//! first identifier token, in pre-order, whose span contains the offset.

use std::ops::ControlFlow;

use tree_sitter::Node;

use crate::error::ResolveError;
use crate::infra::ast::node_types::{self as kind, is_identifier_token};
use crate::infra::ast::{self, ImportSpec, SyntaxTree, Visit, spans};

/// What the cursor points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located<'t> {
    /// Inside an import spec: the unquoted import path.
    ImportPath(String),
    Ident(Node<'t>),
}

/// Locate the import spec or identifier at byte `offset`.
///
/// Span ends are inclusive, so an offset just past an identifier still
/// selects it.
pub fn locate(tree: &SyntaxTree, offset: usize) -> Result<Located<'_>, ResolveError> {
    if let Some(spec) = tree
        .imports()
        .into_iter()
        .find(|spec| spec.span.start <= offset && offset <= spec.span.end)
    {
        tracing::debug!("Offset {} is in import {:?}", offset, spec.path);
        return Ok(Located::ImportPath(spec.path));
    }

    let found = ast::walk(tree.root(), |node| {
        if !spans(node, offset) {
            return ControlFlow::Continue(Visit::Skip);
        }
        if is_identifier_token(node.kind()) {
            return ControlFlow::Break(node);
        }
        ControlFlow::Continue(Visit::Descend)
    });

    match found {
        Some(node) => {
            tracing::debug!(
                "Offset {} is in {} {:?}",
                offset,
                node.kind(),
                tree.text(node)
            );
            Ok(Located::Ident(node))
        }
        None => Err(ResolveError::NotFound(offset)),
    }
}

/// Whether the identifier at `offset` is the selected name of a
/// `pkg.Name` expression or type whose qualifier names one of the file's
/// imports.
pub fn is_qualified(tree: &SyntaxTree, offset: usize) -> bool {
    let imports = tree.imports();
    let names: Vec<&str> = imports.iter().filter_map(ImportSpec::local_name).collect();

    let qualified = ast::walk(tree.root(), |node| {
        if !spans(node, offset) {
            return ControlFlow::Continue(Visit::Skip);
        }
        let (qualifier, selected) = match node.kind() {
            kind::SELECTOR_EXPRESSION => (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ),
            kind::QUALIFIED_TYPE => (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ),
            _ => return ControlFlow::Continue(Visit::Descend),
        };
        if let (Some(qualifier), Some(selected)) = (qualifier, selected)
            && spans(selected, offset)
            && matches!(
                qualifier.kind(),
                kind::IDENTIFIER | kind::PACKAGE_IDENTIFIER
            )
            && names.contains(&tree.text(qualifier))
        {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(Visit::Descend)
    });
    qualified.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ast::GoParser;

    fn parse(source: &str) -> SyntaxTree {
        GoParser::new()
            .unwrap()
            .parse("x.go", source.to_string())
            .unwrap()
    }

    fn ident_at(tree: &SyntaxTree, offset: usize) -> Option<String> {
        match locate(tree, offset) {
            Ok(Located::Ident(node)) => Some(tree.text(node).to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_import_span_covers_name_and_path() {
        let tree = parse(r#"package main; import _ "io""#);
        for offset in 21..=27 {
            assert_eq!(
                locate(&tree, offset).unwrap(),
                Located::ImportPath("io".to_string()),
                "offset {offset}"
            );
        }
        assert_eq!(ident_at(&tree, 20), None);
    }

    #[test]
    fn test_identifier_boundaries() {
        let tree = parse("package p; var abc int");
        assert_eq!(ident_at(&tree, 14), None);
        assert_eq!(ident_at(&tree, 15).as_deref(), Some("abc"));
        assert_eq!(ident_at(&tree, 18).as_deref(), Some("abc"));
        assert_eq!(ident_at(&tree, 19).as_deref(), Some("int"));
    }

    #[test]
    fn test_first_match_wins_between_adjacent_identifiers() {
        // 46 is both one past `io` and the dot before `Reader`.
        let tree = parse("package p; import \"io\"; func main() { var _ io.Reader }");
        assert_eq!(ident_at(&tree, 46).as_deref(), Some("io"));
        assert_eq!(ident_at(&tree, 47).as_deref(), Some("Reader"));
    }

    #[test]
    fn test_predeclared_tokens() {
        let tree = parse("package p; var x = nil");
        assert_eq!(ident_at(&tree, 20).as_deref(), Some("nil"));
    }

    #[test]
    fn test_not_found() {
        let tree = parse("package p;\n\n\n");
        assert_eq!(locate(&tree, 12), Err(ResolveError::NotFound(12)));
    }

    #[test]
    fn test_is_qualified() {
        let src = "package p; import foo \"io\"; type T struct{ r foo.Reader }; func f(t T) { _ = t.r }";
        let tree = parse(src);
        let reader = src.find("Reader").unwrap();
        assert!(is_qualified(&tree, reader));
        let field = src.rfind(".r").unwrap() + 1;
        assert!(!is_qualified(&tree, field));
    }

    #[test]
    fn test_blank_import_never_qualifies() {
        let src = "package p; import _ \"io\"; var io struct{ Reader int }; var _ = io.Reader";
        let tree = parse(src);
        assert!(!is_qualified(&tree, src.rfind("Reader").unwrap()));
    }

    #[test]
    fn test_major_version_import_name() {
        let src = "package p; import \"example.com/mod/v2\"; var _ = mod.Value";
        let tree = parse(src);
        assert!(is_qualified(&tree, src.rfind("Value").unwrap()));
    }
}
