//! AST parsing infrastructure for agodoc
//!
//! Tree-sitter based parsing of Go source and the small traversal helpers
//! shared by the checker and the identifier locator.

pub mod node_types;
pub mod parser;

use std::ops::ControlFlow;

use tree_sitter::Node;

pub use parser::{GoParser, ImportName, ImportSpec, SyntaxTree};

/// Whether a pre-order walk should enter the children of the visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    Skip,
}

/// Depth-first pre-order walk over `root` and its descendants.
///
/// Returns the value of the first `ControlFlow::Break`, ending the walk.
pub fn walk<'t, B>(
    root: Node<'t>,
    mut visit: impl FnMut(Node<'t>) -> ControlFlow<B, Visit>,
) -> Option<B> {
    let mut cursor = root.walk();
    let mut depth = 0usize;
    loop {
        match visit(cursor.node()) {
            ControlFlow::Break(found) => return Some(found),
            ControlFlow::Continue(Visit::Descend) if cursor.goto_first_child() => {
                depth += 1;
                continue;
            }
            ControlFlow::Continue(_) => {}
        }
        loop {
            if depth == 0 {
                return None;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            cursor.goto_parent();
            depth -= 1;
        }
    }
}

pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Whether `node` has an anonymous `token` child, e.g. `:=`.
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token)
}

/// Inclusive span test: an offset one past the last byte still matches.
pub fn spans(node: Node<'_>, offset: usize) -> bool {
    node.start_byte() <= offset && offset <= node.end_byte()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stops_at_first_break() {
        let mut parser = GoParser::new().unwrap();
        let tree = parser
            .parse("a.go", "package p; var a, b int".to_string())
            .unwrap();
        let mut seen = Vec::new();
        let found = walk(tree.root(), |node| {
            if node.kind() == node_types::IDENTIFIER {
                seen.push(tree.text(node).to_string());
                if tree.text(node) == "a" {
                    return ControlFlow::Break(node.start_byte());
                }
            }
            ControlFlow::Continue(Visit::Descend)
        });
        assert_eq!(found, Some(15));
        assert_eq!(seen, vec!["a"]);
    }

    #[test]
    fn test_walk_skip_prunes_subtree() {
        let mut parser = GoParser::new().unwrap();
        let tree = parser
            .parse("a.go", "package p; func f() { x := 1; _ = x }".to_string())
            .unwrap();
        let mut identifiers = 0;
        let found: Option<()> = walk(tree.root(), |node| {
            if node.kind() == node_types::BLOCK {
                return ControlFlow::Continue(Visit::Skip);
            }
            if node.kind() == node_types::IDENTIFIER {
                identifiers += 1;
            }
            ControlFlow::Continue(Visit::Descend)
        });
        assert!(found.is_none());
        assert_eq!(identifiers, 1);
    }

    #[test]
    fn test_spans_is_inclusive() {
        let mut parser = GoParser::new().unwrap();
        let tree = parser.parse("a.go", "package abc".to_string()).unwrap();
        let name = named_children(named_children(tree.root())[0])[0];
        assert!(!spans(name, 7));
        assert!(spans(name, 8));
        assert!(spans(name, 11));
        assert!(!spans(name, 12));
    }
}
