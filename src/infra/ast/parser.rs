//! Go parser wrapper
//!
//! Owns a tree-sitter parser configured for Go and turns source text into
//! a `SyntaxTree`, rejecting files that contain syntax errors.

use std::ops::{ControlFlow, Range};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use super::node_types as kind;
use super::{Visit, walk};
use crate::error::LoadError;

const IMPORT_QUERY: &str = "(import_spec) @spec";

pub fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self, LoadError> {
        let mut parser = Parser::new();
        parser
            .set_language(&go_language())
            .map_err(|e| LoadError::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse `source`; the first syntax error becomes a `LoadError::Parse`.
    ///
    /// The grammar wants a terminator after the last declaration, so a
    /// missing final newline is supplied. Byte offsets are unchanged.
    pub fn parse(&mut self, name: &str, mut source: String) -> Result<SyntaxTree, LoadError> {
        if !source.ends_with('\n') {
            source.push('\n');
        }
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| LoadError::Parser(format!("parsing {name} was cancelled")))?;

        let syntax = SyntaxTree {
            name: name.to_string(),
            source,
            tree,
        };
        if let Some(error) = syntax.first_syntax_error() {
            return Err(error);
        }
        Ok(syntax)
    }
}

/// A parsed Go source file.
pub struct SyntaxTree {
    name: String,
    source: String,
    tree: Tree,
}

/// How an import spec names the imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import "io"`
    Implicit,
    /// `import foo "io"`, with the span of `foo`
    Alias(String, Range<usize>),
    /// `import _ "io"`
    Blank,
    /// `import . "io"`
    Dot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: ImportName,
    pub path: String,
    /// Byte span of the whole spec, name included
    pub span: Range<usize>,
}

impl ImportSpec {
    /// Name the import is referred to by inside the file, if any.
    pub fn local_name(&self) -> Option<&str> {
        match &self.name {
            ImportName::Alias(alias, _) => Some(alias),
            ImportName::Implicit => Some(default_package_name(&self.path)),
            ImportName::Blank | ImportName::Dot => None,
        }
    }
}

/// Package name assumed for an import path: its last element, skipping a
/// trailing major version element such as `/v2`.
pub fn default_package_name(path: &str) -> &str {
    let mut elements = path.rsplit('/');
    let last = elements.next().unwrap_or(path);
    let is_major_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].bytes().all(|b| b.is_ascii_digit());
    match elements.next() {
        Some(parent) if is_major_version => parent,
        _ => last,
    }
}

impl SyntaxTree {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// 1-based line and column of a byte offset.
    pub fn position(&self, byte: usize) -> (usize, usize) {
        let before = &self.source[..byte.min(self.source.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, byte - line_start + 1)
    }

    /// Name from the package clause.
    pub fn package_name(&self) -> Option<&str> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == kind::PACKAGE_CLAUSE)?;
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == kind::PACKAGE_IDENTIFIER)?;
        Some(self.text(name))
    }

    pub fn imports(&self) -> Vec<ImportSpec> {
        let query = match Query::new(&go_language(), IMPORT_QUERY) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!("Invalid import query: {}", e);
                return Vec::new();
            }
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.root(), self.source.as_bytes());
        let mut imports = Vec::new();
        while let Some(query_match) = matches.next() {
            for capture in query_match.captures {
                if let Some(spec) = self.import_spec(capture.node) {
                    imports.push(spec);
                }
            }
        }
        imports.sort_by_key(|spec| spec.span.start);
        imports
    }

    fn import_spec(&self, node: Node<'_>) -> Option<ImportSpec> {
        let path = node.child_by_field_name("path")?;
        let name = match node.child_by_field_name("name") {
            None => ImportName::Implicit,
            Some(n) if n.kind() == kind::DOT => ImportName::Dot,
            Some(n) if n.kind() == kind::BLANK_IDENTIFIER || self.text(n) == "_" => {
                ImportName::Blank
            }
            Some(n) => ImportName::Alias(self.text(n).to_string(), n.byte_range()),
        };
        Some(ImportSpec {
            name,
            path: unquote(self.text(path)).to_string(),
            span: node.byte_range(),
        })
    }

    fn first_syntax_error(&self) -> Option<LoadError> {
        if !self.root().has_error() {
            return None;
        }
        let culprit = walk(self.root(), |node| {
            if node.is_error() || node.is_missing() {
                return ControlFlow::Break(node);
            }
            if node.has_error() {
                ControlFlow::Continue(Visit::Descend)
            } else {
                ControlFlow::Continue(Visit::Skip)
            }
        });

        let (start, message) = match culprit {
            Some(node) if node.is_missing() => {
                (node.start_byte(), format!("expected {}", node.kind()))
            }
            Some(node) => {
                let found: String = self.text(node).chars().take(20).collect();
                let found = found.lines().next().unwrap_or_default().to_string();
                if found.is_empty() {
                    (node.start_byte(), "syntax error".to_string())
                } else {
                    (node.start_byte(), format!("syntax error near {found:?}"))
                }
            }
            None => (0, "syntax error".to_string()),
        };
        let (line, column) = self.position(start);
        Some(LoadError::Parse {
            file: self.name.clone(),
            line,
            column,
            message,
        })
    }
}

fn unquote(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<SyntaxTree, LoadError> {
        GoParser::new().unwrap().parse("x.go", source.to_string())
    }

    #[test]
    fn test_package_name() {
        let tree = parse("package foo_test\n\nfunc F() {}\n").unwrap();
        assert_eq!(tree.package_name(), Some("foo_test"));
    }

    #[test]
    fn test_imports() {
        let tree = parse(
            "package p\n\nimport (\n\t\"fmt\"\n\tx \"net/http\"\n\t_ \"embed\"\n\t. \"strings\"\n)\nimport `io`\n",
        )
        .unwrap();
        let imports = tree.imports();
        let paths: Vec<_> = imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "net/http", "embed", "strings", "io"]);
        assert_eq!(imports[0].name, ImportName::Implicit);
        assert!(matches!(&imports[1].name, ImportName::Alias(name, _) if name == "x"));
        assert_eq!(imports[2].name, ImportName::Blank);
        assert_eq!(imports[3].name, ImportName::Dot);
        assert_eq!(imports[1].local_name(), Some("x"));
        assert_eq!(imports[2].local_name(), None);
    }

    #[test]
    fn test_import_spec_span_includes_name() {
        let tree = parse(r#"package main; import _ "io""#).unwrap();
        assert_eq!(tree.imports()[0].span, 21..27);
    }

    #[test]
    fn test_default_package_name() {
        assert_eq!(default_package_name("io"), "io");
        assert_eq!(default_package_name("net/http"), "http");
        assert_eq!(default_package_name("github.com/user/mod/v2"), "mod");
        assert_eq!(default_package_name("example.com/v"), "v");
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("package p\n\nfunc main() {\n\tx := \n}\n").err().unwrap();
        match err {
            LoadError::Parse { file, line, .. } => {
                assert_eq!(file, "x.go");
                assert!(line >= 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_final_newline() {
        let tree = parse("package p; var abc, d int").unwrap();
        assert_eq!(tree.package_name(), Some("p"));
        assert_eq!(&tree.source()[15..18], "abc");
        assert_eq!(tree.position(15), (1, 16));
    }

    #[test]
    fn test_position() {
        let tree = parse("package p\nvar x int\n").unwrap();
        assert_eq!(tree.position(0), (1, 1));
        assert_eq!(tree.position(14), (2, 5));
    }
}
