//! Source loader
//!
//! Builds the program view of the package in a directory: the edited buffer
//! plus every sibling `.go` file, parsed and checked as one unit.

use std::path::{Path, PathBuf};

use crate::error::{LoadError, TypeError};
use crate::infra::ast::node_types as kind;
use crate::infra::ast::{GoParser, SyntaxTree, named_children};
use crate::services::check::{self, IdentKey, Info};

const TEST_SUFFIX: &str = "_test";

/// A parsed file and the package name it is checked under.
pub struct SourceFile {
    pub syntax: SyntaxTree,
    /// Package clause name with any `_test` suffix removed
    pub package: String,
}

/// All files of the package with their definition and use tables.
pub struct Program {
    files: Vec<SourceFile>,
    edited: usize,
    info: Info,
}

impl Program {
    /// Check `files` as one package; the first file is the edited one.
    pub fn new(files: Vec<SourceFile>) -> Result<Self, LoadError> {
        check_package_names(&files)?;
        let info = check::check(&files).map_err(LoadError::TypeCheck)?;
        Ok(Self {
            files,
            edited: 0,
            info,
        })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The live buffer.
    pub fn edited(&self) -> &SourceFile {
        &self.files[self.edited]
    }

    pub fn edited_index(&self) -> usize {
        self.edited
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Key of an identifier node in the edited file.
    pub fn key(&self, node: tree_sitter::Node<'_>) -> IdentKey {
        IdentKey::new(self.edited, node)
    }
}

/// Parse one file and normalize its package name.
pub fn parse_source(name: &str, source: String) -> Result<SourceFile, LoadError> {
    let mut parser = GoParser::new()?;
    parse_with(&mut parser, name, source)
}

fn parse_with(parser: &mut GoParser, name: &str, source: String) -> Result<SourceFile, LoadError> {
    let syntax = parser.parse(name, source)?;
    let Some(package) = syntax.package_name() else {
        return Err(LoadError::Parse {
            file: name.to_string(),
            line: 1,
            column: 1,
            message: "expected 'package' clause".to_string(),
        });
    };
    let package = package.strip_suffix(TEST_SUFFIX).unwrap_or(package).to_string();
    Ok(SourceFile { syntax, package })
}

/// `*.go` files directly in `dir`, except the one named like `edited`.
pub fn sibling_files(dir: &Path, edited: &str) -> Vec<PathBuf> {
    let edited = Path::new(edited).file_name();
    let mut siblings: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "go"))
        .filter(|e| Some(e.file_name()) != edited)
        .map(|e| e.into_path())
        .collect();
    siblings.sort();
    siblings
}

/// Load the package in `dir`, taking the edited file's contents from
/// `buffer` instead of disk.
pub async fn load_program(dir: &Path, edited: &str, buffer: String) -> Result<Program, LoadError> {
    let mut parser = GoParser::new()?;
    let edited_name = Path::new(edited)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| edited.to_string());

    let mut files = vec![parse_with(&mut parser, &edited_name, buffer)?];
    for path in sibling_files(dir, edited) {
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(parse_with(&mut parser, &name, source)?);
    }
    tracing::debug!("Loaded {} files from {}", files.len(), dir.display());
    Program::new(files)
}

/// Every file must name the edited file's package.
fn check_package_names(files: &[SourceFile]) -> Result<(), LoadError> {
    let Some(expected) = files.first().map(|file| file.package.as_str()) else {
        return Ok(());
    };
    let errors: Vec<TypeError> = files
        .iter()
        .filter(|file| file.package != expected)
        .map(|file| {
            let root = file.syntax.root();
            let start = named_children(root)
                .into_iter()
                .find(|node| node.kind() == kind::PACKAGE_CLAUSE)
                .map_or(0, |clause| clause.start_byte());
            let (line, column) = file.syntax.position(start);
            TypeError {
                file: file.syntax.name().to_string(),
                line,
                column,
                message: format!("package {}; expected {}", file.package, expected),
            }
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::TypeCheck(errors))
    }
}
