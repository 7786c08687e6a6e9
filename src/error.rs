//! Error types for agodoc
//!
//! Every pipeline stage owns one error enum. `AgodocError` aggregates them
//! and carries the one-line context prefix printed before exiting.

use std::path::PathBuf;

use thiserror::Error;

pub type AgodocResult<T> = std::result::Result<T, AgodocError>;

#[derive(Debug, Error)]
pub enum AgodocError {
    #[error("cannot open window: {0}")]
    Editor(#[from] EditorError),

    #[error("cannot get selection: {0}")]
    Encoding(#[from] EncodingError),

    #[error("cannot load program: {0}")]
    Load(#[from] LoadError),

    #[error("cannot find identifier: {0}")]
    Resolve(#[from] ResolveError),

    #[error("documentation viewer failed: {0}")]
    Viewer(#[from] ViewerError),

    #[error("cannot load config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures talking to the Acme file server.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("$winid is not set")]
    MissingWindowId,

    #[error("invalid $winid {0:?}")]
    InvalidWindowId(String),

    #[error("cannot connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("9P protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Remote(String),

    #[error("cannot get filename from tag")]
    MissingFilename,

    #[error("window {file} is not valid UTF-8")]
    InvalidText { file: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("offset {requested} is past the end of the buffer ({available} characters)")]
    EndOfInput { requested: usize, available: usize },
}

/// Failures building the program view of the package.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}", format_type_errors(.0))]
    TypeCheck(Vec<TypeError>),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot initialize Go parser: {0}")]
    Parser(String),
}

/// A single checker diagnostic, positioned 1-based like `go vet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message)
    }
}

fn format_type_errors(errors: &[TypeError]) -> String {
    match errors {
        [] => "type checking failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more errors)", first, rest.len()),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no identifier at offset {0}")]
    NotFound(usize),

    #[error("cannot find identifier {0} in file")]
    UnresolvedIdentifier(String),

    #[error("cannot print documentation of {kind} {name}")]
    UnsupportedSymbolKind { kind: String, name: String },

    #[error("cannot print documentation of unexported identifier {0}")]
    Unexported(String),

    #[error("cannot determine import path of {dir}: {message}")]
    ImportPath { dir: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("cannot start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_error(message: &str) -> TypeError {
        TypeError {
            file: "a.go".to_string(),
            line: 3,
            column: 7,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_stage_prefixes() {
        let err = AgodocError::from(ResolveError::NotFound(12));
        assert_eq!(err.to_string(), "cannot find identifier: no identifier at offset 12");

        let err = AgodocError::from(EditorError::MissingWindowId);
        assert_eq!(err.to_string(), "cannot open window: $winid is not set");

        let err = AgodocError::from(EncodingError::EndOfInput {
            requested: 9,
            available: 4,
        });
        assert!(err.to_string().starts_with("cannot get selection: "));
    }

    #[test]
    fn test_type_errors_aggregate_into_one_line() {
        let single = LoadError::TypeCheck(vec![type_error("undefined: x")]);
        assert_eq!(single.to_string(), "a.go:3:7: undefined: x");

        let many = LoadError::TypeCheck(vec![
            type_error("undefined: x"),
            type_error("undefined: y"),
            type_error("undefined: z"),
        ]);
        assert_eq!(
            many.to_string(),
            "a.go:3:7: undefined: x (and 2 more errors)"
        );
        assert!(!many.to_string().contains('\n'));
    }

    #[test]
    fn test_unsupported_kind_message() {
        let err = ResolveError::UnsupportedSymbolKind {
            kind: "label".to_string(),
            name: "outer".to_string(),
        };
        assert_eq!(err.to_string(), "cannot print documentation of label outer");
    }
}
