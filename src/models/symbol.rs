//! Symbol model definitions
//!
//! Objects recorded by the checker, the resolved symbol built from them, and
//! the documentation lookup key handed to the viewer.

use std::fmt;

/// Kind of a named program entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Const,
    TypeName,
    Var,
    Func,
    PkgName,
    Builtin,
    Nil,
    Label,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Const => "const",
            Self::TypeName => "type",
            Self::Var => "var",
            Self::Func => "func",
            Self::PkgName => "package",
            Self::Builtin => "builtin",
            Self::Nil => "nil",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package an object belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Predeclared in the universe scope.
    Universe,
    /// Declared in the package being edited.
    Local,
    /// Member of an imported package, by import path.
    Imported(String),
    /// Member reached through a value whose package was not loaded.
    Foreign,
}

impl Owner {
    pub fn is_universe(&self) -> bool {
        matches!(self, Self::Universe)
    }
}

/// A named entity recorded in the definition and use tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub name: String,
    pub owner: Owner,
    /// Import path for `PkgName` objects.
    pub imported: Option<String>,
}

impl Object {
    pub fn new(kind: ObjectKind, name: impl Into<String>, owner: Owner) -> Self {
        Self {
            kind,
            name: name.into(),
            owner,
            imported: None,
        }
    }

    pub fn package(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::PkgName,
            name: name.into(),
            owner: Owner::Local,
            imported: Some(path.into()),
        }
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Result of resolving the identifier under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSymbol {
    Builtin(String),
    Package(String),
    Declaration {
        kind: ObjectKind,
        name: String,
        owner: Owner,
    },
    Usage {
        kind: ObjectKind,
        name: String,
        owner: Owner,
        /// Written with a package qualifier. Recorded for diagnostics only;
        /// `owner` alone decides the lookup key.
        from_import: bool,
    },
}

impl ResolvedSymbol {
    /// Whether the symbol belongs to the package being edited, so that its
    /// key needs that package's import path.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Declaration {
                owner: Owner::Local,
                ..
            } | Self::Usage {
                owner: Owner::Local,
                ..
            }
        )
    }
}

/// Documentation path and identifier passed to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    pub path: String,
    pub ident: String,
}

impl LookupKey {
    pub const BUILTIN: &'static str = "builtin";

    pub fn new(path: impl Into<String>, ident: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ident: ident.into(),
        }
    }

    pub fn package(path: impl Into<String>) -> Self {
        Self::new(path, String::new())
    }

    pub fn builtin(ident: impl Into<String>) -> Self {
        Self::new(Self::BUILTIN, ident)
    }

    /// Positional arguments for the documentation viewer.
    pub fn args(&self) -> Vec<&str> {
        if self.ident.is_empty() {
            vec![self.path.as_str()]
        } else {
            vec![self.path.as_str(), self.ident.as_str()]
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ident.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}.{}", self.path, self.ident)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported() {
        assert!(is_exported("Reader"));
        assert!(is_exported("Ärger"));
        assert!(!is_exported("reader"));
        assert!(!is_exported("_"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_lookup_key_args() {
        assert_eq!(LookupKey::package("io").args(), vec!["io"]);
        assert_eq!(LookupKey::new("io", "Reader").args(), vec!["io", "Reader"]);
        assert_eq!(LookupKey::builtin("make").to_string(), "builtin.make");
    }
}
