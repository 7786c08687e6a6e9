//! Predeclared identifiers of the universe scope

use crate::models::symbol::ObjectKind;

const TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

const CONSTS: &[&str] = &["true", "false", "iota"];

const FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

/// Kind of a predeclared identifier, if `name` is one.
pub fn lookup(name: &str) -> Option<ObjectKind> {
    if TYPES.contains(&name) {
        Some(ObjectKind::TypeName)
    } else if CONSTS.contains(&name) {
        Some(ObjectKind::Const)
    } else if FUNCS.contains(&name) {
        Some(ObjectKind::Builtin)
    } else if name == "nil" {
        Some(ObjectKind::Nil)
    } else {
        None
    }
}

/// The only method declared in the universe: `error.Error`.
pub fn method(type_name: &str, method: &str) -> bool {
    type_name == "error" && method == "Error"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("bool"), Some(ObjectKind::TypeName));
        assert_eq!(lookup("true"), Some(ObjectKind::Const));
        assert_eq!(lookup("make"), Some(ObjectKind::Builtin));
        assert_eq!(lookup("nil"), Some(ObjectKind::Nil));
        assert_eq!(lookup("Reader"), None);
    }

    #[test]
    fn test_error_method() {
        assert!(method("error", "Error"));
        assert!(!method("string", "Error"));
    }
}
