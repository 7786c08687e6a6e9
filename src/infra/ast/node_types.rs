//! Tree-sitter Go node kinds
//!
//! Verified against tree-sitter-go `src/node-types.json`.

// Declarations
pub const SOURCE_FILE: &str = "source_file";
pub const PACKAGE_CLAUSE: &str = "package_clause";
pub const IMPORT_DECLARATION: &str = "import_declaration";
pub const IMPORT_SPEC: &str = "import_spec";
pub const FUNCTION_DECLARATION: &str = "function_declaration";
pub const METHOD_DECLARATION: &str = "method_declaration";
pub const TYPE_DECLARATION: &str = "type_declaration";
pub const TYPE_SPEC: &str = "type_spec";
pub const TYPE_ALIAS: &str = "type_alias";
pub const CONST_DECLARATION: &str = "const_declaration";
pub const CONST_SPEC: &str = "const_spec";
pub const VAR_DECLARATION: &str = "var_declaration";
pub const VAR_SPEC: &str = "var_spec";
pub const PARAMETER_LIST: &str = "parameter_list";
pub const PARAMETER_DECLARATION: &str = "parameter_declaration";
pub const VARIADIC_PARAMETER_DECLARATION: &str = "variadic_parameter_declaration";
pub const TYPE_PARAMETER_DECLARATION: &str = "type_parameter_declaration";
pub const FIELD_DECLARATION: &str = "field_declaration";
pub const METHOD_ELEM: &str = "method_elem";
pub const METHOD_SPEC: &str = "method_spec";

// Types
pub const STRUCT_TYPE: &str = "struct_type";
pub const INTERFACE_TYPE: &str = "interface_type";
pub const POINTER_TYPE: &str = "pointer_type";
pub const QUALIFIED_TYPE: &str = "qualified_type";
pub const GENERIC_TYPE: &str = "generic_type";
pub const PARENTHESIZED_TYPE: &str = "parenthesized_type";
pub const FUNCTION_TYPE: &str = "function_type";
pub const TYPE_ELEM: &str = "type_elem";
pub const TYPE_ARGUMENTS: &str = "type_arguments";
pub const SLICE_TYPE: &str = "slice_type";
pub const ARRAY_TYPE: &str = "array_type";
pub const IMPLICIT_LENGTH_ARRAY_TYPE: &str = "implicit_length_array_type";
pub const MAP_TYPE: &str = "map_type";
pub const CHANNEL_TYPE: &str = "channel_type";

// Statements
pub const BLOCK: &str = "block";
pub const SHORT_VAR_DECLARATION: &str = "short_var_declaration";
pub const LABELED_STATEMENT: &str = "labeled_statement";
pub const IF_STATEMENT: &str = "if_statement";
pub const FOR_STATEMENT: &str = "for_statement";
pub const RANGE_CLAUSE: &str = "range_clause";
pub const EXPRESSION_SWITCH_STATEMENT: &str = "expression_switch_statement";
pub const TYPE_SWITCH_STATEMENT: &str = "type_switch_statement";
pub const SELECT_STATEMENT: &str = "select_statement";
pub const EXPRESSION_CASE: &str = "expression_case";
pub const TYPE_CASE: &str = "type_case";
pub const DEFAULT_CASE: &str = "default_case";
pub const COMMUNICATION_CASE: &str = "communication_case";
pub const RECEIVE_STATEMENT: &str = "receive_statement";

// Expressions
pub const FUNC_LITERAL: &str = "func_literal";
pub const CALL_EXPRESSION: &str = "call_expression";
pub const SELECTOR_EXPRESSION: &str = "selector_expression";
pub const COMPOSITE_LITERAL: &str = "composite_literal";
pub const LITERAL_VALUE: &str = "literal_value";
pub const LITERAL_ELEMENT: &str = "literal_element";
pub const KEYED_ELEMENT: &str = "keyed_element";
pub const UNARY_EXPRESSION: &str = "unary_expression";
pub const PARENTHESIZED_EXPRESSION: &str = "parenthesized_expression";
pub const TYPE_CONVERSION_EXPRESSION: &str = "type_conversion_expression";
pub const TYPE_ASSERTION_EXPRESSION: &str = "type_assertion_expression";
pub const INDEX_EXPRESSION: &str = "index_expression";
pub const SLICE_EXPRESSION: &str = "slice_expression";

// Tokens
pub const IDENTIFIER: &str = "identifier";
pub const TYPE_IDENTIFIER: &str = "type_identifier";
pub const FIELD_IDENTIFIER: &str = "field_identifier";
pub const PACKAGE_IDENTIFIER: &str = "package_identifier";
pub const LABEL_NAME: &str = "label_name";
pub const BLANK_IDENTIFIER: &str = "blank_identifier";
pub const DOT: &str = "dot";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const NIL: &str = "nil";
pub const IOTA: &str = "iota";
pub const COMMENT: &str = "comment";

/// Predeclared names the grammar lexes as dedicated tokens.
pub const PREDECLARED_TOKENS: &[&str] = &[TRUE, FALSE, NIL, IOTA];

/// Tokens that name a program entity.
pub fn is_identifier_token(kind: &str) -> bool {
    matches!(
        kind,
        IDENTIFIER | TYPE_IDENTIFIER | FIELD_IDENTIFIER | PACKAGE_IDENTIFIER | LABEL_NAME
    ) || PREDECLARED_TOKENS.contains(&kind)
}

/// Statements whose header declarations are scoped to the statement.
pub fn opens_scope(kind: &str) -> bool {
    matches!(
        kind,
        BLOCK
            | IF_STATEMENT
            | FOR_STATEMENT
            | EXPRESSION_SWITCH_STATEMENT
            | TYPE_SWITCH_STATEMENT
            | SELECT_STATEMENT
            | EXPRESSION_CASE
            | DEFAULT_CASE
            | COMMUNICATION_CASE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_tokens() {
        assert!(is_identifier_token("identifier"));
        assert!(is_identifier_token("type_identifier"));
        assert!(is_identifier_token("nil"));
        assert!(!is_identifier_token("interpreted_string_literal"));
        assert!(!is_identifier_token("blank_identifier"));
    }

    #[test]
    fn test_scopes() {
        assert!(opens_scope("block"));
        assert!(opens_scope("type_switch_statement"));
        assert!(!opens_scope("type_case"));
        assert!(!opens_scope("call_expression"));
    }
}
