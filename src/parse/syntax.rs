//! Closed set of syntax node kinds consumed by the extractors
//!
//! Tree-sitter exposes node kinds as strings. Everything the extractors care
//! about is mapped into `SyntaxKind` once, so each extraction rule is an arm of
//! an exhaustive `match` instead of an ad-hoc string comparison.
//!
//! @module parse/syntax

use tree_sitter::Node;

/// Node kinds understood by symbol, import, export and call extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    // Declarations
    FunctionDeclaration,
    GeneratorFunctionDeclaration,
    ClassDeclaration,
    AbstractClassDeclaration,
    InterfaceDeclaration,
    TypeAliasDeclaration,
    EnumDeclaration,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    AmbientDeclaration,

    // Modules
    ImportStatement,
    ImportClause,
    NamedImports,
    ImportSpecifier,
    NamespaceImport,
    ImportRequireClause,
    ExportStatement,
    ExportClause,
    ExportSpecifier,
    NamespaceExport,

    // Class and interface members
    ClassBody,
    InterfaceBody,
    ObjectType,
    MethodDefinition,
    FieldDefinition,
    MethodSignature,
    AbstractMethodSignature,

    // Parameters
    FormalParameters,
    RequiredParameter,
    OptionalParameter,
    AssignmentPattern,
    RestPattern,
    Identifier,

    // Expressions
    CallExpression,
    NewExpression,
    MemberExpression,
    ArrowFunction,
    FunctionExpression,
    GeneratorFunction,
    StatementBlock,

    Other,
}

impl SyntaxKind {
    pub fn of(node: Node) -> Self {
        // Anonymous tokens share names with some node kinds (`function`)
        if !node.is_named() {
            return Self::Other;
        }
        Self::from_kind(node.kind())
    }

    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "function_declaration" => Self::FunctionDeclaration,
            "generator_function_declaration" => Self::GeneratorFunctionDeclaration,
            "class_declaration" => Self::ClassDeclaration,
            "abstract_class_declaration" => Self::AbstractClassDeclaration,
            "interface_declaration" => Self::InterfaceDeclaration,
            "type_alias_declaration" => Self::TypeAliasDeclaration,
            "enum_declaration" => Self::EnumDeclaration,
            "lexical_declaration" => Self::LexicalDeclaration,
            "variable_declaration" => Self::VariableDeclaration,
            "variable_declarator" => Self::VariableDeclarator,
            "ambient_declaration" => Self::AmbientDeclaration,
            "import_statement" => Self::ImportStatement,
            "import_clause" => Self::ImportClause,
            "named_imports" => Self::NamedImports,
            "import_specifier" => Self::ImportSpecifier,
            "namespace_import" => Self::NamespaceImport,
            "import_require_clause" => Self::ImportRequireClause,
            "export_statement" => Self::ExportStatement,
            "export_clause" => Self::ExportClause,
            "export_specifier" => Self::ExportSpecifier,
            "namespace_export" => Self::NamespaceExport,
            "class_body" => Self::ClassBody,
            "interface_body" => Self::InterfaceBody,
            "object_type" => Self::ObjectType,
            "method_definition" => Self::MethodDefinition,
            "public_field_definition" | "field_definition" => Self::FieldDefinition,
            "method_signature" => Self::MethodSignature,
            "abstract_method_signature" => Self::AbstractMethodSignature,
            "formal_parameters" => Self::FormalParameters,
            "required_parameter" => Self::RequiredParameter,
            "optional_parameter" => Self::OptionalParameter,
            "assignment_pattern" => Self::AssignmentPattern,
            "rest_pattern" => Self::RestPattern,
            "identifier" => Self::Identifier,
            "call_expression" => Self::CallExpression,
            "new_expression" => Self::NewExpression,
            "member_expression" => Self::MemberExpression,
            "arrow_function" => Self::ArrowFunction,
            "function_expression" | "function" => Self::FunctionExpression,
            "generator_function" => Self::GeneratorFunction,
            "statement_block" => Self::StatementBlock,
            _ => Self::Other,
        }
    }

    /// Expressions that introduce a function body
    pub fn is_function_value(&self) -> bool {
        matches!(
            self,
            Self::ArrowFunction | Self::FunctionExpression | Self::GeneratorFunction
        )
    }
}

/// Whether `node` has an anonymous child token with the given text (`async`, `static`, `default`, `type`)
pub fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Source text of a node, empty on invalid UTF-8
pub fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// 1-based start line
pub fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based end line
pub fn end_line(node: Node) -> u32 {
    node.end_position().row as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kinds_map_to_other() {
        assert_eq!(SyntaxKind::from_kind("jsx_element"), SyntaxKind::Other);
        assert_eq!(
            SyntaxKind::from_kind("call_expression"),
            SyntaxKind::CallExpression
        );
        assert!(SyntaxKind::from_kind("arrow_function").is_function_value());
        assert!(!SyntaxKind::from_kind("statement_block").is_function_value());
    }
}
