//! Tree-sitter Based Extraction
//!
//! Runs the three independent passes over a parsed file:
//! - symbols (top-level declarations, class/interface members, callee names)
//! - imports (normalized specifiers and bound names)
//! - exports (direct, default, local clauses and re-exports)
//!
//! and collects the body ranges the skeleton generator collapses.
//!
//! @module parse/extract

use std::collections::{BTreeMap, HashSet};

use tree_sitter::Node;

use super::languages::{Language, Parsers};
use super::skeleton::BodyRange;
use super::syntax::{end_line, has_token, start_line, text, SyntaxKind};
use crate::core::error::{Error, Result};
use crate::index::record::{
    is_relative_specifier, Export, ExportKind, Import, Param, Symbol, SymbolFlags, SymbolKind,
    WILDCARD,
};

/// Everything extracted from one file
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub body_ranges: Vec<BodyRange>,
}

// =============================================================================
// MAIN EXTRACTION FUNCTION
// =============================================================================

/// Parse `source` and extract its structure
pub fn extract(parsers: &mut Parsers, source: &str, language: Language) -> Result<Extracted> {
    let parser = parsers
        .get_mut(language)
        .ok_or_else(|| Error::UnsupportedLanguage {
            path: language.to_string(),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Parse {
            language: language.to_string(),
            message: "Parser returned None".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!(%language, "Syntax errors present, extracting best-effort");
    }

    let src = source.as_bytes();
    let mut symbols = extract_symbols(root, src);
    let imports = extract_imports(root, src);
    let bound = bound_names(&symbols, &imports);
    drop_builtin_calls(&mut symbols, &bound);
    let exports = extract_exports(root, src, &mut symbols, &imports);
    let body_ranges = collect_body_ranges(root);

    Ok(Extracted {
        symbols,
        imports,
        exports,
        body_ranges,
    })
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    children
}

// =============================================================================
// SYMBOLS
// =============================================================================

fn extract_symbols(root: Node, src: &[u8]) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for child in named_children(root) {
        collect_declaration(child, src, SymbolFlags::empty(), &mut symbols);
    }
    symbols
}

fn collect_declaration(node: Node, src: &[u8], flags: SymbolFlags, out: &mut Vec<Symbol>) {
    match SyntaxKind::of(node) {
        SyntaxKind::FunctionDeclaration | SyntaxKind::GeneratorFunctionDeclaration => {
            if let Some(name) = field_text(node, "name", src) {
                out.push(callable_symbol(
                    name,
                    SymbolKind::Function,
                    node,
                    node,
                    src,
                    flags,
                ));
            }
        }
        SyntaxKind::ClassDeclaration | SyntaxKind::AbstractClassDeclaration => {
            out.extend(class_symbol(node, src, flags));
        }
        SyntaxKind::InterfaceDeclaration => {
            out.extend(interface_symbol(node, src, flags));
        }
        SyntaxKind::TypeAliasDeclaration => {
            out.extend(plain_symbol(node, SymbolKind::Type, src, flags));
        }
        SyntaxKind::EnumDeclaration => {
            out.extend(plain_symbol(node, SymbolKind::Enum, src, flags));
        }
        SyntaxKind::LexicalDeclaration | SyntaxKind::VariableDeclaration => {
            for declarator in named_children(node) {
                if SyntaxKind::of(declarator) == SyntaxKind::VariableDeclarator {
                    out.extend(variable_symbol(declarator, src, flags));
                }
            }
        }
        SyntaxKind::ExportStatement => {
            let flags = flags | SymbolFlags::EXPORTED;
            let is_default = has_token(node, "default");
            if let Some(declaration) = node.child_by_field_name("declaration") {
                let before = out.len();
                collect_declaration(declaration, src, flags, out);
                if is_default && out.len() == before {
                    out.extend(default_function(declaration, node, src, flags));
                }
            } else if is_default {
                if let Some(value) = node.child_by_field_name("value") {
                    out.extend(default_function(value, node, src, flags));
                }
            }
        }
        SyntaxKind::AmbientDeclaration => {
            for child in named_children(node) {
                collect_declaration(child, src, flags, out);
            }
        }
        // Not a top-level declaration
        SyntaxKind::VariableDeclarator
        | SyntaxKind::ImportStatement
        | SyntaxKind::ImportClause
        | SyntaxKind::NamedImports
        | SyntaxKind::ImportSpecifier
        | SyntaxKind::NamespaceImport
        | SyntaxKind::ImportRequireClause
        | SyntaxKind::ExportClause
        | SyntaxKind::ExportSpecifier
        | SyntaxKind::NamespaceExport
        | SyntaxKind::ClassBody
        | SyntaxKind::InterfaceBody
        | SyntaxKind::ObjectType
        | SyntaxKind::MethodDefinition
        | SyntaxKind::FieldDefinition
        | SyntaxKind::MethodSignature
        | SyntaxKind::AbstractMethodSignature
        | SyntaxKind::FormalParameters
        | SyntaxKind::RequiredParameter
        | SyntaxKind::OptionalParameter
        | SyntaxKind::AssignmentPattern
        | SyntaxKind::RestPattern
        | SyntaxKind::Identifier
        | SyntaxKind::CallExpression
        | SyntaxKind::NewExpression
        | SyntaxKind::MemberExpression
        | SyntaxKind::ArrowFunction
        | SyntaxKind::FunctionExpression
        | SyntaxKind::GeneratorFunction
        | SyntaxKind::StatementBlock
        | SyntaxKind::Other => {}
    }
}

/// `export default function () {}` and `export default () => {}`
fn default_function(func: Node, span: Node, src: &[u8], flags: SymbolFlags) -> Option<Symbol> {
    let callable = match SyntaxKind::of(func) {
        SyntaxKind::FunctionDeclaration | SyntaxKind::GeneratorFunctionDeclaration => true,
        kind => kind.is_function_value(),
    };
    if !callable {
        return None;
    }
    let name = field_text(func, "name", src).unwrap_or_else(|| "default".to_string());
    Some(callable_symbol(
        name,
        SymbolKind::Function,
        func,
        span,
        src,
        flags,
    ))
}

fn field_text(node: Node, field: &str, src: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .map(|n| text(n, src).to_string())
        .filter(|s| !s.is_empty())
}

/// Symbol for anything with parameters and a body
///
/// `func` carries the parameters/return type/body, `span` the line range
/// (they differ for `const f = () => {}`).
fn callable_symbol(
    name: String,
    kind: SymbolKind,
    func: Node,
    span: Node,
    src: &[u8],
    mut flags: SymbolFlags,
) -> Symbol {
    if has_token(func, "async") {
        flags |= SymbolFlags::ASYNC;
    }
    let mut symbol = Symbol::new(name, kind, start_line(span), end_line(span));
    symbol.flags = flags;
    symbol.params = params_of(func, src);
    symbol.return_type = func
        .child_by_field_name("return_type")
        .map(|n| type_text(n, src));
    if let Some(body) = func.child_by_field_name("body") {
        symbol.calls = collect_calls(body, src);
    }
    symbol
}

fn plain_symbol(node: Node, kind: SymbolKind, src: &[u8], flags: SymbolFlags) -> Option<Symbol> {
    let name = field_text(node, "name", src)?;
    let mut symbol = Symbol::new(name, kind, start_line(node), end_line(node));
    symbol.flags = flags;
    Some(symbol)
}

fn class_symbol(node: Node, src: &[u8], flags: SymbolFlags) -> Option<Symbol> {
    let mut class = plain_symbol(node, SymbolKind::Class, src, flags)?;
    let Some(body) = node.child_by_field_name("body") else {
        return Some(class);
    };

    for member in named_children(body) {
        let mut member_flags = SymbolFlags::empty();
        if has_token(member, "static") {
            member_flags |= SymbolFlags::STATIC;
        }

        match SyntaxKind::of(member) {
            SyntaxKind::MethodDefinition | SyntaxKind::AbstractMethodSignature => {
                if let Some(name) = field_text(member, "name", src) {
                    class.methods.push(callable_symbol(
                        name,
                        SymbolKind::Method,
                        member,
                        member,
                        src,
                        member_flags,
                    ));
                }
            }
            SyntaxKind::FieldDefinition => {
                // `handle = async () => { ... }`
                let value = member
                    .child_by_field_name("value")
                    .filter(|v| SyntaxKind::of(*v).is_function_value());
                let name =
                    field_text(member, "name", src).or_else(|| field_text(member, "property", src));
                if let (Some(value), Some(name)) = (value, name) {
                    class.methods.push(callable_symbol(
                        name,
                        SymbolKind::Method,
                        value,
                        member,
                        src,
                        member_flags,
                    ));
                }
            }
            _ => {}
        }
    }

    Some(class)
}

fn interface_symbol(node: Node, src: &[u8], flags: SymbolFlags) -> Option<Symbol> {
    let mut interface = plain_symbol(node, SymbolKind::Interface, src, flags)?;
    let Some(body) = node.child_by_field_name("body") else {
        return Some(interface);
    };
    if !matches!(
        SyntaxKind::of(body),
        SyntaxKind::InterfaceBody | SyntaxKind::ObjectType
    ) {
        return Some(interface);
    }

    for member in named_children(body) {
        if SyntaxKind::of(member) != SyntaxKind::MethodSignature {
            continue;
        }
        if let Some(name) = field_text(member, "name", src) {
            interface.methods.push(callable_symbol(
                name,
                SymbolKind::Method,
                member,
                member,
                src,
                SymbolFlags::empty(),
            ));
        }
    }

    Some(interface)
}

fn variable_symbol(declarator: Node, src: &[u8], flags: SymbolFlags) -> Option<Symbol> {
    let name_node = declarator.child_by_field_name("name")?;
    // Destructuring patterns declare nothing nameable
    if SyntaxKind::of(name_node) != SyntaxKind::Identifier {
        return None;
    }
    let name = text(name_node, src).to_string();

    match declarator.child_by_field_name("value") {
        Some(value) if SyntaxKind::of(value).is_function_value() => Some(callable_symbol(
            name,
            SymbolKind::Function,
            value,
            declarator,
            src,
            flags,
        )),
        _ => {
            let mut symbol = Symbol::new(
                name,
                SymbolKind::Variable,
                start_line(declarator),
                end_line(declarator),
            );
            symbol.flags = flags;
            symbol.return_type = declarator
                .child_by_field_name("type")
                .map(|n| type_text(n, src));
            Some(symbol)
        }
    }
}

fn params_of(func: Node, src: &[u8]) -> Vec<Param> {
    if let Some(params) = func.child_by_field_name("parameters") {
        return named_children(params)
            .into_iter()
            .filter_map(|p| param_of(p, src))
            .collect();
    }
    // Arrow function with a single bare parameter
    func.child_by_field_name("parameter")
        .map(|p| {
            vec![Param {
                name: text(p, src).to_string(),
                type_text: None,
            }]
        })
        .unwrap_or_default()
}

fn param_of(node: Node, src: &[u8]) -> Option<Param> {
    let kind = SyntaxKind::of(node);
    match kind {
        SyntaxKind::RequiredParameter | SyntaxKind::OptionalParameter => {
            let pattern = node.child_by_field_name("pattern")?;
            let mut name = text(pattern, src).to_string();
            if kind == SyntaxKind::OptionalParameter {
                name.push('?');
            }
            Some(Param {
                name,
                type_text: node.child_by_field_name("type").map(|t| type_text(t, src)),
            })
        }
        SyntaxKind::AssignmentPattern => Some(Param {
            name: field_text(node, "left", src)?,
            type_text: None,
        }),
        _ if node.kind() == "comment" => None,
        // identifiers, rest and destructuring patterns
        _ => Some(Param {
            name: text(node, src).to_string(),
            type_text: None,
        }),
    }
}

/// `: Promise<void>` -> `Promise<void>`
fn type_text(node: Node, src: &[u8]) -> String {
    text(node, src).trim_start_matches(':').trim().to_string()
}

// =============================================================================
// CALLS
// =============================================================================

/// Callee names referenced anywhere under `body`, first occurrence order
fn collect_calls(body: Node, src: &[u8]) -> Vec<String> {
    let mut calls = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = vec![body];

    while let Some(node) = stack.pop() {
        let callee = match SyntaxKind::of(node) {
            SyntaxKind::CallExpression => node
                .child_by_field_name("function")
                .and_then(|f| callee_name(f, src)),
            SyntaxKind::NewExpression => node
                .child_by_field_name("constructor")
                .and_then(|c| callee_name(c, src)),
            _ => None,
        };

        if let Some(name) = callee {
            if !name.is_empty() && seen.insert(name) {
                calls.push(name.to_string());
            }
        }

        // Reverse so the leftmost child is visited first
        stack.extend(named_children(node).into_iter().rev());
    }

    calls
}

/// Reduce a callee expression to its last identifier (`a.b.c` -> `c`)
fn callee_name<'a>(node: Node, src: &'a [u8]) -> Option<&'a str> {
    match SyntaxKind::of(node) {
        SyntaxKind::Identifier => Some(text(node, src)),
        SyntaxKind::MemberExpression => node.child_by_field_name("property").map(|p| text(p, src)),
        _ => None,
    }
}

/// Names declared or imported in the file; these are never treated as builtins
fn bound_names(symbols: &[Symbol], imports: &[Import]) -> HashSet<String> {
    let mut bound = HashSet::new();
    for symbol in symbols {
        bound.insert(symbol.name.clone());
        bound.extend(symbol.methods.iter().map(|m| m.name.clone()));
    }
    for import in imports {
        bound.extend(import.names.iter().filter(|n| *n != WILDCARD).cloned());
        bound.extend(import.aliases.keys().cloned());
    }
    bound
}

fn drop_builtin_calls(symbols: &mut [Symbol], bound: &HashSet<String>) {
    for symbol in symbols {
        symbol
            .calls
            .retain(|name| bound.contains(name) || !is_common_builtin(name));
        drop_builtin_calls(&mut symbol.methods, bound);
    }
}

/// Globals that would otherwise link every file to nothing useful
fn is_common_builtin(name: &str) -> bool {
    matches!(
        name,
        "console"
            | "log"
            | "error"
            | "warn"
            | "info"
            | "debug"
            | "push"
            | "then"
            | "require"
            | "parseInt"
            | "parseFloat"
            | "isNaN"
            | "isFinite"
            | "setTimeout"
            | "setInterval"
            | "clearTimeout"
            | "clearInterval"
            | "JSON"
            | "Math"
            | "Date"
            | "Array"
            | "Object"
            | "String"
            | "Number"
            | "Boolean"
            | "Promise"
            | "Symbol"
            | "Error"
    )
}

// =============================================================================
// IMPORTS
// =============================================================================

fn extract_imports(root: Node, src: &[u8]) -> Vec<Import> {
    named_children(root)
        .into_iter()
        .filter(|n| SyntaxKind::of(*n) == SyntaxKind::ImportStatement)
        .filter_map(|n| import_of(n, src))
        .collect()
}

fn import_of(node: Node, src: &[u8]) -> Option<Import> {
    let mut source = node
        .child_by_field_name("source")
        .map(|s| string_value(s, src));
    let mut names: Vec<String> = Vec::new();
    let mut aliases = BTreeMap::new();
    let mut wildcard = false;
    let mut specifiers = 0;
    let mut type_specifiers = 0;

    for child in named_children(node) {
        match SyntaxKind::of(child) {
            SyntaxKind::ImportClause => {
                for part in named_children(child) {
                    match SyntaxKind::of(part) {
                        // default binding or `* as ns`
                        SyntaxKind::Identifier | SyntaxKind::NamespaceImport => wildcard = true,
                        SyntaxKind::NamedImports => {
                            for spec in named_children(part) {
                                if SyntaxKind::of(spec) != SyntaxKind::ImportSpecifier {
                                    continue;
                                }
                                let Some(imported) = field_text(spec, "name", src) else {
                                    continue;
                                };
                                specifiers += 1;
                                if has_token(spec, "type") {
                                    type_specifiers += 1;
                                }
                                if let Some(alias) = field_text(spec, "alias", src) {
                                    aliases.insert(alias, imported.clone());
                                }
                                if !names.contains(&imported) {
                                    names.push(imported);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            SyntaxKind::ImportRequireClause => {
                wildcard = true;
                if source.is_none() {
                    source = child
                        .child_by_field_name("source")
                        .map(|s| string_value(s, src));
                }
            }
            _ => {}
        }
    }

    // `import type { A }`, or `import { type A, type B }` with no value bindings
    let type_only = has_token(node, "type")
        || (!wildcard && specifiers > 0 && type_specifiers == specifiers);

    if wildcard {
        names.push(WILDCARD.to_string());
    }

    Some(Import {
        source: normalize_specifier(&source?),
        names,
        type_only,
        line: start_line(node),
        aliases,
    })
}

fn string_value(node: Node, src: &[u8]) -> String {
    text(node, src)
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

/// Trim, drop trailing slashes and collapse `.`/`..` segments of relative specifiers
pub fn normalize_specifier(raw: &str) -> String {
    let spec = raw.trim();
    let trimmed = if spec.len() > 1 {
        spec.trim_end_matches('/')
    } else {
        spec
    };
    if trimmed.is_empty() {
        return spec.to_string();
    }
    if !is_relative_specifier(trimmed) {
        return trimmed.to_string();
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(p) if *p != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    match parts.first() {
        None => ".".to_string(),
        Some(&"..") => parts.join("/"),
        Some(_) => format!("./{}", parts.join("/")),
    }
}

// =============================================================================
// EXPORTS
// =============================================================================

fn extract_exports(
    root: Node,
    src: &[u8],
    symbols: &mut [Symbol],
    imports: &[Import],
) -> Vec<Export> {
    let mut exports = Vec::new();

    for node in named_children(root) {
        if SyntaxKind::of(node) != SyntaxKind::ExportStatement {
            continue;
        }
        let line = start_line(node);
        let is_default = has_token(node, "default");

        // export [default] <declaration>
        if let Some(declaration) = node.child_by_field_name("declaration") {
            let mut names = declared_names(declaration, src);
            if is_default && names.is_empty() {
                names.push("default".to_string());
            }
            for name in names {
                let kind = if is_default {
                    ExportKind::Default
                } else {
                    symbols
                        .iter()
                        .find(|s| s.name == name)
                        .map(|s| s.kind.into())
                        .unwrap_or(ExportKind::Variable)
                };
                exports.push(Export {
                    name,
                    kind,
                    line,
                    source: None,
                });
            }
            continue;
        }

        let source = node
            .child_by_field_name("source")
            .map(|s| normalize_specifier(&string_value(s, src)));
        let mut clause = None;
        let mut namespace = None;
        for child in named_children(node) {
            match SyntaxKind::of(child) {
                SyntaxKind::ExportClause => clause = Some(child),
                SyntaxKind::NamespaceExport => namespace = Some(child),
                _ => {}
            }
        }

        match (source, clause) {
            // export { a, b as c } from './x'
            (Some(source), Some(clause)) => {
                for (_, exported) in export_specifiers(clause, src) {
                    exports.push(Export {
                        name: exported,
                        kind: ExportKind::Reexport,
                        line,
                        source: Some(source.clone()),
                    });
                }
            }
            // export * from './x' / export * as ns from './x'
            (Some(source), None) => {
                let name = namespace
                    .and_then(|ns| named_children(ns).into_iter().next())
                    .map(|id| string_value(id, src))
                    .unwrap_or_else(|| WILDCARD.to_string());
                exports.push(Export {
                    name,
                    kind: ExportKind::Reexport,
                    line,
                    source: Some(source),
                });
            }
            // export { a, b as c }
            (None, Some(clause)) => {
                for (local, exported) in export_specifiers(clause, src) {
                    match symbols.iter_mut().find(|s| s.name == local) {
                        Some(symbol) => {
                            symbol.flags |= SymbolFlags::EXPORTED;
                            let kind = if exported == "default" {
                                ExportKind::Default
                            } else {
                                symbol.kind.into()
                            };
                            exports.push(Export {
                                name: exported,
                                kind,
                                line,
                                source: None,
                            });
                        }
                        None => {
                            // Imported binding passed through
                            let source = imports
                                .iter()
                                .find(|i| i.imported_name(&local).is_some())
                                .map(|i| i.source.clone());
                            exports.push(Export {
                                name: exported,
                                kind: ExportKind::Reexport,
                                line,
                                source,
                            });
                        }
                    }
                }
            }
            // export default <expression>
            (None, None) if is_default => {
                // `export default name` or a named class/function expression
                let local = node.child_by_field_name("value").and_then(|v| {
                    if SyntaxKind::of(v) == SyntaxKind::Identifier {
                        Some(text(v, src).to_string())
                    } else {
                        field_text(v, "name", src)
                    }
                });
                let name = match local {
                    Some(local) => {
                        if let Some(symbol) = symbols.iter_mut().find(|s| s.name == local) {
                            symbol.flags |= SymbolFlags::EXPORTED;
                        }
                        local
                    }
                    None => "default".to_string(),
                };
                exports.push(Export {
                    name,
                    kind: ExportKind::Default,
                    line,
                    source: None,
                });
            }
            (None, None) => {}
        }
    }

    exports
}

/// Names introduced by an exported declaration
fn declared_names(declaration: Node, src: &[u8]) -> Vec<String> {
    match SyntaxKind::of(declaration) {
        SyntaxKind::LexicalDeclaration | SyntaxKind::VariableDeclaration => {
            named_children(declaration)
                .into_iter()
                .filter(|d| SyntaxKind::of(*d) == SyntaxKind::VariableDeclarator)
                .filter_map(|d| d.child_by_field_name("name"))
                .filter(|n| SyntaxKind::of(*n) == SyntaxKind::Identifier)
                .map(|n| text(n, src).to_string())
                .collect()
        }
        SyntaxKind::AmbientDeclaration => named_children(declaration)
            .into_iter()
            .flat_map(|c| declared_names(c, src))
            .collect(),
        _ => field_text(declaration, "name", src).into_iter().collect(),
    }
}

/// (local, exported) pairs of an export clause
fn export_specifiers(clause: Node, src: &[u8]) -> Vec<(String, String)> {
    named_children(clause)
        .into_iter()
        .filter(|s| SyntaxKind::of(*s) == SyntaxKind::ExportSpecifier)
        .filter_map(|spec| {
            let local = spec
                .child_by_field_name("name")
                .map(|n| string_value(n, src))?;
            let exported = spec
                .child_by_field_name("alias")
                .map(|n| string_value(n, src))
                .unwrap_or_else(|| local.clone());
            Some((local, exported))
        })
        .collect()
}

// =============================================================================
// BODY RANGES
// =============================================================================

fn collect_body_ranges(root: Node) -> Vec<BodyRange> {
    let mut ranges = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let owns_body = matches!(
            SyntaxKind::of(node),
            SyntaxKind::FunctionDeclaration
                | SyntaxKind::GeneratorFunctionDeclaration
                | SyntaxKind::MethodDefinition
                | SyntaxKind::ArrowFunction
                | SyntaxKind::FunctionExpression
                | SyntaxKind::GeneratorFunction
        );
        if owns_body {
            if let Some(body) = node.child_by_field_name("body") {
                if SyntaxKind::of(body) == SyntaxKind::StatementBlock {
                    ranges.push(BodyRange::of(body));
                }
            }
        }
        stack.extend(named_children(node));
    }

    ranges
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> Extracted {
        let mut parsers = Parsers::new().unwrap();
        extract(&mut parsers, code, Language::TypeScript).unwrap()
    }

    fn symbol<'a>(data: &'a Extracted, name: &str) -> &'a Symbol {
        data.symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing symbol {}", name))
    }

    #[test]
    fn test_extract_functions() {
        let code = r#"
export async function load(path: string, retries?: number): Promise<string> {
    const raw = fs.readFileSync(path);
    return decode(raw);
}

function helper(a, b = 2) {
    return new Parser(a).run(b);
}

export const add = (a: number, b: number): number => a + b;
"#;
        let data = run(code);

        let load = symbol(&data, "load");
        assert_eq!(load.kind, SymbolKind::Function);
        assert!(load.is_exported());
        assert!(load.is_async());
        assert_eq!(load.line, 2);
        assert_eq!(load.end_line, 5);
        assert_eq!(load.params.len(), 2);
        assert_eq!(load.params[0].name, "path");
        assert_eq!(load.params[0].type_text.as_deref(), Some("string"));
        assert_eq!(load.params[1].name, "retries?");
        assert_eq!(load.return_type.as_deref(), Some("Promise<string>"));
        assert_eq!(load.calls, vec!["readFileSync", "decode"]);

        let helper = symbol(&data, "helper");
        assert!(!helper.is_exported());
        assert_eq!(
            helper.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(helper.calls.contains(&"Parser".to_string()));
        assert!(helper.calls.contains(&"run".to_string()));

        let add = symbol(&data, "add");
        assert_eq!(add.kind, SymbolKind::Function);
        assert!(add.is_exported());
        assert_eq!(add.params.len(), 2);
    }

    #[test]
    fn test_extract_class_and_interface() {
        let code = r#"
export class Cache {
    static create(): Cache {
        return new Cache();
    }

    async get(key: string) {
        return this.store.lookup(key);
    }
}

interface Store {
    lookup(key: string): string;
}

type Key = string;
enum Mode { Fast, Slow }
let counter = 0;
"#;
        let data = run(code);

        let cache = symbol(&data, "Cache");
        assert_eq!(cache.kind, SymbolKind::Class);
        assert!(cache.is_exported());
        assert_eq!(cache.methods.len(), 2);
        let create = &cache.methods[0];
        assert_eq!(create.name, "create");
        assert!(create.is_static());
        assert_eq!(create.calls, vec!["Cache"]);
        let get = &cache.methods[1];
        assert!(get.is_async());
        assert_eq!(get.calls, vec!["lookup"]);

        let store = symbol(&data, "Store");
        assert_eq!(store.kind, SymbolKind::Interface);
        assert_eq!(store.methods.len(), 1);
        assert_eq!(store.methods[0].name, "lookup");
        assert_eq!(store.methods[0].return_type.as_deref(), Some("string"));

        assert_eq!(symbol(&data, "Key").kind, SymbolKind::Type);
        assert_eq!(symbol(&data, "Mode").kind, SymbolKind::Enum);
        assert_eq!(symbol(&data, "counter").kind, SymbolKind::Variable);
    }

    #[test]
    fn test_extract_imports() {
        let code = r#"
import { doWork, other as alias } from './b';
import Default from "../lib/../util/";
import * as ns from 'lodash';
import type { Shape } from './types';
import './side-effect';
"#;
        let data = run(code);
        assert_eq!(data.imports.len(), 5);

        let b = &data.imports[0];
        assert_eq!(b.source, "./b");
        assert_eq!(b.names, vec!["doWork", "other"]);
        assert_eq!(b.aliases.get("alias").map(String::as_str), Some("other"));
        assert_eq!(b.line, 2);

        let util = &data.imports[1];
        assert_eq!(util.source, "../util");
        assert_eq!(util.names, vec![WILDCARD]);

        assert_eq!(data.imports[2].source, "lodash");
        assert!(data.imports[2].has_wildcard());
        assert!(data.imports[3].type_only);
        assert!(data.imports[4].names.is_empty());
    }

    #[test]
    fn test_extract_exports() {
        let code = r#"
import { passthrough } from './dep';
function local() {}
const value = 1;
export { local, value as renamed, passthrough };
export { thing } from './things';
export * from './everything';
class Widget {}
export default Widget;
"#;
        let data = run(code);
        let pairs: Vec<(&str, ExportKind)> = data
            .exports
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("local", ExportKind::Function),
                ("renamed", ExportKind::Variable),
                ("passthrough", ExportKind::Reexport),
                ("thing", ExportKind::Reexport),
                (WILDCARD, ExportKind::Reexport),
                ("Widget", ExportKind::Default),
            ]
        );
        assert_eq!(data.exports[2].source.as_deref(), Some("./dep"));
        assert_eq!(data.exports[3].source.as_deref(), Some("./things"));
        assert!(symbol(&data, "local").is_exported());
        assert!(symbol(&data, "value").is_exported());
        assert!(symbol(&data, "Widget").is_exported());
    }

    #[test]
    fn test_body_ranges_cover_functions_only() {
        let code = "function a() {\n  if (x) {\n    y();\n  }\n}\nclass B {\n  m() {\n    z();\n  }\n}\n";
        let data = run(code);
        let merged = super::super::skeleton::merge_ranges(data.body_ranges);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start_row, 0);
        assert_eq!(merged[0].end_row, 4);
        assert_eq!(merged[1].start_row, 6);
        assert_eq!(merged[1].end_row, 8);
    }

    #[test]
    fn test_javascript_grammar() {
        let mut parsers = Parsers::new().unwrap();
        let code = "export function main() {\n  doWork();\n}\n";
        let data = extract(&mut parsers, code, Language::JavaScript).unwrap();
        assert_eq!(data.symbols.len(), 1);
        assert_eq!(data.symbols[0].calls, vec!["doWork"]);
        assert_eq!(data.exports.len(), 1);
    }

    #[test]
    fn test_imported_names_survive_builtin_filter() {
        let code = r#"
import { error, info } from './log';
export function main() {
    error('x');
    info();
    console.log('y');
    warn();
}
"#;
        let data = run(code);
        assert_eq!(symbol(&data, "main").calls, vec!["error", "info"]);
    }

    #[test]
    fn test_type_only_specifiers() {
        let code = r#"
import { type Shape, type Size } from './types';
import { type Shape as S, make } from './factory';
"#;
        let data = run(code);
        assert!(data.imports[0].type_only);
        assert!(!data.imports[1].type_only);
    }

    #[test]
    fn test_anonymous_default_function() {
        let code = "export default function () {\n    main();\n}\nfunction main() {}\n";
        let data = run(code);
        let default = symbol(&data, "default");
        assert_eq!(default.kind, SymbolKind::Function);
        assert!(default.is_exported());
        assert_eq!(default.calls, vec!["main"]);
        assert!(data
            .exports
            .iter()
            .any(|e| e.name == "default" && e.kind == ExportKind::Default));

        let data = run("export default () => helper();\n");
        assert_eq!(symbol(&data, "default").calls, vec!["helper"]);
    }

    #[test]
    fn test_normalize_specifier() {
        assert_eq!(normalize_specifier("./a/../b"), "./b");
        assert_eq!(normalize_specifier("../x/./y/"), "../x/y");
        assert_eq!(normalize_specifier("./a/.."), ".");
        assert_eq!(normalize_specifier(" react "), "react");
        assert_eq!(normalize_specifier("@scope/pkg/"), "@scope/pkg");
    }
}
