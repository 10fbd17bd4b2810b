//! Structural records produced by the index engine
//!
//! An `IndexRecord` is the authoritative per-file view of symbols, imports and
//! exports. The symbol graph and search index hold derived copies only.
//!
//! @module index/record

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// SYMBOL KIND
// =============================================================================

/// Kind of declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Variable,
    Method,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Variable => "variable",
            Self::Method => "method",
        }
    }

    /// Whether symbols of this kind have parameters and a body
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// SYMBOL FLAGS
// =============================================================================

bitflags! {
    /// Flags for symbol metadata
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[repr(transparent)]
    pub struct SymbolFlags: u8 {
        /// Symbol is part of the file's export surface
        const EXPORTED = 0b0000_0001;
        /// Function or method is async
        const ASYNC = 0b0000_0010;
        /// Method is static/class-level
        const STATIC = 0b0000_0100;
    }
}

impl Default for SymbolFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// SYMBOLS
// =============================================================================

/// A parameter of a function or method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
}

/// A declaration extracted from a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// First line (1-based)
    pub line: u32,
    /// Last line (1-based, inclusive)
    pub end_line: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub flags: SymbolFlags,
    /// Members of classes and interfaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Symbol>,
    /// Callee names referenced in the body, first occurrence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, line: u32, end_line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            line,
            end_line,
            params: Vec::new(),
            return_type: None,
            flags: SymbolFlags::empty(),
            methods: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn is_exported(&self) -> bool {
        self.flags.contains(SymbolFlags::EXPORTED)
    }

    pub fn is_async(&self) -> bool {
        self.flags.contains(SymbolFlags::ASYNC)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(SymbolFlags::STATIC)
    }

    /// Human-readable signature, qualified by `parent` for methods
    ///
    /// `async function load(path: string): Promise<Buffer>`,
    /// `static method Cache.clear()`, `class Cache`.
    pub fn signature(&self, parent: Option<&str>) -> String {
        let mut out = String::new();
        if self.is_static() {
            out.push_str("static ");
        }
        if self.is_async() {
            out.push_str("async ");
        }
        out.push_str(self.kind.as_str());
        out.push(' ');
        if let Some(parent) = parent {
            out.push_str(parent);
            out.push('.');
        }
        out.push_str(&self.name);

        if self.kind.is_callable() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|p| match &p.type_text {
                    Some(t) => format!("{}: {}", p.name, t),
                    None => p.name.clone(),
                })
                .collect();
            out.push('(');
            out.push_str(&params.join(", "));
            out.push(')');
        }
        if let Some(ret) = &self.return_type {
            out.push_str(": ");
            out.push_str(ret);
        }
        out
    }
}

// =============================================================================
// IMPORTS & EXPORTS
// =============================================================================

/// Name recorded for namespace and default bindings
pub const WILDCARD: &str = "*";

/// An import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// Normalized module specifier
    pub source: String,
    /// Imported names; `*` for namespace/default bindings
    pub names: Vec<String>,
    #[serde(default)]
    pub type_only: bool,
    pub line: u32,
    /// Local alias -> imported name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl Import {
    pub fn is_relative(&self) -> bool {
        is_relative_specifier(&self.source)
    }

    pub fn has_wildcard(&self) -> bool {
        self.names.iter().any(|n| n == WILDCARD)
    }

    /// Imported name bound to `local` by this statement, if any
    pub fn imported_name(&self, local: &str) -> Option<&str> {
        if let Some(imported) = self.aliases.get(local) {
            return Some(imported);
        }
        self.names
            .iter()
            .find(|n| n.as_str() == local && !self.aliases.values().any(|v| v == *n))
            .map(|n| n.as_str())
    }
}

pub fn is_relative_specifier(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

/// Kind of export entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Variable,
    Method,
    Reexport,
    Default,
}

impl From<SymbolKind> for ExportKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function => Self::Function,
            SymbolKind::Class => Self::Class,
            SymbolKind::Interface => Self::Interface,
            SymbolKind::Type => Self::Type,
            SymbolKind::Enum => Self::Enum,
            SymbolKind::Variable => Self::Variable,
            SymbolKind::Method => Self::Method,
        }
    }
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Variable => "variable",
            Self::Method => "method",
            Self::Reexport => "reexport",
            Self::Default => "default",
        }
    }
}

/// An exported name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub line: u32,
    /// Module specifier for re-exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// =============================================================================
// INDEX RECORD
// =============================================================================

/// Everything the engine knows about one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub path: String,
    pub fingerprint: String,
    /// Milliseconds since the Unix epoch
    pub last_indexed: i64,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub exports: Vec<Export>,
    #[serde(default)]
    pub skeleton: String,
}

impl IndexRecord {
    /// Record for a file that produced no structure
    pub fn empty(path: impl Into<String>, fingerprint: impl Into<String>, now: i64) -> Self {
        Self {
            path: path.into(),
            fingerprint: fingerprint.into(),
            last_indexed: now,
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            skeleton: String::new(),
        }
    }

    /// The (name, kind) pairs that make up the export surface
    pub fn export_surface(&self) -> std::collections::BTreeSet<(String, ExportKind)> {
        self.exports
            .iter()
            .map(|e| (e.name.clone(), e.kind))
            .collect()
    }

    /// Module specifiers this file depends on (imports and re-export sources)
    pub fn dependency_specifiers(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .map(|i| i.source.as_str())
            .chain(self.exports.iter().filter_map(|e| e.source.as_deref()))
    }
}

/// Content fingerprint used to detect no-op modifications
pub fn fingerprint(content: &[u8]) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(content))
}
