//! Derived symbol graph types
//!
//! @module trace/types

use serde::Serialize;

use crate::index::record::SymbolKind;

/// Fully-qualified name: `path#Qualified.name`
pub fn fqn(path: &str, qualified_name: &str) -> String {
    format!("{}#{}", path, qualified_name)
}

/// A symbol as seen by the graph; identity is the FQN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSymbol {
    pub fqn: String,
    pub name: String,
    /// Dot-joined for methods (`Cache.get`)
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub path: String,
    pub line: u32,
    pub end_line: u32,
    pub exported: bool,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

// =============================================================================
// REFERENCES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// The definition itself
    Export,
    /// An import naming the symbol (or a wildcard import)
    Import,
    /// A pass-through export without a local definition
    Reexport,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Import => "import",
            Self::Reexport => "reexport",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub path: String,
    pub line: u32,
}

// =============================================================================
// STATISTICS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub files: usize,
    pub symbols: usize,
    pub call_edges: usize,
    pub import_edges: usize,
}
