//! Symbol graph: definitions, import edges and the call graph
//!
//! @module trace

pub mod graph;
pub mod types;

pub use graph::{SymbolGraph, DEFAULT_FALLBACK_MAX_CANDIDATES};
pub use types::{fqn, GraphStats, GraphSymbol, Reference, ReferenceKind};
