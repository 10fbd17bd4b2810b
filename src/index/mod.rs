//! Incremental structural index: records, staleness and the engine

pub mod engine;
pub mod record;
pub mod resolve;
pub mod staleness;

pub use engine::{EntryOutcome, IndexEngine};
pub use record::{
    fingerprint, Export, ExportKind, Import, IndexRecord, Param, Symbol, SymbolFlags, SymbolKind,
    WILDCARD,
};
pub use staleness::{StalenessEntry, StalenessTracker};
