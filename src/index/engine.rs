//! Index Engine
//!
//! The only writer of `IndexRecord`s. `get_entry` lazily brings one file's
//! record up to date:
//!
//! 1. not stale and cached: return the cached record
//! 2. fingerprint unchanged: refresh the timestamp, mark clean
//! 3. parse and extract symbols, imports and exports
//! 4. build the skeleton
//! 5. replace the record, update the importer map, mark clean and
//!    dependency-dirty every importer if the export surface changed
//!
//! @module index/engine

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, error, warn};

use super::record::{fingerprint, IndexRecord};
use super::resolve::{file_stems, module_stem};
use super::staleness::StalenessTracker;
use crate::core::error::Error;
use crate::parse::{extract, skeleton, Language, Parsers};
use crate::workspace::{now_millis, Workspace};

/// Result of `IndexEngine::get_entry`
#[derive(Debug)]
pub enum EntryOutcome<'a> {
    /// Clean and cached; nothing was read
    Cached(&'a IndexRecord),
    /// Bytes unchanged since the last parse; timestamp refreshed
    Refreshed(&'a IndexRecord),
    /// Parsed and replaced
    Reindexed {
        record: &'a IndexRecord,
        /// Importers marked dependency-dirty by an export surface change
        dependents: Vec<String>,
    },
    /// The file is gone; its record and bookkeeping were dropped
    Removed { dependents: Vec<String> },
    /// Unsupported, unreadable, or the engine is disabled
    Absent,
}

impl<'a> EntryOutcome<'a> {
    pub fn record(&self) -> Option<&'a IndexRecord> {
        match self {
            Self::Cached(record) | Self::Refreshed(record) => Some(record),
            Self::Reindexed { record, .. } => Some(record),
            Self::Removed { .. } | Self::Absent => None,
        }
    }

    /// Whether derived views must be rebuilt for this path
    pub fn replaced(&self) -> bool {
        matches!(self, Self::Reindexed { .. })
    }
}

pub struct IndexEngine {
    records: HashMap<String, IndexRecord>,
    /// Module stem -> files importing it
    importers: HashMap<String, BTreeSet<String>>,
    staleness: StalenessTracker,
    /// `None` when grammar initialization failed
    parsers: Option<Parsers>,
}

impl IndexEngine {
    pub fn new() -> Self {
        Self::with_state(BTreeMap::new(), StalenessTracker::new())
    }

    /// Engine over previously persisted records and staleness
    pub fn with_state(records: BTreeMap<String, IndexRecord>, staleness: StalenessTracker) -> Self {
        let parsers = match Parsers::new() {
            Ok(parsers) => Some(parsers),
            Err(e) => {
                error!(error = %e, "Grammar initialization failed, indexing disabled");
                None
            }
        };

        let mut engine = Self {
            records: HashMap::new(),
            importers: HashMap::new(),
            staleness,
            parsers,
        };
        for (path, record) in records {
            if path != record.path {
                warn!(key = %path, path = %record.path, "Discarding mismatched record");
                continue;
            }
            engine.link_dependencies(&record);
            engine.records.insert(path, record);
        }

        // A clean timestamp without a record would hide the file from reconcile
        let records = &engine.records;
        let orphaned = engine.staleness.retain(|path| records.contains_key(path));
        if orphaned > 0 {
            warn!(orphaned, "Staleness entries without records discarded");
        }
        engine
    }

    pub fn is_enabled(&self) -> bool {
        self.parsers.is_some()
    }

    // =========================================================================
    // GET ENTRY
    // =========================================================================

    /// Ensure an up-to-date record for `path` exists
    pub async fn get_entry(&mut self, workspace: &Workspace, path: &str) -> EntryOutcome<'_> {
        if self.parsers.is_none() {
            return EntryOutcome::Absent;
        }

        // 1. Clean cache hit
        if !self.staleness.is_stale(path) && self.records.contains_key(path) {
            return match self.records.get(path) {
                Some(record) => EntryOutcome::Cached(record),
                None => EntryOutcome::Absent,
            };
        }

        let language = Language::from_path(path);
        if !language.is_indexable() {
            debug!(path, "Unsupported language");
            return EntryOutcome::Absent;
        }

        // 2. Fingerprint short-circuit
        let bytes = match workspace.read_file(path).await {
            Ok(bytes) => bytes,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let dependents = self.remove_file(path);
                return EntryOutcome::Removed { dependents };
            }
            Err(e) => {
                warn!(path, error = %e, "Unreadable file, leaving stale");
                return EntryOutcome::Absent;
            }
        };
        let fp = fingerprint(&bytes);
        let now = now_millis();

        if self
            .records
            .get(path)
            .is_some_and(|record| record.fingerprint == fp)
        {
            self.staleness.mark_clean(path, now);
            return match self.records.get_mut(path) {
                Some(record) => {
                    record.last_indexed = now;
                    debug!(path, "Content unchanged");
                    EntryOutcome::Refreshed(record)
                }
                None => EntryOutcome::Absent,
            };
        }

        // 3 + 4. Parse, extract, skeleton
        let source = String::from_utf8_lossy(&bytes);
        let mut record = IndexRecord::empty(path, fp, now);
        if let Some(parsers) = self.parsers.as_mut() {
            match extract(parsers, &source, language) {
                Ok(extracted) => {
                    record.skeleton = skeleton(&source, extracted.body_ranges);
                    record.symbols = extracted.symbols;
                    record.imports = extracted.imports;
                    record.exports = extracted.exports;
                }
                Err(e) => {
                    warn!(path, error = %e, "Parse failed, storing empty record");
                }
            }
        }
        debug!(
            path,
            symbols = record.symbols.len(),
            imports = record.imports.len(),
            exports = record.exports.len(),
            "Indexed"
        );

        // 5. Replace and propagate
        let dependents = self.replace(record);
        match self.records.get(path) {
            Some(record) => EntryOutcome::Reindexed { record, dependents },
            None => EntryOutcome::Absent,
        }
    }

    /// Install a freshly parsed record; returns importers marked dependency-dirty
    fn replace(&mut self, record: IndexRecord) -> Vec<String> {
        let path = record.path.clone();
        let new_surface = record.export_surface();

        let old = self.records.remove(&path);
        if let Some(old) = &old {
            self.unlink_dependencies(old);
        }
        self.link_dependencies(&record);
        self.staleness.mark_clean(&path, record.last_indexed);
        self.records.insert(path.clone(), record);

        // First-time indexing has no previous surface to compare against
        match old {
            Some(old) if old.export_surface() != new_surface => self.dirty_importers(&path),
            _ => Vec::new(),
        }
    }

    fn dirty_importers(&mut self, path: &str) -> Vec<String> {
        let dependents = self.importers_of(path);
        for dependent in &dependents {
            self.staleness.mark_dependency_dirty(dependent);
        }
        if !dependents.is_empty() {
            debug!(path, dependents = dependents.len(), "Export surface changed");
        }
        dependents
    }

    // =========================================================================
    // IMPORTER MAP
    // =========================================================================

    fn link_dependencies(&mut self, record: &IndexRecord) {
        for spec in record.dependency_specifiers() {
            if let Some(stem) = module_stem(&record.path, spec) {
                self.importers
                    .entry(stem)
                    .or_default()
                    .insert(record.path.clone());
            }
        }
    }

    fn unlink_dependencies(&mut self, record: &IndexRecord) {
        for spec in record.dependency_specifiers() {
            let Some(stem) = module_stem(&record.path, spec) else {
                continue;
            };
            if let Some(set) = self.importers.get_mut(&stem) {
                set.remove(&record.path);
                if set.is_empty() {
                    self.importers.remove(&stem);
                }
            }
        }
    }

    /// Files whose relative imports resolve to `path`, sorted
    pub fn importers_of(&self, path: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        for stem in file_stems(path) {
            if let Some(set) = self.importers.get(&stem) {
                out.extend(set.iter().filter(|p| p.as_str() != path).cloned());
            }
        }
        out.into_iter().collect()
    }

    // =========================================================================
    // BOOKKEEPING
    // =========================================================================

    /// Forget `path` entirely; returns importers marked dependency-dirty
    pub fn remove_file(&mut self, path: &str) -> Vec<String> {
        self.staleness.remove(path);
        let Some(old) = self.records.remove(path) else {
            return Vec::new();
        };
        self.unlink_dependencies(&old);
        debug!(path, "Removed record");

        if old.exports.is_empty() {
            Vec::new()
        } else {
            self.dirty_importers(path)
        }
    }

    /// File-system change notification
    pub fn mark_dirty(&mut self, path: &str) {
        self.staleness.mark_dirty(path);
    }

    /// Reconcile staleness against the current listing; drops records of vanished files
    pub fn reconcile(&mut self, files: &[(String, i64)]) -> Vec<String> {
        let mut vanished: BTreeSet<String> = self.staleness.reconcile(files).into_iter().collect();
        let present: BTreeSet<&str> = files.iter().map(|(p, _)| p.as_str()).collect();
        vanished.extend(
            self.records
                .keys()
                .filter(|p| !present.contains(p.as_str()))
                .cloned(),
        );

        let mut had_exports = Vec::new();
        for path in &vanished {
            if let Some(old) = self.records.remove(path) {
                self.unlink_dependencies(&old);
                if !old.exports.is_empty() {
                    had_exports.push(path.as_str());
                }
            }
        }
        for path in had_exports {
            self.dirty_importers(path);
        }
        vanished.into_iter().collect()
    }

    pub fn is_stale(&self, path: &str) -> bool {
        self.staleness.is_stale(path)
    }

    pub fn list_stale(&self) -> Vec<String> {
        self.staleness.list_stale()
    }

    pub fn staleness(&self) -> &StalenessTracker {
        &self.staleness
    }

    pub fn record(&self, path: &str) -> Option<&IndexRecord> {
        self.records.get(path)
    }

    pub fn records(&self) -> impl Iterator<Item = &IndexRecord> {
        self.records.values()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl Default for IndexEngine {
    fn default() -> Self {
        Self::new()
    }
}
