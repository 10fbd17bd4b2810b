//! Code model: the coordinating facade
//!
//! Owns the workspace, the index engine and both derived views. Every record
//! replacement is applied explicitly and in a fixed order: engine first, then
//! `SymbolGraph::update_from_entry`, then `SearchIndex::update_from_entry`.
//!
//! @module model

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::{EntryOutcome, IndexEngine, IndexRecord, StalenessTracker};
use crate::search::{SearchHit, SearchIndex};
use crate::storage::{
    load_document, save_document, RECORDS_FILE, RECORDS_VERSION, SEARCH_FILE, SEARCH_VERSION,
    STALENESS_FILE, STALENESS_VERSION,
};
use crate::trace::{GraphStats, SymbolGraph};
use crate::watch::WatchEvent;
use crate::workspace::Workspace;

// =============================================================================
// CANCELLATION & REPORTS
// =============================================================================

/// Cooperative cancellation for bulk re-indexing, checked once per batch
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    /// Parsed and replaced
    pub indexed: usize,
    /// Unreadable or unsupported; left stale
    pub failed: usize,
    /// Content unchanged
    pub skipped: usize,
    /// Gone from disk
    pub removed: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub records: usize,
    pub stale: usize,
    pub chunks: usize,
    pub graph: GraphStats,
}

/// What happened to one path during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStatus {
    Unchanged,
    Indexed,
    Removed,
    Failed,
}

// =============================================================================
// CODE MODEL
// =============================================================================

pub struct CodeModel {
    workspace: Workspace,
    state_dir: PathBuf,
    config: Config,
    engine: IndexEngine,
    graph: SymbolGraph,
    search: SearchIndex,
}

impl CodeModel {
    /// Empty model; nothing is loaded from disk
    pub fn new(workspace: Workspace, state_dir: PathBuf, config: Config) -> Self {
        Self {
            workspace,
            state_dir,
            engine: IndexEngine::new(),
            graph: SymbolGraph::new(config.graph.fallback_max_candidates),
            search: SearchIndex::new(config.search.stop_word_weight),
            config,
        }
    }

    /// Load persisted state, rebuild the derived views and reconcile with disk
    pub async fn open(workspace: Workspace, state_dir: PathBuf, config: Config) -> Result<Self> {
        let staleness = StalenessTracker::from_entries(load_document(
            &state_dir.join(STALENESS_FILE),
            STALENESS_VERSION,
        ));
        let records: BTreeMap<String, IndexRecord> =
            load_document(&state_dir.join(RECORDS_FILE), RECORDS_VERSION);
        let fingerprints: BTreeMap<String, String> =
            load_document(&state_dir.join(SEARCH_FILE), SEARCH_VERSION);

        let mut model = Self::new(workspace, state_dir, config);
        model.engine = IndexEngine::with_state(records, staleness);
        model.search = SearchIndex::new(model.config.search.stop_word_weight)
            .with_fingerprints(fingerprints);

        let vanished = model.reconcile().await;
        model.rebuild_views();

        info!(
            root = %model.workspace.root().display(),
            records = model.engine.record_count(),
            stale = model.engine.staleness().stale_count(),
            vanished = vanished.len(),
            "Opened code model"
        );
        Ok(model)
    }

    /// Compare the workspace listing against staleness; drop vanished files
    pub async fn reconcile(&mut self) -> Vec<String> {
        let files = self.workspace.list_files();
        let mut stamped = Vec::with_capacity(files.len());
        for path in files {
            let mtime = match self.workspace.stat(&path).await {
                Ok(mtime) => mtime,
                Err(e) => {
                    warn!(path = %path, error = %e, "Stat failed, treating as modified");
                    i64::MAX
                }
            };
            stamped.push((path, mtime));
        }

        let vanished = self.engine.reconcile(&stamped);
        for path in &vanished {
            self.graph.remove_file(path);
            self.search.remove_file(path);
        }
        vanished
    }

    fn rebuild_views(&mut self) {
        let mut records: Vec<&IndexRecord> = self.engine.records().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        for record in records {
            self.graph.update_from_entry(record);
            self.search.update_from_entry(record);
        }
    }

    /// Forget everything; the next reconcile makes every file stale
    pub fn reset(&mut self) {
        self.engine = IndexEngine::new();
        self.graph = SymbolGraph::new(self.config.graph.fallback_max_candidates);
        self.search = SearchIndex::new(self.config.search.stop_word_weight);
        info!("Model reset");
    }

    // =========================================================================
    // RECORDS
    // =========================================================================

    async fn refresh_entry(&mut self, path: &str) -> EntryStatus {
        match self.engine.get_entry(&self.workspace, path).await {
            EntryOutcome::Cached(_) | EntryOutcome::Refreshed(_) => EntryStatus::Unchanged,
            EntryOutcome::Reindexed { record, .. } => {
                self.graph.update_from_entry(record);
                self.search.update_from_entry(record);
                EntryStatus::Indexed
            }
            EntryOutcome::Removed { .. } => {
                self.graph.remove_file(path);
                self.search.remove_file(path);
                EntryStatus::Removed
            }
            EntryOutcome::Absent => EntryStatus::Failed,
        }
    }

    /// Up-to-date record for `path`, re-indexing it first if stale
    pub async fn get_entry(&mut self, path: &str) -> Option<&IndexRecord> {
        self.refresh_entry(path).await;
        self.engine.record(path)
    }

    pub async fn skeleton(&mut self, path: &str) -> Option<String> {
        self.get_entry(path).await.map(|r| r.skeleton.clone())
    }

    /// Process the stale set in batches until it settles or `cancel` fires
    ///
    /// Files dirtied by a dependency during the run are picked up in a
    /// follow-up round. Files that fail stay stale and are not retried
    /// within the same run.
    pub async fn reindex_stale(&mut self, cancel: &CancelFlag) -> ReindexReport {
        let mut report = ReindexReport::default();
        let mut failed: HashSet<String> = HashSet::new();
        let batch_size = self.config.index.batch_size.max(1);

        loop {
            let round: Vec<String> = self
                .engine
                .list_stale()
                .into_iter()
                .filter(|p| !failed.contains(p))
                .collect();
            if round.is_empty() {
                break;
            }
            debug!(files = round.len(), "Reindex round");

            for batch in round.chunks(batch_size) {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    info!(?report, "Reindex cancelled");
                    return report;
                }
                for path in batch {
                    match self.refresh_entry(path).await {
                        EntryStatus::Indexed => report.indexed += 1,
                        EntryStatus::Unchanged => report.skipped += 1,
                        EntryStatus::Removed => report.removed += 1,
                        EntryStatus::Failed => {
                            report.failed += 1;
                            failed.insert(path.clone());
                        }
                    }
                }
                tokio::task::yield_now().await;
            }
        }

        if report.indexed + report.removed + report.failed > 0 {
            info!(
                indexed = report.indexed,
                skipped = report.skipped,
                removed = report.removed,
                failed = report.failed,
                "Reindex complete"
            );
        }
        report
    }

    /// Apply one file-system notification
    pub fn apply_event(&mut self, event: &WatchEvent) {
        match event {
            WatchEvent::Deleted(path) => {
                let dependents = self.engine.remove_file(path);
                self.graph.remove_file(path);
                self.search.remove_file(path);
                debug!(path = %path, dependents = dependents.len(), "Deleted");
            }
            WatchEvent::Created(path) | WatchEvent::Changed(path) => {
                if self.workspace.is_indexable(path) {
                    self.engine.mark_dirty(path);
                }
            }
        }
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Persist staleness, records and search fingerprints
    pub fn save(&self) -> Result<()> {
        save_document(
            &self.state_dir.join(STALENESS_FILE),
            STALENESS_VERSION,
            &self.engine.staleness().entries(),
        )?;

        let records: BTreeMap<&str, &IndexRecord> = self
            .engine
            .records()
            .map(|r| (r.path.as_str(), r))
            .collect();
        save_document(&self.state_dir.join(RECORDS_FILE), RECORDS_VERSION, &records)?;

        let fingerprints: BTreeMap<&String, &String> = self.search.fingerprints().iter().collect();
        save_document(&self.state_dir.join(SEARCH_FILE), SEARCH_VERSION, &fingerprints)?;

        debug!(records = records.len(), "State saved");
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &IndexEngine {
        &self.engine
    }

    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit<'_>> {
        self.search.search(query, top_k)
    }

    pub fn is_stale(&self, path: &str) -> bool {
        self.engine.is_stale(path)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            records: self.engine.record_count(),
            stale: self.engine.staleness().stale_count(),
            chunks: self.search.chunk_count(),
            graph: self.graph.get_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn model(dir: &TempDir) -> CodeModel {
        let config = Config::default();
        let ws = Workspace::new(dir.path(), &config.index).unwrap();
        CodeModel::open(ws, dir.path().join(".state"), config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cancel_before_first_batch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "export const a = 1;\n").unwrap();
        let mut model = model(&dir).await;

        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = model.reindex_stale(&cancel).await;
        assert!(report.cancelled);
        assert_eq!(report.indexed, 0);
        assert!(model.is_stale("a.ts"));
    }

    #[tokio::test]
    async fn test_small_batches_index_everything() {
        let dir = TempDir::new().unwrap();
        for i in 0..7 {
            fs::write(
                dir.path().join(format!("f{}.ts", i)),
                format!("export function f{}() {{}}\n", i),
            )
            .unwrap();
        }
        let mut model = model(&dir).await;
        model.config.index.batch_size = 2;

        let report = model.reindex_stale(&CancelFlag::new()).await;
        assert_eq!(report.indexed, 7);
        assert!(!report.cancelled);
        assert_eq!(model.stats().graph.symbols, 7);

        let again = model.reindex_stale(&CancelFlag::new()).await;
        assert_eq!(again, ReindexReport::default());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "export function hello() {}\n").unwrap();
        {
            let mut model = model(&dir).await;
            model.reindex_stale(&CancelFlag::new()).await;
            model.save().unwrap();
        }

        let model = model(&dir).await;
        assert!(!model.is_stale("a.ts"));
        assert_eq!(model.graph().get_symbol("hello").len(), 1);
        assert_eq!(model.search("hello", 5).len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_event_removes_everywhere() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "export function gone() {}\n").unwrap();
        let mut model = model(&dir).await;
        model.reindex_stale(&CancelFlag::new()).await;

        fs::remove_file(dir.path().join("a.ts")).unwrap();
        model.apply_event(&WatchEvent::Deleted("a.ts".into()));
        assert!(model.graph().get_symbol("gone").is_empty());
        assert!(model.search("gone", 5).is_empty());
        assert_eq!(model.stats().records, 0);
    }
}
