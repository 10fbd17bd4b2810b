//! Staleness Tracker
//!
//! Pure bookkeeping over which files need (re)indexing. A file is stale when
//! it has never been confirmed clean, when its mtime is newer than the last
//! confirmation, when the file system reported a change, or when one of its
//! dependencies changed its export surface.
//!
//! @module index/staleness

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted per-file entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StalenessEntry {
    /// Milliseconds since the Unix epoch
    pub last_indexed: i64,
}

#[derive(Debug, Default)]
pub struct StalenessTracker {
    dirty: HashSet<String>,
    last_clean: HashMap<String, i64>,
}

impl StalenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted entries; nothing is dirty until `reconcile`
    pub fn from_entries(entries: BTreeMap<String, StalenessEntry>) -> Self {
        Self {
            dirty: HashSet::new(),
            last_clean: entries
                .into_iter()
                .map(|(path, entry)| (path, entry.last_indexed))
                .collect(),
        }
    }

    /// Compare current files and their mtimes (ms) against the last-clean times
    ///
    /// Files never seen, or modified after they were last confirmed clean,
    /// become stale. Returns the paths that were known but are no longer
    /// present; their bookkeeping is dropped.
    pub fn reconcile(&mut self, files: &[(String, i64)]) -> Vec<String> {
        let present: HashSet<&str> = files.iter().map(|(p, _)| p.as_str()).collect();

        let mut vanished: Vec<String> = self
            .last_clean
            .keys()
            .filter(|p| !present.contains(p.as_str()))
            .cloned()
            .collect();
        vanished.sort();
        for path in &vanished {
            self.remove(path);
        }

        for (path, mtime) in files {
            match self.last_clean.get(path) {
                Some(&clean) if *mtime <= clean => {}
                _ => {
                    self.dirty.insert(path.clone());
                }
            }
        }

        debug!(
            files = files.len(),
            stale = self.dirty.len(),
            vanished = vanished.len(),
            "Reconciled staleness"
        );
        vanished
    }

    pub fn is_stale(&self, path: &str) -> bool {
        self.dirty.contains(path) || !self.last_clean.contains_key(path)
    }

    pub fn mark_clean(&mut self, path: &str, now: i64) {
        self.dirty.remove(path);
        self.last_clean.insert(path.to_string(), now);
    }

    /// File-system change notification (create/modify)
    pub fn mark_dirty(&mut self, path: &str) {
        self.dirty.insert(path.to_string());
    }

    /// A dependency's export surface changed; content of `path` is untouched
    pub fn mark_dependency_dirty(&mut self, path: &str) {
        if self.dirty.insert(path.to_string()) {
            debug!(path, "Marked dependency-dirty");
        }
    }

    /// Deletion: forget the path entirely
    pub fn remove(&mut self, path: &str) {
        self.dirty.remove(path);
        self.last_clean.remove(path);
    }

    /// Stale paths in sorted order
    pub fn list_stale(&self) -> Vec<String> {
        let mut stale: Vec<String> = self.dirty.iter().cloned().collect();
        stale.sort();
        stale
    }

    pub fn stale_count(&self) -> usize {
        self.dirty.len()
    }

    /// Keep bookkeeping only for paths where `keep` holds; returns how many were dropped
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) -> usize {
        let before = self.last_clean.len();
        self.last_clean.retain(|path, _| keep(path));
        self.dirty.retain(|path| keep(path));
        before - self.last_clean.len()
    }

    /// Snapshot for persistence
    ///
    /// Paths still dirty are written with a zero timestamp so the next
    /// `reconcile` finds them stale again.
    pub fn entries(&self) -> BTreeMap<String, StalenessEntry> {
        self.last_clean
            .iter()
            .map(|(path, &clean)| {
                let last_indexed = if self.dirty.contains(path) { 0 } else { clean };
                (path.clone(), StalenessEntry { last_indexed })
            })
            .collect()
    }
}
