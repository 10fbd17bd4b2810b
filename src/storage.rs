//! Versioned JSON State Documents
//!
//! Each workspace keeps three independent documents in its state directory:
//! - `staleness.json`: last-clean timestamps
//! - `records.json`: index records
//! - `search.json`: per-file search fingerprints
//!
//! All of them have the shape `{ "version": N, "entries": { path: value } }`.
//! Loading never fails: a missing, malformed or version-mismatched document
//! is treated as empty and the state is rebuilt.
//!
//! @module storage

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::Result;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const STALENESS_VERSION: u32 = 1;
pub const RECORDS_VERSION: u32 = 1;
pub const SEARCH_VERSION: u32 = 1;

pub const STALENESS_FILE: &str = "staleness.json";
pub const RECORDS_FILE: &str = "records.json";
pub const SEARCH_FILE: &str = "search.json";

// =============================================================================
// DOCUMENT FORMAT
// =============================================================================

#[derive(Deserialize)]
struct Document<T> {
    version: u32,
    entries: BTreeMap<String, T>,
}

#[derive(Serialize)]
struct DocumentRef<'a, E: Serialize> {
    version: u32,
    entries: &'a E,
}

// =============================================================================
// LOAD / SAVE
// =============================================================================

/// Load the entries of a document, or an empty map if it cannot be used
pub fn load_document<T: DeserializeOwned>(path: &Path, version: u32) -> BTreeMap<String, T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted state");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable state, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<Document<T>>(&content) {
        Ok(doc) if doc.version == version => doc.entries,
        Ok(doc) => {
            warn!(
                path = %path.display(),
                found = doc.version,
                expected = version,
                "State version mismatch, rebuilding"
            );
            BTreeMap::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed state, rebuilding");
            BTreeMap::new()
        }
    }
}

/// Write a document atomically (temp file, then rename)
pub fn save_document<E: Serialize>(path: &Path, version: u32, entries: &E) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(&DocumentRef { version, entries })?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), "Saved state");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
