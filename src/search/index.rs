//! TF-IDF Search Index
//!
//! Chunks records at symbol granularity and ranks chunks against
//! natural-language queries by cosine similarity of TF-IDF vectors.
//!
//! - chunk vectors use binary term frequency (tokens are deduplicated)
//! - IDF is `ln((N + 1) / (df + 1)) + 1`, scaled down for stop words
//! - chunks live in one dense array; removing a file compacts the array and
//!   remaps every posting list
//!
//! @module search/index

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

use super::tokenize::{is_stop_word, terms, tokenize};
use crate::index::record::{IndexRecord, Symbol, SymbolKind};

/// Default IDF multiplier for stop words
pub const DEFAULT_STOP_WORD_WEIGHT: f64 = 0.1;

/// Longest preview kept on a chunk, in characters
pub const PREVIEW_MAX_CHARS: usize = 120;

// =============================================================================
// CHUNKS
// =============================================================================

/// One retrievable unit: a symbol, a method, or a whole symbol-less file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunk {
    /// `path#Qualified.name`, or `path#file-name` for file chunks
    pub id: String,
    pub path: String,
    pub symbol: String,
    /// `None` for whole-file chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip)]
    pub tokens: Vec<String>,
    pub preview: String,
}

/// Chunks for one record, in declaration order
pub fn chunk_record(record: &IndexRecord) -> Vec<CodeChunk> {
    let mut chunks = Vec::new();
    for symbol in &record.symbols {
        chunks.push(symbol_chunk(&record.path, symbol, None));
        for method in &symbol.methods {
            chunks.push(symbol_chunk(&record.path, method, Some(symbol)));
        }
    }

    if chunks.is_empty() {
        chunks.push(file_chunk(record));
    }
    chunks
}

fn symbol_chunk(path: &str, symbol: &Symbol, parent: Option<&Symbol>) -> CodeChunk {
    let mut text = vec![symbol.name.clone(), symbol.kind.as_str().to_string()];
    for param in &symbol.params {
        text.push(param.name.clone());
        if let Some(type_text) = &param.type_text {
            text.push(type_text.clone());
        }
    }
    if let Some(ret) = &symbol.return_type {
        text.push(ret.clone());
    }
    if let Some(parent) = parent {
        text.push(parent.name.clone());
    }
    text.push(path.to_string());

    let qualified = match parent {
        Some(parent) => format!("{}.{}", parent.name, symbol.name),
        None => symbol.name.clone(),
    };

    CodeChunk {
        id: format!("{}#{}", path, qualified),
        path: path.to_string(),
        symbol: symbol.name.clone(),
        kind: Some(symbol.kind),
        start_line: symbol.line,
        end_line: symbol.end_line,
        tokens: tokenize(&text.join(" ")),
        preview: truncate(&symbol.signature(parent.map(|p| p.name.as_str()))),
    }
}

fn file_chunk(record: &IndexRecord) -> CodeChunk {
    let file_name = record
        .path
        .rsplit('/')
        .next()
        .unwrap_or(&record.path)
        .to_string();
    let line_count = record.skeleton.lines().count().max(1) as u32;
    let preview = record
        .skeleton
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    CodeChunk {
        id: format!("{}#{}", record.path, file_name),
        path: record.path.clone(),
        symbol: file_name,
        kind: None,
        start_line: 1,
        end_line: line_count,
        tokens: tokenize(&format!("{} {}", record.path, record.skeleton)),
        preview: truncate(preview),
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

// =============================================================================
// INDEX
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub chunk: &'a CodeChunk,
    pub score: f64,
}

#[derive(Debug)]
pub struct SearchIndex {
    chunks: Vec<CodeChunk>,
    /// Token -> ascending chunk indices
    postings: HashMap<String, Vec<usize>>,
    /// Token -> weighted IDF; reset on every corpus change
    idf: OnceLock<HashMap<String, f64>>,
    /// Path -> fingerprint of the record the chunks were built from
    fingerprints: HashMap<String, String>,
    stop_word_weight: f64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORD_WEIGHT)
    }
}

impl SearchIndex {
    pub fn new(stop_word_weight: f64) -> Self {
        Self {
            chunks: Vec::new(),
            postings: HashMap::new(),
            idf: OnceLock::new(),
            fingerprints: HashMap::new(),
            stop_word_weight,
        }
    }

    /// Seed persisted fingerprints (chunks are rebuilt from records)
    pub fn with_fingerprints(
        mut self,
        fingerprints: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.fingerprints = fingerprints.into_iter().collect();
        self
    }

    /// Replace the chunks of `record.path`; returns false when nothing changed
    pub fn update_from_entry(&mut self, record: &IndexRecord) -> bool {
        let unchanged = self.fingerprints.get(&record.path) == Some(&record.fingerprint)
            && self.contains_file(&record.path);
        if unchanged {
            return false;
        }

        self.remove_file(&record.path);

        let chunks = chunk_record(record);
        let added = chunks.len();
        for chunk in chunks {
            let index = self.chunks.len();
            for token in &chunk.tokens {
                self.postings.entry(token.clone()).or_default().push(index);
            }
            self.chunks.push(chunk);
        }
        self.fingerprints
            .insert(record.path.clone(), record.fingerprint.clone());
        self.idf = OnceLock::new();

        debug!(path = %record.path, chunks = added, "Search index updated");
        true
    }

    /// Drop every chunk of `path`, compacting the chunk array
    pub fn remove_file(&mut self, path: &str) {
        self.fingerprints.remove(path);
        if !self.contains_file(path) {
            return;
        }

        let mut remap: Vec<Option<usize>> = Vec::with_capacity(self.chunks.len());
        let mut kept = Vec::with_capacity(self.chunks.len());
        for chunk in self.chunks.drain(..) {
            if chunk.path == path {
                remap.push(None);
            } else {
                remap.push(Some(kept.len()));
                kept.push(chunk);
            }
        }
        self.chunks = kept;

        for list in self.postings.values_mut() {
            *list = list.iter().filter_map(|&i| remap[i]).collect();
        }
        self.postings.retain(|_, list| !list.is_empty());
        self.idf = OnceLock::new();
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.chunks.iter().any(|c| c.path == path)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn fingerprints(&self) -> &HashMap<String, String> {
        &self.fingerprints
    }

    // =========================================================================
    // RETRIEVAL
    // =========================================================================

    /// Top `top_k` chunks by cosine similarity to `query`
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit<'_>> {
        let query_terms = terms(query);
        if query_terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut tf: HashMap<&str, f64> = HashMap::new();
        for term in &query_terms {
            *tf.entry(term.as_str()).or_default() += 1.0;
        }

        let idf = self.idf.get_or_init(|| self.compute_idf());
        let unseen_idf = self.smoothed_idf(0);

        let query_vec: HashMap<&str, f64> = tf
            .iter()
            .map(|(&term, &count)| {
                let weight = idf
                    .get(term)
                    .copied()
                    .unwrap_or_else(|| self.stop_scaled(term, unseen_idf));
                (term, count * weight)
            })
            .collect();
        let query_norm = query_vec.values().map(|w| w * w).sum::<f64>().sqrt();
        if query_norm == 0.0 {
            return Vec::new();
        }

        let candidates: BTreeSet<usize> = query_vec
            .keys()
            .filter_map(|term| self.postings.get(*term))
            .flatten()
            .copied()
            .collect();

        let mut hits: Vec<SearchHit<'_>> = candidates
            .into_iter()
            .filter_map(|index| {
                let chunk = &self.chunks[index];
                let mut dot = 0.0;
                let mut norm = 0.0;
                for token in &chunk.tokens {
                    let weight = idf.get(token).copied().unwrap_or(0.0);
                    norm += weight * weight;
                    if let Some(q) = query_vec.get(token.as_str()) {
                        dot += q * weight;
                    }
                }
                if dot <= 0.0 || norm <= 0.0 {
                    return None;
                }
                Some(SearchHit {
                    chunk,
                    score: dot / (query_norm * norm.sqrt()),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        hits.truncate(top_k);
        hits
    }

    fn compute_idf(&self) -> HashMap<String, f64> {
        self.postings
            .iter()
            .map(|(token, list)| {
                let idf = self.smoothed_idf(list.len());
                (token.clone(), self.stop_scaled(token, idf))
            })
            .collect()
    }

    fn smoothed_idf(&self, df: usize) -> f64 {
        let n = self.chunks.len() as f64;
        ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0
    }

    fn stop_scaled(&self, token: &str, idf: f64) -> f64 {
        if is_stop_word(token) {
            idf * self.stop_word_weight
        } else {
            idf
        }
    }
}
