//! Ranked full-text retrieval over symbol chunks

pub mod index;
pub mod tokenize;

pub use index::{chunk_record, CodeChunk, SearchHit, SearchIndex};
pub use tokenize::tokenize;
