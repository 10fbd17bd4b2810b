//! codeatlas - incremental code intelligence for coding agents
//!
//! Keeps a per-file structural index of a TypeScript/JavaScript workspace
//! current with minimal re-parsing, and derives a symbol/call graph and a
//! TF-IDF search index from it.

pub mod cli;
pub mod core;
pub mod index;
pub mod model;
pub mod output;
pub mod parse;
pub mod search;
pub mod storage;
pub mod trace;
pub mod watch;
pub mod workspace;

pub use core::config::Config;
pub use core::error::{Error, Result};
pub use core::project::Project;
pub use model::{CancelFlag, CodeModel, ReindexReport};
pub use workspace::Workspace;
