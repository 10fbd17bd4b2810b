//! `search` command

use std::path::PathBuf;
use std::time::Instant;

use tracing::debug;

use crate::cli::{fresh_model, OutputFormat, QueryArgs};
use crate::core::error::Result;
use crate::output::{format_output, Output, SearchResponse};

/// Run the search command
pub async fn run(project: Option<PathBuf>, args: QueryArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    let top_k = args.limit.unwrap_or(model.config().search.default_top_k);

    let start = Instant::now();
    let hits = model.search(&args.query, top_k);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    debug!(query = %args.query, hits = hits.len(), elapsed_ms, "Search complete");

    let response = SearchResponse {
        query: &args.query,
        hits,
        elapsed_ms,
    };
    print!("{}", format_output(&Output::Search(response), format));
    Ok(())
}
