//! `index` and `stats` commands

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::cli::{open_model, IndexArgs, OutputFormat};
use crate::core::error::Result;
use crate::model::CancelFlag;
use crate::output::{format_output, IndexSummary, Output};

/// Run the index command
pub async fn run(project: Option<PathBuf>, args: IndexArgs, format: OutputFormat) -> Result<()> {
    let start = Instant::now();
    let mut model = open_model(project.as_deref()).await?;

    if args.force {
        model.reset();
        model.reconcile().await;
    }

    // Ctrl-C stops between batches; whatever finished is still saved
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing current batch");
            on_interrupt.cancel();
        }
    });

    let report = model.reindex_stale(&cancel).await;
    interrupt.abort();
    model.save()?;

    let elapsed = start.elapsed();
    info!(
        indexed = report.indexed,
        elapsed_ms = elapsed.as_millis(),
        "Indexing complete"
    );

    let summary = IndexSummary {
        report,
        stats: model.stats(),
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    };
    print!("{}", format_output(&Output::Index(summary), format));
    Ok(())
}

/// Run the stats command
pub async fn stats(project: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let model = crate::cli::fresh_model(project.as_deref()).await?;
    print!("{}", format_output(&Output::Stats(model.stats()), format));
    Ok(())
}
