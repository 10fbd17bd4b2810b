//! `watch` command: keep the index current while files change

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cli::{fresh_model, OutputFormat};
use crate::core::error::Result;
use crate::model::CancelFlag;
use crate::output::{format_output, IndexSummary, Output};
use crate::watch::{next_batch, FileWatcher};

/// Run the watch command until Ctrl-C
pub async fn run(project: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let mut model = fresh_model(project.as_deref()).await?;
    let (watcher, mut rx) = FileWatcher::start(model.workspace())?;
    let window = Duration::from_millis(model.config().watch.debounce_ms);

    if format == OutputFormat::Human {
        println!(
            "Watching {} ({} files). Ctrl-C to stop.",
            model.workspace().root().display(),
            model.stats().records
        );
    }

    loop {
        let batch = tokio::select! {
            batch = next_batch(&mut rx, window) => batch,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(batch) = batch else {
            break;
        };

        let start = Instant::now();
        for event in &batch {
            model.apply_event(event);
        }
        let report = model.reindex_stale(&CancelFlag::new()).await;
        model.save()?;

        let summary = IndexSummary {
            report,
            stats: model.stats(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        print!("{}", format_output(&Output::Index(summary), format));
    }

    watcher.stop();
    model.save()?;
    info!("Watch stopped");
    Ok(())
}
