//! File watching
//!
//! `FileWatcher` turns notify events into workspace-relative `WatchEvent`s
//! on a tokio channel; `next_batch` debounces them into per-path batches.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use notify::{
    event::ModifyKind, Config as NotifyConfig, Event, EventKind, RecommendedWatcher,
    RecursiveMode, Watcher,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::core::error::Result;
use crate::workspace::Workspace;

/// Capacity of the event channel
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(String),
    Changed(String),
    Deleted(String),
}

impl WatchEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Created(path) | Self::Changed(path) | Self::Deleted(path) => path,
        }
    }
}

/// Watches a workspace root recursively
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching; events arrive on the returned receiver
    pub fn start(workspace: &Workspace) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let filter = workspace.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for watch_event in translate(&event, &filter) {
                        debug!(?watch_event, "File event");
                        if tx.blocking_send(watch_event).is_err() {
                            // Receiver dropped; the watcher is shutting down
                            return;
                        }
                    }
                }
                Err(e) => error!(error = %e, "Watch error"),
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let root = workspace.root().to_path_buf();
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "Watching for changes");

        Ok((Self { watcher, root }, rx))
    }

    pub fn stop(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!(root = %self.root.display(), error = %e, "Unwatch failed");
        }
    }
}

/// Indexable, workspace-relative events for one notify event
fn translate(event: &Event, workspace: &Workspace) -> Vec<WatchEvent> {
    let mut out = Vec::new();
    for path in &event.paths {
        let Some(rel) = workspace.relative(path) else {
            continue;
        };
        if !workspace.is_indexable(&rel) {
            continue;
        }

        let watch_event = match event.kind {
            EventKind::Create(_) => WatchEvent::Created(rel),
            // Renames report both ends; whichever side is gone was deleted
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    WatchEvent::Created(rel)
                } else {
                    WatchEvent::Deleted(rel)
                }
            }
            EventKind::Modify(_) => WatchEvent::Changed(rel),
            EventKind::Remove(_) => WatchEvent::Deleted(rel),
            _ => continue,
        };
        out.push(watch_event);
    }
    out
}

/// Wait for the next event, then collect until `window` passes quietly
///
/// Events are coalesced per path (the latest wins) and returned in
/// first-seen order. Returns `None` once the channel is closed and drained.
pub async fn next_batch(
    rx: &mut mpsc::Receiver<WatchEvent>,
    window: Duration,
) -> Option<Vec<WatchEvent>> {
    let first = rx.recv().await?;
    let mut pending = PendingEvents::default();
    pending.push(first);

    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(event)) => pending.push(event),
            Ok(None) | Err(_) => break,
        }
    }

    Some(pending.into_batch())
}

#[derive(Default)]
struct PendingEvents {
    order: Vec<String>,
    latest: HashMap<String, WatchEvent>,
}

impl PendingEvents {
    fn push(&mut self, event: WatchEvent) {
        let path = event.path().to_string();
        let merged = match (self.latest.get(&path), event) {
            // Created then modified is still a creation
            (Some(WatchEvent::Created(_)), WatchEvent::Changed(p)) => WatchEvent::Created(p),
            (_, event) => event,
        };
        if self.latest.insert(path.clone(), merged).is_none() {
            self.order.push(path);
        }
    }

    fn into_batch(mut self) -> Vec<WatchEvent> {
        self.order
            .iter()
            .filter_map(|path| self.latest.remove(path))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IndexConfig;
    use notify::event::{CreateKind, RemoveKind};
    use tempfile::TempDir;

    #[test]
    fn test_translate_filters_and_relativizes() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path(), &IndexConfig::default()).unwrap();

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(ws.root().join("src/a.ts"))
            .add_path(ws.root().join("README.md"))
            .add_path(ws.root().join("node_modules/x/index.js"));
        assert_eq!(
            translate(&event, &ws),
            vec![WatchEvent::Created("src/a.ts".into())]
        );

        let event =
            Event::new(EventKind::Remove(RemoveKind::File)).add_path(ws.root().join("b.tsx"));
        assert_eq!(translate(&event, &ws), vec![WatchEvent::Deleted("b.tsx".into())]);
    }

    #[test]
    fn test_stop_after_root_removed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        std::fs::create_dir(&root).unwrap();
        let ws = Workspace::new(&root, &IndexConfig::default()).unwrap();

        let (watcher, _rx) = FileWatcher::start(&ws).unwrap();
        std::fs::remove_dir_all(&root).unwrap();
        watcher.stop();
    }

    #[tokio::test]
    async fn test_next_batch_coalesces_per_path() {
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(WatchEvent::Created("a.ts".into())).await.unwrap();
        tx.send(WatchEvent::Changed("b.ts".into())).await.unwrap();
        tx.send(WatchEvent::Changed("a.ts".into())).await.unwrap();
        tx.send(WatchEvent::Deleted("b.ts".into())).await.unwrap();
        drop(tx);

        let batch = next_batch(&mut rx, Duration::from_millis(20)).await.unwrap();
        assert_eq!(
            batch,
            vec![
                WatchEvent::Created("a.ts".into()),
                WatchEvent::Deleted("b.ts".into()),
            ]
        );
        assert!(next_batch(&mut rx, Duration::from_millis(20)).await.is_none());
    }
}
