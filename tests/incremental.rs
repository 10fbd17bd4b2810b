//! End-to-end incremental behavior through `CodeModel`

use std::fs;
use std::path::Path;

use codeatlas::core::config::Config;
use codeatlas::index::{EntryOutcome, IndexEngine};
use codeatlas::watch::WatchEvent;
use codeatlas::{CancelFlag, CodeModel, Workspace};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Open from persisted state without re-indexing anything
async fn open_model(dir: &TempDir) -> CodeModel {
    let config = Config::default();
    let workspace = Workspace::new(dir.path(), &config.index).unwrap();
    CodeModel::open(workspace, dir.path().join(".state"), config)
        .await
        .unwrap()
}

async fn indexed_model(dir: &TempDir) -> CodeModel {
    let mut model = open_model(dir).await;
    model.reindex_stale(&CancelFlag::new()).await;
    model
}

/// Rewrite a file and tell the model, as the watcher would
async fn edit(model: &mut CodeModel, root: &Path, rel: &str, content: &str) {
    write(root, rel, content);
    model.apply_event(&WatchEvent::Changed(rel.to_string()));
    model.get_entry(rel).await.unwrap();
}

fn names(symbols: Vec<&codeatlas::trace::GraphSymbol>) -> Vec<String> {
    symbols.into_iter().map(|s| s.name.clone()).collect()
}

#[tokio::test]
async fn second_get_entry_is_cached_and_identical() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export function foo(x: number): number { return x; }\n");
    let workspace = Workspace::new(dir.path(), &Config::default().index).unwrap();
    let mut engine = IndexEngine::new();
    engine.mark_dirty("src/a.ts");

    let first = match engine.get_entry(&workspace, "src/a.ts").await {
        EntryOutcome::Reindexed { record, .. } => record.clone(),
        other => panic!("expected a parse, got {:?}", other.record().map(|r| &r.path)),
    };
    let second = match engine.get_entry(&workspace, "src/a.ts").await {
        EntryOutcome::Cached(record) => record.clone(),
        other => panic!("expected a cache hit, got replaced={}", other.replaced()),
    };
    assert_eq!(first, second);
}

#[tokio::test]
async fn touching_without_changing_bytes_only_marks_clean() {
    let dir = TempDir::new().unwrap();
    let source = "export class Cache { get(key: string) { return key; } }\n";
    write(dir.path(), "src/cache.ts", source);
    let workspace = Workspace::new(dir.path(), &Config::default().index).unwrap();
    let mut engine = IndexEngine::new();
    engine.mark_dirty("src/cache.ts");
    let before = engine
        .get_entry(&workspace, "src/cache.ts")
        .await
        .record()
        .cloned()
        .unwrap();

    write(dir.path(), "src/cache.ts", source);
    engine.mark_dirty("src/cache.ts");
    assert!(engine.is_stale("src/cache.ts"));

    let after = match engine.get_entry(&workspace, "src/cache.ts").await {
        EntryOutcome::Refreshed(record) => record.clone(),
        other => panic!("expected a refresh, got replaced={}", other.replaced()),
    };
    assert!(!engine.is_stale("src/cache.ts"));
    assert_eq!(before.symbols, after.symbols);
    assert_eq!(before.imports, after.imports);
    assert_eq!(before.exports, after.exports);
}

#[tokio::test]
async fn export_rename_dirties_importer_but_body_change_does_not() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export function foo() { return 1; }\n");
    write(
        dir.path(),
        "src/b.ts",
        "import { foo } from './a';\nexport function useFoo() { return foo(); }\n",
    );
    let mut model = indexed_model(&dir).await;
    assert!(!model.is_stale("src/b.ts"));

    edit(&mut model, dir.path(), "src/a.ts", "export function foo() { return 2; }\n").await;
    assert!(!model.is_stale("src/b.ts"));

    edit(&mut model, dir.path(), "src/a.ts", "export function bar() { return 2; }\n").await;
    assert!(model.is_stale("src/b.ts"));

    // B's bytes are unchanged, so the follow-up only refreshes it
    let report = model.reindex_stale(&CancelFlag::new()).await;
    assert_eq!(report.indexed, 0);
    assert_eq!(report.skipped, 1);
    assert!(!model.is_stale("src/b.ts"));
}

#[tokio::test]
async fn removed_call_leaves_no_stale_caller() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/a.ts",
        "function foo() {}\nexport function bar() { foo(); }\n",
    );
    let mut model = indexed_model(&dir).await;
    assert_eq!(names(model.graph().get_callers("foo")), vec!["bar"]);
    assert_eq!(names(model.graph().get_callees("bar")), vec!["foo"]);

    edit(
        &mut model,
        dir.path(),
        "src/a.ts",
        "function foo() {}\nexport function bar() { return 1; }\n",
    )
    .await;
    assert!(model.graph().get_callers("foo").is_empty());
    assert!(model.graph().get_callees("bar").is_empty());
}

#[tokio::test]
async fn deleting_a_file_removes_edges_both_ways() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/b.ts", "export function doWork() {}\n");
    write(
        dir.path(),
        "src/a.ts",
        "import { doWork } from './b';\nexport function main() { doWork(); }\n",
    );
    let mut model = indexed_model(&dir).await;
    assert_eq!(model.stats().graph.call_edges, 1);

    fs::remove_file(dir.path().join("src/b.ts")).unwrap();
    model.apply_event(&WatchEvent::Deleted("src/b.ts".into()));

    assert!(model.graph().get_callees("main").is_empty());
    assert!(model.graph().get_symbol("doWork").is_empty());
    assert_eq!(model.stats().graph.call_edges, 0);
    // Its exports vanished, so the importer must be re-checked
    assert!(model.is_stale("src/a.ts"));
}

#[tokio::test]
async fn search_is_deterministic_and_ignores_short_tokens() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/http.ts",
        "export function handleRequest(req: Request) {}\nexport function handleError(err: Error) {}\n",
    );
    write(
        dir.path(),
        "src/ui.ts",
        "export function handleClick(event: MouseEvent) {}\nexport function render() {}\n",
    );

    let first = indexed_model(&dir).await;
    let ids: Vec<String> = first
        .search("handle", 10)
        .iter()
        .map(|hit| hit.chunk.id.clone())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.contains("#handle")));

    let again: Vec<String> = first
        .search("handle", 10)
        .iter()
        .map(|hit| hit.chunk.id.clone())
        .collect();
    assert_eq!(ids, again);

    let other_dir = TempDir::new().unwrap();
    write(other_dir.path(), "src/http.ts", &fs::read_to_string(dir.path().join("src/http.ts")).unwrap());
    write(other_dir.path(), "src/ui.ts", &fs::read_to_string(dir.path().join("src/ui.ts")).unwrap());
    let second = indexed_model(&other_dir).await;
    let rebuilt: Vec<String> = second
        .search("handle", 10)
        .iter()
        .map(|hit| hit.chunk.id.clone())
        .collect();
    assert_eq!(ids, rebuilt);

    assert!(first.search("a", 10).is_empty());
    assert!(first.search("( ) ; .", 10).is_empty());
}

#[tokio::test]
async fn end_to_end_call_and_import_edges() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/b.ts", "export function doWork() {}\n");
    write(
        dir.path(),
        "src/a.ts",
        "import { doWork } from './b';\nexport function main() { doWork(); }\n",
    );
    let model = indexed_model(&dir).await;

    assert!(names(model.graph().get_callees("main")).contains(&"doWork".to_string()));
    assert!(names(model.graph().get_callers("doWork")).contains(&"main".to_string()));
    assert_eq!(model.graph().get_importers("src/b.ts"), vec!["src/a.ts"]);
    assert_eq!(model.graph().resolve_import("src/a.ts", "./b"), Some("src/b.ts"));
}

#[tokio::test]
async fn late_indexed_callee_is_linked() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/a.ts",
        "import { doWork } from './b';\nexport function main() { doWork(); }\n",
    );
    let mut model = indexed_model(&dir).await;
    assert!(model.graph().get_callees("main").is_empty());

    write(dir.path(), "src/b.ts", "export function doWork() {}\n");
    model.apply_event(&WatchEvent::Created("src/b.ts".into()));
    model.reindex_stale(&CancelFlag::new()).await;

    assert_eq!(names(model.graph().get_callees("main")), vec!["doWork"]);
    assert_eq!(names(model.graph().get_callers("doWork")), vec!["main"]);
}

#[tokio::test]
async fn skeleton_collapses_bodies() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/a.ts",
        "export function add(a: number, b: number): number {\n  return a + b;\n}\n",
    );
    let mut model = indexed_model(&dir).await;
    let skeleton = model.skeleton("src/a.ts").await.unwrap();
    assert!(skeleton.contains("export function add(a: number, b: number): number { ... }"));
    assert!(!skeleton.contains("return a + b"));
}

#[tokio::test]
async fn vanished_files_are_dropped_on_reopen() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export function keep() {}\n");
    write(dir.path(), "src/b.ts", "export function drop() {}\n");
    let model = indexed_model(&dir).await;
    model.save().unwrap();
    drop(model);

    fs::remove_file(dir.path().join("src/b.ts")).unwrap();
    let model = indexed_model(&dir).await;
    assert_eq!(model.stats().records, 1);
    assert!(model.graph().get_symbol("drop").is_empty());
    assert!(model.search("drop", 5).is_empty());
    assert_eq!(model.graph().get_symbol("keep").len(), 1);
}

#[tokio::test]
async fn dependency_dirty_mark_survives_reopen() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export function foo() {}\n");
    write(
        dir.path(),
        "src/b.ts",
        "import { foo } from './a';\nexport function useFoo() { foo(); }\n",
    );
    let mut model = indexed_model(&dir).await;
    edit(&mut model, dir.path(), "src/a.ts", "export function bar() {}\n").await;
    assert!(model.is_stale("src/b.ts"));
    model.save().unwrap();
    drop(model);

    let mut model = open_model(&dir).await;
    assert!(model.is_stale("src/b.ts"));
    assert!(!model.is_stale("src/a.ts"));

    let report = model.reindex_stale(&CancelFlag::new()).await;
    assert_eq!(report.skipped, 1);
    assert!(!model.is_stale("src/b.ts"));
}

#[tokio::test]
async fn corrupt_records_are_rebuilt() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ts", "export function hello() {}\n");
    let model = indexed_model(&dir).await;
    model.save().unwrap();
    drop(model);

    fs::write(dir.path().join(".state/records.json"), "{ corrupt").unwrap();
    let mut model = open_model(&dir).await;
    assert!(model.is_stale("a.ts"));

    let report = model.reindex_stale(&CancelFlag::new()).await;
    assert_eq!(report.indexed, 1);
    assert_eq!(model.stats().records, 1);
    assert_eq!(model.graph().get_symbol("hello").len(), 1);
}

#[tokio::test]
async fn offline_deletion_dirties_importers() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/a.ts", "export function foo() {}\n");
    write(
        dir.path(),
        "src/b.ts",
        "import { foo } from './a';\nexport function useFoo() { foo(); }\n",
    );
    let model = indexed_model(&dir).await;
    model.save().unwrap();
    drop(model);

    fs::remove_file(dir.path().join("src/a.ts")).unwrap();
    let model = open_model(&dir).await;
    assert_eq!(model.stats().records, 1);
    assert!(model.is_stale("src/b.ts"));
    assert!(model.graph().get_callees("useFoo").is_empty());
}

#[tokio::test]
async fn imported_names_shadowing_builtins_are_linked() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/log.ts",
        "export function error(msg: string) {}\nexport function info() {}\n",
    );
    write(
        dir.path(),
        "src/a.ts",
        "import { error, info } from './log';\nexport function main() { error('x'); info(); }\n",
    );
    let model = indexed_model(&dir).await;

    assert_eq!(names(model.graph().get_callers("error")), vec!["main"]);
    assert_eq!(names(model.graph().get_callees("main")), vec!["error", "info"]);
}
