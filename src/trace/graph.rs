//! Symbol Graph
//!
//! Derived, incrementally maintained view over index records:
//! - FQN lookup and fuzzy name search
//! - import edges (file -> imports, module stem -> importers)
//! - a best-effort call graph with bidirectional edges
//!
//! `update_from_entry` tears down everything known about a file before
//! inserting the new version, so at most one version of a file is ever
//! visible. Call resolution depends on which other files are indexed, so
//! files whose calls may resolve differently after a change are re-linked.
//!
//! @module trace/graph

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::types::{fqn, GraphStats, GraphSymbol, Reference, ReferenceKind};
use crate::index::record::{Export, ExportKind, Import, IndexRecord, Symbol, WILDCARD};
use crate::index::resolve::{file_stems, module_stem};

/// Default ambiguity bound for the global call fallback
pub const DEFAULT_FALLBACK_MAX_CANDIDATES: usize = 3;

#[derive(Debug)]
pub struct SymbolGraph {
    /// FQN -> symbol
    symbols: HashMap<String, GraphSymbol>,
    /// Bare name -> FQNs
    by_name: HashMap<String, BTreeSet<String>>,
    /// Path -> FQNs in declaration order
    by_file: HashMap<String, Vec<String>>,
    /// Module stem -> indexed files
    files_by_stem: HashMap<String, BTreeSet<String>>,

    imports: HashMap<String, Vec<Import>>,
    exports: HashMap<String, Vec<Export>>,
    /// Module stem -> files importing or re-exporting from it
    importers: HashMap<String, BTreeSet<String>>,

    /// Caller FQN -> callee names as written
    raw_calls: HashMap<String, Vec<String>>,
    /// Callee name -> files with a caller naming it
    called_names: HashMap<String, BTreeSet<String>>,
    callees: HashMap<String, BTreeSet<String>>,
    callers: HashMap<String, BTreeSet<String>>,

    fallback_max_candidates: usize,
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_MAX_CANDIDATES)
    }
}

impl SymbolGraph {
    pub fn new(fallback_max_candidates: usize) -> Self {
        Self {
            symbols: HashMap::new(),
            by_name: HashMap::new(),
            by_file: HashMap::new(),
            files_by_stem: HashMap::new(),
            imports: HashMap::new(),
            exports: HashMap::new(),
            importers: HashMap::new(),
            raw_calls: HashMap::new(),
            called_names: HashMap::new(),
            callees: HashMap::new(),
            callers: HashMap::new(),
            fallback_max_candidates,
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Replace everything derived from `record.path` with the new record
    pub fn update_from_entry(&mut self, record: &IndexRecord) {
        let path = record.path.as_str();

        let mut affected = self.dependents_of(path);
        self.teardown(path);
        self.insert(record);
        affected.extend(self.dependents_of(path));
        affected.remove(path);

        self.link_file(path);
        for file in &affected {
            self.relink_file(file);
        }

        debug!(
            path,
            symbols = self.by_file.get(path).map_or(0, Vec::len),
            relinked = affected.len(),
            "Graph updated"
        );
    }

    /// Drop a deleted file and re-link everything that resolved into it
    pub fn remove_file(&mut self, path: &str) {
        if !self.by_file.contains_key(path) {
            return;
        }
        let mut affected = self.dependents_of(path);
        self.teardown(path);
        affected.remove(path);
        for file in &affected {
            self.relink_file(file);
        }
        debug!(path, relinked = affected.len(), "Graph file removed");
    }

    /// Files whose call resolution may depend on the symbols of `path`
    fn dependents_of(&self, path: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if let Some(fqns) = self.by_file.get(path) {
            for fqn in fqns {
                let Some(symbol) = self.symbols.get(fqn) else {
                    continue;
                };
                if let Some(files) = self.called_names.get(&symbol.name) {
                    out.extend(files.iter().cloned());
                }
            }
        }
        for stem in file_stems(path) {
            if let Some(files) = self.importers.get(&stem) {
                out.extend(files.iter().cloned());
            }
        }
        out
    }

    fn teardown(&mut self, path: &str) {
        if let Some(fqns) = self.by_file.remove(path) {
            for fqn in &fqns {
                self.unlink_outgoing(fqn);
                if let Some(callers) = self.callers.remove(fqn) {
                    for caller in callers {
                        remove_from(&mut self.callees, &caller, fqn);
                    }
                }
                if let Some(symbol) = self.symbols.remove(fqn) {
                    remove_from(&mut self.by_name, &symbol.name, fqn);
                }
                if let Some(calls) = self.raw_calls.remove(fqn) {
                    for name in calls {
                        remove_from(&mut self.called_names, &name, path);
                    }
                }
            }
        }

        let imports = self.imports.remove(path).unwrap_or_default();
        let exports = self.exports.remove(path).unwrap_or_default();
        let specifiers = imports
            .iter()
            .map(|i| i.source.as_str())
            .chain(exports.iter().filter_map(|e| e.source.as_deref()));
        for spec in specifiers {
            if let Some(stem) = module_stem(path, spec) {
                remove_from(&mut self.importers, &stem, path);
            }
        }
        for stem in file_stems(path) {
            remove_from(&mut self.files_by_stem, &stem, path);
        }
    }

    fn insert(&mut self, record: &IndexRecord) {
        let path = record.path.as_str();
        let mut fqns = Vec::new();
        for symbol in &record.symbols {
            self.insert_symbol(path, symbol, None, &mut fqns);
            for method in &symbol.methods {
                self.insert_symbol(path, method, Some(symbol), &mut fqns);
            }
        }
        self.by_file.insert(path.to_string(), fqns);

        for spec in record.dependency_specifiers() {
            if let Some(stem) = module_stem(path, spec) {
                self.importers
                    .entry(stem)
                    .or_default()
                    .insert(path.to_string());
            }
        }
        self.imports
            .insert(path.to_string(), record.imports.clone());
        self.exports
            .insert(path.to_string(), record.exports.clone());

        for stem in file_stems(path) {
            self.files_by_stem
                .entry(stem)
                .or_default()
                .insert(path.to_string());
        }
    }

    fn insert_symbol(
        &mut self,
        path: &str,
        symbol: &Symbol,
        parent: Option<&Symbol>,
        fqns: &mut Vec<String>,
    ) {
        let qualified_name = match parent {
            Some(parent) => format!("{}.{}", parent.name, symbol.name),
            None => symbol.name.clone(),
        };
        let key = fqn(path, &qualified_name);

        for name in &symbol.calls {
            self.called_names
                .entry(name.clone())
                .or_default()
                .insert(path.to_string());
        }

        // Redeclared names (`var x` twice) share one node
        if self.symbols.contains_key(&key) {
            let calls = self.raw_calls.entry(key).or_default();
            for name in &symbol.calls {
                if !calls.contains(name) {
                    calls.push(name.clone());
                }
            }
            return;
        }

        let graph_symbol = GraphSymbol {
            fqn: key.clone(),
            name: symbol.name.clone(),
            qualified_name,
            kind: symbol.kind,
            path: path.to_string(),
            line: symbol.line,
            end_line: symbol.end_line,
            exported: parent.unwrap_or(symbol).is_exported(),
            signature: symbol.signature(parent.map(|p| p.name.as_str())),
            parent: parent.map(|p| p.name.clone()),
        };

        self.by_name
            .entry(symbol.name.clone())
            .or_default()
            .insert(key.clone());
        if !symbol.calls.is_empty() {
            self.raw_calls.insert(key.clone(), symbol.calls.clone());
        }
        self.symbols.insert(key.clone(), graph_symbol);
        fqns.push(key);
    }

    // =========================================================================
    // CALL LINKING
    // =========================================================================

    fn link_file(&mut self, path: &str) {
        let Some(fqns) = self.by_file.get(path).cloned() else {
            return;
        };
        for caller in fqns {
            let Some(calls) = self.raw_calls.get(&caller).cloned() else {
                continue;
            };
            for name in calls {
                for callee in self.resolve_call(path, &name) {
                    self.add_edge(&caller, &callee);
                }
            }
        }
    }

    fn relink_file(&mut self, path: &str) {
        if let Some(fqns) = self.by_file.get(path).cloned() {
            for fqn in &fqns {
                self.unlink_outgoing(fqn);
            }
        }
        self.link_file(path);
    }

    fn add_edge(&mut self, caller: &str, callee: &str) {
        self.callees
            .entry(caller.to_string())
            .or_default()
            .insert(callee.to_string());
        self.callers
            .entry(callee.to_string())
            .or_default()
            .insert(caller.to_string());
    }

    fn unlink_outgoing(&mut self, caller: &str) {
        if let Some(callees) = self.callees.remove(caller) {
            for callee in callees {
                remove_from(&mut self.callers, &callee, caller);
            }
        }
    }

    /// FQNs a call to `name` from `path` resolves to
    ///
    /// Same file first, then relative imports, then a global match when it
    /// is unambiguous enough.
    fn resolve_call(&self, path: &str, name: &str) -> Vec<String> {
        let Some(candidates) = self.by_name.get(name) else {
            // Only an aliased import can still resolve
            return self.resolve_through_imports(path, name);
        };

        let same_file: Vec<String> = candidates
            .iter()
            .filter(|f| self.symbols.get(*f).is_some_and(|s| s.path == path))
            .cloned()
            .collect();
        if !same_file.is_empty() {
            return same_file;
        }

        let imported = self.resolve_through_imports(path, name);
        if !imported.is_empty() {
            return imported;
        }

        if candidates.len() <= self.fallback_max_candidates {
            candidates.iter().cloned().collect()
        } else {
            Vec::new()
        }
    }

    fn resolve_through_imports(&self, path: &str, name: &str) -> Vec<String> {
        let Some(imports) = self.imports.get(path) else {
            return Vec::new();
        };

        for import in imports.iter().filter(|i| i.is_relative()) {
            let target_name = match import.imported_name(name) {
                Some(imported) => imported,
                None if import.has_wildcard() => name,
                None => continue,
            };
            let Some(stem) = module_stem(path, &import.source) else {
                continue;
            };
            let Some(files) = self.files_by_stem.get(&stem) else {
                continue;
            };
            for file in files {
                let found = self.top_level_in_file(file, target_name);
                if !found.is_empty() {
                    return found;
                }
            }
        }
        Vec::new()
    }

    fn top_level_in_file(&self, path: &str, name: &str) -> Vec<String> {
        let key = fqn(path, name);
        if self.symbols.contains_key(&key) {
            vec![key]
        } else {
            Vec::new()
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Exact FQN lookup, or every symbol with the bare name
    pub fn get_symbol(&self, name: &str) -> Vec<&GraphSymbol> {
        if name.contains('#') {
            return self.symbols.get(name).into_iter().collect();
        }
        self.resolve_name(name)
    }

    /// Substring search ranked exported-first, exact-first, then alphabetical
    pub fn search_symbols(&self, query: &str, limit: usize) -> Vec<&GraphSymbol> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(&GraphSymbol, String)> = self
            .symbols
            .values()
            .filter_map(|s| {
                let lower = s.name.to_lowercase();
                lower.contains(&needle).then_some((s, lower))
            })
            .collect();

        matches.sort_by(|(a, a_lower), (b, b_lower)| {
            b.exported
                .cmp(&a.exported)
                .then_with(|| (*b_lower == needle).cmp(&(*a_lower == needle)))
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.fqn.cmp(&b.fqn))
        });

        matches.into_iter().take(limit).map(|(s, _)| s).collect()
    }

    pub fn get_symbols_in_file(&self, path: &str) -> Vec<&GraphSymbol> {
        self.by_file
            .get(path)
            .map(|fqns| fqns.iter().filter_map(|f| self.symbols.get(f)).collect())
            .unwrap_or_default()
    }

    pub fn get_exported_symbols(&self, path: &str) -> Vec<&GraphSymbol> {
        self.get_symbols_in_file(path)
            .into_iter()
            .filter(|s| s.exported && s.parent.is_none())
            .collect()
    }

    /// Files whose relative imports resolve to `path`
    pub fn get_importers(&self, path: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        for stem in file_stems(path) {
            if let Some(files) = self.importers.get(&stem) {
                out.extend(files.iter().filter(|f| f.as_str() != path).cloned());
            }
        }
        out.into_iter().collect()
    }

    pub fn get_imports(&self, path: &str) -> &[Import] {
        self.imports.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indexed file a relative specifier of `from` resolves to
    pub fn resolve_import(&self, from: &str, specifier: &str) -> Option<&str> {
        let stem = module_stem(from, specifier)?;
        self.files_by_stem
            .get(&stem)
            .and_then(|files| files.iter().next())
            .map(String::as_str)
    }

    /// Callers of any symbol named `name`
    pub fn get_callers(&self, name: &str) -> Vec<&GraphSymbol> {
        self.collect_edges(name, &self.callers)
    }

    /// Callees of any symbol named `name`
    pub fn get_callees(&self, name: &str) -> Vec<&GraphSymbol> {
        self.collect_edges(name, &self.callees)
    }

    fn collect_edges(
        &self,
        name: &str,
        edges: &HashMap<String, BTreeSet<String>>,
    ) -> Vec<&GraphSymbol> {
        let mut out: BTreeSet<&str> = BTreeSet::new();
        for symbol in self.resolve_name(name) {
            if let Some(set) = edges.get(&symbol.fqn) {
                out.extend(set.iter().map(String::as_str));
            }
        }
        out.into_iter()
            .filter_map(|f| self.symbols.get(f))
            .collect()
    }

    fn resolve_name(&self, name: &str) -> Vec<&GraphSymbol> {
        self.by_name
            .get(name)
            .map(|fqns| fqns.iter().filter_map(|f| self.symbols.get(f)).collect())
            .unwrap_or_default()
    }

    /// Definitions, importing files and pass-through re-exports of `name`
    pub fn find_references(&self, name: &str) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .resolve_name(name)
            .into_iter()
            .map(|s| Reference {
                kind: ReferenceKind::Export,
                path: s.path.clone(),
                line: s.line,
            })
            .collect();

        for (path, imports) in &self.imports {
            for import in imports {
                if import.names.iter().any(|n| n == name || n == WILDCARD) {
                    refs.push(Reference {
                        kind: ReferenceKind::Import,
                        path: path.clone(),
                        line: import.line,
                    });
                }
            }
        }

        for (path, exports) in &self.exports {
            let defines = self.symbols.contains_key(&fqn(path, name));
            for export in exports {
                if export.kind == ExportKind::Reexport && export.name == name && !defines {
                    refs.push(Reference {
                        kind: ReferenceKind::Reexport,
                        path: path.clone(),
                        line: export.line,
                    });
                }
            }
        }

        refs.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then(a.line.cmp(&b.line))
                .then(a.kind.cmp(&b.kind))
        });
        refs.dedup();
        refs
    }

    pub fn get_stats(&self) -> GraphStats {
        GraphStats {
            files: self.by_file.len(),
            symbols: self.symbols.len(),
            call_edges: self.callees.values().map(BTreeSet::len).sum(),
            import_edges: self.importers.values().map(BTreeSet::len).sum(),
        }
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.by_file.contains_key(path)
    }
}

/// Remove `value` from the set under `key`, dropping the key once empty
fn remove_from(map: &mut HashMap<String, BTreeSet<String>>, key: &str, value: &str) {
    if let Some(set) = map.get_mut(key) {
        set.remove(value);
        if set.is_empty() {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{extract, Language, Parsers};

    fn record(parsers: &mut Parsers, path: &str, source: &str) -> IndexRecord {
        let data = extract(parsers, source, Language::from_path(path)).unwrap();
        let mut record = IndexRecord::empty(path, "fp", 0);
        record.symbols = data.symbols;
        record.imports = data.imports;
        record.exports = data.exports;
        record
    }

    fn fqns(symbols: Vec<&GraphSymbol>) -> Vec<String> {
        symbols.into_iter().map(|s| s.fqn.clone()).collect()
    }

    /// Every callee edge has its mirror and vice versa
    fn assert_symmetric(graph: &SymbolGraph) {
        for (caller, callees) in &graph.callees {
            for callee in callees {
                assert!(graph.callers[callee].contains(caller), "{} -> {}", caller, callee);
            }
        }
        for (callee, callers) in &graph.callers {
            for caller in callers {
                assert!(graph.callees[caller].contains(callee), "{} <- {}", callee, caller);
            }
        }
    }

    #[test]
    fn test_cross_file_call_through_import() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();

        graph.update_from_entry(&record(
            &mut parsers,
            "src/b.ts",
            "export function doWork() {}\n",
        ));
        graph.update_from_entry(&record(
            &mut parsers,
            "src/a.ts",
            "import { doWork } from './b';\nexport function main() {\n  doWork();\n}\n",
        ));

        assert_eq!(fqns(graph.get_callees("main")), vec!["src/b.ts#doWork"]);
        assert_eq!(fqns(graph.get_callers("doWork")), vec!["src/a.ts#main"]);
        assert_eq!(graph.get_importers("src/b.ts"), vec!["src/a.ts"]);
        assert_eq!(graph.resolve_import("src/a.ts", "./b"), Some("src/b.ts"));
        assert_symmetric(&graph);
    }

    #[test]
    fn test_late_indexed_target_is_linked() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();

        graph.update_from_entry(&record(
            &mut parsers,
            "src/a.ts",
            "import { doWork as dw } from './b';\nfunction main() {\n  dw();\n}\n",
        ));
        assert!(graph.get_callees("main").is_empty());

        graph.update_from_entry(&record(
            &mut parsers,
            "src/b.ts",
            "export function doWork() {}\n",
        ));
        assert_eq!(fqns(graph.get_callees("main")), vec!["src/b.ts#doWork"]);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_reindex_removes_stale_edges() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();

        graph.update_from_entry(&record(
            &mut parsers,
            "src/a.ts",
            "function foo() {}\nfunction bar() {\n  foo();\n}\n",
        ));
        assert_eq!(fqns(graph.get_callers("foo")), vec!["src/a.ts#bar"]);

        graph.update_from_entry(&record(
            &mut parsers,
            "src/a.ts",
            "function foo() {}\nfunction bar() {\n  return 1;\n}\n",
        ));
        assert!(graph.get_callers("foo").is_empty());
        assert_eq!(graph.get_stats().call_edges, 0);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_remove_file_tears_down_both_directions() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();

        graph.update_from_entry(&record(&mut parsers, "lib.ts", "export function util() {}\n"));
        graph.update_from_entry(&record(
            &mut parsers,
            "app.ts",
            "import { util } from './lib';\nfunction run() {\n  util();\n}\n",
        ));
        assert_eq!(graph.get_stats().call_edges, 1);

        graph.remove_file("lib.ts");
        assert!(graph.get_callees("run").is_empty());
        assert!(graph.get_symbol("lib.ts#util").is_empty());
        assert_eq!(graph.get_stats().files, 1);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_global_fallback_respects_threshold() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::new(2);

        graph.update_from_entry(&record(&mut parsers, "x1.ts", "function helper() {}\n"));
        graph.update_from_entry(&record(
            &mut parsers,
            "main.ts",
            "function main() {\n  helper();\n}\n",
        ));
        assert_eq!(fqns(graph.get_callees("main")), vec!["x1.ts#helper"]);

        graph.update_from_entry(&record(&mut parsers, "x2.ts", "function helper() {}\n"));
        assert_eq!(graph.get_callees("main").len(), 2);

        // A third candidate makes the name too ambiguous
        graph.update_from_entry(&record(&mut parsers, "x3.ts", "function helper() {}\n"));
        assert!(graph.get_callees("main").is_empty());
        assert_symmetric(&graph);
    }

    #[test]
    fn test_same_file_wins_over_global() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();

        graph.update_from_entry(&record(&mut parsers, "other.ts", "function load() {}\n"));
        graph.update_from_entry(&record(
            &mut parsers,
            "svc.ts",
            "export class Service {\n  run() {\n    this.load();\n  }\n  load() {}\n}\n",
        ));

        assert_eq!(fqns(graph.get_callees("run")), vec!["svc.ts#Service.load"]);
        let method = &graph.get_symbol("svc.ts#Service.run")[0];
        assert!(method.exported);
        assert_eq!(method.signature, "method Service.run()");
    }

    #[test]
    fn test_search_symbols_ranking() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();
        graph.update_from_entry(&record(
            &mut parsers,
            "a.ts",
            "function parseConfig() {}\nexport function parser() {}\nfunction parse() {}\nexport function parse2() {}\n",
        ));

        let names: Vec<&str> = graph
            .search_symbols("PARSE", 10)
            .into_iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["parse2", "parser", "parse", "parseConfig"]);
        assert_eq!(graph.search_symbols("parse", 2).len(), 2);
        assert!(graph.search_symbols("  ", 10).is_empty());
    }

    #[test]
    fn test_find_references() {
        let mut parsers = Parsers::new().unwrap();
        let mut graph = SymbolGraph::default();
        graph.update_from_entry(&record(&mut parsers, "src/b.ts", "export function doWork() {}\n"));
        graph.update_from_entry(&record(
            &mut parsers,
            "src/a.ts",
            "import { doWork } from './b';\n",
        ));
        graph.update_from_entry(&record(
            &mut parsers,
            "src/index.ts",
            "export { doWork } from './b';\n",
        ));

        let refs: Vec<(ReferenceKind, String, u32)> = graph
            .find_references("doWork")
            .into_iter()
            .map(|r| (r.kind, r.path, r.line))
            .collect();
        assert_eq!(
            refs,
            vec![
                (ReferenceKind::Import, "src/a.ts".to_string(), 1),
                (ReferenceKind::Export, "src/b.ts".to_string(), 1),
                (ReferenceKind::Reexport, "src/index.ts".to_string(), 1),
            ]
        );

        let stats = graph.get_stats();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.import_edges, 2);
        assert_eq!(graph.get_importers("src/b.ts"), vec!["src/a.ts", "src/index.ts"]);
        assert_eq!(graph.get_exported_symbols("src/b.ts").len(), 1);
        assert_eq!(graph.get_imports("src/a.ts")[0].source, "./b");
    }
}
