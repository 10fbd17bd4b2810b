//! Human-readable output formatting

use std::fmt::Write;

use super::{
    ExportList, ImportList, ImporterList, IndexSummary, Output, ReferenceList, SearchResponse,
    SymbolList,
};
use crate::model::ModelStats;

/// Format output for human consumption
pub fn format(output: &Output<'_>) -> String {
    match output {
        Output::Index(summary) => format_index(summary),
        Output::Stats(stats) => format_stats(stats),
        Output::Symbols(list) => format_symbols(list),
        Output::References(list) => format_references(list),
        Output::Imports(list) => format_imports(list),
        Output::Importers(list) => format_importers(list),
        Output::Exports(list) => format_exports(list),
        Output::Skeleton(skeleton) => {
            let mut out = skeleton.skeleton.to_string();
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out
        }
        Output::Search(response) => format_search(response),
    }
}

fn format_index(summary: &IndexSummary) -> String {
    let r = &summary.report;
    let mut out = format!(
        "Indexed {} files ({} unchanged, {} removed, {} failed) in {:.2}s\n",
        r.indexed,
        r.skipped,
        r.removed,
        r.failed,
        summary.elapsed_ms / 1000.0
    );
    if r.cancelled {
        out.push_str("  Cancelled before the stale set was drained\n");
    }
    out.push_str(&format_stats(&summary.stats));
    out
}

fn format_stats(stats: &ModelStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Files:        {}", stats.records);
    let _ = writeln!(out, "  Stale:        {}", stats.stale);
    let _ = writeln!(out, "  Symbols:      {}", stats.graph.symbols);
    let _ = writeln!(out, "  Call edges:   {}", stats.graph.call_edges);
    let _ = writeln!(out, "  Import edges: {}", stats.graph.import_edges);
    let _ = writeln!(out, "  Chunks:       {}", stats.chunks);
    out
}

fn format_symbols(list: &SymbolList<'_>) -> String {
    if list.symbols.is_empty() {
        return format!("No symbols found for '{}'\n", list.query);
    }

    let mut out = format!("{} symbols for '{}'\n\n", list.symbols.len(), list.query);
    for symbol in &list.symbols {
        let _ = writeln!(
            out,
            "{}:{}  {} {}{}",
            symbol.path,
            symbol.line,
            symbol.kind.as_str(),
            symbol.qualified_name,
            if symbol.exported { " (exported)" } else { "" }
        );
        let _ = writeln!(out, "   {}", truncate(&symbol.signature, 80));
    }
    out
}

fn format_references(list: &ReferenceList<'_>) -> String {
    if list.references.is_empty() {
        return format!("No references to '{}'\n", list.name);
    }

    let mut out = format!("{} references to '{}'\n\n", list.references.len(), list.name);
    for reference in &list.references {
        let _ = writeln!(
            out,
            "{:<9} {}:{}",
            reference.kind.as_str(),
            reference.path,
            reference.line
        );
    }
    out
}

fn format_imports(list: &ImportList<'_>) -> String {
    if list.imports.is_empty() {
        return format!("{} imports nothing\n", list.path);
    }

    let mut out = String::new();
    for entry in &list.imports {
        let import = entry.import;
        let _ = write!(
            out,
            "{:>4}  {}{} {{ {} }}",
            import.line,
            if import.type_only { "type " } else { "" },
            import.source,
            import.names.join(", ")
        );
        match entry.resolved {
            Some(path) => {
                let _ = writeln!(out, " -> {}", path);
            }
            None => out.push('\n'),
        }
    }
    out
}

fn format_importers(list: &ImporterList<'_>) -> String {
    if list.importers.is_empty() {
        return format!("Nothing imports {}\n", list.path);
    }
    let mut out = String::new();
    for path in &list.importers {
        let _ = writeln!(out, "{}", path);
    }
    out
}

fn format_exports(list: &ExportList<'_>) -> String {
    if list.exports.is_empty() {
        return format!("{} exports nothing\n", list.path);
    }

    let mut out = String::new();
    for export in list.exports {
        let _ = write!(out, "{:>4}  {:<9} {}", export.line, export.kind.as_str(), export.name);
        match &export.source {
            Some(source) => {
                let _ = writeln!(out, " from {}", source);
            }
            None => out.push('\n'),
        }
    }
    out
}

fn format_search(response: &SearchResponse<'_>) -> String {
    if response.hits.is_empty() {
        return format!(
            "No results found for '{}' ({:.1}ms)\n",
            response.query, response.elapsed_ms
        );
    }

    let mut out = format!(
        "Found {} results for '{}' ({:.1}ms)\n\n",
        response.hits.len(),
        response.query,
        response.elapsed_ms
    );

    for (i, hit) in response.hits.iter().enumerate() {
        let chunk = hit.chunk;
        let _ = writeln!(
            out,
            "{}. {}:{}-{} ({:.2})",
            i + 1,
            chunk.path,
            chunk.start_line,
            chunk.end_line,
            hit.score
        );
        match chunk.kind {
            Some(kind) => {
                let _ = writeln!(out, "   {} {}", kind.as_str(), chunk.symbol);
            }
            None => {
                let _ = writeln!(out, "   file {}", chunk.symbol);
            }
        }
        if !chunk.preview.is_empty() {
            let _ = writeln!(out, "   {}", truncate(&chunk.preview, 80));
        }
        out.push('\n');
    }
    out
}

fn truncate(line: &str, max: usize) -> String {
    if line.chars().count() > max {
        let head: String = line.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Export, ExportKind};

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 80), "short");
        let long = "é".repeat(100);
        let cut = truncate(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_exports_show_reexport_source() {
        let exports = vec![
            Export {
                name: "helper".into(),
                kind: ExportKind::Function,
                line: 1,
                source: None,
            },
            Export {
                name: "Thing".into(),
                kind: ExportKind::Reexport,
                line: 3,
                source: Some("./thing".into()),
            },
        ];
        let out = format(&Output::Exports(ExportList {
            path: "src/a.ts",
            exports: &exports,
        }));
        assert!(out.contains("function  helper\n"));
        assert!(out.contains("reexport  Thing from ./thing\n"));
    }
}
