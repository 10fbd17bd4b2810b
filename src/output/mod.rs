//! Output formatting

pub mod human;
pub mod json;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::index::{Export, Import};
use crate::model::{ModelStats, ReindexReport};
use crate::search::SearchHit;
use crate::trace::{GraphSymbol, Reference};

/// Result of an `index` run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub report: ReindexReport,
    pub stats: ModelStats,
    pub elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct SymbolList<'a> {
    pub query: &'a str,
    pub symbols: Vec<&'a GraphSymbol>,
}

#[derive(Debug, Serialize)]
pub struct ReferenceList<'a> {
    pub name: &'a str,
    pub references: Vec<Reference>,
}

#[derive(Debug, Serialize)]
pub struct ResolvedImport<'a> {
    #[serde(flatten)]
    pub import: &'a Import,
    /// Workspace file the specifier resolves to, if indexed
    pub resolved: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ImportList<'a> {
    pub path: &'a str,
    pub imports: Vec<ResolvedImport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ImporterList<'a> {
    pub path: &'a str,
    pub importers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportList<'a> {
    pub path: &'a str,
    pub exports: &'a [Export],
}

#[derive(Debug, Serialize)]
pub struct Skeleton<'a> {
    pub path: &'a str,
    pub skeleton: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<'a> {
    pub query: &'a str,
    pub hits: Vec<SearchHit<'a>>,
    pub elapsed_ms: f64,
}

/// Anything a command can print
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Output<'a> {
    Index(IndexSummary),
    Stats(ModelStats),
    Symbols(SymbolList<'a>),
    References(ReferenceList<'a>),
    Imports(ImportList<'a>),
    Importers(ImporterList<'a>),
    Exports(ExportList<'a>),
    Skeleton(Skeleton<'a>),
    Search(SearchResponse<'a>),
}

/// Format command output
pub fn format_output(output: &Output<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format(output),
        OutputFormat::Json => json::format(output),
    }
}
