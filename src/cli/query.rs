//! Graph and record queries: skeleton, symbols, calls, references, imports
//!
//! @module cli/query

use std::path::PathBuf;

use crate::cli::{fresh_model, FileArgs, NameArgs, OutputFormat, QueryArgs};
use crate::core::error::{Error, Result};
use crate::model::CodeModel;
use crate::output::{
    format_output, ExportList, ImportList, ImporterList, Output, ReferenceList, ResolvedImport,
    Skeleton, SymbolList,
};

fn emit(output: Output<'_>, format: OutputFormat) {
    print!("{}", format_output(&output, format));
}

fn not_indexed(path: &str) -> Error {
    Error::IndexError {
        message: format!("{} is not indexed", path),
    }
}

async fn model_and_file(project: Option<PathBuf>, args: &FileArgs) -> Result<(CodeModel, String)> {
    let model = fresh_model(project.as_deref()).await?;
    let rel = model.workspace().require_relative(&args.file)?;
    Ok((model, rel))
}

pub async fn skeleton(project: Option<PathBuf>, args: FileArgs, format: OutputFormat) -> Result<()> {
    let (mut model, rel) = model_and_file(project, &args).await?;
    let skeleton = model.skeleton(&rel).await.ok_or_else(|| not_indexed(&rel))?;
    emit(
        Output::Skeleton(Skeleton {
            path: &rel,
            skeleton: &skeleton,
        }),
        format,
    );
    Ok(())
}

pub async fn symbol(project: Option<PathBuf>, args: NameArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    emit(
        Output::Symbols(SymbolList {
            query: &args.name,
            symbols: model.graph().get_symbol(&args.name),
        }),
        format,
    );
    Ok(())
}

pub async fn symbols(project: Option<PathBuf>, args: QueryArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    let limit = args.limit.unwrap_or(model.config().graph.default_limit);
    emit(
        Output::Symbols(SymbolList {
            query: &args.query,
            symbols: model.graph().search_symbols(&args.query, limit),
        }),
        format,
    );
    Ok(())
}

pub async fn callers(project: Option<PathBuf>, args: NameArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    emit(
        Output::Symbols(SymbolList {
            query: &args.name,
            symbols: model.graph().get_callers(&args.name),
        }),
        format,
    );
    Ok(())
}

pub async fn callees(project: Option<PathBuf>, args: NameArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    emit(
        Output::Symbols(SymbolList {
            query: &args.name,
            symbols: model.graph().get_callees(&args.name),
        }),
        format,
    );
    Ok(())
}

pub async fn refs(project: Option<PathBuf>, args: NameArgs, format: OutputFormat) -> Result<()> {
    let model = fresh_model(project.as_deref()).await?;
    emit(
        Output::References(ReferenceList {
            name: &args.name,
            references: model.graph().find_references(&args.name),
        }),
        format,
    );
    Ok(())
}

pub async fn imports(project: Option<PathBuf>, args: FileArgs, format: OutputFormat) -> Result<()> {
    let (model, rel) = model_and_file(project, &args).await?;
    let graph = model.graph();
    let imports = graph
        .get_imports(&rel)
        .iter()
        .map(|import| ResolvedImport {
            import,
            resolved: graph.resolve_import(&rel, &import.source),
        })
        .collect();
    emit(Output::Imports(ImportList { path: &rel, imports }), format);
    Ok(())
}

pub async fn importers(project: Option<PathBuf>, args: FileArgs, format: OutputFormat) -> Result<()> {
    let (model, rel) = model_and_file(project, &args).await?;
    emit(
        Output::Importers(ImporterList {
            path: &rel,
            importers: model.graph().get_importers(&rel),
        }),
        format,
    );
    Ok(())
}

pub async fn exports(project: Option<PathBuf>, args: FileArgs, format: OutputFormat) -> Result<()> {
    let (model, rel) = model_and_file(project, &args).await?;
    let record = model.engine().record(&rel).ok_or_else(|| not_indexed(&rel))?;
    emit(
        Output::Exports(ExportList {
            path: &rel,
            exports: &record.exports,
        }),
        format,
    );
    Ok(())
}
