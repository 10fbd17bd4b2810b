//! CLI command definitions and handlers

pub mod index;
pub mod query;
pub mod search;
pub mod watch;

use std::env;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::project::Project;
use crate::model::{CancelFlag, CodeModel};
use crate::workspace::Workspace;

const LONG_ABOUT: &str = r#"
Incremental code intelligence for TypeScript and JavaScript projects.

Every command brings the index up to date first: only files whose content
changed since the last run are parsed again, and files whose exports they
depend on are re-checked.

QUICK START:
    1. codeatlas index            Index the current project
    2. codeatlas search <query>   Ranked search over symbols
    3. codeatlas skeleton <file>  Signatures only, bodies collapsed

GRAPH:
    codeatlas symbol <name>       Definitions by name or path#Qualified.name
    codeatlas callers <name>      Functions that call <name>
    codeatlas callees <name>      Functions <name> calls
    codeatlas refs <name>         Exports, imports and re-exports of <name>
    codeatlas imports <file>      What a file imports, resolved
    codeatlas importers <file>    Files that import a file

LIVE:
    codeatlas watch               Re-index as files change (Ctrl-C to stop)

Set CODEATLAS_LOG=debug for diagnostics.
"#;

/// Incremental code intelligence
#[derive(Parser, Debug)]
#[command(name = "codeatlas")]
#[command(author, version)]
#[command(about = "Incremental code intelligence: skeletons, symbol graph and search")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project path (default: detected from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the index up to date
    #[command(visible_alias = "i")]
    Index(IndexArgs),

    /// Index statistics
    Stats,

    /// Print a file with function bodies collapsed
    #[command(visible_alias = "sk")]
    Skeleton(FileArgs),

    /// Look up a symbol by name or fully-qualified name
    Symbol(NameArgs),

    /// Fuzzy symbol search
    Symbols(QueryArgs),

    /// Functions that call a symbol
    Callers(NameArgs),

    /// Functions a symbol calls
    Callees(NameArgs),

    /// Definition, import and re-export sites of a name
    Refs(NameArgs),

    /// Imports of a file
    Imports(FileArgs),

    /// Files importing a file
    Importers(FileArgs),

    /// Exports of a file
    Exports(FileArgs),

    /// Ranked full-text search over symbols
    #[command(visible_alias = "s")]
    Search(QueryArgs),

    /// Watch the project and re-index on change
    #[command(visible_alias = "w")]
    Watch,
}

/// Arguments for the index command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    codeatlas index              Index the current project
    codeatlas index -p ~/code    Index a specific directory
    codeatlas index --force      Discard state and re-index everything")]
pub struct IndexArgs {
    /// Discard persisted state and re-index every file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Symbol name (`doWork`) or fully-qualified name (`src/a.ts#Cache.get`)
    pub name: String,
}

#[derive(Args, Debug)]
pub struct FileArgs {
    /// File path, absolute or relative to the current directory
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text
    pub query: String,

    /// Max results
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Open the model for `project` (or the project around the current directory)
pub async fn open_model(project: Option<&Path>) -> Result<CodeModel> {
    let project = match project {
        Some(path) => Project::from_path(path)?,
        None => Project::detect(&env::current_dir()?)?,
    };
    info!(project = %project.name, root = %project.root.display(), "Using project");

    let config = Config::load()?;
    let workspace = Workspace::new(&project.root, &config.index)?;
    let state_dir = Config::state_dir(workspace.root())?;
    CodeModel::open(workspace, state_dir, config).await
}

/// Open the model, re-index whatever is stale and persist the result
pub async fn fresh_model(project: Option<&Path>) -> Result<CodeModel> {
    let mut model = open_model(project).await?;
    model.reindex_stale(&CancelFlag::new()).await;
    model.save()?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["codeatlas", "callers", "doWork", "--json", "-p", "/tmp"])
            .unwrap();
        assert_eq!(cli.format(), OutputFormat::Json);
        assert_eq!(cli.project.as_deref(), Some(Path::new("/tmp")));
        assert!(matches!(cli.command, Commands::Callers(ref a) if a.name == "doWork"));
    }

    #[test]
    fn test_query_limit() {
        let cli = Cli::try_parse_from(["codeatlas", "search", "parse config", "-l", "3"]).unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "parse config");
                assert_eq!(args.limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
