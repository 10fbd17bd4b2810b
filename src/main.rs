//! codeatlas CLI entry point

use clap::Parser;
use codeatlas::cli::{self, Cli, Commands};
use codeatlas::core::error::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CODEATLAS_LOG"))
        .init();

    let cli = Cli::parse();
    let format = cli.format();
    let project = cli.project;

    match cli.command {
        Commands::Index(args) => cli::index::run(project, args, format).await,
        Commands::Stats => cli::index::stats(project, format).await,
        Commands::Skeleton(args) => cli::query::skeleton(project, args, format).await,
        Commands::Symbol(args) => cli::query::symbol(project, args, format).await,
        Commands::Symbols(args) => cli::query::symbols(project, args, format).await,
        Commands::Callers(args) => cli::query::callers(project, args, format).await,
        Commands::Callees(args) => cli::query::callees(project, args, format).await,
        Commands::Refs(args) => cli::query::refs(project, args, format).await,
        Commands::Imports(args) => cli::query::imports(project, args, format).await,
        Commands::Importers(args) => cli::query::importers(project, args, format).await,
        Commands::Exports(args) => cli::query::exports(project, args, format).await,
        Commands::Search(args) => cli::search::run(project, args, format).await,
        Commands::Watch => cli::watch::run(project, format).await,
    }
}
