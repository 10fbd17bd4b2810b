//! Error types for codeatlas

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using codeatlas's Error
pub type Result<T> = std::result::Result<T, Error>;

/// codeatlas error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    #[error("No project root found (looked for .git, package.json, tsconfig.json, etc.)")]
    NoProjectRoot,

    #[error("Index error: {message}")]
    IndexError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Unsupported language for {path}")]
    UnsupportedLanguage { path: String },

    #[error("Parse error ({language}): {message}")]
    Parse { language: String, message: String },

    #[error("Path outside workspace: {path}")]
    OutsideWorkspace { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}
