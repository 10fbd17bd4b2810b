//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub graph: GraphConfig,
    pub search: SearchConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Files processed between yields during bulk re-indexing
    pub batch_size: usize,
    /// Maximum file size to index (bytes)
    pub max_file_size: u64,
    /// Glob patterns a file must match to be indexed
    pub include: Vec<String>,
    /// Glob patterns that exclude a file from indexing
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum same-name candidates for the global call fallback
    pub fallback_max_candidates: usize,
    /// Default result limit for fuzzy symbol search
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// IDF multiplier applied to stop words
    pub stop_word_weight: f64,
    /// Default number of search hits
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce time in milliseconds
    pub debounce_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            max_file_size: MAX_FILE_SIZE,
            include: vec!["**/*".to_string()],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/.git/**".to_string(),
                "**/*.min.js".to_string(),
            ],
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            fallback_max_candidates: 3,
            default_limit: 20,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stop_word_weight: 0.1,
            default_top_k: 10,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = Self::home()?;
        Ok(home.join("config.toml"))
    }

    /// Get the codeatlas home directory
    pub fn home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("CODEATLAS_HOME") {
            return Ok(PathBuf::from(home));
        }

        ProjectDirs::from("dev", "codeatlas", "codeatlas")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine codeatlas home directory".to_string(),
            })
    }

    /// Get the persisted-state directory for a project
    pub fn state_dir(project_root: &Path) -> Result<PathBuf> {
        let home = Self::home()?;
        let hash = xxhash_rust::xxh3::xxh3_64(project_root.to_string_lossy().as_bytes());
        Ok(home.join("projects").join(format!("{:016x}", hash)))
    }
}

pub const MAX_FILE_SIZE: u64 = 1_048_576; // 1MB

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[graph]
fallback_max_candidates = 5

[search]
default_top_k = 3
"#,
        )
        .unwrap();

        assert_eq!(config.graph.fallback_max_candidates, 5);
        assert_eq!(config.graph.default_limit, 20);
        assert_eq!(config.search.default_top_k, 3);
        assert!((config.search.stop_word_weight - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.index.batch_size, 25);
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn test_state_dir_is_stable_per_root() {
        let a = Config::state_dir(Path::new("/work/project")).unwrap();
        let b = Config::state_dir(Path::new("/work/project")).unwrap();
        let c = Config::state_dir(Path::new("/work/other")).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
