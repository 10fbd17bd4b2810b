//! Workspace file-system capability
//!
//! Everything the pipeline needs from the disk goes through `Workspace`:
//! enumeration, reads, mtimes and path normalization. Paths handed to the
//! core are workspace-relative and `/`-separated.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::debug;

use crate::core::config::IndexConfig;
use crate::core::error::{Error, Result};
use crate::parse::Language;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    max_file_size: u64,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: &IndexConfig) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::ProjectNotFound { path: root });
        }
        let root = std::fs::canonicalize(&root).unwrap_or(root);

        Ok(Self {
            root,
            include: build_globset(&config.include)?,
            exclude: build_globset(&config.exclude)?,
            max_file_size: config.max_file_size,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All indexable files, respecting .gitignore and the include/exclude globs
    pub fn list_files(&self) -> Vec<String> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            if !self.is_indexable(&rel) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.max_file_size {
                    debug!(path = %rel, size = meta.len(), "Skipping large file");
                    continue;
                }
            }
            files.push(rel);
        }

        files.sort();
        files
    }

    /// Supported extension, included and not excluded
    pub fn is_indexable(&self, rel: &str) -> bool {
        Language::from_path(rel).is_indexable()
            && self.include.is_match(rel)
            && !self.exclude.is_match(rel)
    }

    pub async fn read_file(&self, rel: &str) -> Result<Vec<u8>> {
        let path = self.absolute(rel);
        let meta = tokio::fs::metadata(&path).await?;
        if meta.len() > self.max_file_size {
            return Err(Error::IndexError {
                message: format!("{} exceeds {} bytes", rel, self.max_file_size),
            });
        }
        Ok(tokio::fs::read(&path).await?)
    }

    /// Modification time in milliseconds since the Unix epoch
    pub async fn stat(&self, rel: &str) -> Result<i64> {
        let meta = tokio::fs::metadata(self.absolute(rel)).await?;
        let modified: chrono::DateTime<chrono::Utc> = meta.modified()?.into();
        Ok(modified.timestamp_millis())
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.absolute(rel).is_file()
    }

    pub fn absolute(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Workspace-relative `/`-separated form of `path`, if it lies inside the root
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?
        } else {
            path
        };

        let mut parts: Vec<String> = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop()?;
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Like `relative`, but an error for paths outside the workspace
    pub fn require_relative(&self, path: &Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = std::fs::canonicalize(&absolute).unwrap_or(absolute);
        self.relative(&absolute)
            .or_else(|| self.relative(path).filter(|rel| self.exists(rel)))
            .ok_or_else(|| Error::OutsideWorkspace {
                path: path.to_path_buf(),
            })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path(), &IndexConfig::default()).unwrap()
    }

    #[test]
    fn test_list_files_filters_extensions_and_excludes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/lib")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("src/a.ts"), "export const a = 1;").unwrap();
        fs::write(dir.path().join("src/lib/b.tsx"), "").unwrap();
        fs::write(dir.path().join("src/readme.md"), "# hi").unwrap();
        fs::write(dir.path().join("src/vendor.min.js"), "x").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();

        let files = workspace(&dir).list_files();
        assert_eq!(files, vec!["src/a.ts", "src/lib/b.tsx"]);
    }

    #[test]
    fn test_relative_paths() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let abs = ws.root().join("src").join("a.ts");
        assert_eq!(ws.relative(&abs).as_deref(), Some("src/a.ts"));
        assert_eq!(ws.relative(Path::new("src/./x/../a.ts")).as_deref(), Some("src/a.ts"));
        assert_eq!(ws.relative(Path::new("../outside.ts")), None);
        assert_eq!(ws.relative(Path::new("/elsewhere/a.ts")), None);
    }

    #[tokio::test]
    async fn test_read_and_stat() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "let x = 1;").unwrap();
        let ws = workspace(&dir);

        assert_eq!(ws.read_file("a.ts").await.unwrap(), b"let x = 1;");
        assert!(ws.stat("a.ts").await.unwrap() > 0);
        assert!(ws.exists("a.ts"));
        assert!(ws.read_file("missing.ts").await.is_err());
    }
}
