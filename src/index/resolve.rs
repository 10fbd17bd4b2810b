//! Relative import resolution
//!
//! Specifiers and files are matched through their *module stem*: the
//! workspace-relative path with a known source extension stripped. `./b`,
//! `./b.js` and `./b.ts` imported from `src/a.ts` all have the stem `src/b`,
//! which is also a stem of `src/b.ts`, `src/b.tsx` and `src/b/index.ts`.
//! Matching on stems works whether or not the target is indexed yet.
//!
//! Bare (package) specifiers are never resolved.

use crate::index::record::is_relative_specifier;
use crate::parse::RESOLVE_EXTENSIONS;

/// Stem a relative `specifier` imported from `from` resolves to
pub fn module_stem(from: &str, specifier: &str) -> Option<String> {
    if !is_relative_specifier(specifier) {
        return None;
    }

    let mut parts: Vec<&str> = from.split('/').collect();
    // Drop the importing file name
    parts.pop();

    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(strip_source_extension(&parts.join("/")).to_string())
}

/// Every stem that resolves to the file at `path`
pub fn file_stems(path: &str) -> Vec<String> {
    let stem = strip_source_extension(path);
    let mut stems = vec![stem.to_string()];
    if let Some(dir) = stem.strip_suffix("/index") {
        stems.push(dir.to_string());
    }
    stems
}

fn strip_source_extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.contains('/') => {
            if RESOLVE_EXTENSIONS.contains(&ext) {
                base
            } else {
                path
            }
        }
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_stem() {
        assert_eq!(module_stem("src/a.ts", "./b").as_deref(), Some("src/b"));
        assert_eq!(module_stem("src/a.ts", "./b.js").as_deref(), Some("src/b"));
        assert_eq!(
            module_stem("src/deep/a.ts", "../util/x").as_deref(),
            Some("src/util/x")
        );
        assert_eq!(module_stem("a.ts", "./lib").as_deref(), Some("lib"));
        assert_eq!(module_stem("a.ts", "../escape"), None);
        assert_eq!(module_stem("src/a.ts", "react"), None);
        assert_eq!(
            module_stem("src/a.ts", "./data.json").as_deref(),
            Some("src/data.json")
        );
    }

    #[test]
    fn test_file_stems_include_index_directory() {
        assert_eq!(file_stems("src/b.ts"), vec!["src/b"]);
        assert_eq!(file_stems("src/util/index.tsx"), vec!["src/util/index", "src/util"]);
        assert_eq!(file_stems("index.js"), vec!["index"]);
    }
}
