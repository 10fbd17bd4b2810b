//! Language detection and tree-sitter grammar loading

use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Parser;

/// Languages with a tree-sitter grammar wired into the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    TypeScript,
    TypeScriptReact,
    JavaScript,
    JavaScriptReact,
    // Not indexable
    Unknown,
}

impl Language {
    /// All languages that have a grammar
    pub const SUPPORTED: [Language; 4] = [
        Language::TypeScript,
        Language::TypeScriptReact,
        Language::JavaScript,
        Language::JavaScriptReact,
    ];

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::TypeScriptReact,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "jsx" => Language::JavaScriptReact,
            _ => Language::Unknown,
        }
    }

    /// Get the language name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::TypeScriptReact => "typescriptreact",
            Language::JavaScript => "javascript",
            Language::JavaScriptReact => "javascriptreact",
            Language::Unknown => "unknown",
        }
    }

    /// Check if files of this language can be indexed
    pub fn is_indexable(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Get the tree-sitter language for this language
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::TypeScriptReact => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            // The JavaScript grammar covers JSX
            Language::JavaScript | Language::JavaScriptReact => {
                Some(tree_sitter_javascript::LANGUAGE.into())
            }
            Language::Unknown => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extensions tried, in order, when resolving an extensionless relative import
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];

/// One configured parser per supported language
pub struct Parsers {
    parsers: HashMap<Language, Parser>,
}

impl Parsers {
    /// Build a parser for every supported language
    ///
    /// Fails if any grammar cannot be loaded (ABI mismatch).
    pub fn new() -> Result<Self> {
        let mut parsers = HashMap::new();
        for language in Language::SUPPORTED {
            let grammar = language
                .tree_sitter_language()
                .ok_or_else(|| Error::Parse {
                    language: language.to_string(),
                    message: "no grammar".to_string(),
                })?;
            let mut parser = Parser::new();
            parser.set_language(&grammar).map_err(|e| Error::Parse {
                language: language.to_string(),
                message: e.to_string(),
            })?;
            parsers.insert(language, parser);
        }
        Ok(Self { parsers })
    }

    pub fn get_mut(&mut self, language: Language) -> Option<&mut Parser> {
        self.parsers.get_mut(&language)
    }
}
