//! Identifier-aware tokenizer
//!
//! `getHTTPResponse_v2` -> `get`, `http`, `response`, `v2`.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Minimum token length kept in the index
pub const MIN_TOKEN_LEN: usize = 2;

/// Language keywords, builtins and path noise that match almost everything
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // keywords
        "function", "const", "let", "var", "return", "class", "interface", "type", "enum",
        "export", "import", "default", "from", "as", "async", "await", "new", "this",
        "extends", "implements", "static", "public", "private", "protected", "readonly",
        "if", "else", "for", "while", "do", "switch", "case", "break", "continue", "try",
        "catch", "finally", "throw", "typeof", "instanceof", "in", "of", "void", "yield",
        // builtin types and values
        "string", "number", "boolean", "any", "unknown", "never", "object", "null",
        "undefined", "true", "false", "promise", "array", "record", "map", "set",
        // chunk kinds and path noise
        "method", "variable", "file", "src", "lib", "index", "ts", "tsx", "js", "jsx",
        "mjs", "cjs", "mts", "cts",
        // english glue
        "the", "and", "or", "to", "is", "an", "on", "at", "by", "with",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// All terms in order, duplicates kept (query term frequencies)
pub fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .flat_map(split_case)
        .map(|part| part.to_lowercase())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

/// Distinct terms in first-occurrence order
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    terms(text)
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Split camelCase/PascalCase, keeping acronyms together (`HTTPServer` -> `HTTP`, `Server`)
fn split_case(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower)
            {
                parts.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
