//! Source parsing: language detection, extraction and skeletons

pub mod extract;
pub mod languages;
pub mod skeleton;
pub mod syntax;

pub use extract::{extract, normalize_specifier, Extracted};
pub use languages::{Language, Parsers, RESOLVE_EXTENSIONS};
pub use skeleton::{skeleton, BodyRange};
