//! Body-collapsed skeleton generation

use tree_sitter::Node;

/// Span of a function or method body block
///
/// Rows are 0-based, columns are byte offsets within the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodyRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl BodyRange {
    pub fn of(node: Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_row: start.row,
            start_col: start.column,
            end_row: end.row,
            end_col: end.column,
        }
    }

    fn end(&self) -> (usize, usize) {
        (self.end_row, self.end_col)
    }
}

/// Sort and merge ranges that overlap or touch on a shared row
pub fn merge_ranges(mut ranges: Vec<BodyRange>) -> Vec<BodyRange> {
    ranges.sort();
    let mut merged: Vec<BodyRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start_row <= current.end_row => {
                if range.end() > current.end() {
                    current.end_row = range.end_row;
                    current.end_col = range.end_col;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Replace every body range with a single `{ ... }` line
///
/// Lines outside bodies are kept byte-for-byte; the text before a body's
/// opening brace and after its closing brace survives on the collapsed line.
pub fn skeleton(source: &str, ranges: Vec<BodyRange>) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let merged = merge_ranges(ranges);

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut row = 0usize;
    for range in merged {
        if range.start_row >= lines.len() {
            break;
        }
        while row < range.start_row {
            out.push(lines[row].to_string());
            row += 1;
        }

        let first = lines[range.start_row];
        let prefix = first.get(..range.start_col).unwrap_or(first);
        let suffix = lines
            .get(range.end_row)
            .and_then(|last| last.get(range.end_col..))
            .unwrap_or("");
        out.push(format!("{}{{ ... }}{}", prefix, suffix));
        row = range.end_row + 1;
    }
    while row < lines.len() {
        out.push(lines[row].to_string());
        row += 1;
    }

    out.join("\n")
}
