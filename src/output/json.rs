//! JSON output formatting

use super::Output;

/// Format output as JSON
pub fn format(output: &Output<'_>) -> String {
    let mut out = serde_json::to_string_pretty(output)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize output: {}"}}"#, e));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ImporterList;

    #[test]
    fn test_untagged_output() {
        let output = Output::Importers(ImporterList {
            path: "src/a.ts",
            importers: vec!["src/b.ts".into()],
        });
        let value: serde_json::Value = serde_json::from_str(&format(&output)).unwrap();
        assert_eq!(value["path"], "src/a.ts");
        assert_eq!(value["importers"][0], "src/b.ts");
    }
}
