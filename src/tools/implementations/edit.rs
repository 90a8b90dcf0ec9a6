// Edit tool - exact string replacement in files
//
// The target string must occur exactly once. On success the tool returns the
// number of lines affected followed by a plain-text change summary:
//
//   Added 2 lines, removed 1 line
//        9     fn validate(&self) -> Result<()> {
//       10 -       // Old comment
//       10 +       // New comment

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::args::required_str;
use crate::tools::error::ToolError;
use crate::tools::paths::resolve_path;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema};

const CONTEXT_LINES: usize = 3;

pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Make a precise edit to a file by replacing a unique string with a new string. \
         old_str must match the file content exactly (including whitespace) and appear \
         exactly once. If it appears more than once, include more surrounding context."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required("path", "string", "The path to the file to edit")
            .required(
                "old_str",
                "string",
                "The exact string to find and replace (must be unique in the file)",
            )
            .required("new_str", "string", "The string to replace old_str with")
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let raw_path = required_str(input, "path")?;
        let old_str = required_str(input, "old_str")?;
        let new_str = required_str(input, "new_str")?;

        if old_str.is_empty() {
            return Err(ToolError::Validation(
                "old_str must not be empty".to_string(),
            ));
        }

        let path = resolve_path(raw_path, &context.working_dir);

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;
        if !metadata.is_file() {
            return Err(ToolError::NotAFile(raw_path.to_string()));
        }

        let original = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;

        let count = original.matches(old_str).count();
        if count == 0 {
            return Err(ToolError::Resource(
                "String not found in file. Make sure old_str exactly matches the file \
                 content including whitespace."
                    .to_string(),
            ));
        }
        if count > 1 {
            return Err(ToolError::Resource(format!(
                "String found {} times, the edit is ambiguous. old_str must be unique. \
                 Add more surrounding context to make it unique.",
                count
            )));
        }

        let updated = original.replacen(old_str, new_str, 1);
        tokio::fs::write(&path, &updated)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;

        let lines_affected = old_str.matches('\n').count() + 1;
        debug!(path = %path.display(), lines_affected, "File edited");

        Ok(format!(
            "Successfully edited {} ({} line(s) affected)\n{}",
            raw_path,
            lines_affected,
            change_summary(&original, old_str, new_str)
        ))
    }
}

/// Plain-text summary of a single replacement with surrounding context
pub fn change_summary(original: &str, old_str: &str, new_str: &str) -> String {
    let orig_lines: Vec<&str> = original.lines().collect();
    let old_lines: Vec<&str> = old_str.lines().collect();
    let new_lines: Vec<&str> = new_str.lines().collect();

    let removed = old_lines.len();
    let added = new_lines.len();

    let mut parts = Vec::new();
    if added > 0 {
        parts.push(format!("Added {} line{}", added, plural(added)));
    }
    if removed > 0 {
        parts.push(format!("removed {} line{}", removed, plural(removed)));
    }
    let mut out = if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join(", ")
    };
    out.push('\n');

    let start_byte = original.find(old_str).unwrap_or(0);
    let start_line = original[..start_byte].matches('\n').count(); // 0-indexed
    let context_start = start_line.saturating_sub(CONTEXT_LINES).min(orig_lines.len());
    let after_start = (start_line + removed).min(orig_lines.len());
    let context_end = (after_start + CONTEXT_LINES).min(orig_lines.len());

    let width = (orig_lines.len() + added).to_string().len().max(3);

    for (i, line) in orig_lines[context_start..start_line.min(orig_lines.len())]
        .iter()
        .enumerate()
    {
        out.push_str(&format!("  {:>w$}     {}\n", context_start + i + 1, line, w = width));
    }
    for (i, line) in old_lines.iter().enumerate() {
        out.push_str(&format!("  {:>w$} -   {}\n", start_line + i + 1, line, w = width));
    }
    for (i, line) in new_lines.iter().enumerate() {
        out.push_str(&format!("  {:>w$} +   {}\n", start_line + i + 1, line, w = width));
    }
    for (i, line) in orig_lines[after_start..context_end].iter().enumerate() {
        out.push_str(&format!(
            "  {:>w$}     {}\n",
            start_line + added + i + 1,
            line,
            w = width
        ));
    }

    out
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn edit(dir: &TempDir, old: &str, new: &str) -> Result<String, ToolError> {
        EditFileTool
            .execute(
                &json!({"path": "f.txt", "old_str": old, "new_str": new}),
                &ToolContext::new(dir.path()),
            )
            .await
    }

    #[tokio::test]
    async fn test_edit_single_occurrence() {
        let dir = TempDir::new().unwrap();
        let original = "fn a() {}\nfn b() { old() }\nfn c() {}\n";
        std::fs::write(dir.path().join("f.txt"), original).unwrap();

        let out = edit(&dir, "old()", "new_call()").await.unwrap();
        assert!(out.starts_with("Successfully edited f.txt (1 line(s) affected)"));

        let after = std::fs::read_to_string(dir.path().join("f.txt")).unwrap();
        assert_eq!(after, original.replacen("old()", "new_call()", 1));
    }

    #[tokio::test]
    async fn test_edit_not_found_leaves_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "abc\n").unwrap();

        let err = edit(&dir, "xyz", "q").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "abc\n");
    }

    #[tokio::test]
    async fn test_edit_ambiguous_leaves_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "dup\ndup\n").unwrap();

        let err = edit(&dir, "dup", "one").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("2 times"), "got: {}", message);
        assert!(message.contains("context"));
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "dup\ndup\n");
    }

    #[tokio::test]
    async fn test_edit_empty_old_str_is_validation_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "abc").unwrap();
        let err = edit(&dir, "", "x").await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = edit(&dir, "a", "b").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_summary_counts() {
        let summary = change_summary("line1\nold line\nline3\n", "old line", "new A\nnew B");
        assert!(summary.starts_with("Added 2 lines, removed 1 line"), "got: {}", summary);
        assert!(summary.contains("  2 -   old line"));
        assert!(summary.contains("  2 +   new A"));
        assert!(summary.contains("  3 +   new B"));
        assert!(summary.contains("  4     line3"));
    }

    #[test]
    fn test_summary_has_no_escape_codes() {
        let summary = change_summary("a\nb\nc\n", "b", "x");
        assert!(!summary.contains('\x1b'));
    }
}
