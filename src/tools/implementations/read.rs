// Read tool - reads file contents with line numbers
//
// Supports optional offset (1-indexed start line) and limit (max lines)
// so the model can read large files in focused chunks.

use async_trait::async_trait;
use serde_json::Value;

use super::args::{optional_usize, required_str};
use crate::tools::error::ToolError;
use crate::tools::paths::resolve_path;
use crate::tools::registry::Tool;
use crate::tools::types::{Disposition, ToolContext, ToolInputSchema};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the specified path. Output is prefixed with line \
         numbers. Use offset and limit to read a specific range of lines \
         (e.g., offset=100 limit=50 reads lines 100-149)."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required("path", "string", "The path to the file to read")
            .optional(
                "offset",
                "integer",
                "Line number to start reading from (1-indexed, default: 1)",
            )
            .optional(
                "limit",
                "integer",
                "Maximum number of lines to read (default: all)",
            )
    }

    fn disposition(&self) -> Disposition {
        Disposition::Auto
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let raw_path = required_str(input, "path")?;
        let offset = optional_usize(input, "offset")?.unwrap_or(1).max(1);
        let limit = optional_usize(input, "limit")?.filter(|&l| l > 0);

        let path = resolve_path(raw_path, &context.working_dir);

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;
        if !metadata.is_file() {
            return Err(ToolError::NotAFile(raw_path.to_string()));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;
        let contents = String::from_utf8_lossy(&bytes);

        let all_lines: Vec<&str> = contents.lines().collect();
        let total_lines = all_lines.len();

        if total_lines == 0 {
            return Ok(format!("{} is empty", raw_path));
        }

        let start = offset - 1; // convert to 0-indexed
        if start >= total_lines {
            return Ok(format!(
                "{} has {} lines. Offset {} is past the end.",
                raw_path, total_lines, offset
            ));
        }
        let end = match limit {
            Some(l) => start.saturating_add(l).min(total_lines),
            None => total_lines,
        };

        let numbered = all_lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>6}\t{}", start + i + 1, line))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!("Contents of {}:\n{}", raw_path, numbered))
    }
}
