// Write tool - create or overwrite files
//
// Parent directories are created as needed. Reports the number of bytes
// written.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::args::required_str;
use crate::tools::error::ToolError;
use crate::tools::paths::resolve_path;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites it if it \
         does. Always provide the complete file content."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required("path", "string", "The path to the file to write")
            .required("content", "string", "The complete content to write to the file")
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let raw_path = required_str(input, "path")?;
        let content = required_str(input, "content")?;

        let path = resolve_path(raw_path, &context.working_dir);

        if path.is_dir() {
            return Err(ToolError::NotAFile(raw_path.to_string()));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::io(parent.display().to_string(), e))?;
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::io(raw_path, e))?;

        debug!(path = %path.display(), bytes = content.len(), "File written");
        Ok(format!(
            "Successfully wrote {} bytes to {}",
            content.len(),
            raw_path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());

        let out = WriteFileTool
            .execute(&json!({"path": "deep/nested/f.txt", "content": "héllo"}), &ctx)
            .await
            .unwrap();

        assert_eq!(out, "Successfully wrote 6 bytes to deep/nested/f.txt");
        let written = std::fs::read_to_string(dir.path().join("deep/nested/f.txt")).unwrap();
        assert_eq!(written, "héllo");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::write(dir.path().join("f.txt"), "old content that is long").unwrap();

        WriteFileTool
            .execute(&json!({"path": "f.txt", "content": "new"}), &ctx)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_to_directory_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        std::fs::create_dir(dir.path().join("d")).unwrap();

        let err = WriteFileTool
            .execute(&json!({"path": "d", "content": "x"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAFile(_)));
    }
}
