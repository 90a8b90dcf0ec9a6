// Tool error taxonomy
//
// Every failure a tool can hit maps to one of these variants. None of them is
// fatal to the orchestration loop: each becomes a failed ToolResult that the
// model gets to see.

use thiserror::Error;

use super::types::ToolResult;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Bad or missing argument, caught before any side effect
    #[error("{0}")]
    Validation(String),

    /// Blocked by policy or by the human
    #[error("{0}")]
    PermissionDenied(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Ambiguous or missing edit target, OS permission errors, bad regex
    #[error("{0}")]
    Resource(String),

    #[error("Command timed out after {secs} seconds")]
    Timeout { secs: u64, output: String },

    #[error("Command exited with code {code}")]
    CommandFailed { code: i32, output: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Wrap an I/O error, surfacing OS permission failures distinctly
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        let context = context.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ToolError::Resource(format!("Permission denied: {}", context))
            }
            std::io::ErrorKind::NotFound => ToolError::NotFound(context),
            _ => ToolError::Io { context, source },
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        let message = err.to_string();
        match err {
            ToolError::CommandFailed { output, .. } | ToolError::Timeout { output, .. } => {
                ToolResult::failure_with_output(output, message)
            }
            _ => ToolResult::failure(message),
        }
    }
}
