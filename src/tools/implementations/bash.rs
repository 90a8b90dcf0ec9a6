// Bash tool - executes shell commands with a hard timeout
//
// Commands run through `bash -c` in the working directory with stdout and
// stderr captured. The same safety classifier the permission engine uses is
// applied again here, so a hazardous command is refused before it spawns.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::args::{optional_usize, required_str};
use crate::config::constants::MAX_BASH_TIMEOUT_SECS;
use crate::tools::error::ToolError;
use crate::tools::permissions::check_shell_command;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema};

pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command in the shell. Use for running scripts, git commands, \
         package managers, build tools, etc."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object()
            .required("command", "string", "The bash command to execute")
            .optional("timeout", "integer", "Timeout in seconds (default: 120)")
    }

    async fn execute(&self, input: &Value, context: &ToolContext) -> Result<String, ToolError> {
        let command = required_str(input, "command")?;
        if command.trim().is_empty() {
            return Err(ToolError::Validation("command must not be empty".to_string()));
        }

        if let Some(hazard) = check_shell_command(command) {
            warn!(command, %hazard, "Refusing hazardous command");
            return Err(ToolError::PermissionDenied(format!(
                "This command is blocked for safety reasons ({})",
                hazard
            )));
        }

        let timeout = match optional_usize(input, "timeout")? {
            Some(secs) if secs > 0 => {
                Duration::from_secs((secs as u64).min(MAX_BASH_TIMEOUT_SECS))
            }
            _ => context.bash_timeout,
        };

        debug!(command, timeout_secs = timeout.as_secs(), "Running shell command");

        let mut builder = Command::new("bash");
        builder
            .arg("-c")
            .arg(command)
            .current_dir(&context.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let header = format!("$ {}", command);

        let output = match tokio::time::timeout(timeout, builder.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::Resource(format!(
                    "Failed to spawn command: {}",
                    e
                )))
            }
            Err(_) => {
                // Dropping the output future kills the child
                warn!(command, "Shell command timed out");
                return Err(ToolError::Timeout {
                    secs: timeout.as_secs(),
                    output: header,
                });
            }
        };

        let mut parts = Vec::new();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.is_empty() {
            parts.push(stdout.into_owned());
        }
        if !stderr.is_empty() {
            parts.push(stderr.into_owned());
        }
        let combined = parts.join("\n");
        let combined = truncate_output(combined.trim(), context.max_output_chars);

        match output.status.code() {
            Some(0) => {
                if combined.is_empty() {
                    Ok(format!("{}\n(no output)", header))
                } else {
                    Ok(format!("{}\n{}", header, combined))
                }
            }
            code => Err(ToolError::CommandFailed {
                // None means the process was killed by a signal
                code: code.unwrap_or(-1),
                output: format!("{}\n{}", header, combined),
            }),
        }
    }
}

/// Cap output at `max` characters, appending a truncation notice
fn truncate_output(output: &str, max: usize) -> String {
    let total = output.chars().count();
    if total <= max {
        return output.to_string();
    }
    let cut = output
        .char_indices()
        .nth(max)
        .map_or(output.len(), |(idx, _)| idx);
    format!(
        "{}\n... (output truncated, {} total chars)",
        &output[..cut],
        total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn run(input: Value) -> Result<String, ToolError> {
        let dir = TempDir::new().unwrap();
        BashTool.execute(&input, &ToolContext::new(dir.path())).await
    }

    #[tokio::test]
    async fn test_echo() {
        let out = run(json!({"command": "echo hello"})).await.unwrap();
        assert_eq!(out, "$ echo hello\nhello");
    }

    #[tokio::test]
    async fn test_no_output() {
        let out = run(json!({"command": "true"})).await.unwrap();
        assert_eq!(out, "$ true\n(no output)");
    }

    #[tokio::test]
    async fn test_stderr_captured() {
        let out = run(json!({"command": "echo oops 1>&2"})).await.unwrap();
        assert!(out.contains("oops"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let out = BashTool
            .execute(&json!({"command": "ls"}), &ToolContext::new(dir.path()))
            .await
            .unwrap();
        assert!(out.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let err = run(json!({"command": "echo partial; exit 3"})).await.unwrap_err();
        match err {
            ToolError::CommandFailed { code, output } => {
                assert_eq!(code, 3);
                assert!(output.contains("partial"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let err = run(json!({"command": "sleep 5", "timeout": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { secs: 1, .. }));
        assert_eq!(err.to_string(), "Command timed out after 1 seconds");
    }

    #[tokio::test]
    async fn test_blocked_command_never_runs() {
        let err = run(json!({"command": "rm -rf /"})).await.unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_long_form_recursive_delete_refused() {
        let err = run(json!({"command": "rm --recursive --force /"})).await.unwrap_err();
        match err {
            ToolError::PermissionDenied(msg) => assert!(msg.contains("recursive delete")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_truncated_with_notice() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path()).with_max_output_chars(10);
        let out = BashTool
            .execute(&json!({"command": "printf 'abcdefghijklmnopqrstuvwxyz'"}), &ctx)
            .await
            .unwrap();
        assert!(out.contains("abcdefghij\n... (output truncated, 26 total chars)"));
        assert!(!out.contains("klm"));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let s = "ééééé";
        assert_eq!(truncate_output(s, 2), "éé\n... (output truncated, 5 total chars)");
        assert_eq!(truncate_output(s, 10), s);
    }
}
