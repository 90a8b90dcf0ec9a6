// Core types for the tool execution system
//
// Wire-compatible with OpenAI-style function calling: a ToolDefinition is
// advertised to the model, a ToolCall comes back, a ToolResult is folded
// into the conversation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::constants::{
    DEFAULT_BASH_TIMEOUT_SECS, DEFAULT_GLOB_LIMIT, DEFAULT_GREP_LIMIT, DEFAULT_MAX_OUTPUT_CHARS,
};

/// Context passed to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Base for resolving relative paths
    pub working_dir: PathBuf,

    /// Default wall-clock bound for shell commands
    pub bash_timeout: Duration,

    /// Shell output cap (characters)
    pub max_output_chars: usize,

    /// Default result cap for glob
    pub glob_limit: usize,

    /// Default match cap for grep
    pub grep_limit: usize,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            bash_timeout: Duration::from_secs(DEFAULT_BASH_TIMEOUT_SECS),
            max_output_chars: DEFAULT_MAX_OUTPUT_CHARS,
            glob_limit: DEFAULT_GLOB_LIMIT,
            grep_limit: DEFAULT_GREP_LIMIT,
        }
    }

    pub fn with_bash_timeout(mut self, timeout: Duration) -> Self {
        self.bash_timeout = timeout;
        self
    }

    pub fn with_max_output_chars(mut self, max: usize) -> Self {
        self.max_output_chars = max;
        self
    }
}

/// Default permission disposition a tool declares for itself.
///
/// `Auto` for read-only tools, `Ask` for anything that mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Auto,
    Ask,
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Always "object"
    pub properties: Value,
    pub required: Vec<String>,
}

impl ToolInputSchema {
    /// Start an empty object schema
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Value::Object(Map::new()),
            required: Vec::new(),
        }
    }

    /// Add a required parameter
    pub fn required(self, name: &str, param_type: &str, description: &str) -> Self {
        self.param(name, param_type, description, true)
    }

    /// Add an optional parameter
    pub fn optional(self, name: &str, param_type: &str, description: &str) -> Self {
        self.param(name, param_type, description, false)
    }

    fn param(mut self, name: &str, param_type: &str, description: &str, required: bool) -> Self {
        if let Value::Object(ref mut properties) = self.properties {
            properties.insert(
                name.to_string(),
                serde_json::json!({
                    "type": param_type,
                    "description": description
                }),
            );
        }
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Names of required parameters missing from `input`
    pub fn missing_required(&self, input: &Value) -> Vec<&str> {
        self.required
            .iter()
            .filter(|name| input.get(name.as_str()).map_or(true, Value::is_null))
            .map(String::as_str)
            .collect()
    }
}

/// A model-requested invocation of a named tool. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    /// Generate a unique call id
    pub fn generate_id() -> String {
        use rand::Rng;
        let random: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        format!("call_{}", random)
    }

    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Self::generate_id(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of executing a ToolCall. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Failed result that still carries captured output (e.g. non-zero exit)
    pub fn failure_with_output(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            error: Some(error.into()),
        }
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return f.write_str(&self.output);
        }
        let error = self.error.as_deref().unwrap_or("tool failed");
        if self.output.is_empty() {
            write!(f, "Error: {}", error)
        } else {
            write!(f, "{}\nError: {}", self.output, error)
        }
    }
}
