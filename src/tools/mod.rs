// Tool execution system
//
// Tools the model can call, the registry that dispatches them, and the
// permission engine that gates every call.

pub mod error;
pub mod implementations;
pub mod paths;
pub mod permissions;
pub mod registry;
pub mod rules;
pub mod types;

pub use error::ToolError;
pub use permissions::{
    check_shell_command, derive_always_rule, evaluate, format_permission_prompt,
    PermissionLevel, PermissionMode, PermissionRequest, ShellHazard,
};
pub use registry::{Tool, ToolRegistry};
pub use rules::{RuleKind, SessionRule, SessionRules};
pub use types::{Disposition, ToolCall, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
