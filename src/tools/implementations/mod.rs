// Tool implementations
//
// The six built-in tools the model can call

// Read-only tools
pub mod glob;
pub mod grep;
pub mod read;

// Filesystem mutation
pub mod edit;
pub mod write;

// Command execution
pub mod bash;

mod args;

pub use bash::BashTool;
pub use edit::EditFileTool;
pub use glob::GlobTool;
pub use grep::GrepTool;
pub use read::ReadFileTool;
pub use write::WriteFileTool;
