// Project-wide constants
//
// Centralised here so limits and defaults have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default DeepSeek API base URL (OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default maximum tokens for a completion.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Model round-trips allowed per task before the loop gives up.
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Shell command timeout when the model does not pass one.
pub const DEFAULT_BASH_TIMEOUT_SECS: u64 = 120;

/// Upper bound on any model-requested shell timeout.
pub const MAX_BASH_TIMEOUT_SECS: u64 = 600;

/// Shell output cap before truncation.
pub const DEFAULT_MAX_OUTPUT_CHARS: usize = 50_000;

/// Glob result cap.
pub const DEFAULT_GLOB_LIMIT: usize = 100;

/// Grep match cap.
pub const DEFAULT_GREP_LIMIT: usize = 50;

/// Grep truncates each matching line to this many characters.
pub const GREP_LINE_MAX_CHARS: usize = 200;

/// Message count at which a conversation is compacted.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 100;

/// Trailing messages kept verbatim when compacting.
pub const COMPACTION_KEEP_RECENT: usize = 10;

/// Transport retries for a single model request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff between retries.
pub const RETRY_BASE_DELAY_MS: u64 = 1000;

/// Request timeout for the model HTTP client.
pub const HTTP_TIMEOUT_SECS: u64 = 300;

/// Project instruction file read into the system prompt.
pub const PROJECT_CONTEXT_FILE: &str = "SEEKCODE.md";

/// Sentinel returned to the user when the turn budget is exhausted.
pub const INCOMPLETE_MESSAGE: &str = "Task incomplete - maximum turns reached.";

/// Directories never descended into by glob or grep.
pub const NOISE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".env",
    "dist",
    "build",
    ".next",
    ".cache",
    "target",
];

/// True when a path component names a noise directory
pub fn is_noise_dir(name: &str) -> bool {
    NOISE_DIRS.contains(&name)
}

/// Per-user directory under $HOME holding config and REPL history.
pub const CONFIG_DIR: &str = ".seekcode";

/// Config file name inside CONFIG_DIR.
pub const CONFIG_FILE: &str = "config.toml";

/// REPL history file name inside CONFIG_DIR.
pub const HISTORY_FILE: &str = "history";
