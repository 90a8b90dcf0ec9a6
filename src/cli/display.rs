// Terminal rendering for the agent loop
//
//   ⏺ bash(cargo test)
//     ⎿ $ cargo test
//        running 12 tests

use crossterm::style::Stylize;
use serde_json::Value;
use std::path::Path;

use crate::agent::{LoopObserver, LoopPhase, TaskOutcome, UsageStats};
use crate::tools::permissions::PermissionLevel;
use crate::tools::types::{ToolCall, ToolResult};

const MAX_PARAM_LEN: usize = 60;
const MAX_RESULT_LINES: usize = 8;
const MAX_RESULT_CHARS: usize = 500;

/// Prints loop progress to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalObserver {
    verbose: bool,
}

impl TerminalObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl LoopObserver for TerminalObserver {
    fn on_phase(&self, phase: LoopPhase) {
        if self.verbose && phase == LoopPhase::AwaitingModel {
            println!("{}", "  thinking…".dark_grey());
        }
    }

    fn on_assistant_text(&self, text: &str) {
        println!("\n{}", text.trim());
    }

    fn on_tool_call(&self, call: &ToolCall, level: PermissionLevel) {
        let marker = match level {
            PermissionLevel::Deny => "⏺".red(),
            _ => "⏺".green(),
        };
        println!("\n{} {}", marker, format_tool_label(&call.name, &call.arguments));
    }

    fn on_tool_result(&self, _call: &ToolCall, result: &ToolResult) {
        let body = summarize_result(&result.to_string());
        let mut lines = body.lines();
        let first = lines.next().unwrap_or_default();
        let styled = |line: &str| {
            if result.success {
                line.dark_grey().to_string()
            } else {
                line.red().to_string()
            }
        };
        println!("  ⎿ {}", styled(first));
        for line in lines {
            println!("     {}", styled(line));
        }
    }
}

/// Label like `bash(git status)` or `read_file(src/main.rs)`
pub fn format_tool_label(name: &str, input: &Value) -> String {
    let key_param = extract_key_param(name, input);
    if key_param.is_empty() {
        name.cyan().bold().to_string()
    } else {
        format!(
            "{}({})",
            name.cyan().bold(),
            truncate(&key_param, MAX_PARAM_LEN).dark_grey()
        )
    }
}

/// Most meaningful argument to show next to the tool name
fn extract_key_param(tool_name: &str, input: &Value) -> String {
    let str_arg = |key: &str| input.get(key).and_then(Value::as_str).unwrap_or("");
    match tool_name {
        "bash" => str_arg("command").trim().to_string(),
        "read_file" | "write_file" | "edit_file" => shorten_path(str_arg("path")),
        "glob" => match str_arg("path") {
            "" => str_arg("pattern").to_string(),
            dir => format!("{} in {}", str_arg("pattern"), shorten_path(dir)),
        },
        "grep" => {
            let path = match str_arg("path") {
                "" => ".",
                p => p,
            };
            format!("{} in {}", truncate(str_arg("pattern"), 30), shorten_path(path))
        }
        _ => input
            .as_object()
            .and_then(|obj| obj.values().filter_map(Value::as_str).find(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string(),
    }
}

/// Keep the last three components of long paths
pub fn shorten_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if parts.len() <= 3 || !Path::new(path).is_absolute() {
        return path.to_string();
    }
    format!("…/{}", parts[parts.len() - 3..].join("/"))
}

/// First few lines of a tool result, capped for the terminal
fn summarize_result(text: &str) -> String {
    let total = text.lines().count();
    let mut shown: String = text
        .lines()
        .take(MAX_RESULT_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if shown.chars().count() > MAX_RESULT_CHARS {
        shown = truncate(&shown, MAX_RESULT_CHARS);
    }
    if total > MAX_RESULT_LINES {
        shown.push_str(&format!("\n… +{} lines", total - MAX_RESULT_LINES));
    }
    shown
}

/// Truncate to `max_chars` characters, adding "…" if needed
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

pub fn print_welcome(version: &str, root: &Path, context_loaded: bool, mode_banner: Option<&str>) {
    println!("{} v{}", "SeekCode".bold().cyan(), version);
    println!("{}", format!("Working in {}", root.display()).dark_grey());
    if context_loaded {
        println!("{}", "Loaded SEEKCODE.md ✓".green());
    }
    if let Some(banner) = mode_banner {
        println!("{}", banner.red().bold());
    }
    println!("{}", "Type 'help' for commands, 'quit' to exit.".dark_grey());
}

pub fn print_outcome(outcome: &TaskOutcome) {
    match outcome {
        TaskOutcome::Completed { answer, .. } if !answer.trim().is_empty() => {
            println!("\n{}", answer.trim());
        }
        TaskOutcome::Completed { .. } => {}
        TaskOutcome::Incomplete { .. } => {
            println!("\n{}", outcome.message().yellow());
        }
    }
}

pub fn print_usage(usage: &UsageStats) {
    println!(
        "{}",
        format!(
            "Tokens: {} prompt + {} completion = {} total ({} requests)",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, usage.requests
        )
        .dark_grey()
    );
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{}", message.dark_grey());
}
