// REPL command handling
//
// Plain words (`quit`, `clear`, `help`) and slash toggles (`/yolo`,
// `/trust`, `/status`, `/compact`). Anything else is a task for the agent.

use crate::agent::Session;
use crate::tools::permissions::PermissionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Clear,
    Help,
    Yolo,
    Trust,
    Status,
    Compact,
}

impl ReplCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "quit" | "exit" | "q" | "/quit" | "/exit" => Some(Self::Quit),
            "clear" | "/clear" => Some(Self::Clear),
            "help" | "/help" => Some(Self::Help),
            "/yolo" | "yolo" => Some(Self::Yolo),
            "/trust" | "trust" => Some(Self::Trust),
            "/status" | "status" => Some(Self::Status),
            "/compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// `/yolo`: flip between bypass-all and normal
pub fn toggle_yolo(mode: PermissionMode) -> PermissionMode {
    match mode {
        PermissionMode::BypassAll => PermissionMode::Normal,
        _ => PermissionMode::BypassAll,
    }
}

/// `/trust`: flip between trust and normal
pub fn toggle_trust(mode: PermissionMode) -> PermissionMode {
    match mode {
        PermissionMode::Trust => PermissionMode::Normal,
        _ => PermissionMode::Trust,
    }
}

/// One-line notice after a mode change
pub fn mode_notice(mode: PermissionMode) -> &'static str {
    match mode {
        PermissionMode::BypassAll => {
            "⚠️  YOLO MODE ENABLED: all permission prompts will be skipped (blocked commands stay blocked)"
        }
        PermissionMode::Trust => "Trust mode enabled: file edits and shell commands run without asking.",
        PermissionMode::Normal => "Permission prompts are active.",
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "off"
    }
}

pub fn format_help(mode: PermissionMode) -> String {
    format!(
        "Commands:
  quit, exit, q  - Exit the program
  clear          - Clear conversation history (session rules are kept)
  help           - Show this help message

Mode commands:
  /yolo          - Toggle YOLO mode (currently {})
  /trust         - Toggle trust mode (currently {})
  /status        - Show current mode, rules and token usage
  /compact       - Summarize older conversation history now

Tips:
  - Answer 'a' (always) at a permission prompt to allow similar calls for the session
  - Create a SEEKCODE.md in your project root for project-specific context",
        on_off(mode == PermissionMode::BypassAll),
        on_off(mode == PermissionMode::Trust),
    )
}

pub fn format_status(session: &Session, model: &str, messages: usize) -> String {
    let mut out = format!(
        "Current status:
  Mode:       {}
  Model:      {}
  Messages:   {}
  Requests:   {}
  Tokens:     {} prompt + {} completion = {} total",
        session.mode,
        model,
        messages,
        session.usage.requests,
        session.usage.prompt_tokens,
        session.usage.completion_tokens,
        session.usage.total_tokens,
    );

    if session.rules.is_empty() {
        out.push_str("\n  Rules:      none");
    } else {
        for rule in session.rules.allow_rules() {
            out.push_str(&format!("\n  allow       {}", rule));
        }
        for rule in session.rules.deny_rules() {
            out.push_str(&format!("\n  deny        {}", rule));
        }
    }
    out
}
