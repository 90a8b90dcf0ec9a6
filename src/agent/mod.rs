// Agent orchestration
//
// The loop that drives one task across model round-trips, plus the
// session-scoped state it threads through every call.

pub mod compactor;
pub mod confirm;
pub mod conversation;
pub mod loop_runner;

pub use compactor::ConversationCompactor;
pub use confirm::{
    AutoDeny, ChannelConfirmer, ConfirmationRequest, Confirmer, Decision, ScriptedConfirmer,
};
pub use conversation::{Conversation, ConversationError};
pub use loop_runner::AgentLoop;

use std::fmt;
use thiserror::Error;

use crate::config::constants::{DEFAULT_MAX_TOKENS, DEFAULT_MAX_TURNS, INCOMPLETE_MESSAGE};
use crate::providers::types::Usage;
use crate::providers::ProviderError;
use crate::tools::permissions::{PermissionLevel, PermissionMode};
use crate::tools::rules::SessionRules;
use crate::tools::types::{ToolCall, ToolResult};

/// Errors that end a task early
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model could not be reached; no progress is possible
    #[error("model request failed: {0}")]
    Transport(#[from] ProviderError),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The model produced a final answer
    Completed { answer: String, turns: usize },

    /// The turn budget ran out first
    Incomplete { turns: usize },
}

impl TaskOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }

    pub fn turns(&self) -> usize {
        match self {
            TaskOutcome::Completed { turns, .. } | TaskOutcome::Incomplete { turns } => *turns,
        }
    }

    /// Text shown to the user
    pub fn message(&self) -> &str {
        match self {
            TaskOutcome::Completed { answer, .. } => answer,
            TaskOutcome::Incomplete { .. } => INCOMPLETE_MESSAGE,
        }
    }
}

/// Orchestration loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    AwaitingModel,
    AwaitingPermission,
    ExecutingTools,
    Done,
    Exhausted,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopPhase::AwaitingModel => "awaiting-model",
            LoopPhase::AwaitingPermission => "awaiting-permission",
            LoopPhase::ExecutingTools => "executing-tools",
            LoopPhase::Done => "done",
            LoopPhase::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Cumulative token accounting for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl UsageStats {
    pub fn record(&mut self, usage: Option<Usage>) {
        self.requests += 1;
        if let Some(u) = usage {
            self.prompt_tokens += u.prompt_tokens;
            self.completion_tokens += u.completion_tokens;
            self.total_tokens += if u.total_tokens > 0 {
                u.total_tokens
            } else {
                u.prompt_tokens + u.completion_tokens
            };
        }
    }
}

/// State that lives for one interactive session and survives `clear`
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub rules: SessionRules,
    pub usage: UsageStats,
    pub mode: PermissionMode,
}

impl Session {
    pub fn new(mode: PermissionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }
}

/// Knobs for one orchestration loop
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_turns: usize,
    /// Empty means the provider's default model
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            model: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }
}

/// Receives progress events from the loop, for display
pub trait LoopObserver: Send + Sync {
    fn on_phase(&self, _phase: LoopPhase) {}

    /// Text the model sent alongside tool calls
    fn on_assistant_text(&self, _text: &str) {}

    fn on_tool_call(&self, _call: &ToolCall, _level: PermissionLevel) {}

    fn on_tool_result(&self, _call: &ToolCall, _result: &ToolResult) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LoopObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_stats_accumulate() {
        let mut stats = UsageStats::default();
        stats.record(Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }));
        stats.record(Some(Usage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 0,
        }));
        stats.record(None);

        assert_eq!(stats.requests, 3);
        assert_eq!(stats.prompt_tokens, 11);
        assert_eq!(stats.completion_tokens, 7);
        assert_eq!(stats.total_tokens, 18);
    }

    #[test]
    fn test_outcome_message() {
        let done = TaskOutcome::Completed {
            answer: "ok".into(),
            turns: 2,
        };
        assert_eq!(done.message(), "ok");
        assert!(done.is_complete());

        let incomplete = TaskOutcome::Incomplete { turns: 50 };
        assert_eq!(incomplete.message(), "Task incomplete - maximum turns reached.");
        assert_eq!(incomplete.turns(), 50);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(LoopPhase::AwaitingPermission.to_string(), "awaiting-permission");
    }
}
