// Conversation state for one interactive session
//
// Append-only during a turn. Tool results are only accepted when they answer
// the most recent assistant tool calls, in the same order.

use thiserror::Error;

use crate::config::constants::DEFAULT_COMPACTION_THRESHOLD;
use crate::providers::types::{Message, ModelReply};
use crate::tools::types::ToolResult;

/// Prefix of the user message that replaces summarized history
pub const SUMMARY_PREFIX: &str = "[Previous conversation summary]";

#[derive(Debug, Error, PartialEq)]
pub enum ConversationError {
    #[error("tool results {got:?} do not match pending tool calls {expected:?}")]
    UnmatchedToolResults {
        expected: Vec<String>,
        got: Vec<String>,
    },
}

/// Ordered role-tagged message history plus a soft compaction threshold
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    compaction_threshold: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }

    /// Start with a system prompt
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(Message::system(system_prompt));
        conversation
    }

    pub fn with_compaction_threshold(mut self, threshold: usize) -> Self {
        self.compaction_threshold = threshold;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        match self.messages.first() {
            Some(Message::System { content }) => Some(content),
            _ => None,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Record the model's raw reply, tool-call list included
    pub fn push_assistant(&mut self, reply: &ModelReply) {
        self.messages.push(Message::Assistant {
            content: reply.text.clone(),
            tool_calls: reply.tool_calls.clone(),
        });
    }

    /// Ids of the tool calls from the last assistant message that have no
    /// results yet
    pub fn pending_call_ids(&self) -> Vec<String> {
        match self.messages.last() {
            Some(Message::Assistant { tool_calls, .. }) => {
                tool_calls.iter().map(|c| c.id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Append results for every pending tool call, in request order
    pub fn push_tool_results(
        &mut self,
        results: Vec<(String, ToolResult)>,
    ) -> Result<(), ConversationError> {
        let expected = self.pending_call_ids();
        let got: Vec<String> = results.iter().map(|(id, _)| id.clone()).collect();
        if expected.is_empty() || expected != got {
            return Err(ConversationError::UnmatchedToolResults { expected, got });
        }

        self.messages
            .extend(results.into_iter().map(|(call_id, result)| Message::ToolResult {
                call_id,
                is_error: !result.success,
                content: result.to_string(),
            }));
        Ok(())
    }

    /// Drop a trailing assistant message whose tool calls never got results,
    /// e.g. after the user interrupted the task. Returns true if one was dropped.
    pub fn discard_unanswered(&mut self) -> bool {
        if self.pending_call_ids().is_empty() {
            return false;
        }
        self.messages.pop();
        true
    }

    pub fn needs_compaction(&self) -> bool {
        self.messages.len() > self.compaction_threshold
    }

    /// Drop history but keep the system prompt
    pub fn clear(&mut self) {
        self.messages.retain(|m| matches!(m, Message::System { .. }));
    }

    fn history_start(&self) -> usize {
        usize::from(matches!(self.messages.first(), Some(Message::System { .. })))
    }

    /// Index splitting history into (summarize, keep) so that at least
    /// `keep_recent` messages are kept and no tool result is separated from
    /// the assistant message that requested it
    pub fn compaction_split(&self, keep_recent: usize) -> Option<usize> {
        let start = self.history_start();
        if self.messages.len().saturating_sub(start) <= keep_recent {
            return None;
        }

        let mut split = self.messages.len() - keep_recent;
        while split > start && matches!(self.messages[split], Message::ToolResult { .. }) {
            split -= 1;
        }

        (split > start).then_some(split)
    }

    /// Messages that would be summarized for a given split
    pub fn messages_before(&self, split: usize) -> &[Message] {
        &self.messages[self.history_start()..split.min(self.messages.len())]
    }

    /// Replace everything between the system prompt and `split` with a
    /// summary message
    pub fn apply_summary(&mut self, split: usize, summary: &str) {
        let start = self.history_start();
        let split = split.clamp(start, self.messages.len());
        self.messages.splice(
            start..split,
            std::iter::once(Message::user(format!("{}\n{}", SUMMARY_PREFIX, summary))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::ToolCall;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "bash".to_string(),
            arguments: json!({"command": "ls"}),
        }
    }

    #[test]
    fn test_tool_results_must_match_pending_calls() {
        let mut conv = Conversation::with_system("sys");
        conv.push_user("task");
        conv.push_assistant(&ModelReply::tool_calls(vec![call("a"), call("b")]));

        let wrong_order = vec![
            ("b".to_string(), ToolResult::ok("x")),
            ("a".to_string(), ToolResult::ok("y")),
        ];
        assert!(conv.push_tool_results(wrong_order).is_err());

        let right = vec![
            ("a".to_string(), ToolResult::ok("x")),
            ("b".to_string(), ToolResult::failure("nope")),
        ];
        conv.push_tool_results(right).unwrap();
        assert_eq!(conv.len(), 5);
        assert!(matches!(
            conv.messages()[4],
            Message::ToolResult { is_error: true, .. }
        ));
    }

    #[test]
    fn test_tool_results_without_assistant_rejected() {
        let mut conv = Conversation::new();
        conv.push_user("hi");
        let err = conv
            .push_tool_results(vec![("a".to_string(), ToolResult::ok(""))])
            .unwrap_err();
        assert!(matches!(err, ConversationError::UnmatchedToolResults { .. }));
    }

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut conv = Conversation::with_system("sys");
        conv.push_user("a");
        conv.push_assistant(&ModelReply::text("b"));
        conv.clear();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.system_prompt(), Some("sys"));
    }

    #[test]
    fn test_needs_compaction_threshold() {
        let mut conv = Conversation::new().with_compaction_threshold(3);
        for i in 0..3 {
            conv.push_user(format!("m{}", i));
        }
        assert!(!conv.needs_compaction());
        conv.push_user("m3");
        assert!(conv.needs_compaction());
    }

    #[test]
    fn test_compaction_split_never_orphans_tool_results() {
        let mut conv = Conversation::with_system("sys");
        conv.push_user("task");
        conv.push_assistant(&ModelReply::tool_calls(vec![call("a"), call("b")]));
        conv.push_tool_results(vec![
            ("a".to_string(), ToolResult::ok("1")),
            ("b".to_string(), ToolResult::ok("2")),
        ])
        .unwrap();
        conv.push_assistant(&ModelReply::text("done"));
        // [sys, user, assistant(calls), result a, result b, assistant]

        // Keeping 2 would start at result b, so the split moves back to the assistant
        let split = conv.compaction_split(2).unwrap();
        assert_eq!(split, 2);
        assert!(matches!(conv.messages()[split], Message::Assistant { .. }));
    }

    #[test]
    fn test_compaction_split_none_when_short() {
        let mut conv = Conversation::with_system("sys");
        conv.push_user("a");
        assert_eq!(conv.compaction_split(10), None);
    }

    #[test]
    fn test_apply_summary() {
        let mut conv = Conversation::with_system("sys");
        for i in 0..6 {
            conv.push_user(format!("m{}", i));
        }
        let split = conv.compaction_split(2).unwrap();
        assert_eq!(conv.messages_before(split).len(), 4);

        conv.apply_summary(split, "earlier stuff");
        assert_eq!(conv.len(), 4);
        assert_eq!(conv.system_prompt(), Some("sys"));
        assert!(conv.messages()[1]
            .text()
            .unwrap()
            .starts_with(SUMMARY_PREFIX));
        assert_eq!(conv.messages()[3].text(), Some("m5"));
    }

    #[test]
    fn test_discard_unanswered_calls() {
        let mut conv = Conversation::new();
        conv.push_user("go");
        conv.push_assistant(&ModelReply::tool_calls(vec![ToolCall::new(
            "bash",
            serde_json::json!({"command": "ls"}),
        )]));
        assert!(conv.discard_unanswered());
        assert_eq!(conv.len(), 1);
        assert!(!conv.discard_unanswered());
    }
}
