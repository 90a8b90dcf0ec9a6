// Conversation compactor
//
// When the conversation grows past its soft threshold, older messages are
// summarized by one tool-less model call and replaced with a single
// `[Previous conversation summary]` user message. The most recent messages
// are kept verbatim.
//
// Failure is non-fatal: if summarization fails the conversation is left as-is
// with a warning logged. Any tokens the summary request consumed are still
// counted in the session usage.

use std::sync::Arc;
use tracing::{info, warn};

use super::conversation::Conversation;
use super::UsageStats;
use crate::config::constants::COMPACTION_KEEP_RECENT;
use crate::providers::types::{ChatRequest, Message, ModelReply};
use crate::providers::{LlmProvider, ProviderError};

pub struct ConversationCompactor {
    provider: Arc<dyn LlmProvider>,
    keep_recent: usize,
}

impl ConversationCompactor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            keep_recent: COMPACTION_KEEP_RECENT,
        }
    }

    pub fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }

    /// Summarize older history in place. Returns true if anything changed.
    pub async fn compact(&self, conversation: &mut Conversation, usage: &mut UsageStats) -> bool {
        let Some(split) = conversation.compaction_split(self.keep_recent) else {
            return false;
        };

        let older = conversation.messages_before(split);
        let count = older.len();
        let summary = self.summarize(older).await.map(|reply| {
            usage.record(reply.usage);
            reply.text.unwrap_or_default().trim().to_string()
        });
        match summary {
            Ok(summary) if !summary.is_empty() => {
                conversation.apply_summary(split, &summary);
                info!(summarized = count, remaining = conversation.len(), "Conversation compacted");
                true
            }
            Ok(_) => {
                warn!("Summarization returned no text, keeping conversation as-is");
                false
            }
            Err(e) => {
                warn!("Conversation summarization failed, keeping conversation as-is: {}", e);
                false
            }
        }
    }

    async fn summarize(&self, messages: &[Message]) -> Result<ModelReply, ProviderError> {
        let prompt = format!(
            "Summarize the following conversation history concisely. Preserve key \
             decisions, files touched, commands run, errors fixed, and anything needed to \
             continue the task:\n\n{}",
            format_messages_for_summary(messages)
        );

        let request = ChatRequest::new(vec![Message::user(prompt)]);
        self.provider.send(&request).await
    }
}

/// Render messages as plain text for the summarization prompt
pub fn format_messages_for_summary(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| match msg {
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut parts: Vec<String> = content.iter().cloned().collect();
                parts.extend(
                    tool_calls
                        .iter()
                        .map(|c| format!("[Called tool: {} {}]", c.name, c.arguments)),
                );
                format!("assistant: {}", parts.join(" "))
            }
            Message::ToolResult {
                call_id, content, ..
            } => {
                let preview: String = content.chars().take(500).collect();
                format!("tool ({}): {}", call_id, preview)
            }
            other => format!("{}: {}", other.role(), other.text().unwrap_or_default()),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::Usage;
    use async_trait::async_trait;

    struct FixedProvider(Result<&'static str, ()>);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn send(&self, request: &ChatRequest) -> Result<ModelReply, ProviderError> {
            assert!(request.tools.is_empty(), "summary calls must not offer tools");
            match self.0 {
                Ok(text) => Ok(ModelReply {
                    usage: Some(Usage {
                        prompt_tokens: 120,
                        completion_tokens: 30,
                        total_tokens: 150,
                    }),
                    ..ModelReply::text(text)
                }),
                Err(()) => Err(ProviderError::Transport("down".into())),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn default_model(&self) -> &str {
            "fixed"
        }
    }

    fn long_conversation() -> Conversation {
        let mut conv = Conversation::with_system("sys");
        for i in 0..20 {
            conv.push_user(format!("message {}", i));
        }
        conv
    }

    #[tokio::test]
    async fn test_compact_replaces_older_messages() {
        let mut conv = long_conversation();
        let compactor =
            ConversationCompactor::new(Arc::new(FixedProvider(Ok("short summary")))).with_keep_recent(5);

        let mut usage = UsageStats::default();

        assert!(compactor.compact(&mut conv, &mut usage).await);
        assert_eq!(conv.len(), 7); // system + summary + 5 recent
        assert!(conv.messages()[1].text().unwrap().contains("short summary"));
        assert_eq!(conv.messages()[6].text(), Some("message 19"));
    }

    #[tokio::test]
    async fn test_compact_counts_summary_tokens() {
        let mut conv = long_conversation();
        let compactor = ConversationCompactor::new(Arc::new(FixedProvider(Ok("short summary"))));
        let mut usage = UsageStats::default();

        assert!(compactor.compact(&mut conv, &mut usage).await);
        assert_eq!(usage.requests, 1);
        assert_eq!(usage.prompt_tokens, 120);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens, 150);
    }

    #[tokio::test]
    async fn test_empty_summary_still_counts_tokens() {
        let mut conv = long_conversation();
        let compactor = ConversationCompactor::new(Arc::new(FixedProvider(Ok("   "))));
        let mut usage = UsageStats::default();

        assert!(!compactor.compact(&mut conv, &mut usage).await);
        assert_eq!(conv.len(), 21);
        assert_eq!(usage.requests, 1);
        assert_eq!(usage.total_tokens, 150);
    }

    #[tokio::test]
    async fn test_compact_failure_is_non_fatal() {
        let mut conv = long_conversation();
        let compactor = ConversationCompactor::new(Arc::new(FixedProvider(Err(()))));

        let mut usage = UsageStats::default();

        assert!(!compactor.compact(&mut conv, &mut usage).await);
        assert_eq!(conv.len(), 21);
        assert_eq!(usage.requests, 0);
    }

    #[test]
    fn test_format_messages_for_summary() {
        let text = format_messages_for_summary(&[
            Message::user("fix the bug"),
            Message::ToolResult {
                call_id: "c1".into(),
                content: "ok".into(),
                is_error: false,
            },
        ]);
        assert!(text.contains("user: fix the bug"));
        assert!(text.contains("tool (c1): ok"));
    }
}
