// Orchestration loop
//
// awaiting-model -> (tool calls?) -> executing-tools -> awaiting-model ...
// until the model answers with plain text (done) or the turn budget runs
// out (exhausted). Tool calls run one at a time, in the order requested.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::confirm::{Confirmer, Decision};
use super::conversation::Conversation;
use super::{AgentError, AgentSettings, LoopObserver, LoopPhase, NoopObserver, Session, TaskOutcome};
use crate::providers::types::ChatRequest;
use crate::providers::LlmProvider;
use crate::tools::permissions::{derive_always_rule, evaluate, PermissionLevel};
use crate::tools::registry::ToolRegistry;
use crate::tools::types::{ToolCall, ToolContext, ToolResult};

/// Result text for a call the human refused
pub const USER_DENIED_MESSAGE: &str = "Permission denied by user.";

pub struct AgentLoop {
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    confirmer: Arc<dyn Confirmer>,
    observer: Arc<dyn LoopObserver>,
    tool_context: ToolContext,
    settings: AgentSettings,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ToolRegistry,
        confirmer: Arc<dyn Confirmer>,
        tool_context: ToolContext,
    ) -> Self {
        Self {
            provider,
            registry,
            confirmer,
            observer: Arc::new(NoopObserver),
            tool_context,
            settings: AgentSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn provider(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.provider)
    }

    /// Drive `task` to completion or until the turn budget is spent.
    ///
    /// Only a model transport failure aborts the task; every tool-level
    /// failure is reported back to the model.
    #[instrument(skip_all, fields(max_turns = self.settings.max_turns))]
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        session: &mut Session,
        task: &str,
    ) -> Result<TaskOutcome, AgentError> {
        conversation.push_user(task);

        let mut turns = 0;
        while turns < self.settings.max_turns {
            self.enter(LoopPhase::AwaitingModel);

            let reply = self.provider.send(&self.build_request(conversation)).await?;
            turns += 1;
            session.usage.record(reply.usage);

            if !reply.has_tool_calls() {
                conversation.push_assistant(&reply);
                self.enter(LoopPhase::Done);
                info!(turns, "Task completed");
                return Ok(TaskOutcome::Completed {
                    answer: reply.text.unwrap_or_default(),
                    turns,
                });
            }

            if let Some(text) = reply.text.as_deref().filter(|t| !t.trim().is_empty()) {
                self.observer.on_assistant_text(text);
            }
            conversation.push_assistant(&reply);

            self.enter(LoopPhase::ExecutingTools);
            let mut results = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                let result = self.handle_call(call, session).await;
                results.push((call.id.clone(), result));
            }
            conversation.push_tool_results(results)?;
        }

        self.enter(LoopPhase::Exhausted);
        warn!(turns, "Turn budget exhausted before a final answer");
        Ok(TaskOutcome::Incomplete { turns })
    }

    fn build_request(&self, conversation: &Conversation) -> ChatRequest {
        let mut request = ChatRequest::new(conversation.messages().to_vec())
            .with_tools(self.registry.schemas())
            .with_model(self.settings.model.clone())
            .with_max_tokens(self.settings.max_tokens);
        if let Some(t) = self.settings.temperature {
            request = request.with_temperature(t);
        }
        request
    }

    fn enter(&self, phase: LoopPhase) {
        debug!(%phase, "Loop phase");
        self.observer.on_phase(phase);
    }

    /// Gate one call through the permission engine, then execute it
    #[instrument(skip(self, call, session), fields(tool = %call.name, id = %call.id))]
    async fn handle_call(&self, call: &ToolCall, session: &mut Session) -> ToolResult {
        if !self.registry.contains(&call.name) {
            let result = ToolResult::failure(format!("Unknown tool: {}", call.name));
            self.observer.on_tool_result(call, &result);
            return result;
        }

        let request = evaluate(&call.name, &call.arguments, session.mode, &session.rules);
        self.observer.on_tool_call(call, request.level);

        let approved = match request.level {
            PermissionLevel::Auto => true,
            PermissionLevel::Deny => false,
            PermissionLevel::Ask => {
                self.enter(LoopPhase::AwaitingPermission);
                let decision = self.confirmer.confirm(&request.prompt()).await;
                self.enter(LoopPhase::ExecutingTools);
                debug!(?decision, "Human decision");

                if decision == Decision::Always {
                    if let Some(rule) = derive_always_rule(&call.name, &call.arguments) {
                        info!(%rule, "Remembering session allow rule");
                        session.rules.remember_allow(rule);
                    }
                }
                decision != Decision::No
            }
        };

        let result = if approved {
            self.registry
                .execute(&call.name, &call.arguments, &self.tool_context)
                .await
        } else if request.level == PermissionLevel::Deny {
            let reason = request.reason.as_deref().unwrap_or("blocked by policy");
            ToolResult::failure(format!("Permission denied: {}", reason))
        } else {
            ToolResult::failure(USER_DENIED_MESSAGE)
        };

        self.observer.on_tool_result(call, &result);
        result
    }
}
