// OpenAI-compatible chat completions provider
//
// DeepSeek speaks the OpenAI wire format, so one provider covers it and any
// other compatible endpoint (base URL is configurable).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::error::ProviderError;
use super::retry::{with_retry, RetryPolicy};
use super::types::{ChatRequest, Message, ModelReply, Usage};
use super::LlmProvider;
use crate::config::constants::HTTP_TIMEOUT_SECS;
use crate::tools::types::ToolCall;

/// Chat completions client for OpenAI-compatible APIs
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    retry: RetryPolicy,
}

impl OpenAiCompatProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert a ChatRequest to the OpenAI wire format
    fn to_openai_request(&self, request: &ChatRequest) -> OpenAIRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let messages = request
            .messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => OpenAIMessage::Regular {
                    role: "system".to_string(),
                    content: content.clone(),
                },
                Message::User { content } => OpenAIMessage::Regular {
                    role: "user".to_string(),
                    content: content.clone(),
                },
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let tool_calls: Vec<OpenAIRequestToolCall> = tool_calls
                        .iter()
                        .map(|call| OpenAIRequestToolCall {
                            id: call.id.clone(),
                            tool_type: "function".to_string(),
                            function: OpenAIRequestFunction {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        })
                        .collect();
                    OpenAIMessage::Assistant {
                        role: "assistant".to_string(),
                        content: content.clone().filter(|c| !c.is_empty()),
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                    }
                }
                Message::ToolResult {
                    call_id, content, ..
                } => OpenAIMessage::Tool {
                    role: "tool".to_string(),
                    content: if content.trim().is_empty() {
                        "(no output)".to_string()
                    } else {
                        content.clone()
                    },
                    tool_call_id: call_id.clone(),
                },
            })
            .collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|tool| OpenAITool {
                        tool_type: "function".to_string(),
                        function: OpenAIFunction {
                            name: tool.name.clone(),
                            description: tool.description.clone(),
                            parameters: serde_json::to_value(&tool.input_schema)
                                .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
                        },
                    })
                    .collect(),
            )
        };

        OpenAIRequest {
            model,
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            tools,
        }
    }

    /// Convert an OpenAI response to a ModelReply
    fn from_openai_response(response: OpenAIResponse) -> Result<ModelReply, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("response contained no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter(|call| call.tool_type.as_deref().unwrap_or("function") == "function")
            .map(|call| {
                let arguments = parse_arguments(&call.function.arguments);
                ToolCall {
                    id: call.id.unwrap_or_else(ToolCall::generate_id),
                    name: call.function.name,
                    arguments,
                }
            })
            .collect();

        Ok(ModelReply {
            text: choice.message.content.filter(|t| !t.is_empty()),
            tool_calls,
            usage: response.usage,
            finish_reason: choice.finish_reason,
        })
    }

    async fn send_once(&self, body: &OpenAIRequest) -> Result<ModelReply, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: OpenAIResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Self::from_openai_response(parsed)
    }
}

/// Tool-call arguments arrive as a JSON string; keep malformed text visible
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        _ => serde_json::json!({ "raw": raw }),
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn send(&self, request: &ChatRequest) -> Result<ModelReply, ProviderError> {
        let body = self.to_openai_request(request);
        debug!(model = %body.model, tools = body.tools.as_ref().map_or(0, Vec::len), "Sending chat request");

        let reply = with_retry(self.retry, || self.send_once(&body)).await?;

        debug!(
            tool_calls = reply.tool_calls.len(),
            has_text = reply.text.is_some(),
            "Received model reply"
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

/// Request-side message; untagged, most specific variant first
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum OpenAIMessage {
    Tool {
        role: String, // "tool"
        content: String,
        tool_call_id: String,
    },
    Assistant {
        role: String, // "assistant"
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<OpenAIRequestToolCall>>,
    },
    Regular {
        role: String,
        content: String,
    },
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequestToolCall {
    id: String,
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIRequestFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequestFunction {
    name: String,
    arguments: String, // JSON-encoded string
}

#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIToolCall {
    id: Option<String>,
    #[serde(rename = "type")]
    tool_type: Option<String>,
    function: OpenAIToolFunction,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIToolFunction {
    name: String,
    #[serde(default)]
    arguments: String, // JSON string
}
