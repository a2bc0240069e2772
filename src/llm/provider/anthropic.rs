//! Anthropic Provider
//!
//! Messages API with tool use. System prompts travel outside the message
//! list, and tool results go back as `tool_result` blocks in a user turn.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::{Config, DeepAgentError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block kinds this client does not use (e.g. thinking)
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl AnthropicProvider {
    /// Build from configuration; fails without an API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .anthropic
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                DeepAgentError::config(
                    "No LLM API key configured. Please set ANTHROPIC_API_KEY in your environment or .env file",
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.anthropic.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.anthropic.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.anthropic.max_tokens,
        })
    }

    /// Split out the system prompt and fold the rest into alternating turns
    fn to_wire_messages(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
        let mut system: Vec<&str> = Vec::new();
        let mut wire: Vec<WireMessage> = Vec::new();

        for msg in messages {
            let (role, blocks) = match msg {
                Message::System { content } => {
                    system.push(content);
                    continue;
                }
                Message::Human { content } => (
                    "user",
                    vec![ContentBlock::Text {
                        text: content.clone(),
                    }],
                ),
                Message::Ai {
                    content,
                    tool_calls,
                } => {
                    let mut blocks = Vec::with_capacity(tool_calls.len() + 1);
                    if !content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: content.clone(),
                        });
                    }
                    blocks.extend(tool_calls.iter().map(|tc| ContentBlock::ToolUse {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        input: tc.args_value(),
                    }));
                    ("assistant", blocks)
                }
                Message::Tool {
                    tool_call_id,
                    content,
                } => (
                    "user",
                    vec![ContentBlock::ToolResult {
                        tool_use_id: tool_call_id.clone(),
                        content: content.clone(),
                    }],
                ),
            };

            // Consecutive same-role messages share one turn
            match wire.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => wire.push(WireMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, wire)
    }

    fn to_llm_response(response: MessagesResponse) -> LLMResponse {
        let mut text = Vec::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                ContentBlock::Text { text: t } => text.push(t),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input))
                }
                ContentBlock::ToolResult { .. } | ContentBlock::Other => {}
            }
        }

        LLMResponse {
            content: text.join("\n"),
            tool_calls,
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
            model: response.model,
        }
    }

    async fn send_messages(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let (system, wire) = Self::to_wire_messages(messages);
        let request = MessagesRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            system,
            messages: wire,
            tools: tools
                .iter()
                .map(|t| WireTool {
                    name: &t.function.name,
                    description: &t.function.description,
                    input_schema: &t.function.parameters,
                })
                .collect(),
            temperature: options.temperature,
            stop_sequences: options.stop,
        };

        debug!(
            model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "anthropic messages request"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("model") {
                return Err(DeepAgentError::ModelNotFound(model.to_string()));
            }

            return Err(DeepAgentError::provider(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DeepAgentError::provider(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_llm_response(body))
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.send_messages(model, messages, &[], options).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.send_messages(model, messages, tools, options).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeepAgentError::provider("Failed to list models"));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
