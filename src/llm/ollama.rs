//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API with tool calling support.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Config, DeepAgentError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    /// Name of the tool a `tool` message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

/// Ollama function in tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.ollama_url(),
        })
    }

    /// Create a client with custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert a conversation to Ollama's message list.
    ///
    /// Ollama has no call ids, so tool results are labelled with the name of
    /// the tool whose call they answer.
    fn to_ollama_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        let call_names: HashMap<&str, &str> = messages
            .iter()
            .flat_map(|m| m.tool_calls())
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => OllamaMessage {
                    role: "system".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: None,
                },
                Message::Human { content } => OllamaMessage {
                    role: "user".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: None,
                },
                Message::Ai {
                    content,
                    tool_calls,
                } => OllamaMessage {
                    role: "assistant".to_string(),
                    content: content.clone(),
                    tool_calls: (!tool_calls.is_empty()).then(|| {
                        tool_calls
                            .iter()
                            .map(|tc| OllamaToolCall {
                                function: OllamaFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.args_value(),
                                },
                            })
                            .collect()
                    }),
                    tool_name: None,
                },
                Message::Tool {
                    tool_call_id,
                    content,
                } => OllamaMessage {
                    role: "tool".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: call_names
                        .get(tool_call_id.as_str())
                        .map(|name| name.to_string()),
                },
            })
            .collect()
    }

    /// Convert Ollama response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> LLMResponse {
        let tool_calls = response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(ToolCall::generate_id(), tc.function.name, tc.function.arguments))
            .collect();

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
            _ => None,
        };

        LLMResponse {
            content: response.message.content,
            tool_calls,
            usage,
            model: response.model,
        }
    }

    fn connect_error(&self, e: reqwest::Error) -> DeepAgentError {
        if e.is_connect() {
            DeepAgentError::provider(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            DeepAgentError::from(e)
        }
    }

    async fn send_chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = ChatRequest {
            model,
            messages: Self::to_ollama_messages(messages),
            tools,
            options: options.map(|opts| OllamaOptions {
                temperature: opts.temperature,
                num_predict: opts.max_tokens,
                stop: opts.stop,
            }),
            stream: false,
        };

        debug!(
            model,
            messages = request.messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(DeepAgentError::ModelNotFound(model.to_string()));
            }

            return Err(DeepAgentError::provider(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        debug!(bytes = response_text.len(), "ollama chat response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| DeepAgentError::provider(format!("Failed to parse response: {}", e)))?;

        Ok(Self::to_llm_response(chat_response))
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.send_chat(model, messages, None, options).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.send_chat(model, messages, Some(tools), options).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            return Err(DeepAgentError::provider("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
