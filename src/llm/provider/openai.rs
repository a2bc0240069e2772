//! OpenAI Provider
//!
//! Chat completions with function tools against api.openai.com or any
//! endpoint speaking the same protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{Config, DeepAgentError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

/// Arguments travel as a JSON-encoded string
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAiProvider {
    /// Build from configuration; fails without an API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                DeepAgentError::config(
                    "No LLM API key configured. Please set OPENAI_API_KEY in your environment or .env file",
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|msg| match msg {
                Message::System { content } => WireMessage {
                    role: "system".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::Human { content } => WireMessage {
                    role: "user".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Message::Ai {
                    content,
                    tool_calls,
                } => WireMessage {
                    role: "assistant".to_string(),
                    content: (!content.is_empty() || tool_calls.is_empty())
                        .then(|| content.clone()),
                    tool_calls: (!tool_calls.is_empty()).then(|| {
                        tool_calls
                            .iter()
                            .map(|tc| WireToolCall {
                                id: tc.id.clone(),
                                call_type: function_type(),
                                function: WireFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.args_value().to_string(),
                                },
                            })
                            .collect()
                    }),
                    tool_call_id: None,
                },
                Message::Tool {
                    tool_call_id,
                    content,
                } => WireMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_call_id.clone()),
                },
            })
            .collect()
    }

    fn to_llm_response(response: ChatResponse) -> Result<LLMResponse> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DeepAgentError::provider("Response contained no choices"))?
            .message;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                if tc.function.arguments.trim().is_empty() {
                    return ToolCall::new(tc.id, tc.function.name, Value::Null);
                }
                match serde_json::from_str(&tc.function.arguments) {
                    Ok(args) => ToolCall::new(tc.id, tc.function.name, args),
                    Err(e) => {
                        warn!(tool = %tc.function.name, "unparseable tool arguments: {}", e);
                        ToolCall::with_invalid_args(tc.id, tc.function.name, e.to_string())
                    }
                }
            })
            .collect();

        Ok(LLMResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: response.model,
        })
    }

    async fn send_chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages: Self::to_wire_messages(messages),
            tools: tools.filter(|t| !t.is_empty()),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop,
        };

        debug!(
            model,
            messages = request.messages.len(),
            tools = tools.map_or(0, |t| t.len()),
            "openai chat request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DeepAgentError::provider(format!("Failed to parse response: {}", e)))?;

        Self::to_llm_response(chat_response)
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
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
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeepAgentError::provider("Failed to list models"));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_api_key() {
        let mut config = Config::default();
        config.openai.api_key = None;
        let err = OpenAiProvider::from_config(&config).err().unwrap();
        assert!(matches!(err, DeepAgentError::Config(_)));

        config.openai.api_key = Some("sk-test".to_string());
        assert!(OpenAiProvider::from_config(&config).is_ok());
    }

    #[test]
    fn test_wire_messages() {
        let call = ToolCall::new("call_9", "plan_add_todo", json!({"task": "t"}));
        let wire = OpenAiProvider::to_wire_messages(&[
            Message::human("go"),
            Message::ai_with_tool_calls("", vec![call]),
            Message::tool("call_9", "Added TODO: t"),
        ]);

        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[1]["content"], Value::Null);
        assert_eq!(value[1]["tool_calls"][0]["type"], "function");
        assert_eq!(
            value[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"task":"t"}"#
        );
        assert_eq!(value[2]["tool_call_id"], "call_9");
    }

    #[test]
    fn test_response_parsing() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "fs_write_file", "arguments": "{\"path\":\"a.txt\",\"content\":\"x\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        }))
        .unwrap();

        let llm = OpenAiProvider::to_llm_response(response).unwrap();
        assert_eq!(llm.content, "");
        assert_eq!(llm.tool_calls[0].id, "call_abc");
        assert_eq!(llm.tool_calls[0].get_string("content").as_deref(), Some("x"));
        assert_eq!(llm.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn test_malformed_arguments_keep_parse_error() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_bad",
                        "type": "function",
                        "function": {"name": "fs_read_file", "arguments": "{\"path\": \"a.txt\""}
                    }]
                }
            }]
        }))
        .unwrap();

        let llm = OpenAiProvider::to_llm_response(response).unwrap();
        let call = &llm.tool_calls[0];
        assert!(call.args.is_empty());
        assert!(call.args_error.as_deref().unwrap().contains("EOF"));
    }

    #[test]
    fn test_empty_choices_is_error() {
        let response: ChatResponse =
            serde_json::from_value(json!({"model": "gpt-4o", "choices": []})).unwrap();
        assert!(OpenAiProvider::to_llm_response(response).is_err());
    }
}
