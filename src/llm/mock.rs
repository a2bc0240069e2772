//! Mock provider (for tests and offline runs, no API needed)
//!
//! Replies come from a script, in order. Once the script runs out the mock
//! echoes the last human message as a final answer. Every request is recorded
//! so tests can inspect what the model was shown.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{DeepAgentError, Message, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Final answer
    Text(String),
    /// Request tool calls (with optional accompanying text)
    ToolCalls {
        content: String,
        calls: Vec<ToolCall>,
    },
    /// Fail the request with a provider error
    Fail(String),
    /// Wait before answering with the inner reply
    Delayed {
        delay: Duration,
        reply: Box<MockReply>,
    },
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self::ToolCalls {
            content: content.into(),
            calls,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    pub fn delayed(delay: Duration, reply: MockReply) -> Self {
        Self::Delayed {
            delay,
            reply: Box::new(reply),
        }
    }
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Names of the tools offered with the request
    pub tool_names: Vec<String>,
}

/// Scripted provider
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockProvider {
    /// Mock that only echoes
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that plays `replies` in order, then echoes
    pub fn with_script(replies: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply
    pub fn push(&self, reply: MockReply) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of scripted replies not yet used
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn respond(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockRequest {
                model: model.to_string(),
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
            });

        let mut next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        while let Some(MockReply::Delayed { delay, reply }) = next {
            tokio::time::sleep(delay).await;
            next = Some(*reply);
        }

        match next {
            Some(MockReply::Text(content)) => Ok(LLMResponse::text(model, content)),
            Some(MockReply::ToolCalls { content, calls }) => Ok(LLMResponse {
                content,
                tool_calls: calls,
                usage: None,
                model: model.to_string(),
            }),
            Some(MockReply::Fail(message)) => Err(DeepAgentError::provider(message)),
            Some(MockReply::Delayed { .. }) | None => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role() == Role::Human)
                    .map(|m| m.content())
                    .unwrap_or("(no input)");
                Ok(LLMResponse::text(model, format!("Echo: {}", last_user)))
            }
        }
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.respond(model, messages, &[]).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.respond(model, messages, tools).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["mock".to_string()])
    }

    fn name(&self) -> &str {
        "mock"
    }
}
