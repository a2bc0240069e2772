//! Chat model handles
//!
//! `ChatModel` pairs a provider with a model name and generation options and
//! never carries tool definitions. Binding tools yields a `ToolBoundModel`, a
//! separate type, so code that must not offer tools (sub-agents) can demand a
//! `ChatModel` and get that guarantee from the compiler.

use std::sync::Arc;

use tracing::debug;

use crate::core::{Config, DeepAgentError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::provider::create_provider;
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

/// A model without tool bindings
#[derive(Clone)]
pub struct ChatModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: GenerateOptions,
}

impl ChatModel {
    /// Create a model handle with default options
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: GenerateOptions::default(),
        }
    }

    /// Replace the generation options
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the backing provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Backing provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Offer `tools` to the model on every call
    pub fn bind_tools(&self, tools: Vec<ToolDefinition>) -> ToolBoundModel {
        ToolBoundModel {
            base: self.clone(),
            tools,
        }
    }

    /// Send `messages` and return the reply as an ai message
    pub async fn invoke(&self, messages: &[Message]) -> Result<Message> {
        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = messages.len(),
            "invoking model"
        );
        let response = self
            .provider
            .chat(&self.model, messages, Some(self.options.clone()))
            .await?;
        Ok(into_ai_message(response))
    }
}

/// A model that is offered a fixed set of tools
#[derive(Clone)]
pub struct ToolBoundModel {
    base: ChatModel,
    tools: Vec<ToolDefinition>,
}

impl ToolBoundModel {
    /// Tools offered on each call
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// The same model without tools
    pub fn base(&self) -> &ChatModel {
        &self.base
    }

    /// Send `messages` with the bound tools and return the reply
    pub async fn invoke(&self, messages: &[Message]) -> Result<Message> {
        debug!(
            provider = self.base.provider.name(),
            model = %self.base.model,
            messages = messages.len(),
            tools = self.tools.len(),
            "invoking model with tools"
        );
        let response = self
            .base
            .provider
            .chat_with_tools(
                &self.base.model,
                messages,
                &self.tools,
                Some(self.base.options.clone()),
            )
            .await?;
        Ok(into_ai_message(response))
    }
}

/// Convert a provider response, filling in any missing tool-call ids
fn into_ai_message(response: LLMResponse) -> Message {
    let tool_calls = response
        .tool_calls
        .into_iter()
        .map(|mut call| {
            if call.id.is_empty() {
                call.id = ToolCall::generate_id();
            }
            call
        })
        .collect();
    Message::ai_with_tool_calls(response.content, tool_calls)
}

/// Produces the base model for each agent request
pub trait ModelFactory: Send + Sync {
    /// Create a tool-free model, or fail with a configuration error
    fn create(&self) -> Result<ChatModel>;
}

impl ModelFactory for ChatModel {
    fn create(&self) -> Result<ChatModel> {
        Ok(self.clone())
    }
}

/// Builds models from the configured provider
pub struct ProviderModelFactory {
    provider: std::result::Result<Arc<dyn LLMProvider>, String>,
    model: String,
    options: GenerateOptions,
}

impl ProviderModelFactory {
    /// Resolve the provider now; a configuration problem is reported on
    /// every `create` call rather than here.
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: create_provider(config).map_err(|e| match e {
                DeepAgentError::Config(msg) => msg,
                other => other.to_string(),
            }),
            model: config.model_name(),
            options: GenerateOptions {
                temperature: Some(config.models.temperature),
                ..Default::default()
            },
        }
    }
}

impl ModelFactory for ProviderModelFactory {
    fn create(&self) -> Result<ChatModel> {
        match &self.provider {
            Ok(provider) => Ok(ChatModel::new(provider.clone(), self.model.clone())
                .with_options(self.options.clone())),
            Err(msg) => Err(DeepAgentError::config(msg.clone())),
        }
    }
}
