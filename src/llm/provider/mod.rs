//! LLM provider factory
//!
//! Ollama lives at the top of the `llm` module as the primary backend; other
//! HTTP providers live here.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use tracing::debug;

use crate::core::config::{Config, ProviderType};
use crate::core::Result;
use crate::llm::mock::MockProvider;
use crate::llm::traits::LLMProvider;
use crate::llm::OllamaClient;

pub use self::anthropic::AnthropicProvider;
pub use self::openai::OpenAiProvider;

/// Create the provider selected by configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderType::OpenAi => Arc::new(OpenAiProvider::from_config(config)?),
        ProviderType::Anthropic => Arc::new(AnthropicProvider::from_config(config)?),
        ProviderType::Mock => Arc::new(MockProvider::new()),
    };
    debug!(provider = provider.name(), "provider created");
    Ok(provider)
}
