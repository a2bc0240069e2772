//! LLM module - Language Model integrations
//!
//! Provides abstractions for different LLM backends with Ollama as the primary.

pub mod mock;
pub mod model;
pub mod ollama;
pub mod provider;
pub mod traits;

pub use mock::{MockProvider, MockReply, MockRequest};
pub use model::{ChatModel, ModelFactory, ProviderModelFactory, ToolBoundModel};
pub use ollama::OllamaClient;
pub use provider::{create_provider, AnthropicProvider, OpenAiProvider};
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
