//! Custom error types for deepagent
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for deepagent operations
#[derive(Error, Debug)]
pub enum DeepAgentError {
    /// Model provider connection or API errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The agent cannot serve requests (e.g. no model credential)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// No state has been recorded for the requested thread
    #[error("Thread {0} not found")]
    ThreadNotFound(String),

    /// Checkpoint store failures
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model not available on the provider
    #[error("Model '{0}' not available")]
    ModelNotFound(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for deepagent operations
pub type Result<T> = std::result::Result<T, DeepAgentError>;

impl DeepAgentError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a checkpoint error
    pub fn checkpoint(msg: impl Into<String>) -> Self {
        Self::Checkpoint(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether callers should treat this as "service unavailable"
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }

    /// Whether callers should treat this as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ThreadNotFound(_))
    }
}
