//! DeepAgent - planning agent with a virtual filesystem and sub-agents
//!
//! An agent that alternates between model calls and deterministic tool
//! execution. Every conversation thread carries its own virtual files and
//! TODO list, persisted through a checkpoint store, and the agent can hand
//! self-contained tasks to specialised sub-agents.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **State**: Per-thread files, TODOs and message history
//! - **Checkpoint**: Thread persistence (memory or JSON files)
//! - **LLM**: Provider abstraction with Ollama, OpenAI and a scripted mock
//! - **Tools**: Tool schemas, handlers and the dispatcher
//! - **Agent**: The AGENT/TOOLS/END loop, streaming and sub-agents
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use deepagent::{Config, DeepAgent};
//!
//! #[tokio::main]
//! async fn main() -> deepagent::Result<()> {
//!     let agent = DeepAgent::from_config(&Config::load())?;
//!
//!     let first = agent.invoke(None, "Plan a blog post about Rust").await?;
//!     let next = agent.chat(&first.thread_id, "Now write the intro").await?;
//!     println!("{}", next.response);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod checkpoint;
pub mod cli;
pub mod core;
pub mod llm;
pub mod state;
pub mod tools;

// Re-export commonly used items
pub use agent::{AgentResponse, DeepAgent, StreamEvent, ThreadSnapshot};
pub use checkpoint::CheckpointStore;
pub use cli::Repl;
pub use core::{Config, DeepAgentError, Result};
