//! Agent module - orchestration and delegation
//!
//! Contains the agent loop that coordinates model calls, tool execution and
//! thread persistence, plus the sub-agents it can delegate to.

pub mod events;
pub mod loop_state;
pub mod node;
pub mod orchestrator;
pub mod sub_agent;

pub use events::StreamEvent;
pub use loop_state::{AgentLoopState, Step};
pub use node::AgentNode;
pub use orchestrator::{AgentResponse, DeepAgent, DeepAgentBuilder, ThreadSnapshot};
pub use sub_agent::{SubAgentContext, SubAgentDescriptor, SubAgentExecutor, SubAgentRegistry};
