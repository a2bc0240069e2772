//! Tools module - what the agent can do to its thread
//!
//! Virtual filesystem and TODO handlers, sub-agent delegation, the schema
//! registry offered to the model and the dispatcher that joins them.

pub mod dispatcher;
pub mod filesystem;
pub mod planning;
pub mod registry;

pub use dispatcher::ToolDispatcher;
pub use registry::{ToolName, ToolRegistry};
