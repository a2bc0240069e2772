//! Tool dispatcher - executes a batch of tool calls
//!
//! Calls run one after another against the batch's working copy of the
//! thread's files and TODOs, so later calls see earlier effects. Every call
//! yields exactly one result; failures become error text.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::agent::sub_agent::{SubAgentContext, SubAgentExecutor};
use crate::core::{ToolCall, ToolResult};
use crate::llm::ChatModel;
use crate::state::{FileStore, TodoList};
use crate::tools::filesystem;
use crate::tools::planning;
use crate::tools::registry::ToolName;

#[derive(Debug, Deserialize)]
struct DelegateArgs {
    sub_agent_name: String,
    task: String,
}

/// Routes tool calls to their handlers
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    sub_agents: Arc<SubAgentExecutor>,
}

impl ToolDispatcher {
    pub fn new(sub_agents: Arc<SubAgentExecutor>) -> Self {
        Self { sub_agents }
    }

    pub fn sub_agents(&self) -> &SubAgentExecutor {
        &self.sub_agents
    }

    /// Execute `calls` in order and return one result per call.
    ///
    /// `model` is the tool-free base model handed to sub-agents.
    pub async fn dispatch(
        &self,
        calls: &[ToolCall],
        files: &mut FileStore,
        todos: &mut TodoList,
        model: &ChatModel,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            debug!(tool = %call.name, id = %call.id, "executing tool");

            let outcome = AssertUnwindSafe(self.execute(call, files, todos, model))
                .catch_unwind()
                .await;

            let content = match outcome {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!(tool = %call.name, "tool failed: {}", e);
                    format!("Error executing {}: {}", call.name, e)
                }
                Err(panic) => {
                    let description = panic_message(panic.as_ref());
                    error!(tool = %call.name, "tool panicked: {}", description);
                    format!("Error executing {}: {}", call.name, description)
                }
            };

            results.push(ToolResult::new(call.id.clone(), content));
        }

        results
    }

    async fn execute(
        &self,
        call: &ToolCall,
        files: &mut FileStore,
        todos: &mut TodoList,
        model: &ChatModel,
    ) -> Result<String, serde_json::Error> {
        let Some(tool) = ToolName::parse(&call.name) else {
            warn!(tool = %call.name, "unknown tool requested");
            return Ok(format!("Error: Unknown tool '{}'.", call.name));
        };

        if let Some(reason) = &call.args_error {
            warn!(tool = %call.name, "arguments were not valid JSON: {}", reason);
            return Ok(format!(
                "Error executing {}: invalid JSON arguments: {}",
                call.name, reason
            ));
        }

        let output = match tool {
            ToolName::FsReadFile => filesystem::read_file(files, decode(call)?),
            ToolName::FsWriteFile => filesystem::write_file(files, decode(call)?),
            ToolName::FsLs => filesystem::ls(files, decode(call)?),
            ToolName::FsEditFile => filesystem::edit_file(files, decode(call)?),
            ToolName::PlanReadTodos => planning::read_todos(todos),
            ToolName::PlanAddTodo => planning::add_todo(todos, decode(call)?),
            ToolName::PlanUpdateTodo => planning::update_todo(todos, decode(call)?),
            ToolName::DelegateToSubagent => {
                let args: DelegateArgs = decode(call)?;
                let context = SubAgentContext::from_files(files);
                self.sub_agents
                    .delegate(&args.sub_agent_name, &args.task, model, context.as_ref())
                    .await
            }
        };

        Ok(output)
    }
}

/// Decode a call's arguments into the handler's argument struct
fn decode<T: DeserializeOwned>(call: &ToolCall) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(call.args.clone()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
