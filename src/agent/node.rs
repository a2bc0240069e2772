//! Agent node
//!
//! One model invocation over the thread's full history with the tool schemas
//! bound. Failures do not escape: they become the final ai message.

use tracing::{debug, error};

use crate::agent::sub_agent::SubAgentRegistry;
use crate::core::{Message, Role, ToolDefinition};
use crate::llm::ChatModel;

/// Calls the model for the main agent
#[derive(Debug, Clone)]
pub struct AgentNode {
    system_prompt: String,
    tools: Vec<ToolDefinition>,
}

impl AgentNode {
    pub fn new(system_prompt: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tools,
        }
    }

    /// The authoritative system prompt
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Built-in prompt, listing the registered sub-agents
    pub fn default_system_prompt(sub_agents: &SubAgentRegistry) -> String {
        format!(
            "You are a Deep Agent capable of planning and executing complex tasks.

You have access to:
1. A virtual filesystem (fs_read_file, fs_write_file, fs_ls, fs_edit_file)
2. A TODO list for task planning (plan_read_todos, plan_add_todo, plan_update_todo)
3. Sub-agent delegation (delegate_to_subagent) for specialized tasks

Available Sub-agents:
{}

Best Practices:
- Start by breaking down complex tasks into a plan using `plan_add_todo`
- Use the filesystem to store your work and intermediate results
- Delegate specialized tasks to sub-agents when appropriate
- Mark tasks as completed using `plan_update_todo` with status 'completed'
- Keep your responses concise and focused on task execution
",
            sub_agents.describe()
        )
    }

    /// History as sent to the model: stored system messages are dropped and
    /// the node's own prompt leads.
    pub fn prepare(&self, history: &[Message]) -> Vec<Message> {
        std::iter::once(Message::system(self.system_prompt.clone()))
            .chain(
                history
                    .iter()
                    .filter(|m| m.role() != Role::System)
                    .cloned(),
            )
            .collect()
    }

    /// Invoke the model once and return its ai message
    pub async fn run(&self, model: &ChatModel, history: &[Message]) -> Message {
        let messages = self.prepare(history);
        let bound = model.bind_tools(self.tools.clone());

        match bound.invoke(&messages).await {
            Ok(reply) => {
                debug!(
                    tool_calls = reply.tool_calls().len(),
                    chars = reply.content().len(),
                    "agent reply"
                );
                reply
            }
            Err(e) => {
                error!("model invocation failed: {}", e);
                Message::ai(format!("Error: {}", e))
            }
        }
    }
}
