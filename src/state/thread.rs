//! Per-thread conversation state
//!
//! The message history plus the thread's virtual files and TODO list.

use serde::{Deserialize, Serialize};

use crate::core::{Message, Role, ToolCall};
use crate::state::files::FileStore;
use crate::state::todos::TodoList;

/// Everything the agent remembers about one thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    /// Append-only message history
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Virtual filesystem
    #[serde(default)]
    pub files: FileStore,
    /// Planning list
    #[serde(default)]
    pub todos: TodoList,
}

impl ThreadState {
    /// Create an empty thread
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Most recent message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent ai message
    pub fn last_ai_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role() == Role::Ai)
    }

    /// Content of the final answer, or an empty string before the first reply
    pub fn response_text(&self) -> String {
        self.last_ai_message()
            .map(|m| m.content().to_string())
            .unwrap_or_default()
    }

    /// Tool calls of the latest ai message that have no result yet.
    ///
    /// Non-empty only when a tool batch was abandoned before its results
    /// were saved.
    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        let Some(pos) = self.messages.iter().rposition(|m| m.role() == Role::Ai) else {
            return Vec::new();
        };
        let answered: Vec<&str> = self.messages[pos + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        self.messages[pos]
            .tool_calls()
            .iter()
            .filter(|call| !answered.contains(&call.id.as_str()))
            .cloned()
            .collect()
    }

    /// Answer every pending tool call with `content`, returning how many
    /// were closed
    pub fn close_pending_calls(&mut self, content: &str) -> usize {
        let pending = self.pending_tool_calls();
        for call in &pending {
            self.push(Message::tool(call.id.clone(), content));
        }
        pending.len()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
