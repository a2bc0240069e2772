//! Shared types used across deepagent modules
//!
//! Contains message structures, tool call/result records and tool definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Ai,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
            Role::Ai => write!(f, "ai"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation thread
///
/// Each variant carries exactly the fields that kind of message can have;
/// only `Ai` messages carry tool calls and only `Tool` messages answer one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Instruction for the model
    System { content: String },
    /// Input from the user
    Human { content: String },
    /// Model output, optionally requesting tool calls
    Ai {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a new human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    /// Create a new ai message without tool calls
    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a new ai message requesting tool calls
    pub fn ai_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Ai {
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a new tool result message
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Role of this message
    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::Human { .. } => Role::Human,
            Self::Ai { .. } => Role::Ai,
            Self::Tool { .. } => Role::Tool,
        }
    }

    /// Text content of this message
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::Human { content }
            | Self::Ai { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by this message (empty unless `Ai`)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Whether this is an ai message requesting at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier the matching result must carry
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Why the model's raw arguments could not be decoded, if they couldn't
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_error: Option<String>,
}

impl ToolCall {
    /// Create a new tool call
    ///
    /// Non-object `args` values are treated as an empty argument map.
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            name: name.into(),
            args,
            args_error: None,
        }
    }

    /// A call whose arguments arrived as malformed JSON
    pub fn with_invalid_args(
        id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            args_error: Some(error.into()),
            ..Self::new(id, name, Value::Null)
        }
    }

    /// Generate a fresh call id
    pub fn generate_id() -> String {
        format!("call_{}", uuid::Uuid::new_v4().simple())
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.args
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Arguments as a JSON value
    pub fn args_value(&self) -> Value {
        Value::Object(self.args.clone())
    }
}

/// Result of executing one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Id of the tool call this result answers
    pub tool_call_id: String,
    /// Output text (error text on failure)
    pub content: String,
}

impl ToolResult {
    /// Create a new result
    pub fn new(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

impl From<ToolResult> for Message {
    fn from(result: ToolResult) -> Self {
        Message::tool(result.tool_call_id, result.content)
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Name of the defined function
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Category of tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Virtual filesystem operations
    FileSystem,
    /// TODO list planning
    Planning,
    /// Sub-agent delegation
    Delegation,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCategory::FileSystem => write!(f, "filesystem"),
            ToolCategory::Planning => write!(f, "planning"),
            ToolCategory::Delegation => write!(f, "delegation"),
        }
    }
}
