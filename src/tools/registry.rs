//! Tool registry - schemas offered to the model
//!
//! Holds the name, description and JSON-schema arguments of every tool. The
//! handlers live in the dispatcher; both sides are joined by `ToolName`.

use std::collections::HashMap;

use serde_json::json;

use crate::core::{ToolCategory, ToolDefinition};

/// Every tool the agent knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    FsReadFile,
    FsWriteFile,
    FsLs,
    FsEditFile,
    PlanReadTodos,
    PlanAddTodo,
    PlanUpdateTodo,
    DelegateToSubagent,
}

impl ToolName {
    /// All tools in the order they are offered to the model
    pub const ALL: [ToolName; 8] = [
        ToolName::FsReadFile,
        ToolName::FsWriteFile,
        ToolName::FsLs,
        ToolName::FsEditFile,
        ToolName::PlanReadTodos,
        ToolName::PlanAddTodo,
        ToolName::PlanUpdateTodo,
        ToolName::DelegateToSubagent,
    ];

    /// Name as seen by the model
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::FsReadFile => "fs_read_file",
            ToolName::FsWriteFile => "fs_write_file",
            ToolName::FsLs => "fs_ls",
            ToolName::FsEditFile => "fs_edit_file",
            ToolName::PlanReadTodos => "plan_read_todos",
            ToolName::PlanAddTodo => "plan_add_todo",
            ToolName::PlanUpdateTodo => "plan_update_todo",
            ToolName::DelegateToSubagent => "delegate_to_subagent",
        }
    }

    /// Look up a tool by the name the model used
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn category(&self) -> ToolCategory {
        match self {
            ToolName::FsReadFile
            | ToolName::FsWriteFile
            | ToolName::FsLs
            | ToolName::FsEditFile => ToolCategory::FileSystem,
            ToolName::PlanReadTodos | ToolName::PlanAddTodo | ToolName::PlanUpdateTodo => {
                ToolCategory::Planning
            }
            ToolName::DelegateToSubagent => ToolCategory::Delegation,
        }
    }

    fn definition(&self) -> ToolDefinition {
        match self {
            ToolName::FsReadFile => ToolDefinition::function(
                self.as_str(),
                "Read the content of a file.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path of the file to read"
                        }
                    },
                    "required": ["path"]
                }),
            ),
            ToolName::FsWriteFile => ToolDefinition::function(
                self.as_str(),
                "Write content to a file.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path of the file to write"
                        },
                        "content": {
                            "type": "string",
                            "description": "Full content of the file"
                        }
                    },
                    "required": ["path", "content"]
                }),
            ),
            ToolName::FsLs => ToolDefinition::function(
                self.as_str(),
                "List files in the directory.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Directory to list",
                            "default": "/"
                        }
                    }
                }),
            ),
            ToolName::FsEditFile => ToolDefinition::function(
                self.as_str(),
                "Edit a file. Mode can be 'replace' (default), 'append', or 'prepend'.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path of the file to edit"
                        },
                        "content": {
                            "type": "string",
                            "description": "Content to write, append or prepend"
                        },
                        "mode": {
                            "type": "string",
                            "enum": ["replace", "append", "prepend"],
                            "default": "replace"
                        }
                    },
                    "required": ["path", "content"]
                }),
            ),
            ToolName::PlanReadTodos => ToolDefinition::function(
                self.as_str(),
                "Read the current TODO list.",
                json!({
                    "type": "object",
                    "properties": {}
                }),
            ),
            ToolName::PlanAddTodo => ToolDefinition::function(
                self.as_str(),
                "Add a new task to the TODO list.",
                json!({
                    "type": "object",
                    "properties": {
                        "task": {
                            "type": "string",
                            "description": "Description of the task"
                        }
                    },
                    "required": ["task"]
                }),
            ),
            ToolName::PlanUpdateTodo => ToolDefinition::function(
                self.as_str(),
                "Update the status of a TODO item. Status can be 'pending', 'in_progress', 'completed'.",
                json!({
                    "type": "object",
                    "properties": {
                        "index": {
                            "type": "integer",
                            "description": "0-based position of the item"
                        },
                        "status": {
                            "type": "string",
                            "enum": ["pending", "in_progress", "completed"]
                        }
                    },
                    "required": ["index", "status"]
                }),
            ),
            ToolName::DelegateToSubagent => ToolDefinition::function(
                self.as_str(),
                "Delegate a specific task to a specialized sub-agent.",
                json!({
                    "type": "object",
                    "properties": {
                        "sub_agent_name": {
                            "type": "string",
                            "description": "Name of the registered sub-agent"
                        },
                        "task": {
                            "type": "string",
                            "description": "Self-contained description of the task"
                        }
                    },
                    "required": ["sub_agent_name", "task"]
                }),
            ),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of tool schemas
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Definitions in registration order
    definitions: Vec<ToolDefinition>,
    /// Tool categories
    categories: HashMap<String, ToolCategory>,
}

impl ToolRegistry {
    /// Registry with every built-in tool
    pub fn new() -> Self {
        let mut registry = Self {
            definitions: Vec::new(),
            categories: HashMap::new(),
        };
        for tool in ToolName::ALL {
            registry.register(tool.definition(), tool.category());
        }
        registry
    }

    /// Register a tool definition; a repeated name replaces the old schema
    fn register(&mut self, definition: ToolDefinition, category: ToolCategory) {
        let name = definition.name().to_string();
        match self.definitions.iter_mut().find(|d| d.name() == name) {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
        self.categories.insert(name, category);
    }

    /// All tool definitions, in registration order
    pub fn all_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }

    /// Definition of one tool
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    /// Get tool definitions by category
    pub fn definitions_by_category(&self, category: ToolCategory) -> Vec<&ToolDefinition> {
        self.definitions
            .iter()
            .filter(|d| self.categories.get(d.name()) == Some(&category))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
