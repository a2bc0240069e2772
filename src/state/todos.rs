//! TODO list used by the agent for planning
//!
//! Items are addressed by their 0-based position.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a TODO item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "in_progress" => Ok(TodoStatus::InProgress),
            "completed" => Ok(TodoStatus::Completed),
            _ => Err(()),
        }
    }
}

/// A single TODO item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub task: String,
    pub status: TodoStatus,
}

/// Ordered list of TODO items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoList {
    items: Vec<Todo>,
}

impl TodoList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending task and return its index
    pub fn add(&mut self, task: impl Into<String>) -> usize {
        self.items.push(Todo {
            task: task.into(),
            status: TodoStatus::Pending,
        });
        self.items.len() - 1
    }

    /// Set the status of the item at `index`.
    ///
    /// Returns `false` (list unchanged) when the index is out of range.
    pub fn update(&mut self, index: usize, status: TodoStatus) -> bool {
        match self.items.get_mut(index) {
            Some(todo) => {
                todo.status = status;
                true
            }
            None => false,
        }
    }

    /// Item at `index`
    pub fn get(&self, index: usize) -> Option<&Todo> {
        self.items.get(index)
    }

    /// Iterate over items in order
    pub fn iter(&self) -> impl Iterator<Item = &Todo> {
        self.items.iter()
    }

    /// Numbered `[status] task` lines, or `None` when empty
    pub fn render(&self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        Some(
            self.items
                .iter()
                .enumerate()
                .map(|(i, todo)| format!("{}. [{}] {}", i, todo.status, todo.task))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_render() {
        let mut todos = TodoList::new();
        assert_eq!(todos.render(), None);

        assert_eq!(todos.add("t"), 0);
        assert_eq!(todos.render().as_deref(), Some("0. [pending] t"));

        todos.add("second");
        todos.update(1, TodoStatus::InProgress);
        assert_eq!(
            todos.render().as_deref(),
            Some("0. [pending] t\n1. [in_progress] second")
        );
    }

    #[test]
    fn test_update_out_of_range() {
        let mut todos = TodoList::new();
        todos.add("t");
        let before = todos.clone();

        assert!(!todos.update(5, TodoStatus::Completed));
        assert_eq!(todos, before);

        assert!(todos.update(0, TodoStatus::Completed));
        assert_eq!(todos.get(0).unwrap().status, TodoStatus::Completed);
    }

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            TodoStatus::Pending,
            TodoStatus::InProgress,
            TodoStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<TodoStatus>(), Ok(status));
        }
        assert!("done".parse::<TodoStatus>().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let mut todos = TodoList::new();
        todos.add("write plan");
        let value = serde_json::to_value(&todos).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"task": "write plan", "status": "pending"}])
        );
    }
}
