//! Planning tools
//!
//! Handlers for `plan_read_todos`, `plan_add_todo` and `plan_update_todo`.

use serde::Deserialize;

use crate::state::{TodoList, TodoStatus};

#[derive(Debug, Deserialize)]
pub struct AddTodoArgs {
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoArgs {
    /// Signed so a negative index is reported as out of range rather than
    /// as a decoding failure
    pub index: i64,
    pub status: String,
}

pub fn read_todos(todos: &TodoList) -> String {
    todos.render().unwrap_or_else(|| "No TODOs.".to_string())
}

pub fn add_todo(todos: &mut TodoList, args: AddTodoArgs) -> String {
    let message = format!("Added TODO: {}", args.task);
    todos.add(args.task);
    message
}

pub fn update_todo(todos: &mut TodoList, args: UpdateTodoArgs) -> String {
    let index = match usize::try_from(args.index) {
        Ok(i) if i < todos.len() => i,
        _ => return "Error: Invalid TODO index.".to_string(),
    };

    let status = match args.status.parse::<TodoStatus>() {
        Ok(status) => status,
        Err(()) => {
            return format!(
                "Error: Invalid status '{}'. Use 'pending', 'in_progress', or 'completed'.",
                args.status
            )
        }
    };

    todos.update(index, status);
    format!("Updated TODO {} to {}", index, status)
}
