//! Streaming events
//!
//! What `DeepAgent::stream` yields while a request runs.

use serde::{Deserialize, Serialize};

use crate::state::{FileStore, TodoList};

/// One event of a streamed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A step finished and its state was saved
    StateUpdate {
        thread_id: String,
        files: FileStore,
        todos: TodoList,
    },
    /// Text produced by the agent
    Content { content: String },
    /// The request finished
    Complete {
        thread_id: String,
        files: FileStore,
        todos: TodoList,
    },
    /// The request failed
    Error { error: String },
}

impl StreamEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut files = FileStore::new();
        files.write("a.txt", "x");
        let mut todos = TodoList::new();
        todos.add("t");

        let event = StreamEvent::StateUpdate {
            thread_id: "t1".to_string(),
            files,
            todos,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "state_update",
                "thread_id": "t1",
                "files": {"a.txt": "x"},
                "todos": [{"task": "t", "status": "pending"}]
            })
        );

        let error = StreamEvent::Error {
            error: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "error", "error": "boom"})
        );
        assert!(error.is_terminal());
        assert!(!StreamEvent::Content {
            content: "hi".to_string()
        }
        .is_terminal());
    }
}
