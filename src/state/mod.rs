//! State module - per-thread data the agent works on
//!
//! The virtual filesystem, the TODO list and the thread aggregate that owns them.

pub mod files;
pub mod thread;
pub mod todos;

pub use files::{EditMode, FileStore};
pub use thread::ThreadState;
pub use todos::{Todo, TodoList, TodoStatus};
