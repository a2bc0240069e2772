//! Checkpoint storage for thread state
//!
//! The agent loop loads a thread once per request and saves it after every
//! completed step. Backends only need to map a thread id to its latest state.

mod file;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::{Config, StorageBackend};
use crate::core::Result;
use crate::state::ThreadState;

pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;

/// Key-value store of thread states
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Latest saved state of a thread, if any
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>>;

    /// Replace the saved state of a thread
    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<()>;

    /// Whether saved threads survive a process restart
    fn is_persistent(&self) -> bool;
}

/// Create the store selected by configuration
pub fn create_store(config: &Config) -> Result<Arc<dyn CheckpointStore>> {
    let store: Arc<dyn CheckpointStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryCheckpointStore::new()),
        StorageBackend::File => Arc::new(FileCheckpointStore::new(config.checkpoint_dir())?),
    };
    Ok(store)
}
