//! In-memory checkpoint store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CheckpointStore;
use crate::core::Result;
use crate::state::ThreadState;

#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    threads: Arc<RwLock<HashMap<String, ThreadState>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored threads
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), state.clone());
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;

    #[tokio::test]
    async fn test_save_then_load() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load("t1").await.unwrap().is_none());

        let mut state = ThreadState::new();
        state.push(Message::human("hi"));
        store.save("t1", &state).await.unwrap();

        assert_eq!(store.load("t1").await.unwrap(), Some(state));
        assert!(store.load("t2").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
        assert!(!store.is_persistent());
    }
}
