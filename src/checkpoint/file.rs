//! File-backed checkpoint store
//!
//! One pretty-printed JSON document per thread: `<dir>/<thread_id>.json`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::CheckpointStore;
use crate::core::{DeepAgentError, Result};
use crate::state::ThreadState;

pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DeepAgentError::checkpoint(format!(
                "Failed to create checkpoint dir {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, thread_id: &str) -> Result<PathBuf> {
        let valid = !thread_id.is_empty()
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DeepAgentError::checkpoint(format!(
                "Invalid thread id '{}'",
                thread_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", thread_id)))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadState>> {
        let path = self.path_for(thread_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DeepAgentError::with_context(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };
        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    async fn save(&self, thread_id: &str, state: &ThreadState) -> Result<()> {
        let path = self.path_for(thread_id)?;
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(state)?;

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(thread_id, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;

    #[tokio::test]
    async fn test_save_then_load_from_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();

        let mut state = ThreadState::new();
        state.push(Message::human("write a plan"));
        state.files.write("plan.txt", "step 1");
        state.todos.add("step 1");
        store.save("thread-1", &state).await.unwrap();

        let reopened = FileCheckpointStore::new(dir.path()).unwrap();
        assert_eq!(reopened.load("thread-1").await.unwrap(), Some(state));
        assert!(reopened.is_persistent());
    }

    #[tokio::test]
    async fn test_missing_thread() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        assert!(store.load("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path()).unwrap();
        let state = ThreadState::new();

        assert!(store.save("../escape", &state).await.is_err());
        assert!(store.load("a/b").await.is_err());
        assert!(store.load("").await.is_err());
    }
}
