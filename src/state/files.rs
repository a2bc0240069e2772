//! Virtual filesystem
//!
//! A flat mapping from path strings to text content, scoped to one thread.
//! There are no directories: a path is just a key.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How `FileStore::edit` combines new content with the existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Overwrite (creates the file if missing)
    Replace,
    /// `old + "\n" + new`
    Append,
    /// `new + "\n" + old`
    Prepend,
}

impl FromStr for EditMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(EditMode::Replace),
            "append" => Ok(EditMode::Append),
            "prepend" => Ok(EditMode::Prepend),
            _ => Err(()),
        }
    }
}

/// In-memory path -> content store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileStore {
    files: BTreeMap<String, String>,
}

impl FileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of a file, if present
    pub fn read(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Create or overwrite a file
    pub fn write(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Whether a file exists
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Edit a file in place.
    ///
    /// Returns `false` without touching the store when the file is missing
    /// and `mode` needs existing content.
    pub fn edit(&mut self, path: &str, content: &str, mode: EditMode) -> bool {
        match mode {
            EditMode::Replace => {
                self.write(path, content);
                true
            }
            EditMode::Append => match self.files.get_mut(path) {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(content);
                    true
                }
                None => false,
            },
            EditMode::Prepend => match self.files.get_mut(path) {
                Some(existing) => {
                    *existing = format!("{}\n{}", content, existing);
                    true
                }
                None => false,
            },
        }
    }

    /// All known paths in lexicographic order
    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Iterate over (path, content) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
