//! Virtual filesystem tools
//!
//! Handlers for `fs_read_file`, `fs_write_file`, `fs_ls` and `fs_edit_file`.
//! Each one works on the batch's working copy of the thread's files and
//! returns the text shown to the model.

use serde::Deserialize;

use crate::state::{EditMode, FileStore};

#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LsArgs {
    /// Accepted for schema compatibility; the store is flat
    #[serde(default = "root_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct EditFileArgs {
    pub path: String,
    pub content: String,
    #[serde(default = "replace_mode")]
    pub mode: String,
}

fn root_path() -> String {
    "/".to_string()
}

fn replace_mode() -> String {
    "replace".to_string()
}

pub fn read_file(files: &FileStore, args: ReadFileArgs) -> String {
    match files.read(&args.path) {
        Some(content) => content.to_string(),
        None => format!("Error: File {} not found.", args.path),
    }
}

pub fn write_file(files: &mut FileStore, args: WriteFileArgs) -> String {
    files.write(args.path.clone(), args.content);
    format!("Successfully wrote to {}", args.path)
}

pub fn ls(files: &FileStore, _args: LsArgs) -> String {
    if files.is_empty() {
        return "No files.".to_string();
    }
    format!("Files: {}", files.paths().join(", "))
}

pub fn edit_file(files: &mut FileStore, args: EditFileArgs) -> String {
    if args.mode != "replace" && !files.contains(&args.path) {
        return format!(
            "Error: File {} not found. Use 'replace' mode to create a new file.",
            args.path
        );
    }

    let mode = match args.mode.parse::<EditMode>() {
        Ok(mode) => mode,
        Err(()) => {
            return format!(
                "Error: Invalid mode '{}'. Use 'replace', 'append', or 'prepend'.",
                args.mode
            )
        }
    };

    files.edit(&args.path, &args.content, mode);
    match mode {
        EditMode::Replace => format!("Successfully replaced content in {}", args.path),
        EditMode::Append => format!("Successfully appended to {}", args.path),
        EditMode::Prepend => format!("Successfully prepended to {}", args.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(files: &mut FileStore, path: &str, content: &str, mode: &str) -> String {
        edit_file(
            files,
            EditFileArgs {
                path: path.to_string(),
                content: content.to_string(),
                mode: mode.to_string(),
            },
        )
    }

    #[test]
    fn test_write_then_read() {
        let mut files = FileStore::new();
        let out = write_file(
            &mut files,
            WriteFileArgs {
                path: "a.txt".to_string(),
                content: "x".to_string(),
            },
        );
        assert_eq!(out, "Successfully wrote to a.txt");
        assert_eq!(
            read_file(&files, ReadFileArgs { path: "a.txt".to_string() }),
            "x"
        );
        assert_eq!(
            read_file(&files, ReadFileArgs { path: "b.txt".to_string() }),
            "Error: File b.txt not found."
        );
    }

    #[test]
    fn test_ls() {
        let mut files = FileStore::new();
        assert_eq!(ls(&files, LsArgs { path: root_path() }), "No files.");

        files.write("notes.md", "");
        files.write("a.txt", "");
        assert_eq!(
            ls(&files, LsArgs { path: root_path() }),
            "Files: a.txt, notes.md"
        );
    }

    #[test]
    fn test_edit_modes() {
        let mut files = FileStore::new();
        files.write("a.txt", "x");

        assert_eq!(
            edit(&mut files, "a.txt", "y", "append"),
            "Successfully appended to a.txt"
        );
        assert_eq!(files.read("a.txt"), Some("x\ny"));

        assert_eq!(
            edit(&mut files, "a.txt", "w", "prepend"),
            "Successfully prepended to a.txt"
        );
        assert_eq!(files.read("a.txt"), Some("w\nx\ny"));

        assert_eq!(
            edit(&mut files, "new.txt", "z", "replace"),
            "Successfully replaced content in new.txt"
        );
        assert_eq!(files.read("new.txt"), Some("z"));
    }

    #[test]
    fn test_edit_missing_file() {
        let mut files = FileStore::new();
        assert_eq!(
            edit(&mut files, "a.txt", "y", "append"),
            "Error: File a.txt not found. Use 'replace' mode to create a new file."
        );
        assert!(files.is_empty());

        // Existence is checked before the mode is validated
        assert_eq!(
            edit(&mut files, "a.txt", "y", "upsert"),
            "Error: File a.txt not found. Use 'replace' mode to create a new file."
        );
    }

    #[test]
    fn test_edit_invalid_mode() {
        let mut files = FileStore::new();
        files.write("a.txt", "x");
        assert_eq!(
            edit(&mut files, "a.txt", "y", "upsert"),
            "Error: Invalid mode 'upsert'. Use 'replace', 'append', or 'prepend'."
        );
        assert_eq!(files.read("a.txt"), Some("x"));
    }

    #[test]
    fn test_args_defaults() {
        let args: EditFileArgs =
            serde_json::from_value(serde_json::json!({"path": "a", "content": "b"})).unwrap();
        assert_eq!(args.mode, "replace");

        let args: LsArgs = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(args.path, "/");
    }
}
