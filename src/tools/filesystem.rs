//! File tools rooted at the workspace directory: list, read, write.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::Tool;

const MAX_READ_CHARS: usize = 20_000;

/// Resolve a user-supplied path against the workspace root.
///
/// Relative paths are joined to the root; absolute paths must already lie
/// inside it. `..` components are rejected outright.
fn resolve(root: &Path, path: &str) -> anyhow::Result<PathBuf> {
    let candidate = Path::new(path);
    if candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(anyhow::anyhow!("Invalid path '{}': contains '..'", path));
    }

    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    if !resolved.starts_with(root) {
        return Err(anyhow::anyhow!("Path '{}' is outside the workspace", path));
    }
    Ok(resolved)
}

fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

/// List the entries of a directory.
pub struct ListDirectory {
    root: PathBuf,
}

impl ListDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List files and subdirectories in a workspace directory. Set recursive to walk subdirectories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace. Defaults to the workspace root."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Walk subdirectories (default: false)"
                },
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum depth when recursive (default: 3)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let path = args["path"].as_str().unwrap_or(".");
        let recursive = args["recursive"].as_bool().unwrap_or(false);
        let max_depth = args["max_depth"].as_u64().unwrap_or(3).max(1) as usize;

        let dir = resolve(&self.root, path)?;
        if !dir.is_dir() {
            return Err(anyhow::anyhow!("Not a directory: {}", path));
        }

        let entries = if recursive {
            tokio::task::spawn_blocking(move || walk(&dir, max_depth)).await??
        } else {
            read_dir_sorted(&dir).await?
        };

        if entries.is_empty() {
            Ok(json!(format!("Directory '{}' is empty", path)))
        } else {
            Ok(json!(entries.join("\n")))
        }
    }
}

async fn read_dir_sorted(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read directory '{}': {}", dir.display(), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let marker = if entry.file_type().await?.is_dir() {
            "[DIR]"
        } else {
            "[FILE]"
        };
        entries.push((
            entry.file_name().to_string_lossy().to_string(),
            marker,
        ));
    }
    entries.sort();

    Ok(entries
        .into_iter()
        .map(|(name, marker)| format!("{} {}", marker, name))
        .collect())
}

fn walk(dir: &Path, max_depth: usize) -> anyhow::Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let marker = if entry.file_type().is_dir() {
            "[DIR]"
        } else {
            "[FILE]"
        };
        entries.push(format!("{} {}", marker, relative.display()));
    }
    Ok(entries)
}

/// Read a text file.
pub struct ReadFile {
    root: PathBuf,
}

impl ReadFile {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file in the workspace."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to read, relative to the workspace"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let path = required_str(&args, "path")?;
        let file = resolve(&self.root, path)?;

        let content = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path, e))?;

        match content.char_indices().nth(MAX_READ_CHARS) {
            Some((cut, _)) => Ok(json!(format!(
                "{}... [content truncated, showing first {} chars]",
                &content[..cut],
                MAX_READ_CHARS
            ))),
            None => Ok(json!(content)),
        }
    }
}

/// Write (or append to) a text file.
pub struct WriteFile {
    root: PathBuf,
}

impl WriteFile {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write text to a file in the workspace, creating parent directories as needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to write, relative to the workspace"
                },
                "content": {
                    "type": "string",
                    "description": "Text to write"
                },
                "append": {
                    "type": "boolean",
                    "description": "Append instead of overwriting (default: false)"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;
        let append = args["append"].as_bool().unwrap_or(false);
        let file = resolve(&self.root, path)?;

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut handle = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&file)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open '{}': {}", path, e))?;
        handle.write_all(content.as_bytes()).await?;
        handle.flush().await?;

        Ok(json!(format!("Wrote {} bytes to {}", content.len(), path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_reports_files_and_dirs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();

        let tool = ListDirectory::new(dir.path());
        let out = tool.execute(json!({"path": "."})).await.unwrap();

        assert_eq!(out, json!("[DIR] a\n[FILE] b.txt"));
    }

    #[tokio::test]
    async fn list_recursive_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src").join("lib.rs"), "").unwrap();

        let tool = ListDirectory::new(dir.path());
        let out = tool
            .execute(json!({"path": ".", "recursive": true}))
            .await
            .unwrap();

        let text = out.as_str().unwrap();
        assert!(text.contains("[DIR] src"));
        assert!(text.contains("lib.rs"));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let write = WriteFile::new(dir.path());
        let read = ReadFile::new(dir.path());

        write
            .execute(json!({"path": "notes/todo.txt", "content": "hello"}))
            .await
            .unwrap();
        write
            .execute(json!({"path": "notes/todo.txt", "content": " world", "append": true}))
            .await
            .unwrap();

        let out = read.execute(json!({"path": "notes/todo.txt"})).await.unwrap();
        assert_eq!(out, json!("hello world"));
    }

    #[tokio::test]
    async fn paths_outside_workspace_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let read = ReadFile::new(dir.path());

        let err = read
            .execute(json!({"path": "../etc/passwd"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("contains '..'"));

        let err = read.execute(json!({"path": "/etc/passwd"})).await.unwrap_err();
        assert!(err.to_string().contains("outside the workspace"));
    }

    #[tokio::test]
    async fn read_requires_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReadFile::new(dir.path())
            .execute(json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing 'path' argument");
    }
}
