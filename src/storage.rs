use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key/value persistence scoped to one tab.
///
/// Values survive a reload of the same tab and are not visible from a new tab.
pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store that lives exactly as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TabFile {
    values: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Store backed by one JSON file per named tab
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: TabFile,
}

impl FileStore {
    /// Open (or lazily create) the tab `name` under `tabs_dir`
    pub fn open(tabs_dir: &Path, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            anyhow::bail!("Invalid tab name '{}'", name);
        }

        let path = tabs_dir.join(format!("{}.json", name));
        let state = Self::read_state(&path);
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(path: &Path) -> TabFile {
        let Ok(content) = fs::read_to_string(path) else {
            return TabFile::default();
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable tab file");
                TabFile::default()
            }
        }
    }

    fn write_state(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create tabs directory")?;
        }
        let content = serde_json::to_string_pretty(&self.state)
            .context("Failed to serialize tab state")?;

        // Write beside the tab file, then swap it in, so a crash never leaves
        // a truncated tab behind.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).context("Failed to write tab state")?;
        fs::rename(&tmp_path, &self.path).context("Failed to replace tab state")?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.state.values.insert(key.to_string(), value.to_string());
        self.state.updated_at = Some(Utc::now());
        self.write_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("k").is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn same_tab_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(dir.path(), "work").unwrap();
            store.set("chat_session_id", "abc").unwrap();
        }
        let store = FileStore::open(dir.path(), "work").unwrap();
        assert_eq!(store.get("chat_session_id").as_deref(), Some("abc"));
    }

    #[test]
    fn other_tab_does_not_see_values() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path(), "one").unwrap();
        store.set("chat_session_id", "abc").unwrap();

        let other = FileStore::open(dir.path(), "two").unwrap();
        assert!(other.get("chat_session_id").is_none());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = FileStore::open(dir.path(), "bad").unwrap();
        assert!(store.get("chat_session_id").is_none());
    }

    #[test]
    fn writes_replace_the_tab_file_whole() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("work.json.tmp"), "{trunc").unwrap();

        let mut store = FileStore::open(dir.path(), "work").unwrap();
        store.set("chat_session_id", "abc").unwrap();
        store.set("chat_session_id", "def").unwrap();

        assert!(!dir.path().join("work.json.tmp").exists());
        let content = fs::read_to_string(store.path()).unwrap();
        let state: TabFile = serde_json::from_str(&content).unwrap();
        assert_eq!(state.values.get("chat_session_id").map(String::as_str), Some("def"));
        assert!(state.updated_at.is_some());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        assert!(FileStore::open(dir.path(), "../escape").is_err());
        assert!(FileStore::open(dir.path(), "  ").is_err());
        assert!(FileStore::open(dir.path(), ".hidden").is_err());
    }
}
