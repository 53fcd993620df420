//! Synchronous string key-value storage, the equivalent of browser local storage.

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    fs,
    path::PathBuf,
};
use tracing::warn;

use crate::Config;

/// Serialized recent-search list (JSON array of strings).
pub const RECENT_SEARCHES_KEY: &str = "weather_recent_searches";

/// Set to `"true"` once the welcome notification has been shown.
pub const VISITED_KEY: &str = "weather_app_visited";

pub trait KeyValueStore: Send + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store; contents are lost when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unparsable file is an empty
    /// store; only I/O failures are errors.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file: {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring unreadable storage file");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Open `storage.json` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::project_dirs()?.data_dir().join("storage.json"))
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize storage entries")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write storage file: {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set(VISITED_KEY, "true").unwrap();
        store.set(RECENT_SEARCHES_KEY, r#"["Paris"]"#).unwrap();
        store.remove(VISITED_KEY).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(VISITED_KEY), None);
        assert_eq!(reopened.get(RECENT_SEARCHES_KEY).as_deref(), Some(r#"["Paris"]"#));
    }

    #[test]
    fn corrupt_file_opens_empty_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"weather_recent_searches": "[oops"#).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(RECENT_SEARCHES_KEY), None);

        store.set(VISITED_KEY, "true").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(VISITED_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory exists at the path but cannot be read as a file.
        let err = FileStore::open(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read storage file"));
    }
}
