use anyhow::{Context, Result};
use tracing::warn;

use crate::storage::{KeyValueStore, RECENT_SEARCHES_KEY};

pub const MAX_RECENT_SEARCHES: usize = 5;

fn same_city(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Most-recent-first list of searched city names.
///
/// Holds at most [`MAX_RECENT_SEARCHES`] entries, none equal ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSearches {
    entries: Vec<String>,
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from stored names, keeping the first of any duplicates.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<String> = Vec::with_capacity(MAX_RECENT_SEARCHES);
        for name in names {
            let name = name.into();
            if name.trim().is_empty() || entries.iter().any(|e| same_city(e, &name)) {
                continue;
            }
            entries.push(name);
            if entries.len() == MAX_RECENT_SEARCHES {
                break;
            }
        }
        Self { entries }
    }

    /// Reads the list from `store`. Missing or unreadable data yields an empty list.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(RECENT_SEARCHES_KEY) else {
            return Self::new();
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(names) => Self::from_names(names),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable recent searches");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&self.entries)
            .context("Failed to serialize recent searches")?;
        store.set(RECENT_SEARCHES_KEY, &json)
    }

    /// Moves `city` to the front, replacing any entry equal ignoring case.
    pub fn insert(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }

        self.entries.retain(|e| !same_city(e, city));
        self.entries.insert(0, city.to_string());
        self.entries.truncate(MAX_RECENT_SEARCHES);
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, city: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !same_city(e, city));
        self.entries.len() != before
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
