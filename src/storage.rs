//! Key-value persistence: the whole note collection lives under one key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

pub const NOTES_KEY: &str = "notes";
pub const THEME_KEY: &str = "theme";
pub const SETTINGS_KEY: &str = "settings";
/// Where an unreadable `notes` blob is parked before starting fresh.
pub const CORRUPT_NOTES_KEY: &str = "notes.corrupt";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write `{key}`: {reason}")]
    Write { key: String, reason: String },
    #[error("`{key}` holds malformed data")]
    Corrupt {
        key: String,
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize `{key}`")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous string store; no transactions, last writer wins.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn read_json<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.read(key)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            raw,
            source,
        })
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &mut impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_through_store() {
        let mut store = MemoryStore::new();
        write_json(&mut store, "list", &vec![1, 2, 3]).unwrap();
        assert_eq!(store.get("list"), Some("[1,2,3]"));
        let back: Option<Vec<i32>> = read_json(&store, "list").unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn missing_and_blank_keys_read_as_none() {
        let store = MemoryStore::new().with_entry("blank", "  ");
        assert!(read_json::<Vec<i32>>(&store, "missing").unwrap().is_none());
        assert!(read_json::<Vec<i32>>(&store, "blank").unwrap().is_none());
    }

    #[test]
    fn malformed_json_keeps_raw_text() {
        let store = MemoryStore::new().with_entry("notes", "[{oops");
        match read_json::<Vec<i32>>(&store, "notes") {
            Err(StorageError::Corrupt { key, raw, .. }) => {
                assert_eq!(key, "notes");
                assert_eq!(raw, "[{oops");
            }
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }
}
