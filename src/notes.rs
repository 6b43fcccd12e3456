//! Note records and the repository that keeps them in sync with storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

use crate::html;
use crate::storage::{self, KeyValueStore, StorageError, CORRUPT_NOTES_KEY, NOTES_KEY};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn plain_text(&self) -> String {
        html::plain_text(&self.content)
    }

    pub fn summary(&self, preview_chars: usize, untitled: &str) -> NoteSummary {
        let title = if self.title.is_empty() {
            untitled.to_string()
        } else {
            self.title.clone()
        };
        NoteSummary {
            id: self.id.clone(),
            title,
            preview: self.plain_text().chars().take(preview_chars).collect(),
            pinned: self.pinned,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.plain_text().to_lowercase().contains(needle)
    }
}

/// What the note list shows for one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub preview: String,
    pub pinned: bool,
}

/// Pinned notes first, then most recently updated.
pub fn sort_for_display(notes: &mut [&Note]) {
    notes.sort_by_key(|note| (Reverse(note.pinned), Reverse(note.updated_at)));
}

pub struct NoteRepository<K> {
    store: K,
    notes: Vec<Note>,
}

impl<K: KeyValueStore> NoteRepository<K> {
    /// Loads the collection. A malformed blob is moved aside so the
    /// collection can start empty without destroying it.
    pub fn open(mut store: K) -> Self {
        let notes = match storage::read_json::<Vec<Note>>(&store, NOTES_KEY) {
            Ok(notes) => notes.unwrap_or_default(),
            Err(StorageError::Corrupt { raw, source, .. }) => {
                tracing::warn!(%source, "note collection unreadable, starting empty");
                if let Err(err) = store.write(CORRUPT_NOTES_KEY, &raw) {
                    tracing::error!(%err, "could not preserve unreadable notes");
                }
                Vec::new()
            }
            Err(err) => {
                tracing::error!(%err, "note collection unavailable, starting empty");
                Vec::new()
            }
        };
        tracing::debug!(count = notes.len(), "notes loaded");
        Self { store, notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    /// Ids derive from the creation time in milliseconds, bumped until unused.
    fn fresh_id(&self, now: DateTime<Utc>) -> NoteId {
        let mut millis = now.timestamp_millis();
        loop {
            let candidate = NoteId::new(millis.to_string());
            if self.get(&candidate).is_none() {
                return candidate;
            }
            millis += 1;
        }
    }

    /// Appends a blank note. The note is kept in memory even if the write
    /// fails.
    pub fn create(&mut self, title: &str, now: DateTime<Utc>) -> (NoteId, Result<(), StorageError>) {
        let id = self.fresh_id(now);
        self.notes.push(Note {
            id: id.clone(),
            title: title.to_string(),
            content: String::new(),
            pinned: false,
            updated_at: now,
        });
        tracing::info!(%id, "note created");
        (id, self.persist())
    }

    /// Stores new title and content and refreshes `updated_at`.
    pub fn update(
        &mut self,
        id: &NoteId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let note = &mut self.notes[idx];
        note.title = title.to_string();
        note.content = content.to_string();
        note.updated_at = now;
        self.persist()?;
        Ok(true)
    }

    pub fn toggle_pin(&mut self, id: &NoteId) -> Result<Option<bool>, StorageError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        let pinned = !self.notes[idx].pinned;
        self.notes[idx].pinned = pinned;
        self.persist()?;
        Ok(Some(pinned))
    }

    pub fn delete(&mut self, id: &NoteId) -> Result<bool, StorageError> {
        let before = self.notes.len();
        self.notes.retain(|note| &note.id != id);
        if self.notes.len() == before {
            return Ok(false);
        }
        tracing::info!(%id, "note deleted");
        self.persist()?;
        Ok(true)
    }

    pub fn sorted(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        sort_for_display(&mut notes);
        notes
    }

    /// Case-insensitive match on title or rendered text, in display order.
    pub fn search(&self, term: &str) -> Vec<&Note> {
        let needle = term.trim().to_lowercase();
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| needle.is_empty() || note.matches(&needle))
            .collect();
        sort_for_display(&mut notes);
        notes
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        storage::write_json(&mut self.store, NOTES_KEY, &self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut repo = NoteRepository::open(MemoryStore::new());
        let (a, _) = repo.create("a", at(1000));
        let (b, _) = repo.create("b", at(1000));
        let (c, _) = repo.create("c", at(1001));
        assert_eq!(a.as_str(), "1000");
        assert_eq!(b.as_str(), "1001");
        assert_eq!(c.as_str(), "1002");
    }

    #[test]
    fn mutations_are_written_through() {
        let mut repo = NoteRepository::open(MemoryStore::new());
        let (id, result) = repo.create("Draft", at(5));
        result.unwrap();
        repo.update(&id, "Final", "<b>x</b>", at(9)).unwrap();
        repo.toggle_pin(&id).unwrap();

        let reopened = NoteRepository::open(repo.store().clone());
        let note = reopened.get(&id).unwrap();
        assert_eq!(note.title, "Final");
        assert_eq!(note.content, "<b>x</b>");
        assert!(note.pinned);
        assert_eq!(note.updated_at, at(9));
    }

    #[test]
    fn reads_records_written_by_browsers() {
        let raw = r#"[{"id":"1700000000000","title":"Hi","content":"x","pinned":true,"updatedAt":"2023-11-14T22:13:20.000Z"}]"#;
        let repo = NoteRepository::open(MemoryStore::new().with_entry(NOTES_KEY, raw));
        let note = repo.get(&NoteId::new("1700000000000")).unwrap();
        assert!(note.pinned);
        assert_eq!(note.updated_at, at(1_700_000_000_000));
    }

    #[test]
    fn corrupt_collection_is_set_aside() {
        let repo = NoteRepository::open(MemoryStore::new().with_entry(NOTES_KEY, "{broken"));
        assert!(repo.is_empty());
        assert_eq!(repo.store().get(CORRUPT_NOTES_KEY), Some("{broken"));
    }

    #[test]
    fn pinned_first_then_most_recent() {
        let mut repo = NoteRepository::open(MemoryStore::new());
        let (old, _) = repo.create("old", at(1));
        let (mid, _) = repo.create("mid", at(2));
        let (new, _) = repo.create("new", at(3));
        repo.toggle_pin(&old).unwrap();

        let order: Vec<&str> = repo.sorted().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(order, ["old", "new", "mid"]);
        assert!(repo.delete(&mid).unwrap());
        assert!(!repo.delete(&mid).unwrap());
        assert_eq!(repo.len(), 2);
        assert!(repo.get(&new).is_some());
    }

    #[test]
    fn search_matches_title_or_text_not_markup() {
        let mut repo = NoteRepository::open(MemoryStore::new());
        let (a, _) = repo.create("Groceries", at(1));
        let (b, _) = repo.create("Work", at(2));
        repo.update(&a, "Groceries", "milk", at(3)).unwrap();
        repo.update(&b, "Work", "<b>Deadline</b> friday", at(4)).unwrap();

        let titles = |term: &str| -> Vec<String> {
            repo.search(term).iter().map(|n| n.title.clone()).collect()
        };
        assert_eq!(titles("GROC"), ["Groceries"]);
        assert_eq!(titles("deadline"), ["Work"]);
        assert!(titles("<b>").is_empty());
        assert_eq!(titles("").len(), 2);
    }

    #[test]
    fn summary_previews_plain_text() {
        let note = Note {
            id: NoteId::new("1"),
            title: String::new(),
            content: "<b>abcdef</b>ghij".into(),
            pinned: false,
            updated_at: at(0),
        };
        let summary = note.summary(8, "Untitled");
        assert_eq!(summary.title, "Untitled");
        assert_eq!(summary.preview, "abcdefgh");
    }
}
