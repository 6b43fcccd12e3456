use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Linear undo/redo log of whole-document snapshots.
///
/// The cursor always points at the snapshot that matches the live document.
/// Adding after an undo drops the redo branch; once the log is full the
/// oldest snapshot is evicted from the front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryStack {
    entries: VecDeque<String>,
    cursor: usize,
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStack {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn new(initial: impl Into<String>, limit: usize) -> Self {
        let mut stack = Self::with_limit(limit);
        stack.reset(initial);
        stack
    }

    pub fn add(&mut self, snapshot: impl Into<String>) {
        let snapshot = snapshot.into();
        if self.entries.is_empty() {
            self.entries.push_back(snapshot);
            self.cursor = 0;
            return;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        if self.entries.len() > self.limit {
            // Dropping the front shifts everything left by one, so the
            // unchanged cursor lands on the snapshot just pushed.
            self.entries.pop_front();
        } else {
            self.cursor += 1;
        }
    }

    /// Adds `snapshot` only when it differs from the current entry.
    pub fn record(&mut self, snapshot: &str) -> bool {
        if self.current() == Some(snapshot) {
            return false;
        }
        self.add(snapshot);
        true
    }

    pub fn undo(&mut self) -> Option<&str> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn redo(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn reset(&mut self, initial: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(initial.into());
        self.cursor = 0;
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut history = HistoryStack::new("", 50);
        history.add("a");
        history.add("ab");

        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.undo(), Some(""));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some("a"));
        assert_eq!(history.redo(), Some("ab"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn add_after_undo_discards_redo_branch() {
        let mut history = HistoryStack::new("", 50);
        history.add("one");
        history.add("two");
        history.undo();
        history.add("three");

        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some("three"));
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo(), Some("one"));
    }

    #[test]
    fn eviction_keeps_cursor_on_newest_entry() {
        let mut history = HistoryStack::new("0", 3);
        history.add("1");
        history.add("2");
        history.add("3");

        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.current(), Some("3"));
        assert_eq!(history.undo(), Some("2"));
        assert_eq!(history.undo(), Some("1"));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn add_on_empty_stack_starts_at_zero() {
        let mut history = HistoryStack::default();
        assert!(history.is_empty());
        assert_eq!(history.undo(), None);

        history.add("first");
        assert_eq!(history.current_index(), 0);
        assert_eq!(history.current(), Some("first"));
    }

    #[test]
    fn record_skips_duplicates() {
        let mut history = HistoryStack::new("same", 50);
        assert!(!history.record("same"));
        assert!(history.record("changed"));
        assert_eq!(history.len(), 2);
    }

    proptest! {
        #[test]
        fn length_never_exceeds_limit(limit in 1usize..20, adds in 0usize..80) {
            let mut history = HistoryStack::new("init", limit);
            for i in 0..adds {
                history.add(i.to_string());
                prop_assert!(history.len() <= limit);
                prop_assert!(history.current_index() < history.len());
            }
        }

        #[test]
        fn undo_then_redo_round_trips(adds in 1usize..40, undos in 0usize..40) {
            let mut history = HistoryStack::new("init", DEFAULT_HISTORY_LIMIT);
            for i in 0..adds {
                history.add(format!("s{i}"));
            }
            for _ in 0..undos {
                history.undo();
            }
            let before = history.current().map(str::to_owned);
            if history.undo().is_some() {
                prop_assert_eq!(history.redo().map(str::to_owned), before);
            } else {
                prop_assert_eq!(history.current().map(str::to_owned), before);
            }
        }

        #[test]
        fn redo_is_unreachable_after_new_add(adds in 2usize..30, undos in 1usize..30) {
            let mut history = HistoryStack::new("init", DEFAULT_HISTORY_LIMIT);
            for i in 0..adds {
                history.add(format!("s{i}"));
            }
            for _ in 0..undos {
                history.undo();
            }
            history.add("fresh");
            prop_assert!(!history.can_redo());
            prop_assert_eq!(history.redo(), None);
        }

        #[test]
        fn reset_leaves_single_entry(adds in 0usize..60, seed in "[a-z]{0,8}") {
            let mut history = HistoryStack::new("init", DEFAULT_HISTORY_LIMIT);
            for i in 0..adds {
                history.add(i.to_string());
            }
            history.reset(seed.clone());
            prop_assert_eq!(history.len(), 1);
            prop_assert_eq!(history.current_index(), 0);
            prop_assert_eq!(history.current(), Some(seed.as_str()));
        }
    }
}
