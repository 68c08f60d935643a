//! Short, newest-first activity log shown next to the network

use std::{
    collections::VecDeque,
    fmt::{self, Display},
};

use chrono::{DateTime, Local};

/// Number of entries kept by a [`Journal`]
pub const JOURNAL_CAPACITY: usize = 6;

/// A timestamped log line
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Ring buffer of the most recent [`JOURNAL_CAPACITY`] entries
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: VecDeque<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(JOURNAL_CAPACITY + 1),
        }
    }

    /// Records `message` as the newest entry, evicting the oldest one when full
    pub fn push(&mut self, message: impl Into<String>) {
        let entry = JournalEntry {
            timestamp: Local::now(),
            message: message.into(),
        };
        log::debug!("journal: {}", entry.message);
        self.entries.push_front(entry);
        self.entries.truncate(JOURNAL_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&JournalEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut journal = Journal::new();
        journal.push("a");
        journal.push("b");
        let messages: Vec<_> = journal.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["b", "a"]);
        assert_eq!(journal.latest().unwrap().message, "b");
    }

    #[test]
    fn test_bounded() {
        let mut journal = Journal::new();
        for i in 0..20 {
            journal.push(format!("entry {}", i));
            assert!(journal.len() <= JOURNAL_CAPACITY);
        }
        assert_eq!(journal.len(), JOURNAL_CAPACITY);
        let messages: Vec<_> = journal.iter().map(|e| e.message.clone()).collect();
        let expected: Vec<_> = (14..20).rev().map(|i| format!("entry {}", i)).collect();
        assert_eq!(messages, expected);

        // timestamps never go backwards towards the front
        let stamps: Vec<_> = journal.iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_display_and_clear() {
        let mut journal = Journal::new();
        journal.push("applied updates");
        let line = journal.latest().unwrap().to_string();
        assert!(line.ends_with(" - applied updates"));
        // HH:MM:SS prefix
        assert_eq!(line.find(" - "), Some(8));

        journal.clear();
        assert!(journal.is_empty());
    }
}
