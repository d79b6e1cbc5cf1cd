//! Bounded ordered log of completed and abandoned matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of entries retained by the ledger.
pub const DEFAULT_HISTORY_CAPACITY: usize = 8;

/// One immutable record of a finished match's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Display name of the first participant (the original first-mover)
    pub player1: String,
    /// Display name of the second participant
    pub player2: String,
    /// Winner's display name, or `None` for a draw
    pub winner: Option<String>,
    /// When the match ended
    pub date: DateTime<Utc>,
    /// Whether the match ended by abandonment rather than on the board
    #[serde(default)]
    pub abandoned: bool,
}

/// Bounded ordered sequence of history entries, most-recent-first.
///
/// Never exceeds its capacity; pushing past capacity evicts the oldest
/// entry from the back.
#[derive(Debug)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLedger {
    /// Creates an empty ledger retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Appends `entry` at the front, evicting the oldest entry past capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Returns the entries, newest at position 0.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
