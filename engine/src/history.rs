//! Linear undo/redo history.
//!
//! Entries form one sequence split by a cursor: the first `done` entries
//! have been applied, the rest have been undone. Committing while entries
//! are undone discards them. The sequence is bounded; once over capacity the
//! oldest entry is evicted and the cursor shifts with it.
//!
//! The history never moves on its own. The engine moves the cursor only
//! after the document-editing service has accepted the matching undo/redo.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::HISTORY_CAPACITY;
use crate::doc::NodeId;
use crate::geometry::{Field, Geometry};

/// What a history entry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Position,
    Size,
}

impl EntryKind {
    /// Attributes an entry of this kind restores.
    #[must_use]
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::Position => &Field::EDGES,
            Self::Size => &Field::ALL,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Size => "Size",
        }
    }
}

/// One committed transition. `None` fields were absent, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub element: NodeId,
    pub md_index: u32,
    pub before: Geometry,
    pub after: Geometry,
}

/// Bounded linear history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    done: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding at most `capacity` entries (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: VecDeque::new(), done: 0, capacity: capacity.max(1) }
    }

    /// Record a new entry, discarding any undone tail and evicting the
    /// oldest entry when over capacity.
    pub fn commit(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.done);
        self.entries.push_back(entry);
        self.done += 1;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.done -= 1;
        }
    }

    /// The entry an undo would revert.
    #[must_use]
    pub fn next_undo(&self) -> Option<&HistoryEntry> {
        self.done.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// The entry a redo would re-apply.
    #[must_use]
    pub fn next_redo(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.done)
    }

    /// Move the cursor back one entry. Returns false at the start.
    pub fn step_back(&mut self) -> bool {
        if self.done == 0 {
            return false;
        }
        self.done -= 1;
        true
    }

    /// Move the cursor forward one entry. Returns false at the tail.
    pub fn step_forward(&mut self) -> bool {
        if self.done >= self.entries.len() {
            return false;
        }
        self.done += 1;
        true
    }

    /// Index of the last applied entry, `None` when nothing is applied.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.done.checked_sub(1)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.done > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.done < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// `done/total`, e.g. `2/5`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}/{}", self.done, self.entries.len())
    }
}
