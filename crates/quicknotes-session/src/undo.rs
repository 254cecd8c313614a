//! Bounded undo history for the active editor.

use std::collections::VecDeque;

use quicknotes_core::defaults::UNDO_DEPTH;

/// Prior content strings of one note, most recent last.
///
/// Holds at most `capacity` entries; recording past the cap silently drops
/// the oldest. There is no redo: an undone value is handed back to the
/// caller and not recorded again.
#[derive(Debug, Clone)]
pub struct UndoBuffer {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for UndoBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self::with_capacity(UNDO_DEPTH)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(UNDO_DEPTH)),
            capacity: capacity.max(1),
        }
    }

    /// Push `previous`, evicting the oldest entry on overflow.
    pub fn record(&mut self, previous: impl Into<String>) {
        self.entries.push_back(previous.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Pop the most recently recorded entry.
    pub fn undo(&mut self) -> Option<String> {
        self.entries.pop_back()
    }

    /// Clear and seed with `initial`.
    ///
    /// The seed is an ordinary entry: after `reset("a"); record("b")` the
    /// first `undo` yields `"b"` and the second `"a"`. Editors that record
    /// the content being replaced should skip the record when it equals
    /// [`peek`](Self::peek), as [`EditorState`](crate::EditorState) does, so
    /// that undoing the first edit lands on the seed.
    pub fn reset(&mut self, initial: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(initial.into());
    }

    /// Most recent entry without removing it.
    pub fn peek(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
