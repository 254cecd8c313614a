//! Editor pane state for the active note.

use quicknotes_core::models::normalize_title;
use quicknotes_core::{Note, NoteId, NoteUpdate};

use crate::undo::UndoBuffer;

/// Character and line counts shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorStats {
    pub chars: usize,
    pub lines: usize,
}

impl EditorStats {
    pub fn of(content: &str) -> Self {
        Self {
            chars: content.chars().count(),
            lines: content.matches('\n').count() + 1,
        }
    }
}

/// Content being edited plus its undo history.
///
/// Produces the [`NoteUpdate`]s the session persists; it never talks to the
/// backend itself.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    note_id: Option<NoteId>,
    content: String,
    history: UndoBuffer,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target `note`, discarding the previous note's history.
    pub fn load(&mut self, note: &Note) {
        self.note_id = Some(note.id.clone());
        self.content = note.content.clone();
        self.history.reset(note.content.clone());
    }

    /// Detach from any note.
    pub fn clear(&mut self) {
        self.note_id = None;
        self.content.clear();
        self.history.clear();
    }

    /// Replace the content with `new`.
    ///
    /// Returns `None` when nothing changed. The previous content is recorded
    /// unless it is already the most recent history entry.
    pub fn edit(&mut self, new: &str) -> Option<NoteUpdate> {
        self.note_id.as_ref()?;
        if new == self.content {
            return None;
        }
        let previous = std::mem::replace(&mut self.content, new.to_string());
        if self.history.peek() != Some(previous.as_str()) {
            self.history.record(previous);
        }
        Some(NoteUpdate::content(new))
    }

    /// Restore the most recent history entry.
    pub fn undo(&mut self) -> Option<NoteUpdate> {
        self.note_id.as_ref()?;
        let restored = self.history.undo()?;
        self.content = restored.clone();
        Some(NoteUpdate::content(restored))
    }

    /// Title update for the loaded note; blank titles become the placeholder.
    pub fn rename(&self, title: &str) -> Option<NoteUpdate> {
        self.note_id.as_ref()?;
        Some(NoteUpdate {
            title: Some(normalize_title(title)),
            content: None,
        })
    }

    /// Follow a content change made outside the editor without recording it.
    pub fn adopt(&mut self, content: &str) {
        self.content = content.to_string();
    }

    pub fn note_id(&self) -> Option<&NoteId> {
        self.note_id.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn can_undo(&self) -> bool {
        self.note_id.is_some() && self.history.can_undo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn stats(&self) -> EditorStats {
        EditorStats::of(&self.content)
    }
}
