//! Local copy of the user's notes.

use quicknotes_core::{Error, Note, NoteId, NoteUpdate, Result};

/// The user's notes as last loaded, most recent first.
///
/// Edits are applied here before they reach the backend, so this is what
/// the UI renders.
#[derive(Debug, Clone, Default)]
pub struct NoteRegistry {
    notes: Vec<Note>,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every note with a fresh load.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    /// Insert a newly created note at the head.
    pub fn insert_front(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Merge `update` into the note with `id`.
    pub fn apply(&mut self, id: &NoteId, update: &NoteUpdate) -> Result<&Note> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| Error::NoteNotFound(id.clone()))?;
        update.apply_to(note);
        Ok(note)
    }

    pub fn remove(&mut self, id: &NoteId) -> Option<Note> {
        let pos = self.notes.iter().position(|n| &n.id == id)?;
        Some(self.notes.remove(pos))
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}
