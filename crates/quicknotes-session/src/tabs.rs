//! Open tab set and active pointer.

use quicknotes_core::{AdmissionDenied, NoteId};

use crate::admission::check_open;

/// Where a note stands in the tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Closed,
    Open,
    Active,
}

/// Ordered, duplicate-free set of open note ids plus the active one.
///
/// The active id, when set, is always a member of the set, and the set
/// never holds more than the tab limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenTabs {
    ids: Vec<NoteId>,
    active: Option<NoteId>,
}

impl OpenTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `id`, appending it when not yet open.
    ///
    /// Returns whether a new tab was added. A full strip refuses new ids and
    /// is left untouched.
    pub fn open(&mut self, id: &NoteId) -> Result<bool, AdmissionDenied> {
        if self.contains(id) {
            self.active = Some(id.clone());
            return Ok(false);
        }
        check_open(self.ids.len())?;
        self.ids.push(id.clone());
        self.active = Some(id.clone());
        Ok(true)
    }

    /// Remove `id`, returning whether it was open.
    ///
    /// Closing the active tab activates the last remaining tab in insertion
    /// order, or nothing when the strip is empty.
    pub fn close(&mut self, id: &NoteId) -> bool {
        let Some(pos) = self.ids.iter().position(|open| open == id) else {
            return false;
        };
        self.ids.remove(pos);
        if self.active.as_ref() == Some(id) {
            self.active = self.ids.last().cloned();
        }
        true
    }

    /// Drop every tab for which `keep` is false, returning the dropped ids.
    pub fn retain(&mut self, mut keep: impl FnMut(&NoteId) -> bool) -> Vec<NoteId> {
        let dropped: Vec<NoteId> = self.ids.iter().filter(|&id| !keep(id)).cloned().collect();
        for id in &dropped {
            self.close(id);
        }
        dropped
    }

    pub fn state(&self, id: &NoteId) -> TabState {
        if self.active.as_ref() == Some(id) {
            TabState::Active
        } else if self.contains(id) {
            TabState::Open
        } else {
            TabState::Closed
        }
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[NoteId] {
        &self.ids
    }

    pub fn active(&self) -> Option<&NoteId> {
        self.active.as_ref()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.active = None;
    }
}
