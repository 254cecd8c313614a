//! Core data models for QuickNotes.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{NEW_NOTE_TITLE_PREFIX, UNTITLED_PLACEHOLDER};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque note identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
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

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// A user-owned plain text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Title to render, substituting the placeholder for blank titles.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_PLACEHOLDER
        } else {
            &self.title
        }
    }
}

/// Request body for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    /// Explicit title; the backend stamps a dated default when absent.
    pub title: Option<String>,
    pub content: String,
}

/// Partial set of note fields to change.
///
/// Only fields that are `Some` are applied locally and sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NoteUpdate {
    /// Update carrying only new content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Update carrying only a new title (blank titles become the placeholder).
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(normalize_title(&title.into())),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Merge the present fields into `note`.
    ///
    /// `updated_at` is left alone; the backend stamps it.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(ref title) = self.title {
            note.title = title.clone();
        }
        if let Some(ref content) = self.content {
            note.content = content.clone();
        }
    }
}

/// Replace a blank title with the placeholder.
pub fn normalize_title(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED_PLACEHOLDER.to_string()
    } else {
        title.to_string()
    }
}

/// Title stamped on notes created without one, e.g. `Note 3/14/2026 9:05:00 AM`.
pub fn default_title<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{} {}",
        NEW_NOTE_TITLE_PREFIX,
        now.format("%-m/%-d/%Y %-I:%M:%S %p")
    )
}

// =============================================================================
// USERS
// =============================================================================

/// The authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: String,
}
