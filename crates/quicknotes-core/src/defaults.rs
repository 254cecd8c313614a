//! Centralized default constants for QuickNotes.
//!
//! **This module is the single source of truth** for limits and defaults.
//! The admission limits are fixed product rules, not configuration.

// =============================================================================
// ADMISSION LIMITS
// =============================================================================

/// Maximum notes a user may create per local calendar day.
pub const DAILY_NOTE_LIMIT: u32 = 10;

/// Maximum number of notes open as tabs at once.
pub const MAX_OPEN_TABS: usize = 10;

// =============================================================================
// EDITOR
// =============================================================================

/// Maximum content snapshots kept in a note's undo history.
pub const UNDO_DEPTH: usize = 50;

/// Title shown for notes whose title was cleared.
pub const UNTITLED_PLACEHOLDER: &str = "Untitled";

/// Prefix of the title stamped on newly created notes.
pub const NEW_NOTE_TITLE_PREFIX: &str = "Note";

// =============================================================================
// EVENTS
// =============================================================================

/// Broadcast buffer for the session event bus.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// BACKEND
// =============================================================================

/// Default HTTP timeout for backend requests.
pub const BACKEND_TIMEOUT_SECS: u64 = 30;

/// Table holding note rows.
pub const NOTES_TABLE: &str = "notes";
