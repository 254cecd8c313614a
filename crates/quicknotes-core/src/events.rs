//! Session event types, envelope schema, and event bus.
//!
//! The session controller and the auth provider publish every state
//! transition here. View layers subscribe to refresh what they render; the
//! app shell subscribes to follow sign-in and sign-out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AdmissionDenied;
use crate::models::{NoteId, UserProfile};

// ============================================================================
// Event Envelope
// ============================================================================

/// Wrapper carrying metadata around a [`SessionEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g., `"note.opened"`, `"auth.signed_in"`).
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Domain-specific event data.
    pub payload: SessionEvent,
}

impl EventEnvelope {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event.event_type().to_string(),
            occurred_at: Utc::now(),
            payload: event,
        }
    }
}

// ============================================================================
// Session Event (domain payloads)
// ============================================================================

/// Everything a view layer may need to react to.
///
/// Serialized as JSON with a `type` tag field, e.g.
/// `{"type":"NoteOpened","note_id":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A user signed in (or a stored session was restored).
    SignedIn { user: UserProfile },
    /// The user signed out or the session expired.
    SignedOut,
    /// Notes and the daily count were (re)loaded from the backend.
    NotesLoaded { count: usize, daily_count: u32 },
    /// A note was created and inserted at the head of the registry.
    NoteCreated { note_id: NoteId },
    /// A note gained a tab.
    NoteOpened { note_id: NoteId },
    /// A note lost its tab.
    NoteClosed { note_id: NoteId },
    /// The active tab changed (None when no tab remains).
    ActiveChanged { note_id: Option<NoteId> },
    /// Fields were applied to the registry optimistically.
    NoteUpdated { note_id: NoteId },
    /// A note was deleted at the backend and removed locally.
    NoteDeleted { note_id: NoteId },
    /// Persisting an optimistic update failed; local state was kept.
    PersistFailed { note_id: NoteId, error: String },
    /// An admission limit refused an operation.
    AdmissionDenied { reason: AdmissionDenied },
}

impl SessionEvent {
    /// Returns the namespaced event type for the envelope (e.g., `"note.updated"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn { .. } => "auth.signed_in",
            SessionEvent::SignedOut => "auth.signed_out",
            SessionEvent::NotesLoaded { .. } => "notes.loaded",
            SessionEvent::NoteCreated { .. } => "note.created",
            SessionEvent::NoteOpened { .. } => "note.opened",
            SessionEvent::NoteClosed { .. } => "note.closed",
            SessionEvent::ActiveChanged { .. } => "tab.active_changed",
            SessionEvent::NoteUpdated { .. } => "note.updated",
            SessionEvent::NoteDeleted { .. } => "note.deleted",
            SessionEvent::PersistFailed { .. } => "note.persist_failed",
            SessionEvent::AdmissionDenied { .. } => "admission.denied",
        }
    }

    /// Returns the note this event relates to, if any.
    pub fn note_id(&self) -> Option<&NoteId> {
        match self {
            SessionEvent::NoteCreated { note_id }
            | SessionEvent::NoteOpened { note_id }
            | SessionEvent::NoteClosed { note_id }
            | SessionEvent::NoteUpdated { note_id }
            | SessionEvent::NoteDeleted { note_id }
            | SessionEvent::PersistFailed { note_id, .. } => Some(note_id),
            SessionEvent::ActiveChanged { note_id } => note_id.as_ref(),
            SessionEvent::SignedIn { .. }
            | SessionEvent::SignedOut
            | SessionEvent::NotesLoaded { .. }
            | SessionEvent::AdmissionDenied { .. } => None,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast-based event bus.
///
/// Cloning yields another handle onto the same channel. Slow receivers that
/// fall behind get a `Lagged` error and miss events; emitting never blocks.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped when nobody listens.
    pub fn emit(&self, event: SessionEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive enveloped events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
