//! Backend collaborator traits.
//!
//! Persistence and authentication live in an external service. These traits
//! are the whole contract the session depends on, so the HTTP backend and
//! the in-memory test backend are interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::events::EventBus;
use crate::models::{NewNote, Note, NoteId, NoteUpdate, UserProfile};

// =============================================================================
// NOTE BACKEND
// =============================================================================

/// Row-level note persistence for one user's notes.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// All notes owned by `user_id`, most recently updated first.
    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>>;

    /// Create a note; the backend assigns id and timestamps.
    async fn create_note(&self, user_id: &str, note: NewNote) -> Result<Note>;

    /// Apply `update` and stamp a new `updated_at`.
    async fn update_note(&self, id: &NoteId, update: NoteUpdate) -> Result<Note>;

    /// Permanently delete a note.
    async fn delete_note(&self, id: &NoteId) -> Result<()>;

    /// Notes created by `user_id` since local midnight.
    async fn count_notes_created_today(&self, user_id: &str) -> Result<u32>;
}

// =============================================================================
// AUTH PROVIDER
// =============================================================================

/// Authentication state of the backend.
///
/// Implementations publish `SignedIn`/`SignedOut` on the bus returned by
/// [`AuthProvider::events`] whenever the identity changes.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, or `None` when there is no session.
    async fn current_user(&self) -> Result<Option<UserProfile>>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile>;

    /// Register a new account and sign in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserProfile>;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Bus carrying sign-in/sign-out transitions.
    fn events(&self) -> &EventBus;
}
