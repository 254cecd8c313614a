//! In-process backend and auth provider for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quicknotes_backend::memory::MemoryBackend;
//!
//! let backend = MemoryBackend::new().with_daily_count("user-1", 9);
//! let note = backend.create_note("user-1", NewNote::default()).await?;
//! assert_eq!(backend.count_notes_created_today("user-1").await?, 10);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Local, Utc};
use uuid::Uuid;

use quicknotes_core::models::default_title;
use quicknotes_core::temporal::today_start;
use quicknotes_core::{
    AuthProvider, Error, EventBus, NewNote, Note, NoteBackend, NoteId, NoteUpdate, Result,
    SessionEvent, UserProfile,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCall {
    pub operation: &'static str,
    pub target: String,
}

#[derive(Default)]
struct State {
    notes: Vec<Note>,
    /// Creations attributed to today that are not in `notes`.
    extra_today: HashMap<String, u32>,
    fail_writes: bool,
    offline: bool,
    calls: Vec<MemoryCall>,
}

/// Note backend holding rows in memory.
///
/// Clones share the same rows, so a test can keep a handle for inspection
/// after moving one into a session.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed existing rows.
    pub fn with_notes(self, notes: impl IntoIterator<Item = Note>) -> Self {
        self.lock().notes.extend(notes);
        self
    }

    /// Pretend `user_id` already created `count` notes today.
    pub fn with_daily_count(self, user_id: &str, count: u32) -> Self {
        self.lock().extra_today.insert(user_id.to_string(), count);
        self
    }

    /// Make create/update/delete answer with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Current rows, in storage order.
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.lock().notes.iter().find(|n| &n.id == id).cloned()
    }

    pub fn calls(&self) -> Vec<MemoryCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of `operation`.
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and apply the failure toggles.
    fn enter(&self, operation: &'static str, target: &str, write: bool) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(MemoryCall {
            operation,
            target: target.to_string(),
        });
        if state.offline {
            return Err(Error::Request("connection refused".to_string()));
        }
        if write && state.fail_writes {
            return Err(Error::Backend(format!("500: {} rejected", operation)));
        }
        Ok(state)
    }
}

#[async_trait]
impl NoteBackend for MemoryBackend {
    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let state = self.enter("fetch_notes", user_id, false)?;
        let mut notes: Vec<Note> = state
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn create_note(&self, user_id: &str, note: NewNote) -> Result<Note> {
        let mut state = self.enter("create_note", user_id, true)?;
        let now = Local::now();
        let created = Note {
            id: NoteId::new(Uuid::now_v7().to_string()),
            user_id: user_id.to_string(),
            title: note.title.unwrap_or_else(|| default_title(&now)),
            content: note.content,
            created_at: now.with_timezone(&Utc),
            updated_at: now.with_timezone(&Utc),
        };
        state.notes.push(created.clone());
        Ok(created)
    }

    async fn update_note(&self, id: &NoteId, update: NoteUpdate) -> Result<Note> {
        let mut state = self.enter("update_note", id.as_str(), true)?;
        let note = state
            .notes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| Error::NoteNotFound(id.clone()))?;
        update.apply_to(note);
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let mut state = self.enter("delete_note", id.as_str(), true)?;
        state.notes.retain(|n| &n.id != id);
        Ok(())
    }

    async fn count_notes_created_today(&self, user_id: &str) -> Result<u32> {
        let state = self.enter("count_notes_created_today", user_id, false)?;
        let since = today_start(&Local::now());
        let stored = state
            .notes
            .iter()
            .filter(|n| n.user_id == user_id && n.created_at >= since)
            .count() as u32;
        Ok(stored + state.extra_today.get(user_id).copied().unwrap_or(0))
    }
}

#[derive(Default)]
struct AuthState {
    /// email -> (password, profile)
    accounts: HashMap<String, (String, UserProfile)>,
    current: Option<UserProfile>,
    offline: bool,
}

/// Auth provider backed by an in-memory account table.
#[derive(Clone)]
pub struct MemoryAuth {
    state: Arc<Mutex<AuthState>>,
    events: EventBus,
}

impl MemoryAuth {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(AuthState::default())),
            events,
        }
    }

    /// Register an account without signing in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        let profile = UserProfile {
            id: format!("user-{}", email),
            email: email.to_string(),
        };
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), profile));
        self
    }

    /// Start with `user` already signed in (a restored session).
    pub fn with_signed_in(self, user: UserProfile) -> Self {
        self.lock().current = Some(user);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Expire the session from the server side.
    pub fn expire_session(&self) {
        if self.lock().current.take().is_some() {
            self.events.emit(SessionEvent::SignedOut);
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn online(&self) -> Result<MutexGuard<'_, AuthState>> {
        let state = self.lock();
        if state.offline {
            return Err(Error::Request("connection refused".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn current_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.online()?.current.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        let user = {
            let mut state = self.online()?;
            let user = match state.accounts.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => return Err(Error::Unauthorized("Invalid login credentials".to_string())),
            };
            state.current = Some(user.clone());
            user
        };
        self.events.emit(SessionEvent::SignedIn { user: user.clone() });
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserProfile> {
        {
            let mut state = self.online()?;
            if state.accounts.contains_key(email) {
                return Err(Error::Backend("422: User already registered".to_string()));
            }
            let profile = UserProfile {
                id: format!("user-{}", email),
                email: email.to_string(),
            };
            state
                .accounts
                .insert(email.to_string(), (password.to_string(), profile));
        }
        self.sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        if self.lock().current.take().is_some() {
            self.events.emit(SessionEvent::SignedOut);
        }
        Ok(())
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}
