//! Session controller: the single owner of a signed-in user's UI state.
//!
//! Every mutation goes through [`Session`], which keeps the registry, the
//! tab strip, the editor and the daily counter consistent with each other
//! and publishes each transition on the [`EventBus`].

use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use quicknotes_core::temporal::MonthGrid;
use quicknotes_core::{
    AdmissionDenied, Error, EventBus, NewNote, Note, NoteBackend, NoteFilter, NoteId, NoteUpdate,
    Result, SessionEvent, UserProfile,
};

use crate::admission::{check_create, DailyCounter};
use crate::editor::{EditorState, EditorStats};
use crate::registry::NoteRegistry;
use crate::tabs::{OpenTabs, TabState};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Handle to an in-flight persistence call.
///
/// Dropping it leaves the write running in the background.
#[derive(Debug)]
pub struct PendingWrite {
    note_id: NoteId,
    handle: JoinHandle<Result<Note>>,
}

impl PendingWrite {
    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the backend's answer.
    pub async fn wait(self) -> Result<Note> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(Error::Internal(format!("persistence task failed: {}", e))),
        }
    }
}

/// Editing session of one signed-in user.
pub struct Session {
    user: UserProfile,
    backend: Arc<dyn NoteBackend>,
    events: EventBus,
    registry: NoteRegistry,
    tabs: OpenTabs,
    editor: EditorState,
    daily: DailyCounter,
}

impl Session {
    /// Create an empty session; call [`refresh`](Self::refresh) to load notes.
    pub fn new(user: UserProfile, backend: Arc<dyn NoteBackend>, events: EventBus) -> Self {
        Self {
            user,
            backend,
            events,
            registry: NoteRegistry::new(),
            tabs: OpenTabs::new(),
            editor: EditorState::new(),
            daily: DailyCounter::new(0, today()),
        }
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Reload notes and today's creation count from the backend.
    ///
    /// Tabs whose notes no longer exist are closed. On failure nothing local
    /// changes.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn refresh(&mut self) -> Result<()> {
        let (notes, daily_count) = tokio::try_join!(
            self.backend.fetch_notes(&self.user.id),
            self.backend.count_notes_created_today(&self.user.id),
        )
        .map_err(|e| {
            warn!(error = %e, "Failed to load notes");
            e
        })?;

        let count = notes.len();
        self.registry.replace_all(notes);
        self.daily = DailyCounter::new(daily_count, today());

        let registry = &self.registry;
        let before = self.tabs.active().cloned();
        for id in self.tabs.retain(|id| registry.contains(id)) {
            debug!(note_id = %id, "Closing tab of vanished note");
            self.events.emit(SessionEvent::NoteClosed { note_id: id });
        }
        self.after_tab_change(before);

        // Same active note, newer content from the backend.
        if let Some(note) = self.editor.note_id().and_then(|id| self.registry.get(id)) {
            if note.content != self.editor.content() {
                debug!(note_id = %note.id, "Reloading editor with refreshed content");
                self.editor.load(note);
            }
        }

        info!(result_count = count, daily_count, "Notes loaded");
        self.events.emit(SessionEvent::NotesLoaded { count, daily_count });
        Ok(())
    }

    // =========================================================================
    // TABS
    // =========================================================================

    /// Open `id` as a tab and make it active.
    ///
    /// Already-open notes are only activated. A new tab beyond the limit is
    /// refused with [`AdmissionDenied::TabLimitExceeded`] and nothing changes.
    #[instrument(skip(self), fields(note_id = %id))]
    pub fn open_note(&mut self, id: &NoteId) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(Error::NoteNotFound(id.clone()));
        }

        let before = self.tabs.active().cloned();
        match self.tabs.open(id) {
            Ok(true) => {
                debug!(open_tabs = self.tabs.len(), "Opened tab");
                self.events.emit(SessionEvent::NoteOpened {
                    note_id: id.clone(),
                });
            }
            Ok(false) => debug!("Tab already open"),
            Err(denied) => return Err(self.deny(denied)),
        }
        self.after_tab_change(before);
        Ok(())
    }

    /// Close the tab of `id`; closing a note that is not open does nothing.
    #[instrument(skip(self), fields(note_id = %id))]
    pub fn close_note(&mut self, id: &NoteId) {
        let before = self.tabs.active().cloned();
        if !self.tabs.close(id) {
            return;
        }
        debug!(open_tabs = self.tabs.len(), "Closed tab");
        self.events.emit(SessionEvent::NoteClosed {
            note_id: id.clone(),
        });
        self.after_tab_change(before);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Create a note, put it at the head of the registry and open it.
    ///
    /// Refused with [`AdmissionDenied::DailyLimitExceeded`] once today's
    /// allowance is used up. When every tab slot is taken the note is still
    /// created but stays closed; the refusal is published as an event.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn create_note(&mut self) -> Result<NoteId> {
        if let Err(denied) = check_create(self.daily_count()) {
            return Err(self.deny(denied));
        }

        let note = self
            .backend
            .create_note(&self.user.id, NewNote::default())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create note");
                e
            })?;

        let id = note.id.clone();
        self.registry.insert_front(note);
        self.daily.increment(today());
        info!(note_id = %id, daily_count = self.daily_count(), "Created note");
        self.events.emit(SessionEvent::NoteCreated {
            note_id: id.clone(),
        });

        if let Err(e) = self.open_note(&id) {
            debug!(error = %e, "New note left closed");
        }
        Ok(id)
    }

    /// Delete `id` at the backend, then drop it locally and close its tab.
    ///
    /// Confirmation is the caller's job.
    #[instrument(skip(self), fields(note_id = %id))]
    pub async fn delete_note(&mut self, id: &NoteId) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(Error::NoteNotFound(id.clone()));
        }

        self.backend.delete_note(id).await.map_err(|e| {
            warn!(error = %e, "Failed to delete note");
            e
        })?;

        self.registry.remove(id);
        self.close_note(id);
        info!("Deleted note");
        self.events.emit(SessionEvent::NoteDeleted {
            note_id: id.clone(),
        });
        Ok(())
    }

    /// Apply `update` locally right away and persist it in the background.
    ///
    /// The local change is kept even if persisting fails; the failure is
    /// logged and published as [`SessionEvent::PersistFailed`].
    #[instrument(skip(self, update), fields(note_id = %id))]
    pub fn update_note(&mut self, id: &NoteId, update: NoteUpdate) -> Result<PendingWrite> {
        self.registry.apply(id, &update)?;
        if self.editor.note_id() == Some(id) {
            if let Some(ref content) = update.content {
                self.editor.adopt(content);
            }
        }
        trace!(
            title = update.title.is_some(),
            content = update.content.is_some(),
            "Applied update locally"
        );
        self.events.emit(SessionEvent::NoteUpdated {
            note_id: id.clone(),
        });

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let note_id = id.clone();
        let handle = tokio::spawn(async move {
            let result = backend.update_note(&note_id, update).await;
            if let Err(ref e) = result {
                error!(note_id = %note_id, error = %e, "Failed to persist note update");
                events.emit(SessionEvent::PersistFailed {
                    note_id: note_id.clone(),
                    error: e.to_string(),
                });
            }
            result
        });

        Ok(PendingWrite {
            note_id: id.clone(),
            handle,
        })
    }

    // =========================================================================
    // EDITOR
    // =========================================================================

    /// Replace the active note's content. `None` when nothing is active or
    /// the content is unchanged.
    pub fn edit_active(&mut self, content: &str) -> Result<Option<PendingWrite>> {
        match (self.tabs.active().cloned(), self.editor.edit(content)) {
            (Some(id), Some(update)) => self.update_note(&id, update).map(Some),
            _ => Ok(None),
        }
    }

    /// Retitle the active note.
    pub fn rename_active(&mut self, title: &str) -> Result<Option<PendingWrite>> {
        match (self.tabs.active().cloned(), self.editor.rename(title)) {
            (Some(id), Some(update)) => self.update_note(&id, update).map(Some),
            _ => Ok(None),
        }
    }

    /// Revert the active note to its previous content and persist that.
    pub fn undo_active(&mut self) -> Result<Option<PendingWrite>> {
        match (self.tabs.active().cloned(), self.editor.undo()) {
            (Some(id), Some(update)) => {
                debug!(note_id = %id, "Undo");
                self.update_note(&id, update).map(Some)
            }
            _ => Ok(None),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// All notes, most recent first.
    pub fn notes(&self) -> &[Note] {
        self.registry.as_slice()
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.registry.get(id)
    }

    pub fn open_tabs(&self) -> &[NoteId] {
        self.tabs.ids()
    }

    /// Open notes in tab order.
    pub fn open_notes(&self) -> Vec<&Note> {
        self.tabs
            .ids()
            .iter()
            .filter_map(|id| self.registry.get(id))
            .collect()
    }

    pub fn active_id(&self) -> Option<&NoteId> {
        self.tabs.active()
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.tabs.active().and_then(|id| self.registry.get(id))
    }

    pub fn tab_state(&self, id: &NoteId) -> TabState {
        self.tabs.state(id)
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn stats(&self) -> Option<EditorStats> {
        self.editor.note_id().map(|_| self.editor.stats())
    }

    /// Notes created today, as far as this session knows.
    pub fn daily_count(&self) -> u32 {
        self.daily.count_on(today())
    }

    /// Creations still allowed today.
    pub fn remaining_today(&self) -> u32 {
        self.daily.remaining_on(today())
    }

    /// Notes matching `filter`, most recent first.
    pub fn filtered<Tz: TimeZone>(&self, filter: &NoteFilter, tz: &Tz) -> Vec<&Note> {
        filter.apply(self.registry.as_slice(), tz)
    }

    /// Calendar page for `year`/`month` marking days with notes.
    pub fn calendar<Tz: TimeZone>(&self, year: i32, month: u32, tz: &Tz) -> Option<MonthGrid> {
        MonthGrid::build(year, month, self.registry.as_slice(), tz)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn deny(&self, denied: AdmissionDenied) -> Error {
        warn!(reason = %denied, "Admission denied");
        self.events
            .emit(SessionEvent::AdmissionDenied { reason: denied });
        Error::Admission(denied)
    }

    /// Publish an active change and point the editor at the active note,
    /// resetting undo history when its identity changed.
    fn after_tab_change(&mut self, before: Option<NoteId>) {
        let active = self.tabs.active().cloned();
        if active != before {
            self.events.emit(SessionEvent::ActiveChanged {
                note_id: active.clone(),
            });
        }
        if self.editor.note_id() == active.as_ref() {
            return;
        }
        match active.as_ref().and_then(|id| self.registry.get(id)) {
            Some(note) => self.editor.load(note),
            None => self.editor.clear(),
        }
    }
}
