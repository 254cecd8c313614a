//! End-to-end behavior of the session controller over the in-memory backend.

use std::sync::Arc;

use chrono::{FixedOffset, Local, TimeZone, Utc};
use quicknotes_backend::memory::MemoryBackend;
use quicknotes_core::{
    AdmissionDenied, Error, EventBus, EventEnvelope, Note, NoteFilter, NoteId, NoteUpdate,
    SessionEvent, UserProfile,
};
use quicknotes_session::{Session, TabState};
use tokio::sync::broadcast::Receiver;

const USER: &str = "user-1";

fn user() -> UserProfile {
    UserProfile {
        id: USER.to_string(),
        email: "ada@example.com".to_string(),
    }
}

/// A note created two days ago (outside today's allowance) and last edited
/// `minutes_ago`.
fn note(id: &str, minutes_ago: i64) -> Note {
    let now = Utc::now();
    Note {
        id: NoteId::from(id),
        user_id: USER.to_string(),
        title: format!("Title {}", id),
        content: format!("content of {}", id),
        created_at: now - chrono::Duration::days(2),
        updated_at: now - chrono::Duration::minutes(minutes_ago),
    }
}

fn id(s: &str) -> NoteId {
    NoteId::from(s)
}

async fn session_with(backend: &MemoryBackend) -> Session {
    let mut session = Session::new(user(), Arc::new(backend.clone()), EventBus::default());
    session.refresh().await.unwrap();
    session
}

fn drain(rx: &mut Receiver<EventEnvelope>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.payload);
    }
    events
}

fn seeded(count: usize) -> MemoryBackend {
    MemoryBackend::new().with_notes((0..count).map(|i| note(&format!("n{}", i), i as i64 + 1)))
}

// =============================================================================
// LOADING
// =============================================================================

#[tokio::test]
async fn test_refresh_loads_most_recent_first() {
    let backend = MemoryBackend::new().with_notes(vec![note("old", 30), note("new", 1)]);
    let session = session_with(&backend).await;

    let ids: Vec<&str> = session.notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert!(session.open_tabs().is_empty());
    assert!(session.active_note().is_none());
}

#[tokio::test]
async fn test_refresh_reads_daily_count() {
    let backend = MemoryBackend::new().with_daily_count(USER, 7);
    let session = session_with(&backend).await;
    assert_eq!(session.daily_count(), 7);
    assert_eq!(session.remaining_today(), 3);
}

#[tokio::test]
async fn test_refresh_prunes_tabs_of_deleted_notes() {
    let backend = seeded(3);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.open_note(&id("n1")).unwrap();

    // Deleted from another device.
    {
        let mut remote = session_with(&backend).await;
        remote.delete_note(&id("n1")).await.unwrap();
    }

    session.refresh().await.unwrap();
    assert_eq!(session.open_tabs(), &[id("n0")]);
    assert_eq!(session.active_id(), Some(&id("n0")));
    assert_eq!(session.editor().note_id(), Some(&id("n0")));
}

#[tokio::test]
async fn test_refresh_reloads_editor_with_newer_content() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.edit_active("old").unwrap().unwrap().wait().await.unwrap();
    session.edit_active("older").unwrap().unwrap().wait().await.unwrap();
    assert_eq!(session.editor().history_len(), 2);

    // Edited on another device.
    {
        let mut remote = session_with(&backend).await;
        remote
            .update_note(&id("n0"), NoteUpdate::content("new from other device"))
            .unwrap()
            .wait()
            .await
            .unwrap();
    }

    session.refresh().await.unwrap();
    assert_eq!(session.active_note().unwrap().content, "new from other device");
    assert_eq!(session.editor().content(), "new from other device");
    assert_eq!(session.stats().unwrap().chars, "new from other device".len());

    // History restarts from the refreshed content; stale text is never written back.
    assert_eq!(session.editor().history_len(), 1);
    session.edit_active("newer").unwrap().unwrap().wait().await.unwrap();
    session.undo_active().unwrap().unwrap().wait().await.unwrap();
    assert_eq!(
        backend.note(&id("n0")).unwrap().content,
        "new from other device"
    );
}

#[tokio::test]
async fn test_refresh_keeps_undo_when_content_unchanged() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.edit_active("draft").unwrap().unwrap().wait().await.unwrap();
    session.edit_active("draft 2").unwrap().unwrap().wait().await.unwrap();

    session.refresh().await.unwrap();
    assert_eq!(session.editor().content(), "draft 2");
    assert_eq!(session.editor().history_len(), 2);
}

#[tokio::test]
async fn test_refresh_failure_keeps_local_state() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();

    backend.set_offline(true);
    let err = session.refresh().await.unwrap_err();
    assert!(err.is_connection());
    assert_eq!(session.notes().len(), 2);
    assert_eq!(session.open_tabs(), &[id("n0")]);
}

// =============================================================================
// TABS
// =============================================================================

#[tokio::test]
async fn test_open_set_never_exceeds_ten() {
    let backend = seeded(12);
    let mut session = session_with(&backend).await;

    for i in 0..10 {
        session.open_note(&id(&format!("n{}", i))).unwrap();
    }
    let before: Vec<NoteId> = session.open_tabs().to_vec();
    let active_before = session.active_id().cloned();

    let err = session.open_note(&id("n10")).unwrap_err();
    assert!(matches!(
        err,
        Error::Admission(AdmissionDenied::TabLimitExceeded { limit: 10 })
    ));
    assert_eq!(session.open_tabs(), before.as_slice());
    assert_eq!(session.active_id().cloned(), active_before);
    assert_eq!(session.tab_state(&id("n10")), TabState::Closed);
}

#[tokio::test]
async fn test_open_twice_only_moves_active() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.open_note(&id("n1")).unwrap();

    session.open_note(&id("n0")).unwrap();
    session.open_note(&id("n0")).unwrap();
    assert_eq!(session.open_tabs(), &[id("n0"), id("n1")]);
    assert_eq!(session.active_id(), Some(&id("n0")));
    assert_eq!(session.tab_state(&id("n1")), TabState::Open);
}

#[tokio::test]
async fn test_open_unknown_note() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    let err = session.open_note(&id("ghost")).unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(_)));
    assert!(session.open_tabs().is_empty());
}

#[tokio::test]
async fn test_close_active_middle_tab() {
    let backend = MemoryBackend::new().with_notes(vec![note("A", 3), note("B", 2), note("C", 1)]);
    let mut session = session_with(&backend).await;
    for name in ["A", "B", "C"] {
        session.open_note(&id(name)).unwrap();
    }
    session.open_note(&id("B")).unwrap();

    session.close_note(&id("B"));
    assert_eq!(session.active_id(), Some(&id("C")));
    assert_eq!(session.open_tabs(), &[id("A"), id("C")]);
    assert_eq!(session.editor().note_id(), Some(&id("C")));
}

#[tokio::test]
async fn test_close_never_leaves_dangling_active() {
    let backend = seeded(4);
    let mut session = session_with(&backend).await;
    for i in 0..4 {
        session.open_note(&id(&format!("n{}", i))).unwrap();
    }
    for _ in 0..4 {
        let active = session.active_id().cloned().unwrap();
        session.close_note(&active);
        match session.active_id() {
            Some(active) => assert!(session.open_tabs().contains(active)),
            None => assert!(session.open_tabs().is_empty()),
        }
    }
    assert!(session.active_note().is_none());
    assert!(session.editor().note_id().is_none());
}

#[tokio::test]
async fn test_tab_events() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;
    let mut rx = session.events().subscribe();

    session.open_note(&id("n0")).unwrap();
    session.open_note(&id("n1")).unwrap();
    session.close_note(&id("n1"));

    assert_eq!(
        drain(&mut rx),
        vec![
            SessionEvent::NoteOpened { note_id: id("n0") },
            SessionEvent::ActiveChanged {
                note_id: Some(id("n0"))
            },
            SessionEvent::NoteOpened { note_id: id("n1") },
            SessionEvent::ActiveChanged {
                note_id: Some(id("n1"))
            },
            SessionEvent::NoteClosed { note_id: id("n1") },
            SessionEvent::ActiveChanged {
                note_id: Some(id("n0"))
            },
        ]
    );
}

// =============================================================================
// CREATION
// =============================================================================

#[tokio::test]
async fn test_create_inserts_at_head_and_opens() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;

    let created = session.create_note().await.unwrap();
    assert_eq!(session.notes()[0].id, created);
    assert_eq!(session.active_id(), Some(&created));
    assert_eq!(session.daily_count(), 1);
    assert!(session.notes()[0].title.starts_with("Note "));
}

#[tokio::test]
async fn test_create_refused_at_daily_limit() {
    let backend = MemoryBackend::new().with_daily_count(USER, 10);
    let mut session = session_with(&backend).await;
    let mut rx = session.events().subscribe();

    let err = session.create_note().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Admission(AdmissionDenied::DailyLimitExceeded { limit: 10 })
    ));
    assert!(session.notes().is_empty());
    assert!(session.open_tabs().is_empty());
    assert_eq!(backend.call_count("create_note"), 0);
    assert_eq!(
        drain(&mut rx),
        vec![SessionEvent::AdmissionDenied {
            reason: AdmissionDenied::DailyLimitExceeded { limit: 10 }
        }]
    );
}

#[tokio::test]
async fn test_create_accepted_at_nine() {
    let backend = MemoryBackend::new().with_daily_count(USER, 9);
    let mut session = session_with(&backend).await;

    session.create_note().await.unwrap();
    assert_eq!(session.daily_count(), 10);
    assert!(session.create_note().await.is_err());
}

#[tokio::test]
async fn test_ten_creates_then_refusal() {
    let backend = MemoryBackend::new();
    let mut session = session_with(&backend).await;

    for _ in 0..10 {
        session.create_note().await.unwrap();
    }
    let err = session.create_note().await.unwrap_err();
    assert!(err.is_admission());
    assert_eq!(session.notes().len(), 10);
    assert_eq!(backend.notes().len(), 10);
    assert_eq!(session.open_tabs().len(), 10);
}

#[tokio::test]
async fn test_create_with_full_tab_strip_keeps_note_closed() {
    let backend = seeded(10);
    let mut session = session_with(&backend).await;
    for i in 0..10 {
        session.open_note(&id(&format!("n{}", i))).unwrap();
    }

    let created = session.create_note().await.unwrap();
    assert_eq!(session.notes()[0].id, created);
    assert_eq!(session.tab_state(&created), TabState::Closed);
    assert_eq!(session.open_tabs().len(), 10);
    assert_eq!(session.daily_count(), 1);
}

#[tokio::test]
async fn test_create_backend_failure_leaves_state() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    backend.set_fail_writes(true);

    let err = session.create_note().await.unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
    assert_eq!(session.notes().len(), 1);
    assert_eq!(session.daily_count(), 0);
    assert!(session.open_tabs().is_empty());
}

// =============================================================================
// DELETION
// =============================================================================

#[tokio::test]
async fn test_delete_removes_and_closes() {
    let backend = seeded(3);
    let mut session = session_with(&backend).await;
    for name in ["n0", "n1", "n2"] {
        session.open_note(&id(name)).unwrap();
    }
    session.open_note(&id("n1")).unwrap();

    session.delete_note(&id("n1")).await.unwrap();
    assert!(session.note(&id("n1")).is_none());
    assert_eq!(session.open_tabs(), &[id("n0"), id("n2")]);
    assert_eq!(session.active_id(), Some(&id("n2")));
    assert!(backend.note(&id("n1")).is_none());
}

#[tokio::test]
async fn test_delete_failure_keeps_note() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    backend.set_fail_writes(true);

    assert!(session.delete_note(&id("n0")).await.is_err());
    assert!(session.note(&id("n0")).is_some());
    assert_eq!(session.active_id(), Some(&id("n0")));
}

// =============================================================================
// UPDATES
// =============================================================================

#[tokio::test]
async fn test_update_is_optimistic_and_persisted() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;

    let pending = session
        .update_note(&id("n0"), NoteUpdate::content("fresh"))
        .unwrap();
    assert_eq!(session.note(&id("n0")).unwrap().content, "fresh");

    let saved = pending.wait().await.unwrap();
    assert_eq!(saved.content, "fresh");
    assert_eq!(backend.note(&id("n0")).unwrap().content, "fresh");
}

#[tokio::test]
async fn test_update_failure_keeps_local_value() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    let mut rx = session.events().subscribe();
    backend.set_fail_writes(true);

    let pending = session
        .update_note(&id("n0"), NoteUpdate::title("Renamed"))
        .unwrap();
    assert!(pending.wait().await.is_err());

    assert_eq!(session.note(&id("n0")).unwrap().title, "Renamed");
    assert_eq!(backend.note(&id("n0")).unwrap().title, "Title n0");

    let events = drain(&mut rx);
    assert_eq!(events[0], SessionEvent::NoteUpdated { note_id: id("n0") });
    assert!(matches!(
        events[1],
        SessionEvent::PersistFailed { ref note_id, .. } if note_id == &id("n0")
    ));
}

#[tokio::test]
async fn test_update_unknown_note_sends_nothing() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    let err = session
        .update_note(&id("ghost"), NoteUpdate::content("x"))
        .unwrap_err();
    assert!(matches!(err, Error::NoteNotFound(_)));
    assert_eq!(backend.call_count("update_note"), 0);
}

// =============================================================================
// EDITOR
// =============================================================================

#[tokio::test]
async fn test_edit_and_undo_active() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();

    let first = session.edit_active("draft 1").unwrap().unwrap();
    let second = session.edit_active("draft 2").unwrap().unwrap();
    first.wait().await.unwrap();
    second.wait().await.unwrap();
    assert!(session.edit_active("draft 2").unwrap().is_none());
    assert_eq!(session.active_note().unwrap().content, "draft 2");

    let pending = session.undo_active().unwrap().unwrap();
    assert_eq!(session.active_note().unwrap().content, "draft 1");
    pending.wait().await.unwrap();
    assert_eq!(backend.note(&id("n0")).unwrap().content, "draft 1");

    session.undo_active().unwrap();
    assert_eq!(session.active_note().unwrap().content, "content of n0");
    assert!(!session.can_undo());
    assert!(session.undo_active().unwrap().is_none());
}

#[tokio::test]
async fn test_switching_note_resets_undo() {
    let backend = seeded(2);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.edit_active("changed").unwrap();
    session.edit_active("changed again").unwrap();

    session.open_note(&id("n1")).unwrap();
    assert_eq!(session.editor().history_len(), 1);
    assert_eq!(session.editor().content(), "content of n1");

    session.open_note(&id("n0")).unwrap();
    assert_eq!(session.editor().content(), "changed again");
    session.undo_active().unwrap();
    assert_eq!(session.active_note().unwrap().content, "changed again");
    assert!(session.undo_active().unwrap().is_none());
}

#[tokio::test]
async fn test_rename_blank_title() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();

    session.rename_active("   ").unwrap().unwrap().wait().await.unwrap();
    assert_eq!(session.active_note().unwrap().title, "Untitled");
    assert_eq!(backend.note(&id("n0")).unwrap().title, "Untitled");
}

#[tokio::test]
async fn test_editor_ops_without_active_note() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    assert!(session.edit_active("x").unwrap().is_none());
    assert!(session.rename_active("x").unwrap().is_none());
    assert!(session.undo_active().unwrap().is_none());
    assert!(session.stats().is_none());
}

#[tokio::test]
async fn test_stats_follow_content() {
    let backend = seeded(1);
    let mut session = session_with(&backend).await;
    session.open_note(&id("n0")).unwrap();
    session.edit_active("one\ntwo").unwrap();

    let stats = session.stats().unwrap();
    assert_eq!(stats.chars, 7);
    assert_eq!(stats.lines, 2);
}

// =============================================================================
// QUERIES
// =============================================================================

#[tokio::test]
async fn test_filter_and_open_notes() {
    let backend = MemoryBackend::new().with_notes(vec![
        note("groceries", 2),
        note("meeting", 1),
    ]);
    let mut session = session_with(&backend).await;
    session.open_note(&id("groceries")).unwrap();
    session.open_note(&id("meeting")).unwrap();

    let open: Vec<&str> = session.open_notes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(open, vec!["groceries", "meeting"]);

    let hits = session.filtered(&NoteFilter::new().with_query("MEETING"), &Local);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id("meeting"));

    let created = session.notes()[0].created_at.with_timezone(&Local).date_naive();
    assert_eq!(
        session
            .filtered(&NoteFilter::new().on_day(created), &Local)
            .len(),
        2
    );
    let today = Local::now().date_naive();
    assert!(session
        .filtered(&NoteFilter::new().on_day(today), &Local)
        .is_empty());
}

#[tokio::test]
async fn test_calendar_marks_days() {
    let mut march = note("march", 0);
    march.created_at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
    let backend = MemoryBackend::new().with_notes(vec![march]);
    let session = session_with(&backend).await;

    let utc = FixedOffset::east_opt(0).unwrap();
    let grid = session.calendar(2026, 3, &utc).unwrap();
    let marked: Vec<u32> = grid
        .days
        .iter()
        .filter(|d| d.has_notes)
        .map(|d| chrono::Datelike::day(&d.date))
        .collect();
    assert_eq!(marked, vec![14]);
}
