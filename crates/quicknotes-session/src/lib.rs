//! # quicknotes-session
//!
//! The editing session of a signed-in user: which notes are open as tabs,
//! which one is active, how many notes may still be created today, and the
//! undo history of the active editor.
//!
//! - [`Session`]: the session controller, owning all mutable UI state
//! - [`admission`]: pure daily-creation and open-tab limit checks
//! - [`UndoBuffer`]: bounded content history of the active note
//! - [`App`]: bootstrap phases around a session (config, auth, loading)

pub mod admission;
pub mod controller;
pub mod editor;
pub mod registry;
pub mod shell;
pub mod tabs;
pub mod undo;

pub use admission::{can_create_note, can_open_tab, check_create, check_open, DailyCounter};
pub use controller::{PendingWrite, Session};
pub use editor::{EditorState, EditorStats};
pub use registry::NoteRegistry;
pub use shell::{App, AppPhase, Backends, Connect};
pub use tabs::{OpenTabs, TabState};
pub use undo::UndoBuffer;
