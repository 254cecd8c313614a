//! # quicknotes-core
//!
//! Core types, traits, and abstractions for QuickNotes.
//!
//! This crate provides the note model, the error taxonomy, the backend
//! collaborator traits, and the small pieces of view logic (search filter,
//! calendar grid) that the session and backend crates build on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod search;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{AdmissionDenied, Error, Result};
pub use events::{EventBus, EventEnvelope, SessionEvent};
pub use models::*;
pub use search::NoteFilter;
pub use temporal::{CalendarDay, MonthGrid};
pub use traits::*;
