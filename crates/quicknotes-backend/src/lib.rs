//! # quicknotes-backend
//!
//! Implementations of the QuickNotes backend collaborator traits.
//!
//! - [`SupabaseAuth`] / [`SupabaseNotes`]: GoTrue auth and PostgREST note
//!   persistence over HTTP, sharing one [`SupabaseClient`].
//! - `memory` (feature `mock`): in-process backend for tests.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "mock")]
pub mod memory;
pub mod notes;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use config::SupabaseConfig;
pub use notes::SupabaseNotes;
