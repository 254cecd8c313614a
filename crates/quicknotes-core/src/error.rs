//! Error types for QuickNotes.

use serde::Serialize;
use thiserror::Error;

use crate::models::NoteId;

/// Result type alias using QuickNotes' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An admission limit refused the requested operation.
///
/// User-facing and non-retryable within the same day (creation) or until a
/// tab is closed (tabs). No state is mutated when one of these is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdmissionDenied {
    /// The user already created the maximum number of notes today.
    #[error("Daily limit reached: at most {limit} new notes per day")]
    DailyLimitExceeded { limit: u32 },

    /// The maximum number of tabs is already open.
    #[error("Tab limit reached: close a tab before opening another (max {limit})")]
    TabLimitExceeded { limit: usize },
}

/// Core error type for QuickNotes operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An admission limit refused the operation
    #[error("Admission denied: {0}")]
    Admission(#[from] AdmissionDenied),

    /// The backend answered with a failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// HTTP/network request failed before a response arrived
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed or no user is signed in
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Note not found in the registry
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the user-facing admission limits.
    pub fn is_admission(&self) -> bool {
        matches!(self, Error::Admission(_))
    }

    /// True when the backend could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Request(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_daily_limit() {
        let err: Error = AdmissionDenied::DailyLimitExceeded { limit: 10 }.into();
        assert_eq!(
            err.to_string(),
            "Admission denied: Daily limit reached: at most 10 new notes per day"
        );
    }

    #[test]
    fn test_error_display_tab_limit() {
        let err: Error = AdmissionDenied::TabLimitExceeded { limit: 10 }.into();
        assert!(err.to_string().contains("Tab limit reached"));
        assert!(err.to_string().contains("max 10"));
    }

    #[test]
    fn test_error_display_backend() {
        let err = Error::Backend("500: boom".to_string());
        assert_eq!(err.to_string(), "Backend error: 500: boom");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing SUPABASE_URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing SUPABASE_URL");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let err = Error::NoteNotFound(NoteId::from("n-1"));
        assert_eq!(err.to_string(), "Note not found: n-1");
    }

    #[test]
    fn test_is_admission() {
        let err: Error = AdmissionDenied::TabLimitExceeded { limit: 10 }.into();
        assert!(err.is_admission());
        assert!(!Error::Backend("x".into()).is_admission());
    }

    #[test]
    fn test_is_connection() {
        assert!(Error::Request("connection refused".into()).is_connection());
        assert!(!Error::Unauthorized("expired".into()).is_connection());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: access denied");
        assert!(!err.is_connection());
    }

    #[test]
    fn test_admission_denied_serializes_with_variant_name() {
        let json = serde_json::to_value(AdmissionDenied::DailyLimitExceeded { limit: 10 }).unwrap();
        assert_eq!(json["DailyLimitExceeded"]["limit"], 10);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
