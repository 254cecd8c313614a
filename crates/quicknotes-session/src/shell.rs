//! Application shell: bootstrap phases around a [`Session`].
//!
//! ```text
//! Loading ──► ConfigurationError(message) ──retry──► Loading
//!    │
//!    ├──► SignedOut ◄──── sign out / session expired ────┐
//!    │        │                                          │
//!    │        └── sign in ──► Ready(Session) ────────────┘
//!    └──► Ready(Session)      (stored session restored)
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use quicknotes_core::{AuthProvider, Error, EventBus, NoteBackend, Result, SessionEvent, UserProfile};

use crate::controller::Session;

/// Backend collaborators resolved from configuration.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthProvider>,
    pub notes: Arc<dyn NoteBackend>,
}

/// Builds the backends; called on every (re)start so a retry picks up
/// corrected configuration.
pub type Connect = Box<dyn Fn(&EventBus) -> Result<Backends> + Send + Sync>;

/// Where the application stands.
pub enum AppPhase {
    /// Checking configuration and any stored session.
    Loading,
    /// The backend is missing, misconfigured or unreachable; only retry is
    /// offered.
    ConfigurationError(String),
    /// Configured, waiting for credentials.
    SignedOut,
    /// A user is signed in and the editor is usable.
    Ready(Box<Session>),
}

impl AppPhase {
    pub fn name(&self) -> &'static str {
        match self {
            AppPhase::Loading => "loading",
            AppPhase::ConfigurationError(_) => "configuration_error",
            AppPhase::SignedOut => "signed_out",
            AppPhase::Ready(_) => "ready",
        }
    }
}

impl fmt::Debug for AppPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppPhase::ConfigurationError(message) => {
                f.debug_tuple("ConfigurationError").field(message).finish()
            }
            AppPhase::Ready(session) => f.debug_tuple("Ready").field(&session.user().id).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Owns the phase machine and, once signed in, the session.
pub struct App {
    events: EventBus,
    connect: Connect,
    backends: Option<Backends>,
    phase: AppPhase,
}

impl App {
    pub fn new(events: EventBus, connect: Connect) -> Self {
        Self {
            events,
            connect,
            backends: None,
            phase: AppPhase::Loading,
        }
    }

    /// Resolve the backends and restore any stored session.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> &AppPhase {
        self.phase = AppPhase::Loading;
        self.backends = None;

        let backends = match (self.connect)(&self.events) {
            Ok(backends) => backends,
            Err(e) => {
                error!(error = %e, "Backend is not configured");
                self.phase = AppPhase::ConfigurationError(e.to_string());
                return &self.phase;
            }
        };
        self.backends = Some(backends.clone());

        match backends.auth.current_user().await {
            Ok(Some(user)) => self.enter(user, backends.notes).await,
            Ok(None) => self.phase = AppPhase::SignedOut,
            Err(e) if e.is_connection() => {
                error!(error = %e, "Backend unreachable");
                self.phase = AppPhase::ConfigurationError(format!(
                    "could not reach the backend: {}",
                    e
                ));
            }
            Err(e) => {
                warn!(error = %e, "Session check failed");
                self.phase = AppPhase::SignedOut;
            }
        }
        &self.phase
    }

    /// Start over from `Loading`.
    pub async fn retry(&mut self) -> &AppPhase {
        info!("Retrying startup");
        self.start().await
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let backends = self.require_backends()?;
        let user = backends.auth.sign_in(email, password).await?;
        self.enter(user, backends.notes).await;
        Ok(())
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<()> {
        let backends = self.require_backends()?;
        let user = backends.auth.sign_up(email, password).await?;
        self.enter(user, backends.notes).await;
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        let backends = self.require_backends()?;
        backends.auth.sign_out().await?;
        if matches!(self.phase, AppPhase::Ready(_)) {
            self.phase = AppPhase::SignedOut;
        }
        Ok(())
    }

    /// Follow auth transitions published on the bus.
    pub async fn handle_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SignedIn { user } => {
                if let AppPhase::Ready(ref session) = self.phase {
                    if session.user().id == user.id {
                        return;
                    }
                }
                if let Some(backends) = self.backends.clone() {
                    self.enter(user.clone(), backends.notes).await;
                }
            }
            SessionEvent::SignedOut => {
                if matches!(self.phase, AppPhase::Ready(_)) {
                    info!("Session ended");
                    self.phase = AppPhase::SignedOut;
                }
            }
            _ => {}
        }
    }

    pub fn phase(&self) -> &AppPhase {
        &self.phase
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn session(&self) -> Option<&Session> {
        match self.phase {
            AppPhase::Ready(ref session) => Some(&**session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match self.phase {
            AppPhase::Ready(ref mut session) => Some(&mut **session),
            _ => None,
        }
    }

    fn require_backends(&self) -> Result<Backends> {
        self.backends
            .clone()
            .ok_or_else(|| Error::Config("backend is not configured".to_string()))
    }

    async fn enter(&mut self, user: UserProfile, notes: Arc<dyn NoteBackend>) {
        let mut session = Session::new(user, notes, self.events.clone());
        match session.refresh().await {
            Ok(()) => {}
            Err(e) if e.is_connection() => {
                self.phase = AppPhase::ConfigurationError(format!(
                    "could not reach the backend: {}",
                    e
                ));
                return;
            }
            // Already logged; the editor still opens with what is local.
            Err(_) => {}
        }
        self.phase = AppPhase::Ready(Box::new(session));
    }
}
