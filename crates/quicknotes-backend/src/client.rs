//! Shared HTTP client for the Supabase REST and auth endpoints.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use tracing::info;

use quicknotes_core::{Error, Result, UserProfile};

use crate::config::SupabaseConfig;

/// Access token plus the user it belongs to (unknown until verified).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthSession {
    pub access_token: String,
    pub user: Option<UserProfile>,
}

struct Inner {
    http: Client,
    config: SupabaseConfig,
    session: RwLock<Option<AuthSession>>,
}

/// Cheaply cloneable handle shared by the auth and notes backends.
///
/// Requests carry the anon key as `apikey` and the session access token (or
/// the anon key when signed out) as the bearer token, so row-level security
/// sees the signed-in user.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<Inner>,
}

impl SupabaseClient {
    /// Create a client; fails with a configuration error when the settings
    /// are missing or still placeholders.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(url = %config.base_url(), "Initializing Supabase client");

        let session = config.access_token.clone().map(|access_token| AuthSession {
            access_token,
            user: None,
        });

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                session: RwLock::new(session),
            }),
        })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.inner.config
    }

    /// Build a request against `path` (e.g. `/rest/v1/notes`).
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let config = &self.inner.config;
        let url = format!("{}{}", config.base_url(), path);
        let bearer = self
            .access_token()
            .unwrap_or_else(|| config.anon_key.clone());

        self.inner
            .http
            .request(method, &url)
            .header("apikey", &config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.read_session().as_ref().map(|s| s.access_token.clone())
    }

    pub(crate) fn session_user(&self) -> Option<UserProfile> {
        self.read_session().as_ref().and_then(|s| s.user.clone())
    }

    pub(crate) fn set_session(&self, session: AuthSession) {
        *self.write_session() = Some(session);
    }

    /// Clear the session, returning whether one existed.
    pub(crate) fn clear_session(&self) -> bool {
        self.write_session().take().is_some()
    }

    // A poisoned lock only means a panic elsewhere; the token itself is intact.
    fn read_session(&self) -> RwLockReadGuard<'_, Option<AuthSession>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<AuthSession>> {
        self.inner
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
