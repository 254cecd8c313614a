//! GoTrue implementation of the auth provider.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use quicknotes_core::{AuthProvider, Error, EventBus, Result, SessionEvent, UserProfile};

use crate::client::{AuthSession, SupabaseClient};
use crate::error::check;

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for UserProfile {
    fn from(user: GoTrueUser) -> Self {
        UserProfile {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

/// Token grant response. Sign-up without auto-confirm returns the bare user
/// instead, which leaves `access_token` empty.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<GoTrueUser>,
}

/// Email/password authentication against Supabase GoTrue.
pub struct SupabaseAuth {
    client: SupabaseClient,
    events: EventBus,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient, events: EventBus) -> Self {
        Self { client, events }
    }

    async fn grant(&self, path: &str, email: &str, password: &str) -> Result<TokenResponse> {
        let response = self
            .client
            .request(Method::POST, path)
            .json(&Credentials { email, password })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    fn establish(&self, access_token: String, user: GoTrueUser) -> UserProfile {
        let user = UserProfile::from(user);
        self.client.set_session(AuthSession {
            access_token,
            user: Some(user.clone()),
        });
        info!(user_id = %user.id, "Signed in");
        self.events.emit(SessionEvent::SignedIn { user: user.clone() });
        user
    }

    fn drop_session(&self) {
        if self.client.clear_session() {
            info!("Signed out");
            self.events.emit(SessionEvent::SignedOut);
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Option<UserProfile>> {
        if self.client.access_token().is_none() {
            return Ok(None);
        }
        if let Some(user) = self.client.session_user() {
            return Ok(Some(user));
        }

        // Restored token: ask GoTrue who it belongs to.
        let response = self
            .client
            .request(Method::GET, "/auth/v1/user")
            .send()
            .await?;

        match check(response).await {
            Ok(response) => {
                let user: GoTrueUser = response.json().await?;
                let token = self.client.access_token().unwrap_or_default();
                Ok(Some(self.establish(token, user)))
            }
            Err(Error::Unauthorized(reason)) => {
                debug!(reason = %reason, "Stored session rejected");
                self.drop_session();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        let grant = self
            .grant("/auth/v1/token?grant_type=password", email, password)
            .await?;
        match (grant.access_token, grant.user) {
            (Some(token), Some(user)) => Ok(self.establish(token, user)),
            _ => Err(Error::Backend("token response without session".to_string())),
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserProfile> {
        let grant = self.grant("/auth/v1/signup", email, password).await?;
        match (grant.access_token, grant.user) {
            (Some(token), Some(user)) => Ok(self.establish(token, user)),
            _ => Err(Error::Unauthorized(
                "account created; confirm your email address, then sign in".to_string(),
            )),
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<()> {
        if self.client.access_token().is_none() {
            return Ok(());
        }

        let result = self
            .client
            .request(Method::POST, "/auth/v1/logout")
            .send()
            .await;

        // The local session ends regardless of what the server says.
        match result {
            Ok(response) => {
                if let Err(e) = check(response).await {
                    warn!(error = %e, "Server-side sign out failed");
                }
            }
            Err(e) => warn!(error = %e, "Server-side sign out failed"),
        }
        self.drop_session();
        Ok(())
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}
