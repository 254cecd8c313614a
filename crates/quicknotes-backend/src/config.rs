//! Supabase connection settings.

use quicknotes_core::defaults::BACKEND_TIMEOUT_SECS;
use quicknotes_core::{Error, Result};

/// Marker found in template URLs that were never filled in.
const PLACEHOLDER_MARKER: &str = "placeholder";

const URL_VARS: &[&str] = &[
    "SUPABASE_URL",
    "NEXT_PUBLIC_SUPABASE_URL",
    "VITE_SUPABASE_URL",
];

const ANON_KEY_VARS: &[&str] = &[
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
    "VITE_SUPABASE_ANON_KEY",
];

/// Configuration for the Supabase backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: String,
    /// Public anon API key.
    pub anon_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Access token of a previously established session.
    pub access_token: Option<String>,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_seconds: BACKEND_TIMEOUT_SECS,
            access_token: None,
        }
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SUPABASE_URL` | none | Project URL (also `NEXT_PUBLIC_`/`VITE_` prefixed) |
    /// | `SUPABASE_ANON_KEY` | none | Anon key (also `NEXT_PUBLIC_`/`VITE_` prefixed) |
    /// | `SUPABASE_TIMEOUT_SECS` | `30` | Request timeout |
    /// | `SUPABASE_ACCESS_TOKEN` | none | Restore an existing session |
    ///
    /// Missing values are not an error here; call [`validate`](Self::validate).
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|v| !v.trim().is_empty())
                .unwrap_or_default()
        };

        Self {
            url: first(URL_VARS),
            anon_key: first(ANON_KEY_VARS),
            timeout_seconds: lookup("SUPABASE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(BACKEND_TIMEOUT_SECS),
            access_token: lookup("SUPABASE_ACCESS_TOKEN").filter(|v| !v.trim().is_empty()),
        }
    }

    /// True when both URL and key are present and the URL is not a template
    /// placeholder.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
            && !self.anon_key.is_empty()
            && !self.url.contains(PLACEHOLDER_MARKER)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(Error::Config(
                "Supabase is not configured: set SUPABASE_URL and SUPABASE_ANON_KEY".to_string(),
            ))
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
