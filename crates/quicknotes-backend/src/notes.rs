//! PostgREST implementation of the note backend.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument};

use quicknotes_core::defaults::NOTES_TABLE;
use quicknotes_core::models::default_title;
use quicknotes_core::temporal::today_start;
use quicknotes_core::{Error, NewNote, Note, NoteBackend, NoteId, NoteUpdate, Result};

use crate::client::SupabaseClient;
use crate::error::check;

/// Row inserted on creation; the database assigns `id`.
#[derive(Debug, Serialize)]
struct NoteInsert<'a> {
    user_id: &'a str,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields sent on update, always carrying a fresh `updated_at`.
#[derive(Debug, Serialize)]
struct NotePatch {
    #[serde(flatten)]
    update: NoteUpdate,
    updated_at: DateTime<Utc>,
}

/// Note persistence through the `notes` table.
pub struct SupabaseNotes {
    client: SupabaseClient,
}

impl SupabaseNotes {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table_path() -> String {
        format!("/rest/v1/{}", NOTES_TABLE)
    }

    /// Notes owned by `user_id` created at or after `since`.
    pub async fn count_created_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u32> {
        let response = self
            .client
            .request(Method::HEAD, &Self::table_path())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("created_at", format!("gte.{}", since.to_rfc3339())),
            ])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;

        let range = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Backend("count response missing Content-Range".to_string()))?;

        parse_content_range(range)
            .ok_or_else(|| Error::Backend(format!("unparseable Content-Range: {}", range)))
    }
}

/// Total from a PostgREST `Content-Range` header such as `0-9/10` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<u32> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl NoteBackend for SupabaseNotes {
    #[instrument(skip(self))]
    async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let response = self
            .client
            .request(Method::GET, &Self::table_path())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "updated_at.desc".to_string()),
            ])
            .send()
            .await?;

        let notes: Vec<Note> = check(response).await?.json().await?;
        debug!(result_count = notes.len(), "Fetched notes");
        Ok(notes)
    }

    #[instrument(skip(self, note))]
    async fn create_note(&self, user_id: &str, note: NewNote) -> Result<Note> {
        let now = Local::now();
        let row = NoteInsert {
            user_id,
            title: note.title.unwrap_or_else(|| default_title(&now)),
            content: note.content,
            created_at: now.with_timezone(&Utc),
            updated_at: now.with_timezone(&Utc),
        };

        let response = self
            .client
            .request(Method::POST, &Self::table_path())
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let mut created: Vec<Note> = check(response).await?.json().await?;
        if created.is_empty() {
            return Err(Error::Backend("insert returned no rows".to_string()));
        }
        let note = created.swap_remove(0);
        debug!(note_id = %note.id, "Created note");
        Ok(note)
    }

    #[instrument(skip_all, fields(note_id = %id))]
    async fn update_note(&self, id: &NoteId, update: NoteUpdate) -> Result<Note> {
        let patch = NotePatch {
            update,
            updated_at: Utc::now(),
        };

        let response = self
            .client
            .request(Method::PATCH, &Self::table_path())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        let mut updated: Vec<Note> = check(response).await?.json().await?;
        if updated.is_empty() {
            return Err(Error::NoteNotFound(id.clone()));
        }
        Ok(updated.swap_remove(0))
    }

    #[instrument(skip_all, fields(note_id = %id))]
    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let response = self
            .client
            .request(Method::DELETE, &Self::table_path())
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_notes_created_today(&self, user_id: &str) -> Result<u32> {
        self.count_created_since(user_id, today_start(&Local::now()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-9/10"), Some(10));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-2/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_patch_flattens_update() {
        let patch = NotePatch {
            update: NoteUpdate::content("hello"),
            updated_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["content"], "hello");
        assert!(json.get("title").is_none());
        assert_eq!(json["updated_at"], "2026-03-14T09:00:00Z");
    }
}
