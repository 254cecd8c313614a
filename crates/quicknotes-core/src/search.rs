//! Sidebar search: text query plus optional creation-day filter.

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::models::Note;
use crate::temporal::is_same_day;

/// Filter over the note registry.
///
/// A note matches when the case-insensitive `query` occurs in its title or
/// content (an empty query matches everything) and, when `day` is set, the
/// note was created on that local calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFilter {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<NaiveDate>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn on_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// Drop the day restriction ("All Notes").
    pub fn all_days(mut self) -> Self {
        self.day = None;
        self
    }

    pub fn matches<Tz: TimeZone>(&self, note: &Note, tz: &Tz) -> bool {
        let needle = self.query.to_lowercase();
        let text_match = needle.is_empty()
            || note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle);

        text_match
            && self
                .day
                .map_or(true, |day| is_same_day(&note.created_at, day, tz))
    }

    /// Matching notes, preserving input order.
    pub fn apply<'a, Tz: TimeZone>(&self, notes: &'a [Note], tz: &Tz) -> Vec<&'a Note> {
        notes.iter().filter(|n| self.matches(n, tz)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteId;
    use chrono::{FixedOffset, Utc};

    fn note(id: &str, title: &str, content: &str, created: (i32, u32, u32, u32)) -> Note {
        let ts = Utc
            .with_ymd_and_hms(created.0, created.1, created.2, created.3, 0, 0)
            .unwrap();
        Note {
            id: NoteId::from(id),
            user_id: "u".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn sample() -> Vec<Note> {
        vec![
            note("a", "Shopping List", "milk, eggs", (2026, 3, 14, 9)),
            note("b", "Ideas", "Build a CLI for notes", (2026, 3, 14, 23)),
            note("c", "Journal", "rainy day", (2026, 3, 15, 8)),
        ]
    }

    fn ids(notes: Vec<&Note>) -> Vec<&str> {
        notes.into_iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let notes = sample();
        assert_eq!(ids(NoteFilter::new().apply(&notes, &Utc)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_query_matches_title_case_insensitive() {
        let notes = sample();
        let filter = NoteFilter::new().with_query("SHOPPING");
        assert_eq!(ids(filter.apply(&notes, &Utc)), vec!["a"]);
    }

    #[test]
    fn test_query_matches_content() {
        let notes = sample();
        let filter = NoteFilter::new().with_query("cli");
        assert_eq!(ids(filter.apply(&notes, &Utc)), vec!["b"]);
    }

    #[test]
    fn test_day_filter_uses_time_zone() {
        let notes = sample();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let filter = NoteFilter::new().on_day(day);

        assert_eq!(ids(filter.apply(&notes, &Utc)), vec!["a", "b"]);

        // At UTC+2, note "b" (23:00 UTC) lands on the 15th.
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(ids(filter.apply(&notes, &east)), vec!["a"]);
    }

    #[test]
    fn test_query_and_day_combined() {
        let notes = sample();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let filter = NoteFilter::new().with_query("ideas").on_day(day);
        assert_eq!(ids(filter.apply(&notes, &Utc)), vec!["b"]);

        let cleared = filter.all_days().with_query("rain");
        assert_eq!(ids(cleared.apply(&notes, &Utc)), vec!["c"]);
    }
}
