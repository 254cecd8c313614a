//! Plain text rendering of session state.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};

use quicknotes_core::{AdmissionDenied, MonthGrid, Note};
use quicknotes_session::{EditorStats, Session, TabState};

const WEEKDAYS: &str = "Su Mo Tu We Th Fr Sa";

fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// One row of a note listing: position, tab marker, title, id, last edit.
pub fn note_line(position: usize, note: &Note, state: TabState) -> String {
    let marker = match state {
        TabState::Active => '*',
        TabState::Open => '+',
        TabState::Closed => ' ',
    };
    format!(
        "#{:<3} {} {}  ({})  {}",
        position,
        marker,
        note.display_title(),
        note.id,
        local_time(&note.updated_at)
    )
}

/// Tab strip with the active tab bracketed.
pub fn tab_strip(session: &Session) -> String {
    if session.open_tabs().is_empty() {
        return "(no open tabs)".to_string();
    }
    session
        .open_notes()
        .iter()
        .map(|note| match session.tab_state(&note.id) {
            TabState::Active => format!("[{}]", note.display_title()),
            _ => format!(" {} ", note.display_title()),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// The active note with a header and status line, optionally with a line
/// number gutter.
pub fn active_note(session: &Session, line_numbers: bool) -> String {
    let Some(note) = session.active_note() else {
        return "(no active note; use 'open' or 'new')".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", note.display_title());
    if line_numbers {
        let _ = writeln!(out, "{}", numbered(&note.content));
    } else {
        let _ = writeln!(out, "{}", note.content);
    }
    if let Some(stats) = session.stats() {
        out.push_str(&status_line(stats, session.can_undo(), session.remaining_today()));
    }
    out
}

/// Prefix every line with its right-aligned 1-based number.
///
/// Counts lines the way the status bar does, so a trailing newline yields a
/// final empty, numbered line.
pub fn numbered(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} | {}", i + 1, line, width = width))
        .map(|line| line.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status_line(stats: EditorStats, can_undo: bool, remaining_today: u32) -> String {
    format!(
        "-- {} chars, {} lines | undo {} | {} new notes left today --",
        stats.chars,
        stats.lines,
        if can_undo { "available" } else { "empty" },
        remaining_today
    )
}

/// Sunday-first month view; days with notes carry a `*`.
pub fn calendar(grid: &MonthGrid) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^27}", grid.title());
    let _ = writeln!(out, "{}", WEEKDAYS.replace(' ', "  "));

    let mut column = 0;
    for _ in 0..grid.leading_blanks {
        out.push_str("    ");
        column += 1;
    }
    for day in &grid.days {
        let marker = if day.has_notes { '*' } else { ' ' };
        let _ = write!(out, "{:>2}{} ", chrono::Datelike::day(&day.date), marker);
        column += 1;
        if column == 7 {
            out = out.trim_end().to_string();
            out.push('\n');
            column = 0;
        }
    }
    out.trim_end().to_string()
}

/// Blocking notice for an admission refusal.
pub fn admission_notice(denied: &AdmissionDenied) -> String {
    match denied {
        AdmissionDenied::DailyLimitExceeded { limit } => format!(
            "!! You have already created {} notes today. Try again tomorrow.",
            limit
        ),
        AdmissionDenied::TabLimitExceeded { limit } => format!(
            "!! {} tabs are open. Close one before opening another.",
            limit
        ),
    }
}
