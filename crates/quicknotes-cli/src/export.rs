//! Plain-text export of a note.

use std::path::{Path, PathBuf};

use tracing::info;

use quicknotes_core::{Note, Result};

/// Default export name: `<display title>.txt`, path separators replaced.
pub fn file_name(note: &Note) -> String {
    let stem: String = note
        .display_title()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{}.txt", stem)
}

/// Write the note's content to `target`.
///
/// No target means [`file_name`] in the working directory; a directory
/// target receives that name inside it. The written path is returned.
pub fn write_note(note: &Note, target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(dir) if dir.is_dir() => dir.join(file_name(note)),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name(note)),
    };
    std::fs::write(&path, &note.content)?;
    info!(
        note_id = %note.id,
        path = %path.display(),
        bytes = note.content.len(),
        "Note exported"
    );
    Ok(path)
}
