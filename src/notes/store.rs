//! Note collection

use super::note::{sanitize_punctuation, Note};
use crate::persistence::NotePersistence;
use crate::{DayplanError, Result};
use tracing::warn;

/// Owns every note in insertion order
#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize and trim `content`, then store it as a new note.
    ///
    /// # Errors
    /// `Validation` when nothing is left after sanitizing and trimming.
    pub fn add_note(&mut self, content: &str) -> Result<Note> {
        let content = clean_content(content)?;
        let note = Note::new(content);
        self.notes.push(note.clone());
        Ok(note)
    }

    /// Replace the content of `note_id`. Returns false for an unknown id.
    pub fn update_note(&mut self, note_id: &str, content: &str) -> Result<bool> {
        let content = clean_content(content)?;
        match self.notes.iter_mut().find(|note| note.id == note_id) {
            Some(note) => {
                note.content = content;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_note(&mut self, note_id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != note_id);
        self.notes.len() != before
    }

    /// Owned copy; mutating it never reaches the store
    pub fn get_all_notes(&self) -> Vec<Note> {
        self.notes.clone()
    }

    pub fn get_note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Re-insert a persisted note, keeping its id and creation time
    pub fn restore_note(&mut self, mut note: Note) -> Result<()> {
        note.content = clean_content(&note.content)?;
        if self.get_note(&note.id).is_some() {
            return Err(DayplanError::Validation(format!(
                "Duplicate note id: {}",
                note.id
            )));
        }
        self.notes.push(note);
        Ok(())
    }

    pub fn load_from(&mut self, persistence: &dyn NotePersistence) -> Result<usize> {
        let mut restored = 0;
        for note in persistence.load_notes()? {
            let id = note.id.clone();
            match self.restore_note(note) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Skipping stored note {}: {}", id, e),
            }
        }
        Ok(restored)
    }

    /// Human-readable listing, newest first
    pub fn render_listing(&self) -> String {
        if self.notes.is_empty() {
            return "No notes found.".to_string();
        }
        let mut newest_first: Vec<&Note> = self.notes.iter().collect();
        newest_first.sort_by(|a, b| b.creation_time.cmp(&a.creation_time));

        let mut out = String::new();
        for note in newest_first {
            out.push_str(&format!("ID: {}\n", note.id));
            out.push_str(&format!("Created: {}\n", note.formatted_creation_time()));
            out.push_str(&format!("Content: {}\n\n", note.content));
        }
        out.trim_end().to_string()
    }
}

fn clean_content(content: &str) -> Result<String> {
    let cleaned = sanitize_punctuation(content).trim().to_string();
    if cleaned.is_empty() {
        return Err(DayplanError::Validation(
            "Note content cannot be empty".to_string(),
        ));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::note::parse_creation_time;

    #[test]
    fn test_add_note_sanitizes_and_trims() {
        let mut store = NoteStore::new();
        let note = store.add_note("  It\u{2019}s done \u{2014} finally  ").unwrap();
        assert_eq!(note.content, "It's done - finally");
        assert_eq!(store.note_count(), 1);
    }

    #[test]
    fn test_add_note_rejects_blank() {
        let mut store = NoteStore::new();
        assert!(matches!(
            store.add_note(" \u{00A0} "),
            Err(DayplanError::Validation(_))
        ));
        assert_eq!(store.note_count(), 0);
    }

    #[test]
    fn test_update_note_resanitizes() {
        let mut store = NoteStore::new();
        let id = store.add_note("draft").unwrap().id;
        assert!(store.update_note(&id, "\u{201C}final\u{201D}").unwrap());
        assert_eq!(store.get_note(&id).unwrap().content, "\"final\"");
        assert!(!store.update_note("missing", "x").unwrap());
    }

    #[test]
    fn test_delete_note() {
        let mut store = NoteStore::new();
        let id = store.add_note("a").unwrap().id;
        store.add_note("b").unwrap();
        assert!(store.delete_note(&id));
        assert!(!store.delete_note(&id));
        assert_eq!(store.note_count(), 1);
    }

    #[test]
    fn test_get_all_notes_is_a_copy() {
        let mut store = NoteStore::new();
        store.add_note("original").unwrap();
        let mut copy = store.get_all_notes();
        copy[0].content = "changed".to_string();
        copy.clear();
        assert_eq!(store.get_all_notes()[0].content, "original");
    }

    #[test]
    fn test_restore_keeps_identity() {
        let mut store = NoteStore::new();
        let note = Note {
            id: "kept".to_string(),
            content: "old note".to_string(),
            creation_time: parse_creation_time("2024-12-01 10:00:00").unwrap(),
        };
        store.restore_note(note.clone()).unwrap();
        assert_eq!(store.get_note("kept"), Some(&note));
        assert!(store.restore_note(note).is_err());
    }

    #[test]
    fn test_render_listing_newest_first() {
        let mut store = NoteStore::new();
        assert_eq!(store.render_listing(), "No notes found.");

        for (id, when) in [("old", "2024-01-01 09:00:00"), ("new", "2024-06-01 09:00:00")] {
            store
                .restore_note(Note {
                    id: id.to_string(),
                    content: format!("{id} note"),
                    creation_time: parse_creation_time(when).unwrap(),
                })
                .unwrap();
        }
        let listing = store.render_listing();
        let new_pos = listing.find("new note").unwrap();
        let old_pos = listing.find("old note").unwrap();
        assert!(new_pos < old_pos);
        assert!(listing.contains("Created: 2024-06-01 09:00:00"));
    }
}
