//! Applies note actions to the shared note store

use super::{lock, UNRECOGNIZED_ACTION};
use crate::action::NoteAction;
use crate::notes::{Note, NoteStore, SharedNotes};
use crate::persistence::NotePersistence;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

const NEED_INFO_FALLBACK: &str = "I need more information to complete this action.";

pub struct NoteExecutor {
    notes: SharedNotes,
    persistence: Arc<dyn NotePersistence>,
}

impl NoteExecutor {
    pub fn new(notes: SharedNotes, persistence: Arc<dyn NotePersistence>) -> Self {
        Self { notes, persistence }
    }

    pub fn notes(&self) -> &SharedNotes {
        &self.notes
    }

    pub fn snapshot(&self) -> Vec<Note> {
        lock(&self.notes).get_all_notes()
    }

    pub fn execute(&self, raw: &str) -> String {
        match NoteAction::parse(raw) {
            Ok(action) => self.apply(action),
            Err(failure) => {
                warn!("Note action not applied: {}", failure);
                UNRECOGNIZED_ACTION.to_string()
            }
        }
    }

    pub fn apply(&self, action: NoteAction) -> String {
        let mut store = lock(&self.notes);
        match self.run(&mut store, action) {
            Ok(message) => message,
            Err(e) => {
                warn!("Note action failed: {}", e);
                format!("Error executing note action: {e}")
            }
        }
    }

    fn run(&self, store: &mut NoteStore, action: NoteAction) -> Result<String> {
        match action {
            NoteAction::Add { content } => {
                let note = store.add_note(&content)?;
                self.save(store)?;
                Ok(format!("Added new note: {}", note.content))
            }
            NoteAction::Update { note_id, content } => {
                if !store.update_note(&note_id, &content)? {
                    return Ok(not_found(&note_id));
                }
                self.save(store)?;
                let updated = store
                    .get_note(&note_id)
                    .map(|note| note.content.clone())
                    .unwrap_or(content);
                Ok(format!("Updated note: {updated}"))
            }
            NoteAction::Delete { note_id } => {
                if !store.delete_note(&note_id) {
                    return Ok(not_found(&note_id));
                }
                self.save(store)?;
                Ok(format!("Deleted note with ID: {note_id}"))
            }
            NoteAction::DeleteMultiple { note_ids } => {
                let mut message = String::from("Deleted multiple notes:\n");
                let mut deleted = 0;
                let mut missing = 0;
                for note_id in &note_ids {
                    if store.delete_note(note_id) {
                        message.push_str(&format!("- Deleted note: {note_id}\n"));
                        deleted += 1;
                    } else {
                        message.push_str(&format!("- Note not found: {note_id}\n"));
                        missing += 1;
                    }
                }
                self.save(store)?;
                message.push_str(&format!(
                    "\nSummary: {deleted} notes deleted, {missing} not found"
                ));
                Ok(message)
            }
            NoteAction::ItemNotFound(item) => Ok(item.describe()),
            NoteAction::NeedInfo { message } => {
                Ok(message.unwrap_or_else(|| NEED_INFO_FALLBACK.to_string()))
            }
        }
    }

    fn save(&self, store: &NoteStore) -> Result<()> {
        self.persistence.save_notes(&store.get_all_notes())?;
        info!("Saved {} notes", store.note_count());
        Ok(())
    }
}

fn not_found(note_id: &str) -> String {
    format!("Could not find note with ID: {note_id}")
}
