//! Durable storage for tasks and notes
//!
//! The stores only see the save-all / load-all traits below. `JsonFileStore`
//! is the file-backed implementation used by the binary.

mod json_file;

pub use json_file::{migrate_legacy_tasks, JsonFileStore, LEGACY_TASKS_FILE};

use crate::notes::Note;
use crate::schedule::Task;
use crate::Result;

pub const TASKS_FILE: &str = "tasks.json";
pub const NOTES_FILE: &str = "notes.json";

/// Save-all / load-all contract for the schedule
pub trait TaskPersistence: Send + Sync {
    fn save_tasks(&self, tasks: &[Task]) -> Result<()>;
    fn load_tasks(&self) -> Result<Vec<Task>>;
}

/// Save-all / load-all contract for notes
pub trait NotePersistence: Send + Sync {
    fn save_notes(&self, notes: &[Note]) -> Result<()>;
    fn load_notes(&self) -> Result<Vec<Note>>;
}
