//! JSON files under the data directory

use super::{NotePersistence, TaskPersistence, NOTES_FILE, TASKS_FILE};
use crate::action::scanner::{find_array, non_empty_field, split_elements, string_field};
use crate::notes::{parse_creation_time, Note};
use crate::schedule::{parse_time, Priority, Task, TaskStatus};
use crate::{DayplanError, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pipe-delimited task file written by older versions
pub const LEGACY_TASKS_FILE: &str = "tasks.txt";

/// Stores `tasks.json` and `notes.json` in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.dir.join(NOTES_FILE)
    }

    /// Write pretty JSON to a sibling temp file, then rename over `path`
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, items: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(items)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path).map_err(|e| {
            DayplanError::Persistence(format!("failed to replace {}: {e}", path.display()))
        })?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Strict parse first; if the file is not valid JSON, mine each record
    /// with the tolerant scanner and skip the ones that do not decode.
    fn read_records<T, F>(&self, path: &Path, from_fields: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&str) -> Option<T>,
    {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "{} is not strict JSON ({}), recovering records",
                    path.display(),
                    e
                );
                let Some(array) = find_array(&content) else {
                    return Err(DayplanError::Persistence(format!(
                        "{} holds no record array",
                        path.display()
                    )));
                };
                let mut records = Vec::new();
                for element in split_elements(array) {
                    match from_fields(element) {
                        Some(record) => records.push(record),
                        None => warn!("Skipping unreadable record in {}", path.display()),
                    }
                }
                Ok(records)
            }
        }
    }
}

impl TaskPersistence for JsonFileStore {
    fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_json(&self.tasks_path(), tasks)
    }

    fn load_tasks(&self) -> Result<Vec<Task>> {
        let tasks = self.read_records(&self.tasks_path(), task_from_fields)?;
        debug!("Loaded {} tasks from {}", tasks.len(), self.dir.display());
        Ok(tasks)
    }
}

impl NotePersistence for JsonFileStore {
    fn save_notes(&self, notes: &[Note]) -> Result<()> {
        self.write_json(&self.notes_path(), notes)
    }

    fn load_notes(&self) -> Result<Vec<Note>> {
        let notes = self.read_records(&self.notes_path(), note_from_fields)?;
        debug!("Loaded {} notes from {}", notes.len(), self.dir.display());
        Ok(notes)
    }
}

fn task_from_fields(record: &str) -> Option<Task> {
    let status = match string_field(record, "status") {
        Some(raw) => raw.parse::<TaskStatus>().ok()?,
        None => TaskStatus::default(),
    };
    Some(Task {
        id: non_empty_field(record, "id")?,
        description: non_empty_field(record, "description")?,
        start_time: parse_time(&string_field(record, "startTime")?).ok()?,
        end_time: parse_time(&string_field(record, "endTime")?).ok()?,
        date: NaiveDate::parse_from_str(&string_field(record, "date")?, "%Y-%m-%d").ok()?,
        status,
        priority: string_field(record, "priority")
            .and_then(|p| Priority::parse(&p))
            .unwrap_or_default(),
    })
}

fn note_from_fields(record: &str) -> Option<Note> {
    Some(Note {
        id: non_empty_field(record, "id")?,
        content: string_field(record, "content")?,
        creation_time: parse_creation_time(&string_field(record, "creationTime")?)?,
    })
}

/// Convert `tasks.txt` in `dir` to `tasks.json`.
///
/// Does nothing when there is no legacy file or when `tasks.json` already
/// exists. Lines that do not have exactly seven fields are skipped.
/// Returns the number of tasks written.
pub fn migrate_legacy_tasks(dir: &Path) -> Result<usize> {
    let legacy = dir.join(LEGACY_TASKS_FILE);
    let store = JsonFileStore::new(dir);

    if !legacy.exists() {
        info!("No {} to migrate", legacy.display());
        return Ok(0);
    }
    if store.tasks_path().exists() {
        warn!(
            "{} already exists, not overwriting it with {}",
            store.tasks_path().display(),
            legacy.display()
        );
        return Ok(0);
    }

    let content = fs::read_to_string(&legacy)?;
    let tasks: Vec<Task> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let task = parse_legacy_line(line);
            if task.is_none() {
                warn!("Invalid legacy task line: {}", line);
            }
            task
        })
        .collect();

    store.save_tasks(&tasks)?;
    info!("Migrated {} tasks from {}", tasks.len(), legacy.display());
    Ok(tasks.len())
}

/// `id|description|start|end|date|status|priority`
fn parse_legacy_line(line: &str) -> Option<Task> {
    let parts = split_unescaped_pipes(line);
    let [id, description, start, end, date, status, priority] = parts.as_slice() else {
        return None;
    };
    Some(Task {
        id: id.clone(),
        description: unescape_legacy(description),
        start_time: parse_time(start).ok()?,
        end_time: parse_time(end).ok()?,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?,
        status: status.parse().ok()?,
        priority: Priority::parse(priority).unwrap_or_default(),
    })
}

/// Split on `|` that is not escaped; escapes are kept for `unescape_legacy`
fn split_unescaped_pipes(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn unescape_legacy(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('|') => out.push('|'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn task(desc: &str, start: &str, end: &str) -> Task {
        Task::new(desc, parse_time(start).unwrap(), parse_time(end).unwrap(), day())
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_tasks().unwrap().is_empty());
        assert!(store.load_notes().unwrap().is_empty());
    }

    #[test]
    fn test_tasks_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        let mut done = task("Write report", "09:00", "10:30");
        done.status = TaskStatus::Completed;
        done.priority = Priority::High;
        let tasks = vec![done, task("Lunch", "12:00", "13:00")];

        store.save_tasks(&tasks).unwrap();
        assert!(!store.tasks_path().with_extension("json.tmp").exists());
        assert_eq!(store.load_tasks().unwrap(), tasks);
    }

    #[test]
    fn test_notes_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let notes = vec![Note::new("first"), Note::new("second \"quoted\"")];
        store.save_notes(&notes).unwrap();

        let loaded = store.load_notes().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].content, "second \"quoted\"");
        assert_eq!(
            loaded[0].formatted_creation_time(),
            notes[0].formatted_creation_time()
        );
    }

    #[test]
    fn test_tolerant_load_skips_bad_records() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        // trailing comma makes this invalid for serde_json
        let content = r#"[
  {"id": "a", "description": "Gym, legs", "startTime": "07:00", "endTime": "08:00",
   "date": "2025-04-01", "status": "IN_PROGRESS", "priority": "LOW"},
  {"id": "b", "description": "bad time", "startTime": "7am", "endTime": "08:00", "date": "2025-04-01"},
  {"id": "c", "description": "no status", "startTime": "09:00", "endTime": "10:00", "date": "2025-04-01"},
]"#;
        fs::write(store.tasks_path(), content).unwrap();

        let tasks = store.load_tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].description, "Gym, legs");
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].priority, Priority::Low);
        assert_eq!(tasks[1].id, "c");
        assert_eq!(tasks[1].status, TaskStatus::Pending);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.notes_path(), "not json at all").unwrap();
        assert!(matches!(
            store.load_notes(),
            Err(DayplanError::Persistence(_))
        ));
    }

    #[test]
    fn test_migrate_legacy_tasks() {
        let dir = TempDir::new().unwrap();
        let legacy = "t1|Call mom \\| dad\\nlater|18:00|18:30|2025-04-01|PENDING|HIGH\n\
                      broken|line\n\
                      \n\
                      t2|Read|21:00|22:00|2025-04-01|COMPLETED|LOW\n";
        fs::write(dir.path().join(LEGACY_TASKS_FILE), legacy).unwrap();

        assert_eq!(migrate_legacy_tasks(dir.path()).unwrap(), 2);
        let tasks = JsonFileStore::new(dir.path()).load_tasks().unwrap();
        assert_eq!(tasks[0].id, "t1");
        assert_eq!(tasks[0].description, "Call mom | dad\nlater");
        assert_eq!(tasks[0].priority, Priority::High);
        assert_eq!(tasks[1].status, TaskStatus::Completed);

        // second run must not overwrite
        assert_eq!(migrate_legacy_tasks(dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_migrate_without_legacy_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(migrate_legacy_tasks(dir.path()).unwrap(), 0);
        assert!(!dir.path().join(TASKS_FILE).exists());
    }
}
