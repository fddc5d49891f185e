//! In-memory schedule with a per-date index and overlap detection

use super::task::{intervals_overlap, Priority, Task, TaskStatus, MAX_DESCRIPTION_CHARS};
use crate::persistence::TaskPersistence;
use crate::{DayplanError, Result};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of an insertion through [`ScheduleStore::add_task`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Added(Task),
    /// Rejected because the slot intersects an existing task; nothing changed.
    Conflict { existing_id: String },
}

impl Insertion {
    pub fn task(&self) -> Option<&Task> {
        match self {
            Self::Added(task) => Some(task),
            Self::Conflict { .. } => None,
        }
    }
}

/// Owns every task. `tasks` keeps insertion order; `by_date` holds task ids.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    tasks: Vec<Task>,
    by_date: HashMap<NaiveDate, Vec<String>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task for `date`.
    ///
    /// With `allow_overlap == false` the same-date tasks are scanned first and
    /// an intersecting slot yields [`Insertion::Conflict`] without touching the
    /// store. With `allow_overlap == true` the task is always appended.
    ///
    /// # Errors
    /// - `Validation` when the description is blank or too long, or when
    ///   `start` is not strictly before `end`.
    pub fn add_task(
        &mut self,
        description: &str,
        start: NaiveTime,
        end: NaiveTime,
        date: NaiveDate,
        allow_overlap: bool,
    ) -> Result<Insertion> {
        let description = validate_description(description)?;
        validate_interval(start, end)?;

        if !allow_overlap {
            if let Some(existing) = self.find_overlap(start, end, date) {
                debug!(
                    "Rejected '{}' {}-{} on {}: overlaps {}",
                    description, start, end, date, existing.id
                );
                return Ok(Insertion::Conflict {
                    existing_id: existing.id.clone(),
                });
            }
        }

        let task = Task::new(description, start, end, date);
        self.insert(task.clone());
        Ok(Insertion::Added(task))
    }

    /// Re-insert a previously persisted task, keeping its id, status and
    /// priority. Never checks for overlap.
    pub fn restore_task(&mut self, task: Task) -> Result<()> {
        validate_description(&task.description)?;
        validate_interval(task.start_time, task.end_time)?;
        if self.get_task(&task.id).is_some() {
            return Err(DayplanError::Validation(format!(
                "Duplicate task id: {}",
                task.id
            )));
        }
        self.insert(task);
        Ok(())
    }

    /// Load every persisted task through the overlap-permissive path.
    /// Returns how many tasks were restored.
    pub fn load_from(&mut self, persistence: &dyn TaskPersistence) -> Result<usize> {
        let mut restored = 0;
        for task in persistence.load_tasks()? {
            let id = task.id.clone();
            match self.restore_task(task) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Skipping stored task {}: {}", id, e),
            }
        }
        Ok(restored)
    }

    fn insert(&mut self, task: Task) {
        self.by_date
            .entry(task.date)
            .or_default()
            .push(task.id.clone());
        self.tasks.push(task);
    }

    fn find_overlap(&self, start: NaiveTime, end: NaiveTime, date: NaiveDate) -> Option<&Task> {
        self.by_date
            .get(&date)?
            .iter()
            .filter_map(|id| self.get_task(id))
            .find(|existing| intervals_overlap(start, end, existing))
    }

    /// Dry run of the overlap check used by [`add_task`](Self::add_task)
    pub fn is_time_slot_available(&self, start: NaiveTime, end: NaiveTime, date: NaiveDate) -> bool {
        self.find_overlap(start, end, date).is_none()
    }

    /// Tasks on `date`, sorted by start time (ties keep insertion order)
    pub fn get_tasks_for_date(&self, date: NaiveDate) -> Vec<Task> {
        let mut day: Vec<Task> = self
            .by_date
            .get(&date)
            .map(|ids| ids.iter().filter_map(|id| self.get_task(id)).cloned().collect())
            .unwrap_or_default();
        day.sort_by_key(|task| task.start_time);
        day
    }

    pub fn get_today_tasks(&self, today: NaiveDate) -> Vec<Task> {
        self.get_tasks_for_date(today)
    }

    /// All tasks sorted by date, then start time
    pub fn get_all_tasks(&self) -> Vec<Task> {
        let mut all = self.tasks.clone();
        all.sort_by_key(|task| (task.date, task.start_time));
        all
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        let mut matching: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|task| (task.date, task.start_time));
        matching
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    fn get_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    pub fn update_task_status(&mut self, task_id: &str, status: TaskStatus) -> bool {
        match self.get_task_mut(task_id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    /// Replace a description after the same checks `add_task` applies.
    /// Returns false when the id is unknown.
    pub fn update_task_description(&mut self, task_id: &str, description: &str) -> Result<bool> {
        self.update_task(task_id, Some(description), None)
    }

    pub fn update_task_priority(&mut self, task_id: &str, priority: Priority) -> bool {
        match self.get_task_mut(task_id) {
            Some(task) => {
                task.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Apply whichever of `description` / `priority` is present.
    /// Returns false when the id is unknown. An invalid description fails
    /// before anything changes.
    pub fn update_task(
        &mut self,
        task_id: &str,
        description: Option<&str>,
        priority: Option<Priority>,
    ) -> Result<bool> {
        let description = description.map(validate_description).transpose()?;
        let Some(task) = self.get_task_mut(task_id) else {
            return Ok(false);
        };
        if let Some(description) = description {
            task.description = description.to_string();
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        Ok(true)
    }

    /// Remove from the flat list and the date index, pruning empty dates
    pub fn remove_task(&mut self, task_id: &str) -> bool {
        let Some(pos) = self.tasks.iter().position(|task| task.id == task_id) else {
            return false;
        };
        let removed = self.tasks.remove(pos);
        if let Some(ids) = self.by_date.get_mut(&removed.date) {
            ids.retain(|id| id != task_id);
            if ids.is_empty() {
                self.by_date.remove(&removed.date);
            }
        }
        true
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn date_count(&self) -> usize {
        self.by_date.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.by_date.clear();
    }
}

fn validate_description(description: &str) -> Result<&str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(DayplanError::Validation(
            "Task description cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DayplanError::Validation(format!(
            "Task description cannot exceed {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

fn validate_interval(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        return Err(DayplanError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_time;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn add(store: &mut ScheduleStore, desc: &str, start: &str, end: &str, allow: bool) -> Insertion {
        store.add_task(desc, t(start), t(end), day(), allow).unwrap()
    }

    #[test]
    fn test_checked_add_rejects_overlap_and_leaves_store_unchanged() {
        let mut store = ScheduleStore::new();
        let first = add(&mut store, "Gym", "09:00", "10:00", false);
        let first_id = first.task().unwrap().id.clone();

        let second = add(&mut store, "Call", "09:30", "10:30", false);
        assert_eq!(
            second,
            Insertion::Conflict {
                existing_id: first_id
            }
        );
        assert_eq!(store.task_count(), 1);
        assert_eq!(store.get_tasks_for_date(day()).len(), 1);
    }

    #[test]
    fn test_permissive_add_always_appends() {
        let mut store = ScheduleStore::new();
        add(&mut store, "Gym", "09:00", "10:00", false);
        let overlapping = add(&mut store, "Call", "09:30", "10:30", true);
        assert!(overlapping.task().is_some());
        assert_eq!(store.task_count(), 2);
    }

    #[test]
    fn test_checked_path_keeps_intervals_disjoint() {
        let mut store = ScheduleStore::new();
        let slots = [
            ("08:00", "09:00"),
            ("08:30", "09:30"),
            ("09:00", "10:00"),
            ("07:00", "12:00"),
            ("10:00", "10:15"),
            ("09:59", "10:01"),
        ];
        for (i, (start, end)) in slots.iter().enumerate() {
            add(&mut store, &format!("task {i}"), start, end, false);
        }
        let tasks = store.get_tasks_for_date(day());
        assert_eq!(tasks.len(), 3);
        for (i, a) in tasks.iter().enumerate() {
            for b in tasks.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_validation_failures() {
        let mut store = ScheduleStore::new();
        let blank = store.add_task("   ", t("09:00"), t("10:00"), day(), false);
        assert!(matches!(blank, Err(DayplanError::Validation(_))));

        let reversed = store.add_task("x", t("10:00"), t("09:00"), day(), true);
        assert!(matches!(reversed, Err(DayplanError::Validation(_))));

        let empty_range = store.add_task("x", t("10:00"), t("10:00"), day(), true);
        assert!(empty_range.is_err());

        let long = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(store.add_task(&long, t("09:00"), t("10:00"), day(), true).is_err());
        assert_eq!(store.task_count(), 0);
    }

    #[test]
    fn test_description_is_trimmed() {
        let mut store = ScheduleStore::new();
        let added = add(&mut store, "  Study  ", "14:00", "15:00", false);
        assert_eq!(added.task().unwrap().description, "Study");
    }

    #[test]
    fn test_tasks_for_date_sorted_by_start() {
        let mut store = ScheduleStore::new();
        add(&mut store, "late", "16:00", "17:00", false);
        add(&mut store, "early", "08:00", "09:00", false);
        add(&mut store, "mid", "12:00", "13:00", false);
        let order: Vec<String> = store
            .get_tasks_for_date(day())
            .into_iter()
            .map(|task| task.description)
            .collect();
        assert_eq!(order, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_unknown_id_is_a_noop() {
        let mut store = ScheduleStore::new();
        add(&mut store, "Gym", "09:00", "10:00", false);
        let before = store.get_all_tasks();

        assert!(!store.remove_task("missing"));
        assert!(!store.update_task_status("missing", TaskStatus::Completed));
        assert!(!store.update_task_priority("missing", Priority::High));
        assert!(!store.update_task("missing", Some("x"), None).unwrap());
        assert_eq!(store.get_all_tasks(), before);
    }

    #[test]
    fn test_description_updates_are_validated() {
        let mut store = ScheduleStore::new();
        let id = add(&mut store, "Gym", "09:00", "10:00", false)
            .task()
            .unwrap()
            .id
            .clone();

        assert!(matches!(
            store.update_task_description(&id, "   "),
            Err(DayplanError::Validation(_))
        ));
        let too_long = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(matches!(
            store.update_task(&id, Some(&too_long), Some(Priority::High)),
            Err(DayplanError::Validation(_))
        ));
        let task = store.get_task(&id).unwrap();
        assert_eq!(task.description, "Gym");
        assert_eq!(task.priority, Priority::Medium);

        assert!(store.update_task_description(&id, "  Swim  ").unwrap());
        assert_eq!(store.get_task(&id).unwrap().description, "Swim");
    }

    #[test]
    fn test_remove_prunes_empty_date_bucket() {
        let mut store = ScheduleStore::new();
        let id = add(&mut store, "Gym", "09:00", "10:00", false)
            .task()
            .unwrap()
            .id
            .clone();
        assert_eq!(store.date_count(), 1);
        assert!(store.remove_task(&id));
        assert_eq!(store.task_count(), 0);
        assert_eq!(store.date_count(), 0);
        assert!(store.get_tasks_for_date(day()).is_empty());
    }

    #[test]
    fn test_status_transitions_are_unconstrained() {
        let mut store = ScheduleStore::new();
        let id = add(&mut store, "Gym", "09:00", "10:00", false)
            .task()
            .unwrap()
            .id
            .clone();
        for status in [
            TaskStatus::Completed,
            TaskStatus::Pending,
            TaskStatus::Cancelled,
            TaskStatus::InProgress,
        ] {
            assert!(store.update_task_status(&id, status));
            assert_eq!(store.get_task(&id).unwrap().status, status);
        }
        assert_eq!(store.get_tasks_by_status(TaskStatus::InProgress).len(), 1);
    }

    #[test]
    fn test_is_time_slot_available() {
        let mut store = ScheduleStore::new();
        add(&mut store, "Gym", "09:00", "10:00", false);
        assert!(!store.is_time_slot_available(t("09:15"), t("09:45"), day()));
        assert!(store.is_time_slot_available(t("10:00"), t("11:00"), day()));
        assert!(store.is_time_slot_available(
            t("09:15"),
            t("09:45"),
            day().succ_opt().unwrap()
        ));
    }

    #[test]
    fn test_restore_keeps_identity_and_skips_overlap_check() {
        let mut store = ScheduleStore::new();
        add(&mut store, "Gym", "09:00", "10:00", false);

        let mut stored = Task::new("Call", t("09:30"), t("10:30"), day());
        stored.status = TaskStatus::Completed;
        stored.priority = Priority::High;
        store.restore_task(stored.clone()).unwrap();

        assert_eq!(store.get_task(&stored.id), Some(&stored));
        assert!(store.restore_task(stored).is_err());
        assert_eq!(store.task_count(), 2);
    }
}
