//! Applies schedule actions to the shared schedule

use super::{lock, UNRECOGNIZED_ACTION};
use crate::action::{ScheduleAction, TaskSpec};
use crate::persistence::TaskPersistence;
use crate::schedule::{parse_time, Insertion, ScheduleStore, SharedSchedule, Task, TaskStatus};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

const NEED_INFO_FALLBACK: &str = "I need more information to complete this action.";

/// Runs schedule actions against one store and saves after every mutation
pub struct ScheduleExecutor {
    schedule: SharedSchedule,
    persistence: Arc<dyn TaskPersistence>,
}

impl ScheduleExecutor {
    pub fn new(schedule: SharedSchedule, persistence: Arc<dyn TaskPersistence>) -> Self {
        Self {
            schedule,
            persistence,
        }
    }

    pub fn schedule(&self) -> &SharedSchedule {
        &self.schedule
    }

    /// Tasks on `date`, as the model should see them
    pub fn snapshot(&self, date: NaiveDate) -> Vec<Task> {
        lock(&self.schedule).get_tasks_for_date(date)
    }

    /// Decode `raw` model output and apply it. New tasks are dated `date`.
    pub fn execute(&self, raw: &str, date: NaiveDate) -> String {
        match ScheduleAction::parse(raw) {
            Ok(action) => self.apply(action, date),
            Err(failure) => {
                warn!("Schedule action not applied: {}", failure);
                UNRECOGNIZED_ACTION.to_string()
            }
        }
    }

    /// Apply an already decoded action.
    ///
    /// A failure inside a batch stops the batch where it is. Earlier items stay
    /// applied in memory and nothing is saved.
    pub fn apply(&self, action: ScheduleAction, date: NaiveDate) -> String {
        let mut store = lock(&self.schedule);
        match self.run(&mut store, action, date) {
            Ok(message) => message,
            Err(e) => {
                warn!("Schedule action failed: {}", e);
                format!("Error executing schedule action: {e}")
            }
        }
    }

    fn run(&self, store: &mut ScheduleStore, action: ScheduleAction, date: NaiveDate) -> Result<String> {
        match action {
            ScheduleAction::Add(spec) => {
                let message = match add_spec(store, &spec, date)? {
                    Insertion::Added(task) => format!(
                        "Added task: {} ({}, Priority: {})",
                        task.description,
                        task.time_range(),
                        task.priority
                    ),
                    Insertion::Conflict { existing_id } => {
                        return Ok(format!(
                            "Could not add task: {} overlaps task {existing_id}",
                            spec.description
                        ))
                    }
                };
                self.save(store)?;
                Ok(message)
            }
            ScheduleAction::AddMultiple(specs) => {
                let mut message = String::from("Added multiple tasks:\n");
                let mut added = 0;
                let mut conflicts = 0;
                for spec in &specs {
                    match add_spec(store, spec, date)? {
                        Insertion::Added(task) => {
                            message.push_str(&format!(
                                "- {} ({})\n",
                                task.description,
                                task.time_range()
                            ));
                            added += 1;
                        }
                        Insertion::Conflict { existing_id } => {
                            message.push_str(&format!(
                                "- Conflict: {} overlaps task {existing_id}\n",
                                spec.description
                            ));
                            conflicts += 1;
                        }
                    }
                }
                self.save(store)?;
                message.push_str(&format!(
                    "\nSummary: {added} tasks added, {conflicts} conflicts"
                ));
                Ok(message)
            }
            ScheduleAction::Update {
                task_id,
                description,
                priority,
            } => {
                if description.is_none() && priority.is_none() {
                    return Ok(
                        "No valid fields provided for update (description or priority required)"
                            .to_string(),
                    );
                }
                if !store.update_task(&task_id, description.as_deref(), priority)? {
                    return Ok(not_found(&task_id));
                }
                self.save(store)?;

                let mut changes = Vec::new();
                if let Some(description) = &description {
                    changes.push(format!("description to '{}'", description.trim()));
                }
                if let Some(priority) = priority {
                    changes.push(format!("priority to {priority}"));
                }
                Ok(format!("Updated task {task_id}: {}", changes.join(" and ")))
            }
            ScheduleAction::Complete { task_id } => {
                if !store.update_task_status(&task_id, TaskStatus::Completed) {
                    return Ok(not_found(&task_id));
                }
                self.save(store)?;
                Ok(format!("Marked task {task_id} as completed."))
            }
            ScheduleAction::Delete { task_id } => {
                let Some(description) = store.get_task(&task_id).map(|t| t.description.clone())
                else {
                    return Ok(not_found(&task_id));
                };
                store.remove_task(&task_id);
                self.save(store)?;
                Ok(format!("Deleted task: {description}"))
            }
            ScheduleAction::DeleteMultiple { task_ids } => {
                let mut message = String::from("Deleted multiple tasks:\n");
                let mut deleted = 0;
                let mut missing = 0;
                for task_id in &task_ids {
                    if store.remove_task(task_id) {
                        message.push_str(&format!("- Deleted task: {task_id}\n"));
                        deleted += 1;
                    } else {
                        message.push_str(&format!("- Task not found: {task_id}\n"));
                        missing += 1;
                    }
                }
                self.save(store)?;
                message.push_str(&format!(
                    "\nSummary: {deleted} tasks deleted, {missing} not found"
                ));
                Ok(message)
            }
            ScheduleAction::ItemNotFound(item) => Ok(item.describe()),
            ScheduleAction::NeedInfo { message } => {
                Ok(message.unwrap_or_else(|| NEED_INFO_FALLBACK.to_string()))
            }
        }
    }

    fn save(&self, store: &ScheduleStore) -> Result<()> {
        self.persistence.save_tasks(&store.get_all_tasks())?;
        info!("Saved {} tasks", store.task_count());
        Ok(())
    }
}

/// Model-initiated insertion: overlap is allowed, priority defaults to MEDIUM
fn add_spec(store: &mut ScheduleStore, spec: &TaskSpec, date: NaiveDate) -> Result<Insertion> {
    let start = parse_time(&spec.start_time)?;
    let end = parse_time(&spec.end_time)?;
    let mut insertion = store.add_task(&spec.description, start, end, date, true)?;
    if let (Insertion::Added(task), Some(priority)) = (&mut insertion, spec.priority) {
        store.update_task_priority(&task.id, priority);
        task.priority = priority;
    }
    Ok(insertion)
}

fn not_found(task_id: &str) -> String {
    format!("Could not find task with ID: {task_id}")
}
