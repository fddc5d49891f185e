//! Prompt builder for Dayplan model interactions

use crate::notes::Note;
use crate::schedule::{Task, TIME_FORMAT};

/// Builds prompt strings from a snapshot of the stores
#[derive(Debug, Default)]
pub struct PromptBuilder<'a> {
    tasks: &'a [Task],
    notes: &'a [Note],
}

impl<'a> PromptBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks shown to the model as the current schedule
    pub fn with_tasks(mut self, tasks: &'a [Task]) -> Self {
        self.tasks = tasks;
        self
    }

    /// Notes shown to the model as the current collection
    pub fn with_notes(mut self, notes: &'a [Note]) -> Self {
        self.notes = notes;
        self
    }

    /// One numbered line per task
    pub fn task_context(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks scheduled for today.".to_string();
        }
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                format!(
                    "{}. ID: {}, Description: {}, Time: {}-{}, Status: {}, Priority: {}",
                    i + 1,
                    task.id,
                    task.description,
                    task.start_time.format(TIME_FORMAT),
                    task.end_time.format(TIME_FORMAT),
                    task.status,
                    task.priority
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn note_context(&self) -> String {
        if self.notes.is_empty() {
            return "No notes currently.".to_string();
        }
        self.notes
            .iter()
            .enumerate()
            .map(|(i, note)| format!("{}. ID: {}, Content: {}", i + 1, note.id, note.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Prompt asking for exactly one schedule action object
    pub fn for_schedule_edit(&self, instruction: &str) -> String {
        let context = self.task_context();

        format!(
            r#"You are an AI assistant that can edit schedules. Current tasks for today:
{context}

User instruction: {instruction}

IMPORTANT VALIDATION:
- For ADD: You MUST have description, start time, and end time
- For ADD_MULTIPLE: You MUST provide an array of tasks, each with description, startTime, and endTime
- For UPDATE/COMPLETE/DELETE: You MUST identify which specific task by its ID
- For DELETE_MULTIPLE: You MUST provide an array of taskIds to delete
- If the task requested to be edited or deleted doesn't exist, use {{"action":"ITEM_NOT_FOUND","itemType":"task","itemId":"taskId-here"}}
- If information is missing, respond with {{"action":"NEED_INFO","message":"what you need"}}
- Tasks cannot happen simultaneously. A new task can only start before or after another one.

Respond with a single JSON object. Examples:
- To add a task: {{"action":"ADD","description":"task name","startTime":"14:00","endTime":"15:00","priority":"MEDIUM"}}
- To add multiple tasks: {{"action":"ADD_MULTIPLE","tasks":[{{"description":"task 1","startTime":"14:00","endTime":"15:00"}},{{"description":"task 2","startTime":"15:30","endTime":"16:30"}}]}}
- To update a task: {{"action":"UPDATE","taskId":"id-here","description":"new description","priority":"HIGH"}}
- To complete a task: {{"action":"COMPLETE","taskId":"id-here"}}
- To delete a task: {{"action":"DELETE","taskId":"id-here"}}
- To delete multiple tasks: {{"action":"DELETE_MULTIPLE","taskIds":["id-1","id-2"]}}
- If unclear: {{"action":"NEED_INFO","message":"Please specify which task to complete"}}

Priority is one of HIGH, MEDIUM, LOW. Use 24-hour time format (HH:MM)."#
        )
    }

    /// Prompt asking for exactly one note action object
    pub fn for_note_edit(&self, instruction: &str) -> String {
        let context = self.note_context();

        format!(
            r#"You are an AI assistant that can edit notes. User's current notes:
{context}

User instruction: {instruction}

IMPORTANT VALIDATION:
- For UPDATE: You MUST have both noteId and new content
- For DELETE: You MUST have the noteId to delete
- For DELETE_MULTIPLE: You MUST provide an array of noteIds to delete
- If the note requested to be edited or deleted doesn't exist, use {{"action":"ITEM_NOT_FOUND","itemType":"note","itemId":"id-here"}}
- If information is missing or unclear, respond with {{"action":"NEED_INFO","message":"what you need"}}

Respond with a single JSON object. Examples:
- To add a note: {{"action":"ADD","content":"note content here"}}
- To update a note: {{"action":"UPDATE","noteId":"id-here","content":"updated content"}}
- To delete a note: {{"action":"DELETE","noteId":"id-here"}}
- To delete multiple notes: {{"action":"DELETE_MULTIPLE","noteIds":["id-1","id-2"]}}
- If unclear: {{"action":"NEED_INFO","message":"Please specify which note to update"}}"#
        )
    }

    pub fn for_chat(message: &str) -> String {
        format!("You are a helpful planning assistant. Respond to the following message: {message}")
    }
}
