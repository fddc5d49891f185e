//! Assistant for Dayplan
//!
//! Wires prompt building, the model backend and the two executors together:
//! instruction → prompt → model reply → parsed action → store mutation → save.

mod note_executor;
mod prompt;
mod schedule_executor;

pub use note_executor::NoteExecutor;
pub use prompt::PromptBuilder;
pub use schedule_executor::ScheduleExecutor;

use crate::gateway::AiGateway;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Token limits per request type
pub const SCHEDULE_EDIT_MAX_TOKENS: u32 = 500;
pub const NOTE_EDIT_MAX_TOKENS: u32 = 300;
pub const CHAT_MAX_TOKENS: u32 = 1000;

/// Returned when a reply has no usable action
pub const UNRECOGNIZED_ACTION: &str =
    "Action not completed. Please try again or use a different prompt.";

/// A panic while holding a store lock leaves the data intact; keep using it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Front door for model-driven edits and chat
pub struct Assistant {
    gateway: Arc<dyn AiGateway>,
    schedule: ScheduleExecutor,
    notes: NoteExecutor,
}

impl Assistant {
    pub fn new(gateway: Arc<dyn AiGateway>, schedule: ScheduleExecutor, notes: NoteExecutor) -> Self {
        Self {
            gateway,
            schedule,
            notes,
        }
    }

    pub fn schedule(&self) -> &ScheduleExecutor {
        &self.schedule
    }

    pub fn notes(&self) -> &NoteExecutor {
        &self.notes
    }

    pub fn describe(&self) -> String {
        self.gateway.describe()
    }

    /// Ask the model to edit today's schedule according to `instruction`
    pub async fn edit_schedule(&self, instruction: &str, today: NaiveDate) -> String {
        let tasks = self.schedule.snapshot(today);
        let prompt = PromptBuilder::new()
            .with_tasks(&tasks)
            .for_schedule_edit(instruction);
        debug!("Schedule edit prompt:\n{}", prompt);

        match self.gateway.generate(&prompt, SCHEDULE_EDIT_MAX_TOKENS).await {
            Ok(reply) => {
                debug!("Schedule edit reply: {}", reply);
                let result = self.schedule.execute(&reply, today);
                info!("Schedule edit: {}", first_line(&result));
                result
            }
            Err(e) => {
                warn!("Schedule edit failed: {}", e);
                "Sorry, I encountered an error editing your schedule. Please try again.".to_string()
            }
        }
    }

    /// Ask the model to edit the note collection according to `instruction`
    pub async fn edit_notes(&self, instruction: &str) -> String {
        let notes = self.notes.snapshot();
        let prompt = PromptBuilder::new()
            .with_notes(&notes)
            .for_note_edit(instruction);
        debug!("Note edit prompt:\n{}", prompt);

        match self.gateway.generate(&prompt, NOTE_EDIT_MAX_TOKENS).await {
            Ok(reply) => {
                debug!("Note edit reply: {}", reply);
                let result = self.notes.execute(&reply);
                info!("Note edit: {}", first_line(&result));
                result
            }
            Err(e) => {
                warn!("Note edit failed: {}", e);
                "Sorry, I encountered an error editing your notes. Please try again.".to_string()
            }
        }
    }

    /// Free-form chat; never touches the stores
    pub async fn chat(&self, message: &str) -> String {
        let prompt = PromptBuilder::for_chat(message);
        match self.gateway.generate(&prompt, CHAT_MAX_TOKENS).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat failed: {}", e);
                "Sorry, I encountered an error processing your message.".to_string()
            }
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
