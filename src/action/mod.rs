//! Action parsing for Dayplan
//!
//! Turns loosely structured model output into typed schedule and note actions.

mod parser;
pub mod scanner;

pub use parser::{ActionKind, ItemNotFound, NoteAction, ParseFailure, ScheduleAction, TaskSpec};
