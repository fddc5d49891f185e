//! Dayplan - daily schedule and notes with a language-model editor
//!
//! A small planner that keeps:
//! - A per-date task schedule with overlap detection
//! - A free-form note collection
//! - An assistant that turns model replies into edits on either collection

pub mod action;
pub mod assistant;
pub mod config;
pub mod gateway;
pub mod notes;
pub mod persistence;
pub mod schedule;

pub use action::{NoteAction, ParseFailure, ScheduleAction};
pub use assistant::{Assistant, NoteExecutor, PromptBuilder, ScheduleExecutor};
pub use gateway::AiGateway;
pub use notes::{Note, NoteStore};
pub use persistence::{JsonFileStore, NotePersistence, TaskPersistence};
pub use schedule::{Insertion, Priority, ScheduleStore, Task, TaskStatus};

use std::path::PathBuf;
use std::time::Duration;

/// Which language-model backend answers prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Google Gemini over HTTPS with an API key
    Gemini,
    /// Local OpenAI-compatible chat-completions server (LM Studio)
    LmStudio,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::LmStudio => write!(f, "lmstudio"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = DayplanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "lmstudio" | "lm-studio" | "local" => Ok(Self::LmStudio),
            other => Err(DayplanError::Config(format!("unknown AI provider: {other}"))),
        }
    }
}

/// Configuration for Dayplan
#[derive(Debug, Clone)]
pub struct DayplanConfig {
    /// Directory holding tasks.json and notes.json
    pub data_dir: PathBuf,

    /// Active model backend
    pub provider: Provider,

    /// Gemini API key (required when provider is Gemini)
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    pub gemini_model: String,

    /// Base URL of the local chat-completions server
    pub lmstudio_url: String,

    /// Model name sent to the local server
    pub lmstudio_model: String,

    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl DayplanConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            provider: Provider::Gemini,
            gemini_api_key: None,
            gemini_model: config::DEFAULT_GEMINI_MODEL.to_string(),
            lmstudio_url: config::DEFAULT_LMSTUDIO_URL.to_string(),
            lmstudio_model: config::DEFAULT_LMSTUDIO_MODEL.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    pub fn with_lmstudio(mut self, url: impl Into<String>, model: impl Into<String>) -> Self {
        self.lmstudio_url = url.into();
        self.lmstudio_model = model.into();
        self
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(persistence::TASKS_FILE)
    }

    pub fn notes_file(&self) -> PathBuf {
        self.data_dir.join(persistence::NOTES_FILE)
    }
}

/// Result type for Dayplan operations
pub type Result<T> = std::result::Result<T, DayplanError>;

/// Errors that can occur in Dayplan
#[derive(Debug, thiserror::Error)]
pub enum DayplanError {
    /// Malformed direct input to a store mutator
    #[error("{0}")]
    Validation(String),

    /// The model backend could not be reached or answered with a failure
    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
