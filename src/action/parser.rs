//! Typed actions decoded from model replies

use super::scanner::{
    array_field, non_empty_field, objects, split_elements, string_elements, string_field,
};
use crate::schedule::Priority;
use tracing::{debug, warn};

/// Why a reply could not be turned into an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// No `"action"` field anywhere in the reply
    NoActionKind,
    UnknownKind(String),
    /// The detected kind requires this field and it was absent
    MissingField(&'static str),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActionKind => write!(f, "reply has no action field"),
            Self::UnknownKind(kind) => write!(f, "unknown action kind '{kind}'"),
            Self::MissingField(field) => write!(f, "missing required field '{field}'"),
        }
    }
}

/// The `"action"` tag, decoded once before any field is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Add,
    AddMultiple,
    Update,
    Complete,
    Delete,
    DeleteMultiple,
    ItemNotFound,
    NeedInfo,
}

impl ActionKind {
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "ADD" => Some(Self::Add),
            "ADD_MULTIPLE" => Some(Self::AddMultiple),
            "UPDATE" => Some(Self::Update),
            "COMPLETE" => Some(Self::Complete),
            "DELETE" => Some(Self::Delete),
            "DELETE_MULTIPLE" => Some(Self::DeleteMultiple),
            "ITEM_NOT_FOUND" => Some(Self::ItemNotFound),
            "NEED_INFO" => Some(Self::NeedInfo),
            _ => None,
        }
    }

    /// Locate the action object in `raw` and decode its kind.
    /// Returns the kind with the text its fields should be read from.
    fn detect(raw: &str) -> Result<(Self, &str), ParseFailure> {
        let body = objects(raw)
            .find(|object| string_field(object, "action").is_some())
            .unwrap_or(raw);
        let tag = string_field(body, "action").ok_or(ParseFailure::NoActionKind)?;
        let kind = Self::parse(&tag).ok_or(ParseFailure::UnknownKind(tag))?;
        Ok((kind, body))
    }
}

/// One task in an ADD or ADD_MULTIPLE payload. Times stay as text here and
/// are parsed when the action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub priority: Option<Priority>,
}

impl TaskSpec {
    fn from_fields(text: &str) -> Result<Self, ParseFailure> {
        Ok(Self {
            description: non_empty_field(text, "description")
                .ok_or(ParseFailure::MissingField("description"))?,
            start_time: non_empty_field(text, "startTime")
                .ok_or(ParseFailure::MissingField("startTime"))?,
            end_time: non_empty_field(text, "endTime")
                .ok_or(ParseFailure::MissingField("endTime"))?,
            priority: string_field(text, "priority").and_then(|p| Priority::parse(&p)),
        })
    }
}

/// Something the model reported rather than asked us to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemNotFound {
    pub item_type: Option<String>,
    pub item_id: Option<String>,
}

impl ItemNotFound {
    fn from_fields(text: &str) -> Self {
        Self {
            item_type: non_empty_field(text, "itemType"),
            item_id: non_empty_field(text, "itemId"),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.item_type, &self.item_id) {
            (Some(item_type), Some(item_id)) => {
                format!("The {item_type} with ID {item_id} does not exist in the system.")
            }
            _ => "The requested item does not exist.".to_string(),
        }
    }
}

/// A schedule edit requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleAction {
    Add(TaskSpec),
    AddMultiple(Vec<TaskSpec>),
    Update {
        task_id: String,
        description: Option<String>,
        priority: Option<Priority>,
    },
    Complete {
        task_id: String,
    },
    Delete {
        task_id: String,
    },
    DeleteMultiple {
        task_ids: Vec<String>,
    },
    ItemNotFound(ItemNotFound),
    NeedInfo {
        message: Option<String>,
    },
}

impl ScheduleAction {
    /// Decode a schedule action from raw model output.
    ///
    /// Batch elements that lack a required field are dropped with a warning;
    /// the rest of the batch is kept.
    pub fn parse(raw: &str) -> Result<Self, ParseFailure> {
        let (kind, body) = ActionKind::detect(raw)?;
        debug!("Decoded schedule action kind {:?}", kind);

        let action = match kind {
            ActionKind::Add => Self::Add(TaskSpec::from_fields(body)?),
            ActionKind::AddMultiple => {
                let array = array_field(body, "tasks").ok_or(ParseFailure::MissingField("tasks"))?;
                let specs = split_elements(array)
                    .into_iter()
                    .filter_map(|element| match TaskSpec::from_fields(element) {
                        Ok(spec) => Some(spec),
                        Err(failure) => {
                            warn!("Skipping batch task: {}", failure);
                            None
                        }
                    })
                    .collect();
                Self::AddMultiple(specs)
            }
            ActionKind::Update => Self::Update {
                task_id: required(body, "taskId")?,
                description: non_empty_field(body, "description"),
                priority: string_field(body, "priority").and_then(|p| Priority::parse(&p)),
            },
            ActionKind::Complete => Self::Complete {
                task_id: required(body, "taskId")?,
            },
            ActionKind::Delete => Self::Delete {
                task_id: required(body, "taskId")?,
            },
            ActionKind::DeleteMultiple => Self::DeleteMultiple {
                task_ids: id_list(body, "taskIds")?,
            },
            ActionKind::ItemNotFound => Self::ItemNotFound(ItemNotFound::from_fields(body)),
            ActionKind::NeedInfo => Self::NeedInfo {
                message: non_empty_field(body, "message"),
            },
        };
        Ok(action)
    }
}

/// A note edit requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteAction {
    Add { content: String },
    Update { note_id: String, content: String },
    Delete { note_id: String },
    DeleteMultiple { note_ids: Vec<String> },
    ItemNotFound(ItemNotFound),
    NeedInfo { message: Option<String> },
}

impl NoteAction {
    pub fn parse(raw: &str) -> Result<Self, ParseFailure> {
        let (kind, body) = ActionKind::detect(raw)?;
        debug!("Decoded note action kind {:?}", kind);

        let action = match kind {
            ActionKind::Add => Self::Add {
                content: required(body, "content")?,
            },
            ActionKind::Update => Self::Update {
                note_id: required(body, "noteId")?,
                content: required(body, "content")?,
            },
            ActionKind::Delete => Self::Delete {
                note_id: required(body, "noteId")?,
            },
            ActionKind::DeleteMultiple => Self::DeleteMultiple {
                note_ids: id_list(body, "noteIds")?,
            },
            ActionKind::ItemNotFound => Self::ItemNotFound(ItemNotFound::from_fields(body)),
            ActionKind::NeedInfo => Self::NeedInfo {
                message: non_empty_field(body, "message"),
            },
            ActionKind::AddMultiple | ActionKind::Complete => {
                return Err(ParseFailure::UnknownKind(format!("{kind:?}")))
            }
        };
        Ok(action)
    }
}

fn required(body: &str, field: &'static str) -> Result<String, ParseFailure> {
    non_empty_field(body, field).ok_or(ParseFailure::MissingField(field))
}

fn id_list(body: &str, field: &'static str) -> Result<Vec<String>, ParseFailure> {
    let array = array_field(body, field).ok_or(ParseFailure::MissingField(field))?;
    Ok(string_elements(array))
}
