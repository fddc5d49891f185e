//! Task model for the daily schedule

use crate::{DayplanError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire and display format for times of day
pub const TIME_FORMAT: &str = "%H:%M";

/// Longest description accepted by the store
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Lifecycle state of a task. Any state may follow any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DayplanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            other => Err(DayplanError::Validation(format!(
                "Unknown task status: {other}"
            ))),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Case-insensitive match against HIGH / MEDIUM / LOW.
    /// Anything else is `None` so callers can pick their own fallback.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

/// A scheduled block of time on one calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    /// Create a pending, medium-priority task with a fresh id
    pub fn new(
        description: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            start_time,
            end_time,
            date,
            status: TaskStatus::Pending,
            priority: Priority::Medium,
        }
    }

    /// Half-open interval intersection on the same date
    pub fn overlaps(&self, other: &Task) -> bool {
        self.date == other.date && intervals_overlap(self.start_time, self.end_time, other)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// `HH:MM - HH:MM`
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format(TIME_FORMAT),
            self.end_time.format(TIME_FORMAT)
        )
    }
}

pub(crate) fn intervals_overlap(start: NaiveTime, end: NaiveTime, other: &Task) -> bool {
    start < other.end_time && end > other.start_time
}

/// Parse a 24-hour time of day. Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| DayplanError::InvalidTime(trimmed.to_string()))
}

mod hhmm {
    use super::TIME_FORMAT;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("Study", t("14:00"), t("15:00"), day());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.duration_minutes(), 60);
        assert_eq!(task.time_range(), "14:00 - 15:00");
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = Task::new("a", t("09:00"), t("10:00"), day());
        let b = Task::new("b", t("10:00"), t("11:00"), day());
        let c = Task::new("c", t("09:30"), t("10:30"), day());
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_different_dates_never_overlap() {
        let a = Task::new("a", t("09:00"), t("10:00"), day());
        let mut b = a.clone();
        b.date = day().succ_opt().unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(t("07:05"), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert_eq!(t("23:59:30"), NaiveTime::from_hms_opt(23, 59, 30).unwrap());
        assert!(matches!(
            parse_time("25:00"),
            Err(DayplanError::InvalidTime(_))
        ));
        assert!(parse_time("noon").is_err());
    }

    #[test]
    fn test_priority_and_status_parsing() {
        assert_eq!(Priority::parse("high"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!("in progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task::new("Read", t("08:00"), t("08:30"), day());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["startTime"], "08:00");
        assert_eq!(value["date"], "2025-03-14");
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["priority"], "MEDIUM");

        let back: Task = serde_json::from_value(value).unwrap();
        assert_eq!(back, task);
    }
}
