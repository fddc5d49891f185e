//! Note model and punctuation normalisation

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Creation timestamps are stored and displayed in this format
pub const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A free-form note. `creation_time` never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    #[serde(with = "creation_time")]
    pub creation_time: NaiveDateTime,
}

impl Note {
    /// Build a note from already-sanitized content, stamped with local time
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            creation_time: Local::now().naive_local(),
        }
    }

    pub fn formatted_creation_time(&self) -> String {
        self.creation_time.format(CREATION_TIME_FORMAT).to_string()
    }
}

/// Replace typographic punctuation with ASCII equivalents.
///
/// Dashes and the minus sign become `-`, curly quotes become `'` or `"`,
/// and a non-breaking space becomes a plain space. Applying it twice is the
/// same as applying it once.
pub fn sanitize_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect()
}

pub(crate) fn parse_creation_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, CREATION_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

mod creation_time {
    use super::{parse_creation_time, CREATION_TIME_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(CREATION_TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_creation_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid creation time: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_typographic_punctuation() {
        let input = "It\u{2019}s a \u{201C}quote\u{201D} \u{2013} with\u{00A0}space \u{2212}1";
        assert_eq!(
            sanitize_punctuation(input),
            "It's a \"quote\" - with space -1"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_punctuation("don\u{2019}t \u{2014} stop");
        assert_eq!(once, "don't - stop");
        assert_eq!(sanitize_punctuation(&once), once);
    }

    #[test]
    fn test_sanitize_keeps_other_unicode() {
        assert_eq!(sanitize_punctuation("café ✓ 日本"), "café ✓ 日本");
    }

    #[test]
    fn test_creation_time_formats() {
        let parsed = parse_creation_time("2025-01-31 08:15:00").unwrap();
        assert_eq!(parsed.format(CREATION_TIME_FORMAT).to_string(), "2025-01-31 08:15:00");
        assert!(parse_creation_time("2025-01-31T08:15:00.123").is_some());
        assert!(parse_creation_time("yesterday").is_none());
    }

    #[test]
    fn test_note_json_shape() {
        let note = Note {
            id: "n1".to_string(),
            content: "Buy milk".to_string(),
            creation_time: parse_creation_time("2025-01-31 08:15:00").unwrap(),
        };
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["creationTime"], "2025-01-31 08:15:00");
        let back: Note = serde_json::from_value(value).unwrap();
        assert_eq!(back, note);
    }
}
