//! Persisted records: notes and reminders.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A free-text note saved by a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Sender that saved the note.
    pub owner: String,
    /// Note text, never empty after trimming.
    pub content: String,
    pub created_at: String,
}

/// A one-shot reminder owned by a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub task: String,
    /// Absolute local due time at minute resolution.
    pub due_at: NaiveDateTime,
    pub owner: String,
    /// Set once by the dispatcher after a successful send.
    pub delivered: bool,
}

impl Reminder {
    /// Short id shown to users (first 8 chars of the uuid).
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// How the dispatcher matches due reminders against the current minute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMatch {
    /// `due_at` must equal the current minute. A missed minute is never retried.
    #[default]
    Exact,
    /// Any undelivered reminder with `due_at` at or before the current minute.
    CatchUp,
}

impl DeliveryMatch {
    /// Parse the configuration spelling (`exact`, `catch-up`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "exact" => Some(Self::Exact),
            "catch-up" | "catchup" | "catch_up" => Some(Self::CatchUp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::CatchUp => "catch-up",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_short_id() {
        let r = Reminder {
            id: "0123456789abcdef".into(),
            task: "x".into(),
            due_at: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            owner: "a".into(),
            delivered: false,
        };
        assert_eq!(r.short_id(), "01234567");
    }

    #[test]
    fn test_delivery_match_parse() {
        assert_eq!(DeliveryMatch::parse("exact"), Some(DeliveryMatch::Exact));
        assert_eq!(DeliveryMatch::parse(" Catch-Up "), Some(DeliveryMatch::CatchUp));
        assert_eq!(DeliveryMatch::parse("sometimes"), None);
        assert_eq!(DeliveryMatch::default().as_str(), "exact");
    }
}
