//! Typed decisions parsed from oracle payloads.

use super::payload::Payload;
use aide_core::dates::parse_due_at;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The action the router chose for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    SaveNote {
        content: String,
    },
    ListNotes,
    ListReminders,
    /// Not supported yet; fields are kept as given for logging.
    UpdateReminder {
        id: Option<String>,
        new_due_at: Option<String>,
    },
    /// Not supported yet.
    DeleteReminder {
        id: Option<String>,
    },
    /// No action applies; answer conversationally.
    None,
}

impl Decision {
    /// Short label recorded in the audit log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SaveNote { .. } => "save_note",
            Self::ListNotes => "list_notes",
            Self::ListReminders => "list_reminders",
            Self::UpdateReminder { .. } => "update_reminder",
            Self::DeleteReminder { .. } => "delete_reminder",
            Self::None => "none",
        }
    }
}

/// Turn a routing payload into a [`Decision`]. Anything invalid is `Decision::None`.
pub fn parse_decision(payload: Payload) -> Decision {
    let Payload::Json(mut value) = payload else {
        return Decision::None;
    };

    // Accept `"Save_Note"` and similar spellings of the tag.
    if let Some(action) = value.get("action").and_then(Value::as_str) {
        let normalized = action.trim().to_lowercase();
        value["action"] = Value::String(normalized);
    }

    match serde_json::from_value::<Decision>(value) {
        Ok(Decision::SaveNote { content }) => {
            let content = content.trim();
            if content.is_empty() {
                Decision::None
            } else {
                Decision::SaveNote {
                    content: content.to_string(),
                }
            }
        }
        Ok(decision) => decision,
        Err(e) => {
            tracing::debug!("routing payload rejected: {e}");
            Decision::None
        }
    }
}

/// A reminder the extractor found, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub task: String,
    pub due_at: NaiveDateTime,
    pub owner: String,
}

/// Build a [`ReminderDraft`] from an extraction payload.
///
/// Requires a non-empty string `task` and a string `due_at` in the fixed
/// `YYYY-MM-DD HH:MM` format. Every other shape is `None`.
pub fn parse_reminder_draft(payload: Payload, owner: &str) -> Option<ReminderDraft> {
    let Payload::Json(value) = payload else {
        return None;
    };
    let task = value.get("task")?.as_str()?.trim();
    if task.is_empty() {
        return None;
    }
    let due_at = parse_due_at(value.get("due_at")?.as_str()?)?;
    Some(ReminderDraft {
        task: task.to_string(),
        due_at,
        owner: owner.to_string(),
    })
}
