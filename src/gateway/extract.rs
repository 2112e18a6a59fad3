//! Reminder extraction: one oracle call, strict parsing, no persistence.

use super::Gateway;
use crate::markers::*;
use aide_core::{config::NO_REMINDER, dates::ground_truth_for};
use chrono::NaiveDateTime;
use tracing::{debug, info};

impl Gateway {
    /// Ask the oracle whether `message` is a reminder request.
    ///
    /// Total: oracle failures, timeouts, the sentinel and every malformed
    /// payload all yield `None`.
    pub(super) async fn extract(
        &self,
        message: &str,
        owner: &str,
        now: NaiveDateTime,
    ) -> Option<ReminderDraft> {
        let dates = ground_truth_for(now, message);
        let prompt = self.prompts.extraction_with(&dates);

        let payload = self.classify(&prompt, message, NO_REMINDER).await;
        let sentinel = payload == Payload::Sentinel;
        let draft = parse_reminder_draft(payload, owner);

        match &draft {
            Some(d) => info!("extracted reminder '{}' due {}", d.task, d.due_at),
            None if sentinel => debug!("message is not a reminder"),
            None => debug!("extraction payload rejected, falling back to routing"),
        }
        draft
    }
}
