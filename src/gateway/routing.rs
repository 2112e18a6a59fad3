//! Intent routing for messages that are not reminders, plus the conversational fallback.

use super::Gateway;
use crate::{markers::*, reply};
use aide_core::{
    config::NO_ACTION,
    context::Context,
    dates::{ground_truth, ground_truth_for},
    error::AideError,
};
use chrono::NaiveDateTime;
use tracing::{info, warn};

impl Gateway {
    /// Decide what `message` asks for and carry it out.
    ///
    /// Oracle and parse failures become [`Decision::None`]; only store
    /// failures are returned as errors.
    pub(super) async fn route(
        &self,
        message: &str,
        owner: &str,
        now: NaiveDateTime,
    ) -> Result<(Decision, String), AideError> {
        let dates = ground_truth_for(now, message);
        let prompt = self.prompts.routing_with(&dates);
        let decision = parse_decision(self.classify(&prompt, message, NO_ACTION).await);
        info!("routing: {} for {owner}", decision.label());

        let reply = match &decision {
            Decision::SaveNote { content } => {
                let note = self.memory.insert_note(owner, content).await?;
                reply::note_saved(&note.content)
            }
            Decision::ListNotes => self.list_notes_reply().await?,
            Decision::ListReminders => self.list_reminders_reply(owner).await?,
            Decision::UpdateReminder { id, new_due_at } => {
                info!(
                    "update requested for reminder {} to {}",
                    id.as_deref().unwrap_or("?"),
                    new_due_at.as_deref().unwrap_or("?")
                );
                reply::UPDATE_UNSUPPORTED.to_string()
            }
            Decision::DeleteReminder { id } => {
                info!(
                    "delete requested for reminder {}",
                    id.as_deref().unwrap_or("?")
                );
                reply::DELETE_UNSUPPORTED.to_string()
            }
            Decision::None => self.converse(message, now).await,
        };

        Ok((decision, reply))
    }

    /// All notes, oldest first.
    pub(super) async fn list_notes_reply(&self) -> Result<String, AideError> {
        let notes = self.memory.list_notes().await?;
        Ok(reply::notes_list(&notes))
    }

    /// Reminders of `owner`, soonest first.
    pub(super) async fn list_reminders_reply(&self, owner: &str) -> Result<String, AideError> {
        let reminders = self.memory.reminders_for_owner(owner).await?;
        Ok(reply::reminders_list(&reminders))
    }

    /// Free-form answer from the oracle. Never fails; a fixed apology stands in.
    async fn converse(&self, message: &str, now: NaiveDateTime) -> String {
        let system = format!("{}\n\n{}", self.prompts.conversation, ground_truth(now));
        let ctx = Context::with_system(&system, message);

        match tokio::time::timeout(self.oracle_timeout, self.provider.complete(&ctx)).await {
            Ok(Ok(resp)) => {
                let text = resp.text.trim();
                if text.is_empty() {
                    warn!("conversational reply was empty");
                    reply::FALLBACK_APOLOGY.to_string()
                } else {
                    text.to_string()
                }
            }
            Ok(Err(e)) => {
                warn!("conversational call failed: {e}");
                reply::FALLBACK_APOLOGY.to_string()
            }
            Err(_) => {
                warn!("conversational call timed out");
                reply::FALLBACK_APOLOGY.to_string()
            }
        }
    }
}
