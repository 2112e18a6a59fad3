//! Gateway: turns one inbound message into one reply.
//!
//! Pipeline: built-in command → reminder extraction → intent routing →
//! conversational fallback. Every handled message is audited.

mod extract;
mod routing;
mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use scheduler::{Dispatcher, ScanReport};

use crate::{commands::Command, markers::*, reply};
use aide_core::{
    config::Prompts, context::Context, error::AideError, message::IncomingMessage,
    traits::Provider,
};
use aide_memory::{
    audit::{AuditEntry, AuditLogger, AuditStatus},
    Store,
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// The message pipeline shared by the webhook and `aide ask`.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) memory: Store,
    pub(super) audit: AuditLogger,
    pub(super) prompts: Prompts,
    /// Upper bound for every oracle call.
    pub(super) oracle_timeout: Duration,
}

/// Result of a successfully handled message.
struct Handled {
    reply: String,
    intent: &'static str,
    used_oracle: bool,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        memory: Store,
        prompts: Prompts,
        oracle_timeout: Duration,
    ) -> Self {
        let audit = AuditLogger::new(memory.pool().clone());
        Self {
            provider,
            memory,
            audit,
            prompts,
            oracle_timeout,
        }
    }

    /// Handle one inbound message. Always produces a reply.
    ///
    /// `now` is the local reference time used to resolve relative dates.
    pub async fn handle_message(&self, incoming: &IncomingMessage, now: NaiveDateTime) -> String {
        let started = Instant::now();
        info!(
            "inbound {} from {}: {}",
            incoming.channel,
            incoming.sender_id,
            preview(&incoming.text)
        );

        let (reply, intent, used_oracle, status) = match self.process(incoming, now).await {
            Ok(handled) => (
                handled.reply,
                Some(handled.intent),
                handled.used_oracle,
                AuditStatus::Ok,
            ),
            Err(e) => {
                error!("failed to handle message from {}: {e}", incoming.sender_id);
                (reply::GENERIC_ERROR.to_string(), None, false, AuditStatus::Error)
            }
        };

        self.record(
            incoming,
            &reply,
            intent,
            used_oracle.then(|| self.provider.name().to_string()),
            started,
            status,
        )
        .await;

        reply
    }

    /// Audit a message whose handler aborted before producing a reply.
    pub async fn record_aborted(&self, incoming: &IncomingMessage, started: Instant) {
        self.record(
            incoming,
            reply::GENERIC_ERROR,
            None,
            None,
            started,
            AuditStatus::Error,
        )
        .await;
    }

    async fn record(
        &self,
        incoming: &IncomingMessage,
        reply: &str,
        intent: Option<&str>,
        provider_used: Option<String>,
        started: Instant,
        status: AuditStatus,
    ) {
        let entry = AuditEntry {
            channel: incoming.channel.clone(),
            sender_id: incoming.sender_id.clone(),
            input_text: incoming.text.clone(),
            output_text: Some(reply.to_string()),
            intent: intent.map(str::to_string),
            provider_used,
            processing_ms: Some(started.elapsed().as_millis() as i64),
            status,
        };
        if let Err(e) = self.audit.log(&entry).await {
            warn!("audit log write failed: {e}");
        }
    }

    async fn process(
        &self,
        incoming: &IncomingMessage,
        now: NaiveDateTime,
    ) -> Result<Handled, AideError> {
        let text = incoming.text.trim();
        let owner = incoming.sender_id.as_str();

        if text.is_empty() {
            return Ok(Handled {
                reply: reply::help(),
                intent: "empty",
                used_oracle: false,
            });
        }

        if let Some(command) = Command::parse(text) {
            let reply = match &command {
                Command::Help => reply::help(),
                Command::Notes => self.list_notes_reply().await?,
                Command::Reminders => self.list_reminders_reply(owner).await?,
                Command::SaveNote(content) => {
                    let note = self.memory.insert_note(owner, content).await?;
                    reply::note_saved(&note.content)
                }
            };
            return Ok(Handled {
                reply,
                intent: command.label(),
                used_oracle: false,
            });
        }

        if let Some(draft) = self.extract(text, owner, now).await {
            let reminder = self
                .memory
                .create_reminder(&draft.owner, &draft.task, draft.due_at)
                .await?;
            info!(
                "reminder {} scheduled for {} at {}",
                reminder.short_id(),
                reminder.owner,
                reminder.due_at
            );
            return Ok(Handled {
                reply: reply::reminder_saved(&reminder),
                intent: "reminder",
                used_oracle: true,
            });
        }

        let (decision, reply) = self.route(text, owner, now).await?;
        Ok(Handled {
            reply,
            intent: decision.label(),
            used_oracle: true,
        })
    }

    /// One bounded oracle call whose output is reduced to a [`Payload`].
    ///
    /// Errors and timeouts are logged and become [`Payload::Unparseable`].
    pub(super) async fn classify(&self, system_prompt: &str, message: &str, sentinel: &str) -> Payload {
        let ctx = Context::with_system(system_prompt, message);
        match tokio::time::timeout(self.oracle_timeout, self.provider.complete(&ctx)).await {
            Ok(Ok(resp)) => {
                let meta = &resp.metadata;
                debug!(
                    "oracle {} ({}) answered in {}ms, {} tokens: {}",
                    meta.provider_used,
                    meta.model.as_deref().unwrap_or("default model"),
                    meta.processing_time_ms,
                    meta.tokens_used.map_or("?".to_string(), |t| t.to_string()),
                    resp.text
                );
                extract_payload(&resp.text, sentinel)
            }
            Ok(Err(e)) => {
                warn!("oracle call failed: {e}");
                Payload::Unparseable
            }
            Err(_) => {
                warn!(
                    "oracle call timed out after {}s",
                    self.oracle_timeout.as_secs()
                );
                Payload::Unparseable
            }
        }
    }
}

/// First 80 chars of a message for log lines.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        out.push('…');
    }
    out
}
