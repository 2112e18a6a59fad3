//! Reminder dispatcher: pushes due reminders to their owners.
//!
//! Each scan claims a reminder before sending and marks it delivered only
//! after the channel accepted it. A failed send releases the claim so a later
//! scan can retry; a crash between send and mark holds the claim until the
//! lease expires.

use crate::reply;
use aide_core::{
    config::SchedulerConfig,
    dates::truncate_to_minute,
    error::AideError,
    message::OutgoingMessage,
    model::{DeliveryMatch, Reminder},
    traits::Channel,
};
use aide_memory::Store;
use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome counts of one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub delivered: usize,
    pub failed: usize,
    /// Claimed by another dispatcher or already delivered.
    pub skipped: usize,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Polls the store and delivers due reminders through a channel.
pub struct Dispatcher {
    store: Store,
    channel: Arc<dyn Channel>,
    poll: Duration,
    mode: DeliveryMatch,
}

impl Dispatcher {
    pub fn new(store: Store, channel: Arc<dyn Channel>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            channel,
            poll: Duration::from_secs(config.poll_interval_secs),
            mode: config.delivery_match,
        }
    }

    /// Scan, then sleep the full poll interval, until `shutdown` resolves.
    ///
    /// Scans never overlap. A scan in progress finishes before shutdown.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "dispatcher running | channel: {} | poll: {}s | match: {}",
            self.channel.name(),
            self.poll.as_secs(),
            self.mode.as_str()
        );
        tokio::pin!(shutdown);

        loop {
            let now = chrono::Local::now().naive_local();
            match self.scan(now).await {
                Ok(report) if report.is_empty() => debug!("dispatcher: nothing due"),
                Ok(report) => info!(
                    "dispatcher: delivered={} failed={} skipped={}",
                    report.delivered, report.failed, report.skipped
                ),
                Err(e) => error!("dispatcher scan failed: {e}"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll) => {}
                _ = &mut shutdown => {
                    info!("dispatcher stopping");
                    break;
                }
            }
        }
    }

    /// Deliver every reminder due at `now` (minute resolution).
    pub async fn scan(&self, now: NaiveDateTime) -> Result<ScanReport, AideError> {
        let now = truncate_to_minute(now);
        let due = self.store.due_reminders(now, self.mode).await?;
        let mut report = ScanReport::default();

        for reminder in &due {
            match self.store.claim_reminder(&reminder.id, now).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("reminder {} claimed elsewhere", reminder.short_id());
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!("could not claim reminder {}: {e}", reminder.short_id());
                    report.failed += 1;
                    continue;
                }
            }

            if self.deliver(reminder).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    /// Send one claimed reminder and record the outcome. Returns `true` when delivered.
    async fn deliver(&self, reminder: &Reminder) -> bool {
        let message = OutgoingMessage::to(
            &reminder.owner,
            reply::reminder_notification(&reminder.task),
        );

        if let Err(e) = self.channel.send(message).await {
            warn!(
                "failed to send reminder {} to {}: {e}",
                reminder.short_id(),
                reminder.owner
            );
            if let Err(e) = self.store.release_claim(&reminder.id).await {
                error!("could not release claim on {}: {e}", reminder.short_id());
            }
            return false;
        }

        match self.store.mark_delivered(&reminder.id).await {
            Ok(true) => {
                info!(
                    "delivered reminder {} to {}",
                    reminder.short_id(),
                    reminder.owner
                );
                true
            }
            Ok(false) => {
                warn!("reminder {} was already marked delivered", reminder.short_id());
                true
            }
            Err(e) => {
                error!(
                    "reminder {} sent but not marked delivered: {e}",
                    reminder.short_id()
                );
                false
            }
        }
    }
}
