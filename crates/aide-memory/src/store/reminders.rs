//! Reminder creation, listing, and the dispatch lifecycle.
//!
//! A reminder moves `pending → delivered` exactly once. The dispatcher first
//! takes a short claim on a row, sends, then flips `delivered`; every write
//! is a conditional single-statement update so concurrent dispatchers cannot
//! both win the same reminder.

use super::Store;
use aide_core::{
    dates::{format_due_at, parse_due_at, truncate_to_minute},
    error::AideError,
    model::{DeliveryMatch, Reminder},
};
use chrono::NaiveDateTime;
use uuid::Uuid;

/// How long a dispatch claim holds before another scan may take the reminder.
pub const CLAIM_LEASE_MINUTES: i64 = 5;

const CLAIM_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// (id, owner, task, due_at, delivered)
type ReminderRow = (String, String, String, String, bool);

fn into_reminder((id, owner, task, due_at, delivered): ReminderRow) -> Result<Reminder, AideError> {
    let parsed = parse_due_at(&due_at)
        .ok_or_else(|| AideError::Memory(format!("reminder {id} has malformed due_at '{due_at}'")))?;
    Ok(Reminder {
        id,
        task,
        due_at: parsed,
        owner,
        delivered,
    })
}

fn into_reminders(rows: Vec<ReminderRow>) -> Result<Vec<Reminder>, AideError> {
    rows.into_iter().map(into_reminder).collect()
}

impl Store {
    /// Create a reminder for `owner`.
    ///
    /// An identical undelivered reminder (same owner, task, and minute) is
    /// returned instead of inserting a duplicate, so a redelivered webhook
    /// does not schedule the same thing twice. The unique pending index makes
    /// the insert the arbiter when two requests race.
    pub async fn create_reminder(
        &self,
        owner: &str,
        task: &str,
        due_at: NaiveDateTime,
    ) -> Result<Reminder, AideError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(AideError::Memory("reminder task must not be empty".into()));
        }
        let due_at = truncate_to_minute(due_at);
        let due = format_due_at(due_at);

        let id = Uuid::new_v4().to_string();
        let inserted = sqlx::query(
            "INSERT INTO reminders (id, owner, task, due_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&id)
        .bind(owner)
        .bind(task)
        .bind(&due)
        .execute(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("create reminder failed: {e}")))?;

        let id = if inserted.rows_affected() == 1 {
            id
        } else {
            let (existing,): (String,) = sqlx::query_as(
                "SELECT id FROM reminders \
                 WHERE owner = ? AND task = ? AND due_at = ? AND delivered = 0 \
                 LIMIT 1",
            )
            .bind(owner)
            .bind(task)
            .bind(&due)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AideError::Memory(format!("dedup lookup failed: {e}")))?;
            tracing::info!("reminder dedup: reusing existing {existing}");
            existing
        };

        Ok(Reminder {
            id,
            task: task.to_string(),
            due_at,
            owner: owner.to_string(),
            delivered: false,
        })
    }

    /// Look up a reminder by full id.
    pub async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>, AideError> {
        let row: Option<ReminderRow> = sqlx::query_as(
            "SELECT id, owner, task, due_at, delivered FROM reminders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("get reminder failed: {e}")))?;

        row.map(into_reminder).transpose()
    }

    /// All reminders of one owner, soonest first.
    pub async fn reminders_for_owner(&self, owner: &str) -> Result<Vec<Reminder>, AideError> {
        let rows: Vec<ReminderRow> = sqlx::query_as(
            "SELECT id, owner, task, due_at, delivered FROM reminders \
             WHERE owner = ? \
             ORDER BY due_at ASC, rowid ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("list reminders failed: {e}")))?;

        into_reminders(rows)
    }

    /// Undelivered, unclaimed reminders due at `now` (truncated to the minute).
    pub async fn due_reminders(
        &self,
        now: NaiveDateTime,
        mode: DeliveryMatch,
    ) -> Result<Vec<Reminder>, AideError> {
        let minute = format_due_at(truncate_to_minute(now));
        let stale = stale_claim_cutoff(now);

        let sql = match mode {
            DeliveryMatch::Exact => {
                "SELECT id, owner, task, due_at, delivered FROM reminders \
                 WHERE delivered = 0 AND due_at = ? \
                 AND (claimed_at IS NULL OR claimed_at < ?) \
                 ORDER BY due_at ASC, rowid ASC"
            }
            DeliveryMatch::CatchUp => {
                "SELECT id, owner, task, due_at, delivered FROM reminders \
                 WHERE delivered = 0 AND due_at <= ? \
                 AND (claimed_at IS NULL OR claimed_at < ?) \
                 ORDER BY due_at ASC, rowid ASC"
            }
        };

        let rows: Vec<ReminderRow> = sqlx::query_as(sql)
            .bind(&minute)
            .bind(&stale)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AideError::Memory(format!("get due reminders failed: {e}")))?;

        into_reminders(rows)
    }

    /// Take the dispatch claim on a reminder.
    ///
    /// Returns `false` when the reminder is already delivered or another
    /// scan holds a fresh claim.
    pub async fn claim_reminder(&self, id: &str, now: NaiveDateTime) -> Result<bool, AideError> {
        let result = sqlx::query(
            "UPDATE reminders SET claimed_at = ? \
             WHERE id = ? AND delivered = 0 \
             AND (claimed_at IS NULL OR claimed_at < ?)",
        )
        .bind(now.format(CLAIM_FORMAT).to_string())
        .bind(id)
        .bind(stale_claim_cutoff(now))
        .execute(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("claim reminder failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Flip `delivered` to true. Only the `false → true` transition succeeds;
    /// returns `false` if the reminder was already delivered.
    pub async fn mark_delivered(&self, id: &str) -> Result<bool, AideError> {
        let result = sqlx::query(
            "UPDATE reminders \
             SET delivered = 1, delivered_at = datetime('now', 'localtime'), claimed_at = NULL \
             WHERE id = ? AND delivered = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("mark delivered failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Drop the dispatch claim after a failed send so a later scan may retry.
    pub async fn release_claim(&self, id: &str) -> Result<bool, AideError> {
        let result = sqlx::query(
            "UPDATE reminders SET claimed_at = NULL WHERE id = ? AND delivered = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("release claim failed: {e}")))?;

        Ok(result.rows_affected() == 1)
    }
}

fn stale_claim_cutoff(now: NaiveDateTime) -> String {
    (now - chrono::Duration::minutes(CLAIM_LEASE_MINUTES))
        .format(CLAIM_FORMAT)
        .to_string()
}
