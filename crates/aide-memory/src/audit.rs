//! Audit log: records every message handled by the webhook.

use aide_core::error::AideError;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub channel: String,
    pub sender_id: String,
    pub input_text: String,
    pub output_text: Option<String>,
    /// Which branch handled the message (e.g. "reminder", "list_notes").
    pub intent: Option<String>,
    pub provider_used: Option<String>,
    pub processing_ms: Option<i64>,
    pub status: AuditStatus,
}

/// Status of an audited interaction.
pub enum AuditStatus {
    Ok,
    Error,
}

impl AuditStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), AideError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log \
             (id, channel, sender_id, input_text, output_text, intent, \
              provider_used, processing_ms, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.channel)
        .bind(&entry.sender_id)
        .bind(&entry.input_text)
        .bind(&entry.output_text)
        .bind(&entry.intent)
        .bind(&entry.provider_used)
        .bind(entry.processing_ms)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} {} [{}] {}",
            entry.channel,
            entry.sender_id,
            entry.status.as_str(),
            truncate(&entry.input_text, 80)
        );

        Ok(())
    }

    /// Number of entries recorded for a sender.
    pub async fn count_for_sender(&self, sender_id: &str) -> Result<i64, AideError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM audit_log WHERE sender_id = ?")
                .bind(sender_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AideError::Memory(format!("audit count failed: {e}")))?;
        Ok(count)
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // "ñ" is two bytes; cutting in the middle backs off.
        assert_eq!(truncate("mañana", 3), "ma");
    }

    #[tokio::test]
    async fn test_log_and_count() {
        let store = Store::in_memory().await.unwrap();
        let audit = AuditLogger::new(store.pool().clone());
        let entry = AuditEntry {
            channel: "whatsapp".into(),
            sender_id: "whatsapp:+15550001111".into(),
            input_text: "list notes".into(),
            output_text: Some("📭 You have no saved notes.".into()),
            intent: Some("list_notes".into()),
            provider_used: Some("openai".into()),
            processing_ms: Some(12),
            status: AuditStatus::Ok,
        };
        audit.log(&entry).await.unwrap();
        audit.log(&entry).await.unwrap();
        assert_eq!(
            audit.count_for_sender("whatsapp:+15550001111").await.unwrap(),
            2
        );
        assert_eq!(audit.count_for_sender("someone-else").await.unwrap(), 0);
    }
}
