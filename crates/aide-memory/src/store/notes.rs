//! Note insert and listing.

use super::Store;
use aide_core::{error::AideError, model::Note};
use uuid::Uuid;

impl Store {
    /// Save a note. Content is stored trimmed and must not be empty.
    pub async fn insert_note(&self, owner: &str, content: &str) -> Result<Note, AideError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AideError::Memory("note content must not be empty".into()));
        }

        let id = Uuid::new_v4().to_string();
        let (created_at,): (String,) = sqlx::query_as(
            "INSERT INTO notes (id, owner, content) VALUES (?, ?, ?) RETURNING created_at",
        )
        .bind(&id)
        .bind(owner)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("insert note failed: {e}")))?;

        Ok(Note {
            id,
            owner: owner.to_string(),
            content: content.to_string(),
            created_at,
        })
    }

    /// All notes, oldest first.
    pub async fn list_notes(&self) -> Result<Vec<Note>, AideError> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, owner, content, created_at FROM notes ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AideError::Memory(format!("list notes failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, owner, content, created_at)| Note {
                id,
                owner,
                content,
                created_at,
            })
            .collect())
    }
}
