use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::chat::context::ChatContext;
use crate::db::{
    connection::Database,
    helpers::{non_empty, to_i64, to_u32},
};

impl Database {
    /// Upserts the accumulated context of a chat session.
    pub async fn save_chat_context(&self, session_id: &str, context: &ChatContext) -> Result<()> {
        let session_id = session_id.to_string();
        let record = context.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO chat_contexts (session_id, location, banana_type, quantity, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(session_id) DO UPDATE SET
                    location = excluded.location,
                    banana_type = excluded.banana_type,
                    quantity = excluded.quantity,
                    updated_at = excluded.updated_at",
                params![
                    session_id,
                    record.location,
                    record.banana_type,
                    record.quantity.map(to_i64),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("failed to save chat context")?;
            Ok(())
        })
        .await
    }

    /// Stored context for a session, or an empty context if none was saved.
    pub async fn get_chat_context(&self, session_id: &str) -> Result<ChatContext> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT location, banana_type, quantity
                     FROM chat_contexts
                     WHERE session_id = ?1",
                    params![session_id],
                    |row| {
                        Ok((
                            row.get::<_, Option<String>>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<i64>>(2)?,
                        ))
                    },
                )
                .optional()
                .context("failed to load chat context")?;

            let Some((location, banana_type, quantity)) = row else {
                return Ok(ChatContext::default());
            };

            Ok(ChatContext {
                location: non_empty(location),
                banana_type: non_empty(banana_type),
                quantity: quantity.map(|q| to_u32(q, "quantity")).transpose()?,
            })
        })
        .await
    }

    pub async fn delete_chat_context(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM chat_contexts WHERE session_id = ?1",
                params![session_id],
            )
            .context("failed to delete chat context")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("musa.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn missing_session_has_empty_context() {
        let (_dir, db) = open();
        assert!(db.get_chat_context("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_and_overwrites_context() {
        let (_dir, db) = open();
        let ctx = ChatContext {
            location: Some("Kandy".into()),
            banana_type: None,
            quantity: Some(15),
        };
        db.save_chat_context("s1", &ctx).await.unwrap();
        assert_eq!(db.get_chat_context("s1").await.unwrap(), ctx);

        let updated = ChatContext {
            banana_type: Some("ambul".into()),
            ..ctx.clone()
        };
        db.save_chat_context("s1", &updated).await.unwrap();
        assert_eq!(db.get_chat_context("s1").await.unwrap(), updated);

        db.delete_chat_context("s1").await.unwrap();
        assert!(db.get_chat_context("s1").await.unwrap().is_empty());
    }
}
