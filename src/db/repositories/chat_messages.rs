use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde_json::{from_str, to_string};

use crate::api::ChatData;
use crate::db::{connection::Database, helpers::parse_datetime, models::ChatMessage};

impl Database {
    pub async fn insert_chat_message(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        let session_id = session_id.to_string();
        let record = message.clone();
        self.execute(move |conn| {
            let data_json = record
                .data
                .as_ref()
                .map(to_string)
                .transpose()
                .context("failed to serialize chat data")?;

            conn.execute(
                "INSERT INTO chat_messages (id, session_id, text, is_bot, data_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    session_id,
                    record.text,
                    record.is_bot,
                    data_json,
                    record.created_at.to_rfc3339(),
                ],
            )
            .context("failed to insert chat message")?;
            Ok(())
        })
        .await
    }

    /// History of a session, oldest first.
    pub async fn get_chat_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, text, is_bot, data_json, created_at
                 FROM chat_messages
                 WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;

            let rows = stmt.query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;

            let mut messages = Vec::new();
            for row in rows {
                let (id, text, is_bot, data_json, created_at) = row?;
                let data = match data_json {
                    Some(json) => Some(
                        from_str::<ChatData>(&json).context("failed to parse stored chat data")?,
                    ),
                    None => None,
                };
                messages.push(ChatMessage {
                    id,
                    text,
                    is_bot,
                    data,
                    created_at: parse_datetime(&created_at, "created_at")?,
                });
            }

            Ok(messages)
        })
        .await
    }

    /// Session that received the most recent message, if any.
    pub async fn latest_chat_session_id(&self) -> Result<Option<String>> {
        self.execute(|conn| {
            conn.query_row(
                "SELECT session_id FROM chat_messages
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("failed to load latest chat session")
        })
        .await
    }

    pub async fn delete_chat_messages(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM chat_messages WHERE session_id = ?1",
                params![session_id],
            )
            .context("failed to delete chat messages")?;
            Ok(())
        })
        .await
    }
}
