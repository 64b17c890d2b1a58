//! Persisted chat history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ChatData;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub is_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ChatData>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_bot: false,
            data: None,
            created_at,
        }
    }

    pub fn bot(text: impl Into<String>, data: Option<ChatData>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            is_bot: true,
            data,
            created_at,
        }
    }
}
