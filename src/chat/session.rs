use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiStatus;
use crate::chat::context::ChatContext;
use crate::db::ChatMessage;
use crate::language::Language;

pub const GREETING: &str = "Hello! I'm your banana farming assistant. How can I help you?";
pub const CONNECTION_ERROR: &str =
    "I'm having trouble connecting to the server. Please check your network connection and try again.";
pub const STILL_DISCONNECTED: &str =
    "I'm still having trouble connecting to the server. Please check your network connection.";
pub const BACK_ONLINE: &str = "I'm back online! How can I help you?";
pub const GENERIC_ERROR: &str = "Sorry, I couldn't process your request. Please try again.";

/// In-memory state of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub context: ChatContext,
    pub history: Vec<ChatMessage>,
    /// Language name sent to the chatbot.
    pub language: String,
    pub supported_languages: Vec<String>,
    pub api_status: ApiStatus,
}

impl ChatSession {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), started_at)
    }

    pub fn with_id(id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            context: ChatContext::default(),
            history: vec![ChatMessage::bot(GREETING, None, started_at)],
            language: Language::default().as_str().to_string(),
            supported_languages: vec![
                Language::English.as_str().to_string(),
                Language::Sinhala.as_str().to_string(),
            ],
            api_status: ApiStatus::Unknown,
        }
    }

    pub fn push_bot(&mut self, text: &str, at: DateTime<Utc>) -> ChatMessage {
        let message = ChatMessage::bot(text, None, at);
        self.history.push(message.clone());
        message
    }
}
