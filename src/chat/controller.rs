use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use log::error;
use tokio::sync::Mutex;

use crate::api::{is_network_error, ApiClient, ApiStatus, ChatRequest};
use crate::chat::context::{extract_context, ContextField};
use crate::chat::format::{format_message_with_defaults, PriceDefaults};
use crate::chat::session::{
    ChatSession, BACK_ONLINE, CONNECTION_ERROR, GENERIC_ERROR, STILL_DISCONNECTED,
};
use crate::db::{ChatMessage, Database};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Drives one conversation with the farming assistant.
///
/// The session lock is held for the whole send, network call included, so
/// messages of a conversation go out one at a time and context updates land
/// in the order the user typed them.
#[derive(Clone)]
pub struct ChatController {
    session: Arc<Mutex<ChatSession>>,
    api: ApiClient,
    db: Database,
    defaults: PriceDefaults,
}

impl ChatController {
    pub fn new(api: ApiClient, db: Database, defaults: PriceDefaults) -> Self {
        Self {
            session: Arc::new(Mutex::new(ChatSession::new(Utc::now()))),
            api,
            db,
            defaults,
        }
    }

    /// Resumes a stored conversation: its context and history.
    pub async fn restore(
        api: ApiClient,
        db: Database,
        defaults: PriceDefaults,
        session_id: &str,
    ) -> Result<Self> {
        let mut session = ChatSession::with_id(session_id.to_string(), Utc::now());
        session.context = db.get_chat_context(session_id).await?;
        session.history.extend(db.get_chat_messages(session_id).await?);
        log_info!(
            "Restored chat session {} with {} messages",
            session_id,
            session.history.len() - 1
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            api,
            db,
            defaults,
        })
    }

    pub async fn snapshot(&self) -> ChatSession {
        self.session.lock().await.clone()
    }

    /// Sends one user message and records the assistant's reply.
    ///
    /// Blank input is ignored. Remote failures become an assistant message
    /// rather than an error. Only a failure to store the user's message is
    /// returned; storage failures after that are logged and the reply is kept.
    pub async fn send_message<Tz: TimeZone>(
        &self,
        text: &str,
        now: &DateTime<Tz>,
    ) -> Result<ChatSession> {
        let mut session = self.session.lock().await;
        if text.trim().is_empty() {
            return Ok(session.clone());
        }

        let sent_at = now.with_timezone(&Utc);
        let user_message = ChatMessage::user(text, sent_at);
        self.db.insert_chat_message(&session.id, &user_message).await?;
        session.history.push(user_message);

        let extracted = extract_context(text, &session.context);
        if extracted != session.context {
            session.context = extracted.clone();
            self.persist_context(&session).await;
        }

        let request = ChatRequest {
            message: format_message_with_defaults(text, &extracted, now, &self.defaults),
            language: session.language.clone(),
        };

        let reply = if session.api_status == ApiStatus::Disconnected {
            Err(anyhow!("not connected to API server"))
        } else {
            self.api.send_chat_message(&request).await
        };

        let replied_at = Utc::now().max(sent_at);
        let bot_message = match reply {
            Ok(response) => {
                session.api_status = ApiStatus::Connected;
                if let Some(data) = &response.data {
                    let merged = session.context.merge_response(data);
                    if merged != session.context {
                        session.context = merged;
                        self.persist_context(&session).await;
                    }
                }
                ChatMessage::bot(response.text, response.data, replied_at)
            }
            Err(err) => {
                error!("Chat error: {err:#}");
                if is_network_error(&err) || session.api_status == ApiStatus::Disconnected {
                    session.api_status = ApiStatus::Disconnected;
                    ChatMessage::bot(CONNECTION_ERROR, None, replied_at)
                } else {
                    ChatMessage::bot(GENERIC_ERROR, None, replied_at)
                }
            }
        };

        if let Err(err) = self.db.insert_chat_message(&session.id, &bot_message).await {
            error!("Failed to store reply in session {}: {err:#}", session.id);
        }
        session.history.push(bot_message);

        Ok(session.clone())
    }

    async fn persist_context(&self, session: &ChatSession) {
        if let Err(err) = self.db.save_chat_context(&session.id, &session.context).await {
            error!("Failed to store context of session {}: {err:#}", session.id);
        }
    }

    /// Probes the server and refreshes the language list.
    pub async fn check_connection(&self) -> ApiStatus {
        let mut session = self.session.lock().await;
        let was_disconnected = session.api_status == ApiStatus::Disconnected;

        match self.api.test_connection().await {
            Ok(()) => {
                session.api_status = ApiStatus::Connected;
                match self.api.supported_languages().await {
                    Ok(languages) if !languages.is_empty() => {
                        session.supported_languages = languages;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        log_warn!("Could not fetch supported languages: {err:#}");
                    }
                }
                if was_disconnected {
                    session.push_bot(BACK_ONLINE, Utc::now());
                }
            }
            Err(err) => {
                error!("API connection error: {err:#}");
                session.api_status = ApiStatus::Disconnected;
                let notice = if was_disconnected {
                    STILL_DISCONNECTED
                } else {
                    CONNECTION_ERROR
                };
                session.push_bot(notice, Utc::now());
            }
        }

        session.api_status
    }

    pub async fn set_language(&self, language: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        let language = language.trim().to_lowercase();
        if !session.supported_languages.contains(&language) {
            return Err(anyhow!("unsupported language '{language}'"));
        }
        session.language = language;
        Ok(())
    }

    /// Forgets one context field, as when the user dismisses its chip.
    pub async fn clear_context_field(&self, field: ContextField) -> Result<ChatSession> {
        let mut session = self.session.lock().await;
        session.context.clear(field);
        self.db.save_chat_context(&session.id, &session.context).await?;
        Ok(session.clone())
    }

    /// Starts a fresh conversation and drops the stored one. Language and
    /// connection state carry over.
    pub async fn reset(&self) -> Result<ChatSession> {
        let mut session = self.session.lock().await;
        self.db.delete_chat_messages(&session.id).await?;
        self.db.delete_chat_context(&session.id).await?;

        let mut fresh = ChatSession::new(Utc::now());
        fresh.language = session.language.clone();
        fresh.supported_languages = session.supported_languages.clone();
        fresh.api_status = session.api_status;
        log_info!("Chat session {} replaced by {}", session.id, fresh.id);
        *session = fresh;
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiEndpoints;
    use crate::chat::context::ChatContext;
    use crate::chat::session::GREETING;
    use mockito::Matcher;
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Database,
        controller: ChatController,
    }

    fn fixture(base_url: String) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("musa.sqlite3")).unwrap();
        let api = ApiClient::new(ApiEndpoints {
            base_url,
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let controller = ChatController::new(api, db.clone(), PriceDefaults::default());
        Fixture {
            _dir: dir,
            db,
            controller,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn sends_augmented_message_and_merges_echoed_context() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chatbot")
            .match_body(Matcher::PartialJson(json!({
                "message": "what is the price for 20kg?. I need a price prediction with the following details: location=Colombo, banana_type=ambul, quantity=20, month=5, week_of_month=3, day_of_week=3, day_of_month=15, include_all_features=true",
                "language": "english"
            })))
            .with_status(200)
            .with_body(r#"{"text":"About 110 LKR/kg","data":{"price":110.0,"currency":"LKR","location":"Colombo"}}"#)
            .create_async()
            .await;

        let fx = fixture(server.url());
        let session = fx
            .controller
            .send_message("what is the price for 20kg?", &now())
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(session.api_status, ApiStatus::Connected);
        assert_eq!(
            session.context,
            ChatContext {
                location: Some("Colombo".into()),
                banana_type: None,
                quantity: Some(20),
            }
        );
        let texts: Vec<_> = session.history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![GREETING, "what is the price for 20kg?", "About 110 LKR/kg"]
        );

        assert_eq!(fx.db.get_chat_context(&session.id).await.unwrap(), session.context);
        assert_eq!(fx.db.get_chat_messages(&session.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_message_is_ignored() {
        let fx = fixture("http://127.0.0.1:9".into());
        let session = fx.controller.send_message("   ", &now()).await.unwrap();
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn server_error_yields_generic_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chatbot")
            .with_status(500)
            .create_async()
            .await;

        let fx = fixture(server.url());
        let session = fx
            .controller
            .send_message("location is Kandy", &now())
            .await
            .unwrap();
        assert_eq!(session.history.last().unwrap().text, GENERIC_ERROR);
        assert_eq!(session.context.location.as_deref(), Some("Kandy"));
        assert_ne!(session.api_status, ApiStatus::Disconnected);
    }

    #[tokio::test]
    async fn unreachable_server_marks_session_disconnected() {
        let fx = fixture("http://127.0.0.1:9".into());
        let session = fx.controller.send_message("hello", &now()).await.unwrap();
        assert_eq!(session.api_status, ApiStatus::Disconnected);
        assert_eq!(session.history.last().unwrap().text, CONNECTION_ERROR);

        assert_eq!(fx.controller.check_connection().await, ApiStatus::Disconnected);
        let session = fx.controller.snapshot().await;
        assert_eq!(session.history.last().unwrap().text, STILL_DISCONNECTED);
    }

    #[tokio::test]
    async fn reconnect_refreshes_languages() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/").with_status(200).with_body("ok").create_async().await;
        server
            .mock("GET", "/api/v1/supported-languages")
            .with_status(200)
            .with_body(r#"{"supported_languages":["english","sinhala","tamil"]}"#)
            .create_async()
            .await;

        let fx = fixture(server.url());
        assert_eq!(fx.controller.check_connection().await, ApiStatus::Connected);
        fx.controller.set_language("Tamil").await.unwrap();
        assert!(fx.controller.set_language("french").await.is_err());
        assert_eq!(fx.controller.snapshot().await.language, "tamil");
    }

    #[tokio::test]
    async fn clear_and_restore_context() {
        let fx = fixture("http://127.0.0.1:9".into());
        let session = fx
            .controller
            .send_message("location is Kandy and 12 kg", &now())
            .await
            .unwrap();
        assert_eq!(session.context.quantity, Some(12));

        let session = fx
            .controller
            .clear_context_field(ContextField::Location)
            .await
            .unwrap();
        assert_eq!(session.context.location, None);

        let api = ApiClient::new(ApiEndpoints::default()).unwrap();
        let restored =
            ChatController::restore(api, fx.db.clone(), PriceDefaults::default(), &session.id)
                .await
                .unwrap();
        let restored = restored.snapshot().await;
        assert_eq!(restored.context, session.context);
        assert_eq!(restored.history.len(), 3);

        let fresh = fx.controller.reset().await.unwrap();
        assert_ne!(fresh.id, session.id);
        assert!(fresh.context.is_empty());
        assert_eq!(fresh.history.len(), 1);
        assert!(fx.db.get_chat_messages(&session.id).await.unwrap().is_empty());
        assert!(fx.db.get_chat_context(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_text_survives_oddly_typed_echo() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chatbot")
            .with_status(200)
            .with_body(r#"{"text":"About 110 LKR/kg","data":{"price":"110","quantity":"10"}}"#)
            .create_async()
            .await;

        let fx = fixture(server.url());
        let session = fx
            .controller
            .send_message("how much for my bananas?", &now())
            .await
            .unwrap();
        let reply = session.history.last().unwrap();
        assert_eq!(reply.text, "About 110 LKR/kg");
        assert_eq!(reply.data.as_ref().unwrap().price, Some(110.0));
        assert_eq!(session.context.quantity, Some(10));
    }

    async fn drop_table(db: &Database, table: &'static str) {
        db.execute(move |conn| {
            conn.execute_batch(&format!("DROP TABLE {table}"))?;
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn context_storage_failure_keeps_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/chatbot")
            .with_status(200)
            .with_body(r#"{"text":"Kandy prices are steady","data":{"location":"Kandy"}}"#)
            .create_async()
            .await;

        let fx = fixture(server.url());
        drop_table(&fx.db, "chat_contexts").await;

        let session = fx
            .controller
            .send_message("location is Kandy", &now())
            .await
            .unwrap();
        assert_eq!(session.history.last().unwrap().text, "Kandy prices are steady");
        assert_eq!(session.context.location.as_deref(), Some("Kandy"));
        assert_eq!(fx.db.get_chat_messages(&session.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_user_message_store_leaves_history_untouched() {
        let fx = fixture("http://127.0.0.1:9".into());
        drop_table(&fx.db, "chat_messages").await;

        assert!(fx.controller.send_message("hello", &now()).await.is_err());
        let session = fx.controller.snapshot().await;
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.api_status, ApiStatus::Unknown);
    }
}
