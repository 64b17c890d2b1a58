use chrono::Local;
use tauri::State;

use crate::{
    api::ApiStatus,
    chat::{
        extract_context, format_message_with_defaults, ChatContext, ChatController, ChatSession,
        ContextField,
    },
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> ChatController {
    state.chat.clone()
}

#[tauri::command]
pub fn extract_chat_context(text: String, prior: Option<ChatContext>) -> ChatContext {
    extract_context(&text, &prior.unwrap_or_default())
}

#[tauri::command]
pub fn format_chat_message(
    state: State<'_, AppState>,
    text: String,
    context: ChatContext,
) -> String {
    format_message_with_defaults(
        &text,
        &context,
        &Local::now(),
        &state.settings.price_defaults(),
    )
}

#[tauri::command]
pub async fn send_chat_message(
    state: State<'_, AppState>,
    text: String,
) -> Result<ChatSession, String> {
    let controller = controller_from_state(&state);
    controller
        .send_message(&text, &Local::now())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_chat_session(state: State<'_, AppState>) -> Result<ChatSession, String> {
    let controller = controller_from_state(&state);
    Ok(controller.snapshot().await)
}

#[tauri::command]
pub async fn clear_chat_context_field(
    state: State<'_, AppState>,
    field: ContextField,
) -> Result<ChatSession, String> {
    let controller = controller_from_state(&state);
    controller
        .clear_context_field(field)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_chat_session(state: State<'_, AppState>) -> Result<ChatSession, String> {
    let controller = controller_from_state(&state);
    controller.reset().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn check_api_connection(state: State<'_, AppState>) -> Result<ApiStatus, String> {
    let controller = controller_from_state(&state);
    Ok(controller.check_connection().await)
}

#[tauri::command]
pub async fn set_chat_language(
    state: State<'_, AppState>,
    language: String,
) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller
        .set_language(&language)
        .await
        .map_err(|e| e.to_string())
}
