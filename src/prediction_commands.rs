//! Tauri commands for the price, ripeness and disease screens.
//!
//! Each successful prediction replaces the stored last prediction of its
//! kind so the screen can show it again offline.

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tauri::State;

use crate::{
    api::{HealthStatus, PredictionRequest, PriceQuote},
    chat::format::CalendarFields,
    classification::{DiseaseReport, RipenessReport},
    db::{PredictionKind, SavedPrediction},
    language::Language,
    log_warn, AppState,
};

const ENABLE_LOGS: bool = true;

async fn remember<P: Serialize>(state: &State<'_, AppState>, kind: PredictionKind, prediction: &P) {
    if let Err(err) = state.db.save_last_prediction(kind, prediction).await {
        log_warn!("Failed to save last {} prediction: {err:#}", kind.as_str());
    }
}

fn language_or_default(state: &State<'_, AppState>, language: Option<Language>) -> Language {
    language
        .or_else(|| Language::parse(&state.settings.language()))
        .unwrap_or_default()
}

#[tauri::command]
pub async fn predict_price(
    state: State<'_, AppState>,
    location: String,
    banana_type: String,
    quantity: Option<u32>,
) -> Result<PriceQuote, String> {
    let request = PredictionRequest::new(
        location,
        banana_type,
        quantity,
        CalendarFields::at(&Local::now()),
    );
    let response = state
        .api
        .predict_price(&request)
        .await
        .map_err(|e| e.to_string())?;
    remember(&state, PredictionKind::Price, &response).await;
    Ok(response.quote(quantity))
}

#[tauri::command]
pub async fn recommend_market(
    state: State<'_, AppState>,
    location: String,
    banana_type: String,
    quantity: Option<u32>,
) -> Result<Value, String> {
    let request = PredictionRequest::new(
        location,
        banana_type,
        quantity,
        CalendarFields::at(&Local::now()),
    );
    state
        .api
        .market_recommendation(&request)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_markets(state: State<'_, AppState>) -> Result<Value, String> {
    state.api.markets().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_api_health(state: State<'_, AppState>) -> Result<HealthStatus, String> {
    state.api.health().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn classify_ripeness(
    state: State<'_, AppState>,
    image: Vec<u8>,
    language: Option<Language>,
) -> Result<RipenessReport, String> {
    let result = state
        .api
        .classify_ripeness(image)
        .await
        .map_err(|e| e.to_string())?;
    remember(&state, PredictionKind::Ripeness, &result).await;
    Ok(result.report(language_or_default(&state, language)))
}

#[tauri::command]
pub async fn predict_disease(
    state: State<'_, AppState>,
    image: Vec<u8>,
    language: Option<Language>,
) -> Result<DiseaseReport, String> {
    let prediction = state
        .api
        .predict_disease(image)
        .await
        .map_err(|e| e.to_string())?;
    remember(&state, PredictionKind::Disease, &prediction).await;
    Ok(prediction.report(language_or_default(&state, language)))
}

#[tauri::command]
pub async fn get_last_prediction(
    state: State<'_, AppState>,
    kind: PredictionKind,
) -> Result<Option<SavedPrediction>, String> {
    state
        .db
        .get_last_prediction(kind)
        .await
        .map_err(|e| e.to_string())
}
