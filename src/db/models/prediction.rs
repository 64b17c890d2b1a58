use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which screen a saved prediction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredictionKind {
    Price,
    Ripeness,
    Disease,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Price => "price",
            PredictionKind::Ripeness => "ripeness",
            PredictionKind::Disease => "disease",
        }
    }
}

/// Most recent prediction of a kind, kept so the screen can show it offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPrediction {
    pub kind: PredictionKind,
    pub payload: Value,
    pub saved_at: DateTime<Utc>,
}
