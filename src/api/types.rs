//! Request and response bodies of the Smart Musa prediction server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::format::CalendarFields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    /// Free-form on the server side; a payload that is not an object is dropped.
    #[serde(default, deserialize_with = "lenient::object")]
    pub data: Option<ChatData>,
}

/// Structured data attached to a chatbot reply.
///
/// The server echoes the fields it recognized in the message, so these double
/// as context updates for the session. Every field is read leniently: numbers
/// may arrive as strings, and a field of the wrong shape reads as absent
/// instead of failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatData {
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub banana_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::object",
        skip_serializing_if = "Option::is_none"
    )]
    pub best_market: Option<BestMarket>,
}

impl ChatData {
    /// Echoed quantity as whole kilograms. Zero, negative and non-finite
    /// values are not treated as an update.
    pub fn quantity_kg(&self) -> Option<u32> {
        self.quantity
            .filter(|q| q.is_finite() && *q >= 1.0 && *q <= f64::from(u32::MAX))
            .map(|q| q.round() as u32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestMarket {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub predicted_price: Option<f64>,
    /// km
    #[serde(default, deserialize_with = "lenient::number")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub potential_profit: Option<f64>,
}

/// Field deserializers that never reject a reply over one badly typed value.
mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.filter(|n| n.is_finite()))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }
}

/// Feature payload of the price model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub location: String,
    pub banana_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub month: u32,
    pub week_of_month: u32,
    pub day_of_week: u32,
    pub day_of_month: u32,
}

impl PredictionRequest {
    pub fn new(
        location: impl Into<String>,
        banana_type: impl Into<String>,
        quantity: Option<u32>,
        calendar: CalendarFields,
    ) -> Self {
        Self {
            location: location.into(),
            banana_type: banana_type.into(),
            quantity,
            month: calendar.month,
            week_of_month: calendar.week_of_month,
            day_of_week: calendar.day_of_week,
            day_of_month: calendar.day_of_month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Per kilogram.
    pub predicted_price: f64,
    pub currency: String,
    pub date: String,
    #[serde(default)]
    pub features_used: Option<Map<String, Value>>,
}

impl PredictionResponse {
    pub fn total_for(&self, quantity_kg: u32) -> f64 {
        self.predicted_price * f64::from(quantity_kg)
    }

    pub fn quote(self, quantity_kg: Option<u32>) -> PriceQuote {
        PriceQuote {
            total: quantity_kg.map(|kg| self.total_for(kg)),
            quantity_kg,
            prediction: self,
        }
    }
}

/// Price prediction plus the total for the farmer's harvest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    #[serde(flatten)]
    pub prediction: PredictionResponse,
    pub quantity_kg: Option<u32>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthComponents {
    pub model: String,
    pub chatbot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub components: Option<HealthComponents>,
}

impl HealthStatus {
    pub fn api_status(&self) -> ApiStatus {
        if self.status == "healthy" {
            ApiStatus::Connected
        } else {
            ApiStatus::Disconnected
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == "degraded"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SupportedLanguages {
    #[serde(default)]
    pub supported_languages: Vec<String>,
}
