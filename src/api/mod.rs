//! HTTP client for the prediction, chatbot and image classification services.

mod types;

pub use types::{
    ApiStatus, BestMarket, ChatData, ChatRequest, ChatResponse, HealthComponents, HealthStatus,
    PredictionRequest, PredictionResponse, PriceQuote,
};

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{multipart, Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::classification::{DiseasePrediction, RipenessResult};
use crate::{log_info, log_warn};
use types::SupportedLanguages;

const ENABLE_LOGS: bool = true;

/// Where each remote service lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoints {
    /// Prediction server (chatbot, price model, markets).
    pub base_url: String,
    pub classification_url: String,
    pub disease_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.8.162:5000".into(),
            classification_url: "https://kavinduLM98-banana-classification.hf.space/predict"
                .into(),
            disease_url: "http://192.168.8.174:8000/predict".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    endpoints: ApiEndpoints,
    http: Client,
}

impl ApiClient {
    pub fn new(endpoints: ApiEndpoints) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { endpoints, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.base_url.trim_end_matches('/'), path)
    }

    pub async fn send_chat_message(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.post_json(&self.url("/api/v1/chatbot"), request, "chatbot request")
            .await
    }

    pub async fn predict_price(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        self.post_json(&self.url("/api/v1/predict"), request, "price prediction")
            .await
    }

    pub async fn market_recommendation(&self, request: &PredictionRequest) -> Result<Value> {
        self.post_json(&self.url("/recommend"), request, "market recommendation")
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let health: HealthStatus = self.get_json(&self.url("/health"), "health check").await?;
        if health.is_degraded() {
            log_warn!("API is in degraded state: {:?}", health.components);
        }
        Ok(health)
    }

    pub async fn supported_languages(&self) -> Result<Vec<String>> {
        let body: SupportedLanguages = self
            .get_json(&self.url("/api/v1/supported-languages"), "supported languages")
            .await?;
        Ok(body.supported_languages)
    }

    pub async fn markets(&self) -> Result<Value> {
        self.get_json(&self.url("/api/v1/markets"), "markets list")
            .await
    }

    /// Checks that the prediction server answers on its root path.
    pub async fn test_connection(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("/"))
            .send()
            .await
            .context("failed to connect to API")?;
        ensure_success(response, "connection test").await?;
        Ok(())
    }

    pub async fn classify_ripeness(&self, image: Vec<u8>) -> Result<RipenessResult> {
        let form = image_form("image", "banana.jpg", image)?;
        let response = self
            .http
            .post(&self.endpoints.classification_url)
            .multipart(form)
            .send()
            .await
            .context("failed to send ripeness classification request")?;
        let result: RipenessResult = read_json(response, "ripeness classification").await?;
        log_info!(
            "Ripeness classified as {} ({:.2})",
            result.predicted_class,
            result.confidence
        );
        Ok(result)
    }

    pub async fn predict_disease(&self, image: Vec<u8>) -> Result<DiseasePrediction> {
        let form = image_form("file", "image.jpg", image)?;
        let response = self
            .http
            .post(&self.endpoints.disease_url)
            .multipart(form)
            .send()
            .await
            .context("failed to send disease prediction request")?;
        read_json(response, "disease prediction").await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to send {what}"))?;
        read_json(response, what).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B, what: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to send {what}"))?;
        read_json(response, what).await
    }
}

/// True when `err` (or anything in its chain) is a transport failure rather
/// than a server-side rejection.
pub fn is_network_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .map(|e| e.is_connect() || e.is_timeout() || e.is_request())
            .unwrap_or(false)
    })
}

fn image_form(
    field: &'static str,
    file_name: &'static str,
    image: Vec<u8>,
) -> Result<multipart::Form> {
    let part = multipart::Part::bytes(image)
        .file_name(file_name)
        .mime_str("image/jpeg")
        .context("invalid image mime type")?;
    Ok(multipart::Form::new().part(field, part))
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log_warn!("{what} failed with {status}: {body}");
    Err(anyhow!("{what} failed ({status}): {body}"))
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let response = ensure_success(response, what).await?;
    response
        .json::<T>()
        .await
        .with_context(|| format!("failed to decode {what} response"))
}
