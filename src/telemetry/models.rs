use serde::{Deserialize, Serialize};

/// One sample from a field sensor module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub module_id: String,
    /// ISO-8601; the only source of ordering.
    pub timestamp_iso: String,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// % soil moisture
    pub moisture: f64,
    /// %
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
}

/// Recency bound for the history charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeWindow {
    pub const fn duration_ms(&self) -> i64 {
        match self {
            TimeWindow::Last24Hours => 86_400_000,
            TimeWindow::Last7Days => 604_800_000,
            TimeWindow::Last30Days => 2_592_000_000,
        }
    }
}

/// Chart-ready series; all four vectors are index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowedSeries {
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub moisture: Vec<f64>,
}

impl WindowedSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Dashboard header values taken from the latest summary record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySummary {
    pub avg_temperature: String,
    pub avg_humidity: String,
    pub avg_moisture: String,
    pub rain_possibility: String,
}

/// Controller settings stored under `esp32/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationSettings {
    pub banana_type: String,
    pub crop_stage: String,
    /// Automatic irrigation when true, manual otherwise.
    pub operation_mode: bool,
    pub test_mode: bool,
}

impl Default for IrrigationSettings {
    fn default() -> Self {
        Self {
            banana_type: "1".into(),
            crop_stage: "1".into(),
            operation_mode: false,
            test_mode: false,
        }
    }
}
