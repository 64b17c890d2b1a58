//! Typed views over realtime-database snapshots of the irrigation controller.
//!
//! The frontend subscribes to `esp32/sensor_data`, `esp32/historical_data`
//! and `esp32/settings` and hands each snapshot value over unchanged. Nothing
//! here fails: malformed children are skipped and logged.

use chrono::DateTime;
use serde_json::{json, Map, Value};

use crate::log_warn;
use crate::telemetry::models::{IrrigationSettings, SensorReading, TelemetrySummary};

const ENABLE_LOGS: bool = true;

/// Key of the pointer to the latest summary record in `esp32/historical_data`.
pub const INDEX_KEY: &str = "Index";

/// Current readings keyed by module id.
pub fn parse_sensor_snapshot(snapshot: &Value) -> Vec<SensorReading> {
    let Some(modules) = snapshot.as_object() else {
        return Vec::new();
    };

    modules
        .iter()
        .filter_map(|(module_id, child)| {
            let reading = reading_from(module_id, child, false);
            if reading.is_none() {
                log_warn!("Skipping malformed sensor_data entry '{module_id}'");
            }
            reading
        })
        .collect()
}

/// Historical records, without the `Index` pointer. Records without a
/// timestamp are skipped.
pub fn parse_historical_snapshot(snapshot: &Value) -> Vec<SensorReading> {
    let Some(entries) = snapshot.as_object() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|(key, _)| key.as_str() != INDEX_KEY)
        .filter_map(|(key, child)| {
            let reading = reading_from(key, child, true);
            if reading.is_none() {
                log_warn!("Skipping malformed historical_data entry '{key}'");
            }
            reading
        })
        .collect()
}

/// Follows `Index` to the latest summary record and formats it for display.
pub fn latest_summary(historical: &Value) -> Option<TelemetrySummary> {
    let entries = historical.as_object()?;
    let key = entries.get(INDEX_KEY).and_then(index_key)?;
    let record = entries.get(&key)?.as_object()?;

    Some(TelemetrySummary {
        avg_temperature: format!("{:.1}°C", number(record, "temperature")?),
        avg_humidity: format!("{:.1}%", number(record, "humidity")?),
        avg_moisture: format!("{:.1}%", number(record, "moisture")?),
        rain_possibility: format!("{:.1}%", number(record, "chanceOfRain")?),
    })
}

impl IrrigationSettings {
    /// Reads `esp32/settings`; absent keys fall back to the defaults.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let defaults = Self::default();
        let Some(obj) = snapshot.as_object() else {
            return defaults;
        };

        Self {
            banana_type: text(obj, "bananaType").unwrap_or(defaults.banana_type),
            crop_stage: text(obj, "cropStage").unwrap_or(defaults.crop_stage),
            operation_mode: number(obj, "mode") == Some(1.0),
            test_mode: number(obj, "Testmode") == Some(1.0),
        }
    }

    /// Value written back to `esp32/settings`.
    pub fn to_snapshot(&self) -> Value {
        json!({
            "bananaType": self.banana_type,
            "cropStage": self.crop_stage,
            "mode": u8::from(self.operation_mode),
            "Testmode": u8::from(self.test_mode),
        })
    }
}

fn reading_from(key: &str, child: &Value, require_timestamp: bool) -> Option<SensorReading> {
    let obj = child.as_object()?;
    let timestamp = timestamp(obj);
    if require_timestamp && timestamp.is_none() {
        return None;
    }

    Some(SensorReading {
        module_id: text(obj, "module").unwrap_or_else(|| key.to_string()),
        timestamp_iso: timestamp.unwrap_or_default(),
        temperature: number(obj, "temperature")?,
        humidity: number(obj, "humidity")?,
        moisture: number(obj, "moisture")?,
        battery: number(obj, "battery"),
    })
}

/// Firmware writes either ISO-8601 text or epoch milliseconds.
fn timestamp(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("timestamp")? {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339())
        }
        _ => text(obj, "timestamp"),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings depending on the
/// firmware revision.
fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|n| n.is_finite())
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn index_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
