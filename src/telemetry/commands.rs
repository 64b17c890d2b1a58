//! Telemetry commands. The frontend owns the realtime subscription and hands
//! raw snapshot JSON to these for shaping.

use chrono::Local;
use serde_json::Value;

use crate::telemetry::{
    latest_summary, parse_historical_snapshot, parse_sensor_snapshot, select_window,
    IrrigationSettings, SensorReading, TelemetrySummary, TimeWindow, WindowedSeries,
};

#[tauri::command]
pub fn select_telemetry_window(
    readings: Vec<SensorReading>,
    window: TimeWindow,
) -> WindowedSeries {
    select_window(&readings, window, &Local::now())
}

/// Windows the `historical_data` snapshot directly.
#[tauri::command]
pub fn select_historical_window(historical: Value, window: TimeWindow) -> WindowedSeries {
    let readings = parse_historical_snapshot(&historical);
    select_window(&readings, window, &Local::now())
}

#[tauri::command]
pub fn parse_sensor_data(snapshot: Value) -> Vec<SensorReading> {
    parse_sensor_snapshot(&snapshot)
}

#[tauri::command]
pub fn get_telemetry_summary(historical: Value) -> Option<TelemetrySummary> {
    latest_summary(&historical)
}

#[tauri::command]
pub fn parse_irrigation_settings(snapshot: Value) -> IrrigationSettings {
    IrrigationSettings::from_snapshot(&snapshot)
}

/// Inverse of [`parse_irrigation_settings`], for writing back to `esp32/settings`.
#[tauri::command]
pub fn irrigation_settings_snapshot(settings: IrrigationSettings) -> Value {
    settings.to_snapshot()
}
