pub mod models;
pub mod snapshot;
pub mod window;

#[cfg(feature = "app")]
pub mod commands;

pub use models::{IrrigationSettings, SensorReading, TelemetrySummary, TimeWindow, WindowedSeries};
pub use snapshot::{latest_summary, parse_historical_snapshot, parse_sensor_snapshot};
pub use window::select_window;
