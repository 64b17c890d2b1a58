use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::log_debug;
use crate::telemetry::models::{SensorReading, TimeWindow, WindowedSeries};

const ENABLE_LOGS: bool = false;

/// Offset-less layouts the sensor firmware has been seen to write.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Main windowing function: turns an unordered bag of readings into a
/// chronological, time-bounded series.
///
/// `now` supplies both the cutoff instant and the time zone used for labels
/// and for timestamps that carry no offset.
pub fn select_window<Tz: TimeZone>(
    readings: &[SensorReading],
    window: TimeWindow,
    now: &DateTime<Tz>,
) -> WindowedSeries {
    let tz = now.timezone();

    // Step 1: drop unparsable timestamps
    let mut stamped: Vec<(DateTime<Utc>, &SensorReading)> = readings
        .iter()
        .filter_map(|reading| match parse_timestamp(&reading.timestamp_iso, &tz) {
            Some(ts) => Some((ts, reading)),
            None => {
                log_debug!(
                    "Dropping reading from {} with bad timestamp '{}'",
                    reading.module_id,
                    reading.timestamp_iso
                );
                None
            }
        })
        .collect();

    // Step 2: chronological order, ties keep input order
    stamped.sort_by_key(|(ts, _)| ts.timestamp_millis());

    // Step 3: strictly newer than the cutoff
    let cutoff = now.timestamp_millis() - window.duration_ms();

    let mut series = WindowedSeries::default();
    for (ts, reading) in stamped
        .into_iter()
        .filter(|(ts, _)| ts.timestamp_millis() > cutoff)
    {
        series.labels.push(label_for(&ts.with_timezone(&tz), window));
        series.temperature.push(reading.temperature);
        series.humidity.push(reading.humidity);
        series.moisture.push(reading.moisture);
    }

    series
}

/// Parses an ISO-8601 timestamp. Values without an offset are read in `tz`.
pub fn parse_timestamp<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

fn label_for<Tz: TimeZone>(ts: &DateTime<Tz>, window: TimeWindow) -> String {
    match window {
        TimeWindow::Last24Hours => format!("{}:{:02}", ts.hour(), ts.minute()),
        TimeWindow::Last7Days | TimeWindow::Last30Days => {
            format!("{}/{}", ts.day(), ts.month())
        }
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::TimeDelta;
    use proptest::prelude::*;

    fn window_strategy() -> impl Strategy<Value = TimeWindow> {
        prop_oneof![
            Just(TimeWindow::Last24Hours),
            Just(TimeWindow::Last7Days),
            Just(TimeWindow::Last30Days),
        ]
    }

    proptest! {
        /// `temperature` carries minutes-ago and `humidity` the input
        /// position, so order can be checked from the output alone.
        #[test]
        fn keeps_strictly_newer_in_stable_order(
            samples in prop::collection::vec((-600i64..=60 * 24 * 35, any::<bool>()), 0..40),
            window in window_strategy(),
        ) {
            let now = Utc.with_ymd_and_hms(2024, 6, 10, 14, 5, 0).unwrap();
            let readings: Vec<SensorReading> = samples
                .iter()
                .enumerate()
                .map(|(i, &(minutes_ago, garbled))| SensorReading {
                    module_id: format!("m{i}"),
                    timestamp_iso: if garbled {
                        format!("not-a-time-{i}")
                    } else {
                        (now - TimeDelta::minutes(minutes_ago)).to_rfc3339()
                    },
                    temperature: minutes_ago as f64,
                    humidity: i as f64,
                    moisture: 0.0,
                    battery: None,
                })
                .collect();

            let series = select_window(&readings, window, &now);
            prop_assert_eq!(series.labels.len(), series.temperature.len());
            prop_assert_eq!(series.humidity.len(), series.temperature.len());
            prop_assert_eq!(series.moisture.len(), series.temperature.len());

            let expected = samples
                .iter()
                .filter(|&&(minutes_ago, garbled)| {
                    !garbled && minutes_ago * 60_000 < window.duration_ms()
                })
                .count();
            prop_assert_eq!(series.len(), expected);

            let kept: Vec<(f64, f64)> = series
                .temperature
                .iter()
                .copied()
                .zip(series.humidity.iter().copied())
                .collect();
            for pair in kept.windows(2) {
                let (ago_a, idx_a) = pair[0];
                let (ago_b, idx_b) = pair[1];
                prop_assert!(ago_a > ago_b || (ago_a == ago_b && idx_a < idx_b));
            }
        }
    }
}
