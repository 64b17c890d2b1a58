use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use serde_json::{from_str, to_string};

use crate::db::{
    connection::Database,
    helpers::parse_datetime,
    models::{PredictionKind, SavedPrediction},
};

impl Database {
    /// Replaces the saved prediction of `kind`.
    pub async fn save_last_prediction<P: Serialize>(
        &self,
        kind: PredictionKind,
        prediction: &P,
    ) -> Result<SavedPrediction> {
        let payload = serde_json::to_value(prediction).context("failed to serialize prediction")?;
        let saved = SavedPrediction {
            kind,
            payload,
            saved_at: Utc::now(),
        };
        let record = saved.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO last_predictions (kind, payload_json, saved_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(kind) DO UPDATE SET
                    payload_json = excluded.payload_json,
                    saved_at = excluded.saved_at",
                params![
                    record.kind.as_str(),
                    to_string(&record.payload)?,
                    record.saved_at.to_rfc3339(),
                ],
            )
            .context("failed to save last prediction")?;
            Ok(())
        })
        .await?;
        Ok(saved)
    }

    pub async fn get_last_prediction(
        &self,
        kind: PredictionKind,
    ) -> Result<Option<SavedPrediction>> {
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT payload_json, saved_at FROM last_predictions WHERE kind = ?1",
                    params![kind.as_str()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .context("failed to load last prediction")?;

            match row {
                Some((payload_json, saved_at)) => Ok(Some(SavedPrediction {
                    kind,
                    payload: from_str(&payload_json).context("failed to parse saved prediction")?,
                    saved_at: parse_datetime(&saved_at, "saved_at")?,
                })),
                None => Ok(None),
            }
        })
        .await
    }
}
