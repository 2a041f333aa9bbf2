//! Detection runs
//!
//! Executes the SQL text of saved scenarios verbatim against the dataset and
//! records every matched withdrawal in TB_DETECTION_RESULT. The text is never
//! re-validated here: whatever was saved is what runs.

use chrono::Utc;
use sqlx::Row;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::{Result, SiranioError};
use crate::storage::{DetectionMatch, Store};
use crate::{utils, DetectionBatch, DetectionRun, RunStatus, SavedScenario};

#[derive(Debug, Clone)]
pub struct DetectionRunner {
    store: Store,
}

impl DetectionRunner {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Run each scenario in order; unknown ids are reported, not failed
    pub async fn run(&self, scenario_ids: &[i64]) -> Result<DetectionBatch> {
        let run_id = Uuid::new_v4();
        let span = info_span!("detection_run", %run_id);

        let mut runs = Vec::with_capacity(scenario_ids.len());
        for &scenario_id in scenario_ids {
            let run = self.run_scenario(scenario_id).instrument(span.clone()).await?;
            runs.push(run);
        }

        let total: usize = runs.iter().map(|r| r.detected_count).sum();
        span.in_scope(|| info!(scenarios = runs.len(), detected = total, "detection run finished"));

        Ok(DetectionBatch { run_id, runs })
    }

    async fn run_scenario(&self, scenario_id: i64) -> Result<DetectionRun> {
        let Some(scenario) = self.store.find_scenario(scenario_id).await? else {
            warn!(scenario_id, "scenario not found, skipping");
            return Ok(DetectionRun {
                scenario_id,
                scenario_name: None,
                detected_count: 0,
                status: RunStatus::NotFound,
            });
        };

        let matches = self.execute(&scenario).await?;
        let detected_at = utils::detection_timestamp(Utc::now());
        self.store
            .replace_detections(scenario_id, &matches, &detected_at)
            .await?;

        info!(scenario_id, detected = matches.len(), "scenario executed");

        Ok(DetectionRun {
            scenario_id,
            scenario_name: Some(scenario.scenario_name),
            detected_count: matches.len(),
            status: RunStatus::Completed,
        })
    }

    /// Run the stored SQL; each row must expose CUSTOMER_ID and TXN_ID
    async fn execute(&self, scenario: &SavedScenario) -> Result<Vec<DetectionMatch>> {
        let query_error = |e: sqlx::Error| SiranioError::QueryExecution {
            scenario_id: scenario.scenario_id,
            message: e.to_string(),
        };

        let rows = sqlx::query(&scenario.sql_text)
            .fetch_all(self.store.pool())
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                Ok(DetectionMatch {
                    customer_id: row.try_get("CUSTOMER_ID").map_err(query_error)?,
                    txn_id: row.try_get("TXN_ID").map_err(query_error)?,
                })
            })
            .collect()
    }
}
