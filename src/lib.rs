//! Siranio - keyword-driven fraud detection scenarios for withdrawal data
//!
//! An analyst types three keywords and gets back three scenario drafts
//! (strict, balanced, relaxed), each a SQL query over a synthetic
//! customer/withdrawal dataset:
//! - Keyword rule table and sensitivity tiers ([`rules`])
//! - Scenario drafting and SQL assembly ([`scenario`])
//! - SQLite persistence of saved scenarios and detection results ([`storage`])
//! - Synthetic dataset seeding ([`seed`])
//! - Detection runs that execute saved SQL verbatim ([`detection`])
//! - HTTP API ([`api`])

pub mod api;
pub mod config;
pub mod detection;
pub mod errors;
pub mod rules;
pub mod scenario;
pub mod seed;
pub mod storage;
pub mod utils;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::SiranioConfig;
use crate::detection::DetectionRunner;
use crate::errors::{Result, SiranioError};
use crate::scenario::{GeneratedScenario, KEYWORD_COUNT};
use crate::seed::SeedReport;
use crate::storage::Store;

/// Main service structure shared by the HTTP API and the CLI
#[derive(Debug, Clone)]
pub struct Siranio {
    config: SiranioConfig,
    store: Store,
    detector: DetectionRunner,
}

/// Synthetic customer (TB_CUSTOMER)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub age: i64,
    pub gender: String,
    pub region: String,
    pub reg_date: String,
}

/// Synthetic withdrawal (TB_TRANSACTION); TXN_ID is assigned by the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalTransaction {
    pub customer_id: String,
    pub date: String,
    pub time: String,
    pub amount: f64,
    pub channel: String,
}

/// Scenario accepted for saving
#[derive(Debug, Clone, PartialEq)]
pub struct NewScenario {
    pub name: String,
    pub description: String,
    pub keywords: [String; KEYWORD_COUNT],
    pub numeric_thresholds: [Option<f64>; KEYWORD_COUNT],
    pub sql_text: String,
}

impl NewScenario {
    /// Save a generated draft as-is
    pub fn from_generated(draft: &GeneratedScenario) -> Self {
        let keywords = draft.keywords.as_slice();
        Self {
            name: draft.name.clone(),
            description: draft.description.clone(),
            keywords: [
                keywords[0].clone(),
                keywords[1].clone(),
                keywords[2].clone(),
            ],
            numeric_thresholds: draft.numeric_thresholds.map(|t| t.map(|v| v as f64)),
            sql_text: draft.sql.clone(),
        }
    }
}

/// Persisted scenario (TB_SCENARIO), serialized with its column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SavedScenario {
    #[sqlx(rename = "SCENARIO_ID")]
    pub scenario_id: i64,
    #[sqlx(rename = "SCENARIO_NAME")]
    pub scenario_name: String,
    #[sqlx(rename = "SCENARIO_DESC")]
    pub scenario_desc: String,
    #[sqlx(rename = "CONDITION_KEYWORD1")]
    pub condition_keyword1: String,
    #[sqlx(rename = "CONDITION_KEYWORD2")]
    pub condition_keyword2: String,
    #[sqlx(rename = "CONDITION_KEYWORD3")]
    pub condition_keyword3: String,
    #[sqlx(rename = "THRESHOLD_1")]
    pub threshold_1: Option<f64>,
    #[sqlx(rename = "THRESHOLD_2")]
    pub threshold_2: Option<f64>,
    #[sqlx(rename = "THRESHOLD_3")]
    pub threshold_3: Option<f64>,
    #[sqlx(rename = "SQL_TEXT")]
    pub sql_text: String,
    #[sqlx(rename = "REG_DATE")]
    pub reg_date: String,
    #[sqlx(rename = "REG_TIME")]
    pub reg_time: String,
    #[sqlx(rename = "CREATED_BY")]
    pub created_by: Option<String>,
    #[sqlx(rename = "CREATED_AT")]
    pub created_at: String,
}

/// Detection hit joined with its withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DetectionRecord {
    #[sqlx(rename = "RESULT_ID")]
    pub result_id: i64,
    #[sqlx(rename = "CUSTOMER_ID")]
    pub customer_id: String,
    #[sqlx(rename = "TXN_ID")]
    pub txn_id: i64,
    #[sqlx(rename = "SCENARIO_ID")]
    pub scenario_id: i64,
    #[sqlx(rename = "DETECTION_TIME")]
    pub detection_time: String,
    #[sqlx(rename = "WITHDRAWAL_DATE")]
    pub withdrawal_date: String,
    #[sqlx(rename = "WITHDRAWAL_TIME")]
    pub withdrawal_time: String,
    #[sqlx(rename = "WITHDRAWAL_AMOUNT")]
    pub withdrawal_amount: f64,
    #[sqlx(rename = "WITHDRAWAL_CHANNEL")]
    pub withdrawal_channel: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    NotFound,
}

/// Outcome of running one saved scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRun {
    pub scenario_id: i64,
    pub scenario_name: Option<String>,
    pub detected_count: usize,
    pub status: RunStatus,
}

/// All runs requested together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionBatch {
    pub run_id: Uuid,
    pub runs: Vec<DetectionRun>,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetCounts {
    pub customers: i64,
    pub transactions: i64,
    pub scenarios: i64,
    pub detection_results: i64,
}

impl Siranio {
    /// Connect to the configured database and create the schema
    pub async fn open(config: SiranioConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|message| SiranioError::ConfigError { message })?;

        let store = Store::connect(&config).await?;
        store.bootstrap().await?;
        info!(database = %config.database_url, "database ready");

        Ok(Self {
            detector: DetectionRunner::new(store.clone()),
            store,
            config,
        })
    }

    pub fn config(&self) -> &SiranioConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fill the synthetic dataset up to the configured targets
    pub async fn seed_dataset(&self) -> Result<SeedReport> {
        let mut rng = StdRng::from_entropy();
        seed::seed_dataset(&self.store, &self.config, &mut rng).await
    }

    /// Draft the strict, balanced and relaxed scenarios for three keywords
    pub fn generate_scenarios<S: AsRef<str>>(&self, keywords: &[S]) -> Result<[GeneratedScenario; 3]> {
        scenario::generate_scenarios(keywords)
    }

    pub async fn save_scenario(&self, scenario: &NewScenario) -> Result<SavedScenario> {
        let saved = self.store.save_scenario(scenario).await?;
        info!(scenario_id = saved.scenario_id, name = %saved.scenario_name, "scenario saved");
        Ok(saved)
    }

    pub async fn list_scenarios(&self) -> Result<Vec<SavedScenario>> {
        self.store.list_scenarios().await
    }

    pub async fn get_scenario(&self, scenario_id: i64) -> Result<SavedScenario> {
        self.store
            .find_scenario(scenario_id)
            .await?
            .ok_or(SiranioError::ScenarioNotFound { scenario_id })
    }

    /// Execute saved scenarios against the dataset and persist their matches
    pub async fn run_detections(&self, scenario_ids: &[i64]) -> Result<DetectionBatch> {
        self.detector.run(scenario_ids).await
    }

    pub async fn list_detections(&self, scenario_id: Option<i64>) -> Result<Vec<DetectionRecord>> {
        self.store.list_detections(scenario_id).await
    }

    pub async fn counts(&self) -> Result<DatasetCounts> {
        self.store.counts().await
    }
}
