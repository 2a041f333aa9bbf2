//! SQLite storage for the synthetic dataset, saved scenarios and detection results

use std::str::FromStr;

use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::SiranioConfig;
use crate::errors::{Result, SiranioError};
use crate::{
    Customer, DatasetCounts, DetectionRecord, NewScenario, SavedScenario, WithdrawalTransaction,
};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS TB_CUSTOMER (
      CUSTOMER_ID TEXT PRIMARY KEY,
      CUSTOMER_AGE INTEGER NOT NULL,
      CUSTOMER_GENDER TEXT NOT NULL,
      CUSTOMER_REGION TEXT NOT NULL,
      CUSTOMER_REG_DATE TEXT NOT NULL,
      CREATED_AT TEXT NOT NULL DEFAULT (datetime('now')),
      UPDATED_AT TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS TB_TRANSACTION (
      TXN_ID INTEGER PRIMARY KEY AUTOINCREMENT,
      CUSTOMER_ID TEXT NOT NULL,
      WITHDRAWAL_DATE TEXT NOT NULL,
      WITHDRAWAL_TIME TEXT NOT NULL,
      WITHDRAWAL_AMOUNT REAL NOT NULL,
      WITHDRAWAL_CHANNEL TEXT NOT NULL,
      CREATED_AT TEXT NOT NULL DEFAULT (datetime('now')),
      FOREIGN KEY (CUSTOMER_ID) REFERENCES TB_CUSTOMER(CUSTOMER_ID)
    )",
    "CREATE TABLE IF NOT EXISTS TB_SCENARIO (
      SCENARIO_ID INTEGER PRIMARY KEY AUTOINCREMENT,
      SCENARIO_NAME TEXT NOT NULL,
      SCENARIO_DESC TEXT NOT NULL,
      CONDITION_KEYWORD1 TEXT NOT NULL,
      CONDITION_KEYWORD2 TEXT NOT NULL,
      CONDITION_KEYWORD3 TEXT NOT NULL,
      THRESHOLD_1 REAL,
      THRESHOLD_2 REAL,
      THRESHOLD_3 REAL,
      SQL_TEXT TEXT NOT NULL,
      REG_DATE TEXT NOT NULL,
      REG_TIME TEXT NOT NULL,
      CREATED_BY TEXT,
      CREATED_AT TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS TB_DETECTION_RESULT (
      RESULT_ID INTEGER PRIMARY KEY AUTOINCREMENT,
      CUSTOMER_ID TEXT NOT NULL,
      TXN_ID INTEGER NOT NULL,
      SCENARIO_ID INTEGER NOT NULL,
      DETECTION_TIME TEXT NOT NULL DEFAULT (datetime('now')),
      FOREIGN KEY (CUSTOMER_ID) REFERENCES TB_CUSTOMER(CUSTOMER_ID),
      FOREIGN KEY (TXN_ID) REFERENCES TB_TRANSACTION(TXN_ID),
      FOREIGN KEY (SCENARIO_ID) REFERENCES TB_SCENARIO(SCENARIO_ID)
    )",
];

const SCENARIO_COLUMNS: &str = "SCENARIO_ID, SCENARIO_NAME, SCENARIO_DESC, \
     CONDITION_KEYWORD1, CONDITION_KEYWORD2, CONDITION_KEYWORD3, \
     THRESHOLD_1, THRESHOLD_2, THRESHOLD_3, SQL_TEXT, REG_DATE, REG_TIME, CREATED_BY, CREATED_AT";

/// One row matched by a scenario query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionMatch {
    pub customer_id: String,
    pub txn_id: i64,
}

/// Handle to the SQLite database; cheap to clone
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    created_by: String,
    detection_list_limit: u32,
}

impl Store {
    pub async fn connect(config: &SiranioConfig) -> Result<Self> {
        let options = if config.database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&config.database_url).map_err(|e| {
                SiranioError::ConfigError {
                    message: format!("Invalid SQLite connection string: {}", e),
                }
            })?
        } else {
            // Treat as file path
            SqliteConnectOptions::new().filename(&config.database_url)
        };
        let options = options.create_if_missing(true).foreign_keys(true);

        let pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        let pool = if config.is_in_memory() {
            // The database disappears with its last connection
            pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        SiranioError::StorageError {
                            message: format!("Failed to create {}: {}", parent.display(), e),
                        }
                    })?;
                }
            }
            pool_options
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        info!(
            "SQLite connection pool created (max_connections: {})",
            config.max_connections
        );

        Ok(Self {
            pool,
            created_by: config.created_by.clone(),
            detection_list_limit: config.detection_list_limit,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the four tables if they do not exist
    pub async fn bootstrap(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert customers in one transaction, replacing rows with the same id
    pub async fn insert_customers(&self, customers: &[Customer]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for customer in customers {
            sqlx::query(
                "INSERT OR REPLACE INTO TB_CUSTOMER (
                   CUSTOMER_ID, CUSTOMER_AGE, CUSTOMER_GENDER, CUSTOMER_REGION, CUSTOMER_REG_DATE
                 ) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&customer.customer_id)
            .bind(customer.age)
            .bind(&customer.gender)
            .bind(&customer.region)
            .bind(&customer.reg_date)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(customers.len() as u64)
    }

    /// Insert withdrawals in one transaction
    pub async fn insert_transactions(&self, transactions: &[WithdrawalTransaction]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for txn in transactions {
            sqlx::query(
                "INSERT INTO TB_TRANSACTION (
                   CUSTOMER_ID, WITHDRAWAL_DATE, WITHDRAWAL_TIME, WITHDRAWAL_AMOUNT, WITHDRAWAL_CHANNEL
                 ) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&txn.customer_id)
            .bind(&txn.date)
            .bind(&txn.time)
            .bind(txn.amount)
            .bind(&txn.channel)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(transactions.len() as u64)
    }

    pub async fn customer_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT CUSTOMER_ID FROM TB_CUSTOMER")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Persist a scenario, stamping the local registration date and time
    pub async fn save_scenario(&self, scenario: &NewScenario) -> Result<SavedScenario> {
        let now = Local::now();
        let [kw1, kw2, kw3] = &scenario.keywords;
        let [th1, th2, th3] = scenario.numeric_thresholds;

        let result = sqlx::query(
            "INSERT INTO TB_SCENARIO (
               SCENARIO_NAME, SCENARIO_DESC,
               CONDITION_KEYWORD1, CONDITION_KEYWORD2, CONDITION_KEYWORD3,
               THRESHOLD_1, THRESHOLD_2, THRESHOLD_3,
               SQL_TEXT, REG_DATE, REG_TIME, CREATED_BY
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&scenario.name)
        .bind(&scenario.description)
        .bind(kw1)
        .bind(kw2)
        .bind(kw3)
        .bind(th1)
        .bind(th2)
        .bind(th3)
        .bind(&scenario.sql_text)
        .bind(now.format("%Y-%m-%d").to_string())
        .bind(now.format("%H:%M:%S").to_string())
        .bind(&self.created_by)
        .execute(&self.pool)
        .await?;

        let scenario_id = result.last_insert_rowid();
        self.find_scenario(scenario_id)
            .await?
            .ok_or(SiranioError::ScenarioNotFound { scenario_id })
    }

    /// Saved scenarios, newest first
    pub async fn list_scenarios(&self) -> Result<Vec<SavedScenario>> {
        let sql = format!(
            "SELECT {} FROM TB_SCENARIO ORDER BY SCENARIO_ID DESC",
            SCENARIO_COLUMNS
        );
        let scenarios = sqlx::query_as::<_, SavedScenario>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(scenarios)
    }

    pub async fn find_scenario(&self, scenario_id: i64) -> Result<Option<SavedScenario>> {
        let sql = format!(
            "SELECT {} FROM TB_SCENARIO WHERE SCENARIO_ID = ?",
            SCENARIO_COLUMNS
        );
        let scenario = sqlx::query_as::<_, SavedScenario>(&sql)
            .bind(scenario_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(scenario)
    }

    /// Replace a scenario's previous results with `matches`, atomically
    pub async fn replace_detections(
        &self,
        scenario_id: i64,
        matches: &[DetectionMatch],
        detected_at: &str,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM TB_DETECTION_RESULT WHERE SCENARIO_ID = ?")
            .bind(scenario_id)
            .execute(&mut *tx)
            .await?;

        for hit in matches {
            sqlx::query(
                "INSERT INTO TB_DETECTION_RESULT (CUSTOMER_ID, TXN_ID, SCENARIO_ID, DETECTION_TIME)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&hit.customer_id)
            .bind(hit.txn_id)
            .bind(scenario_id)
            .bind(detected_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Most recent detection hits, optionally for a single scenario
    pub async fn list_detections(&self, scenario_id: Option<i64>) -> Result<Vec<DetectionRecord>> {
        let filter = if scenario_id.is_some() {
            "WHERE dr.SCENARIO_ID = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT dr.RESULT_ID,
                    dr.CUSTOMER_ID,
                    dr.TXN_ID,
                    dr.SCENARIO_ID,
                    dr.DETECTION_TIME,
                    t.WITHDRAWAL_DATE,
                    t.WITHDRAWAL_TIME,
                    t.WITHDRAWAL_AMOUNT,
                    t.WITHDRAWAL_CHANNEL
               FROM TB_DETECTION_RESULT dr
               JOIN TB_TRANSACTION t ON dr.TXN_ID = t.TXN_ID
              {}
              ORDER BY dr.DETECTION_TIME DESC, dr.RESULT_ID ASC
              LIMIT ?",
            filter
        );

        let mut query = sqlx::query_as::<_, DetectionRecord>(&sql);
        if let Some(id) = scenario_id {
            query = query.bind(id);
        }
        let rows = query
            .bind(i64::from(self.detection_list_limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn counts(&self) -> Result<DatasetCounts> {
        Ok(DatasetCounts {
            customers: self.count_rows("TB_CUSTOMER").await?,
            transactions: self.count_rows("TB_TRANSACTION").await?,
            scenarios: self.count_rows("TB_SCENARIO").await?,
            detection_results: self.count_rows("TB_DETECTION_RESULT").await?,
        })
    }

    /// `table` must be one of the schema's own table names
    pub(crate) async fn count_rows(&self, table: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(1) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        let store = Store::connect(&SiranioConfig::in_memory()).await.unwrap();
        store.bootstrap().await.unwrap();
        store
    }

    fn scenario(name: &str) -> NewScenario {
        NewScenario {
            name: name.to_string(),
            description: "테스트 시나리오".to_string(),
            keywords: ["고액 출금".to_string(), "야간".to_string(), "atm".to_string()],
            numeric_thresholds: [Some(5_000_000.0), None, None],
            sql_text: "SELECT 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = memory_store().await;
        store.bootstrap().await.unwrap();
        assert_eq!(store.counts().await.unwrap(), DatasetCounts::default());
    }

    #[tokio::test]
    async fn test_save_scenario_round_trips_columns() {
        let store = memory_store().await;
        let saved = store.save_scenario(&scenario("시나리오 1 | 엄격형")).await.unwrap();

        assert!(saved.scenario_id > 0);
        assert_eq!(saved.condition_keyword2, "야간");
        assert_eq!(saved.threshold_1, Some(5_000_000.0));
        assert_eq!(saved.threshold_3, None);
        assert_eq!(saved.created_by.as_deref(), Some("POC_USER"));
        assert_eq!(saved.reg_date.len(), 10);
        assert_eq!(saved.reg_time.len(), 8);
    }

    #[tokio::test]
    async fn test_list_scenarios_newest_first() {
        let store = memory_store().await;
        let first = store.save_scenario(&scenario("first")).await.unwrap();
        let second = store.save_scenario(&scenario("second")).await.unwrap();

        let listed = store.list_scenarios().await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.scenario_id).collect();
        assert_eq!(ids, vec![second.scenario_id, first.scenario_id]);
    }

    #[tokio::test]
    async fn test_find_missing_scenario() {
        let store = memory_store().await;
        assert!(store.find_scenario(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_scenario_serializes_column_names() {
        let store = memory_store().await;
        let saved = store.save_scenario(&scenario("cols")).await.unwrap();
        let json = serde_json::to_value(&saved).unwrap();

        assert_eq!(json["SCENARIO_NAME"], "cols");
        assert_eq!(json["CONDITION_KEYWORD1"], "고액 출금");
        assert_eq!(json["THRESHOLD_1"], 5_000_000.0);
        assert!(json["THRESHOLD_2"].is_null());
        assert_eq!(json["SQL_TEXT"], "SELECT 1");
    }

    #[tokio::test]
    async fn test_replace_detections_and_list() {
        let store = memory_store().await;
        store
            .insert_customers(&[Customer {
                customer_id: "C0001".to_string(),
                age: 30,
                gender: "F".to_string(),
                region: "서울".to_string(),
                reg_date: "2022-01-01".to_string(),
            }])
            .await
            .unwrap();
        store
            .insert_transactions(&[
                WithdrawalTransaction {
                    customer_id: "C0001".to_string(),
                    date: "2024-05-01".to_string(),
                    time: "23:10:00".to_string(),
                    amount: 6_000_000.0,
                    channel: "ATM".to_string(),
                },
                WithdrawalTransaction {
                    customer_id: "C0001".to_string(),
                    date: "2024-05-02".to_string(),
                    time: "10:00:00".to_string(),
                    amount: 20_000.0,
                    channel: "창구".to_string(),
                },
            ])
            .await
            .unwrap();
        let saved = store.save_scenario(&scenario("det")).await.unwrap();

        let hits = vec![
            DetectionMatch { customer_id: "C0001".to_string(), txn_id: 1 },
            DetectionMatch { customer_id: "C0001".to_string(), txn_id: 2 },
        ];
        store
            .replace_detections(saved.scenario_id, &hits, "2024-05-03T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(store.list_detections(None).await.unwrap().len(), 2);

        // A re-run replaces the earlier hits
        store
            .replace_detections(saved.scenario_id, &hits[..1], "2024-05-04T00:00:00.000Z")
            .await
            .unwrap();
        let rows = store.list_detections(Some(saved.scenario_id)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].withdrawal_channel, "ATM");
        assert_eq!(rows[0].withdrawal_amount, 6_000_000.0);
        assert_eq!(rows[0].detection_time, "2024-05-04T00:00:00.000Z");

        assert!(store.list_detections(Some(saved.scenario_id + 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detection_listing_respects_limit() {
        let mut config = SiranioConfig::in_memory();
        config.detection_list_limit = 2;
        let store = Store::connect(&config).await.unwrap();
        store.bootstrap().await.unwrap();

        store
            .insert_customers(&[Customer {
                customer_id: "C0001".to_string(),
                age: 70,
                gender: "M".to_string(),
                region: "부산".to_string(),
                reg_date: "2021-06-30".to_string(),
            }])
            .await
            .unwrap();
        let txns: Vec<_> = (0..5)
            .map(|i| WithdrawalTransaction {
                customer_id: "C0001".to_string(),
                date: "2024-01-01".to_string(),
                time: format!("0{}:00:00", i),
                amount: 100_000.0,
                channel: "온라인".to_string(),
            })
            .collect();
        store.insert_transactions(&txns).await.unwrap();
        let saved = store.save_scenario(&scenario("limit")).await.unwrap();

        let hits: Vec<_> = (1..=5)
            .map(|txn_id| DetectionMatch { customer_id: "C0001".to_string(), txn_id })
            .collect();
        store
            .replace_detections(saved.scenario_id, &hits, "2024-01-02T00:00:00.000Z")
            .await
            .unwrap();

        assert_eq!(store.list_detections(None).await.unwrap().len(), 2);
        assert_eq!(store.counts().await.unwrap().detection_results, 5);
    }
}
