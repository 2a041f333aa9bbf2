//! Configuration module for the Siranio service
//! Covers the HTTP listener, the SQLite dataset and the synthetic seeding targets

use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiranioConfig {
    /// Listener address
    pub host: String,
    pub port: u16,

    /// SQLite connection string (`sqlite://path`, `sqlite::memory:` or a bare file path)
    pub database_url: String,
    pub max_connections: u32,

    /// Synthetic dataset size
    pub customer_target_count: u32,
    pub transaction_target_count: u32,

    /// Seed the dataset before serving
    pub seed_on_startup: bool,

    /// Maximum rows returned by the detection listing
    pub detection_list_limit: u32,

    /// Recorded as CREATED_BY on saved scenarios
    pub created_by: String,
}

impl Default for SiranioConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "sqlite://data/siranio.db".to_string(),
            max_connections: 5,
            customer_target_count: 500,
            transaction_target_count: 10_000,
            seed_on_startup: true,
            detection_list_limit: 500,
            created_by: "POC_USER".to_string(),
        }
    }
}

impl SiranioConfig {
    /// Throwaway in-memory dataset, small enough for tests and demos.
    ///
    /// An in-memory SQLite database lives as long as its connection, so the
    /// pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            customer_target_count: 50,
            transaction_target_count: 1_000,
            ..Self::default()
        }
    }

    /// Layer defaults, an optional JSON file and the environment.
    ///
    /// `SIRANIO_<FIELD>` variables override the file; a bare `PORT` wins over both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Json));
        }

        let config = builder
            .add_source(Environment::with_prefix("SIRANIO").try_parsing(true))
            .set_override_option("port", std::env::var("PORT").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        if self.database_url.trim().is_empty() {
            return Err("Database URL must not be empty".to_string());
        }

        if self.max_connections == 0 {
            return Err("At least one database connection is required".to_string());
        }

        if self.is_in_memory() && self.max_connections != 1 {
            return Err("In-memory databases must use exactly one connection".to_string());
        }

        if self.detection_list_limit == 0 {
            return Err("Detection list limit must be greater than 0".to_string());
        }

        if self.created_by.trim().is_empty() {
            return Err("created_by must not be empty".to_string());
        }

        Ok(())
    }
}
