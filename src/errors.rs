//! Error handling for the Siranio scenario service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiranioError {
    #[error("Expected exactly 3 non-empty keywords, got {count}")]
    InvalidInputCount { count: usize },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Scenario not found: {scenario_id}")]
    ScenarioNotFound { scenario_id: i64 },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Detection query failed for scenario {scenario_id}: {message}")]
    QueryExecution { scenario_id: i64, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Data serialization error: {message}")]
    SerializationError { message: String },
}

impl SiranioError {
    /// Message shown to the analyst in the UI
    pub fn to_user_message(&self) -> String {
        match self {
            SiranioError::InvalidInputCount { .. } => {
                "3개의 키워드를 정확히 입력해 주세요.".to_string()
            }
            SiranioError::InvalidRequest { message } => message.clone(),
            SiranioError::ScenarioNotFound { scenario_id } => {
                format!("시나리오를 찾을 수 없습니다. (ID: {})", scenario_id)
            }
            SiranioError::StorageError { .. } => "시나리오 저장에 실패했습니다.".to_string(),
            SiranioError::QueryExecution { .. } => {
                "탐지 실행 중 오류가 발생했습니다.".to_string()
            }
            _ => "요청을 처리하는 중 오류가 발생했습니다.".to_string(),
        }
    }

    /// Check if the request can be retried as-is
    pub fn is_recoverable(&self) -> bool {
        match self {
            SiranioError::StorageError { .. } => true,

            SiranioError::InvalidInputCount { .. }
            | SiranioError::InvalidRequest { .. }
            | SiranioError::ScenarioNotFound { .. }
            | SiranioError::QueryExecution { .. } => false,

            _ => false,
        }
    }

    /// Get severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SiranioError::QueryExecution { .. } | SiranioError::ConfigError { .. } => {
                ErrorSeverity::Critical
            }

            SiranioError::StorageError { .. } | SiranioError::SerializationError { .. } => {
                ErrorSeverity::High
            }

            SiranioError::ScenarioNotFound { .. } => ErrorSeverity::Medium,

            _ => ErrorSeverity::Low,
        }
    }

    /// Whether the caller sent something that must be corrected before resubmitting
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SiranioError::InvalidInputCount { .. } | SiranioError::InvalidRequest { .. }
        )
    }
}

impl From<sqlx::Error> for SiranioError {
    fn from(err: sqlx::Error) -> Self {
        SiranioError::StorageError {
            message: err.to_string(),
        }
    }
}

impl From<::config::ConfigError> for SiranioError {
    fn from(err: ::config::ConfigError) -> Self {
        SiranioError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SiranioError {
    fn from(err: serde_json::Error) -> Self {
        SiranioError::SerializationError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, SiranioError>;
