//! REST API
//!
//! - types: request/response payloads
//! - extractors: JSON body and query extractors with JSON rejections
//! - handlers: endpoint handlers
//! - router: route table, CORS and request tracing

mod extractors;
mod handlers;
mod router;
pub mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::errors::{ErrorSeverity, SiranioError};

pub use extractors::{JsonExtractor, ScenarioFilter, ScenarioIdPath};
pub use router::create_router;
pub use types::AppState;

impl SiranioError {
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if matches!(self, SiranioError::ScenarioNotFound { .. }) {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for SiranioError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!(recoverable = self.is_recoverable(), "Request failed: {}", self)
            }
            ErrorSeverity::Medium => warn!("Request failed: {}", self),
            ErrorSeverity::Low => {}
        }

        let body = if status.is_server_error() {
            json!({
                "message": self.to_user_message(),
                "detail": self.to_string(),
            })
        } else {
            json!({ "message": self.to_user_message() })
        };

        (status, Json(body)).into_response()
    }
}
