//! Router creation and configuration

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::*;
use super::types::AppState;
use crate::Siranio;

/// Create the `/api` router over a shared service
pub fn create_router(service: Arc<Siranio>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/scenarios/generate", post(generate_scenarios))
        .route("/api/scenarios", get(list_scenarios).post(save_scenario))
        .route("/api/scenarios/:id", get(get_scenario))
        .route("/api/detections/run", post(run_detections))
        .route("/api/detections", get(list_detections))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "해당 API를 찾을 수 없습니다." })),
    )
}
