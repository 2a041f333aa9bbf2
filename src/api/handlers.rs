//! API endpoint handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use super::extractors::{JsonExtractor, ScenarioFilter, ScenarioIdPath};
use super::types::*;
use crate::errors::SiranioError;
use crate::{utils, DetectionBatch, DetectionRecord, SavedScenario};

type ApiResult<T> = Result<T, SiranioError>;

fn invalid(issues: Vec<&'static str>) -> SiranioError {
    SiranioError::InvalidRequest {
        message: issues.join(", "),
    }
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: utils::detection_timestamp(Utc::now()),
    })
}

/// Draft the three scenarios for the submitted keywords
pub(super) async fn generate_scenarios(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let keywords = payload.into_keywords().map_err(invalid)?;
    let scenarios = state.service.generate_scenarios(keywords.as_slice())?;
    Ok(Json(GenerateResponse { scenarios }))
}

pub(super) async fn save_scenario(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<SaveScenarioRequest>,
) -> ApiResult<(StatusCode, Json<SavedScenario>)> {
    let scenario = payload.into_new_scenario().map_err(invalid)?;
    let saved = state.service.save_scenario(&scenario).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub(super) async fn list_scenarios(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SavedScenario>>> {
    Ok(Json(state.service.list_scenarios().await?))
}

pub(super) async fn get_scenario(
    State(state): State<AppState>,
    ScenarioIdPath(scenario_id): ScenarioIdPath,
) -> ApiResult<Json<SavedScenario>> {
    Ok(Json(state.service.get_scenario(scenario_id).await?))
}

/// Execute saved scenarios and replace their detection results
pub(super) async fn run_detections(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<RunDetectionsRequest>,
) -> ApiResult<Json<DetectionBatch>> {
    payload.validate().map_err(invalid)?;
    info!("Running {} scenario(s)", payload.scenario_ids.len());

    let batch = state.service.run_detections(&payload.scenario_ids).await?;
    Ok(Json(batch))
}

pub(super) async fn list_detections(
    State(state): State<AppState>,
    ScenarioFilter(scenario_id): ScenarioFilter,
) -> ApiResult<Json<Vec<DetectionRecord>>> {
    Ok(Json(state.service.list_detections(scenario_id).await?))
}
