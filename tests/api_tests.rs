//! Integration tests for the REST API
//!
//! Each test builds the router over a fresh in-memory database and drives it
//! with `oneshot` requests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use siranio::{api, config::SiranioConfig, Siranio};

async fn create_app(seed: bool) -> Router {
    let mut config = SiranioConfig::in_memory();
    config.customer_target_count = 40;
    config.transaction_target_count = 600;

    let service = Siranio::open(config).await.unwrap();
    if seed {
        service.seed_dataset().await.unwrap();
    }
    api::create_router(Arc::new(service))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn save_first_draft(app: &Router, keywords: Value) -> Value {
    let (_, generated) = send(
        app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({ "keywords": keywords })),
    )
    .await;
    let draft = &generated["scenarios"][0];

    let (status, saved) = send(
        app,
        Method::POST,
        "/api/scenarios",
        Some(json!({
            "name": draft["name"],
            "description": draft["description"],
            "keywords": draft["keywords"],
            "numericThresholds": draft["numericThresholds"],
            "sqlText": draft["sql"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    saved
}

#[tokio::test]
async fn test_health() {
    let app = create_app(false).await;
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_generate_from_keyword_array() {
    let app = create_app(false).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({ "keywords": ["고액 출금", "야간", "ATM"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let scenarios = body["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 3);

    let variants: Vec<_> = scenarios.iter().map(|s| s["variant"].as_str().unwrap()).collect();
    assert_eq!(variants, ["strict", "balanced", "relaxed"]);
    assert_eq!(scenarios[0]["name"], "시나리오 1 | 엄격형");
    assert_eq!(scenarios[1]["numericThresholds"], json!([3000000, null, null]));
    assert!(scenarios[0]["sql"]
        .as_str()
        .unwrap()
        .contains("t.WITHDRAWAL_CHANNEL = 'ATM'"));
    assert!(scenarios[0]["conditions"][0].get("sql").is_none());
}

#[tokio::test]
async fn test_generate_from_form_fields() {
    let app = create_app(false).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({
            "conditionKeyword1": "젊은 고객",
            "conditionKeyword2": "점심 시간",
            "conditionKeyword3": "해외여행",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let relaxed = &body["scenarios"][2];
    assert_eq!(relaxed["keywords"], json!(["젊은 고객", "점심 시간", "해외여행"]));
    assert!(relaxed["sql"]
        .as_str()
        .unwrap()
        .contains("t.WITHDRAWAL_CHANNEL LIKE '%해외여행%'"));
}

#[tokio::test]
async fn test_generate_rejects_bad_keyword_input() {
    let app = create_app(false).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({ "keywords": ["야간", "atm"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "키워드는 3개가 필요합니다.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({ "conditionKeyword1": "야간" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "키워드 3개를 모두 입력하세요.");

    // Whitespace passes request validation but not the generator
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios/generate",
        Some(json!({ "keywords": ["야간", "   ", "atm"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "3개의 키워드를 정확히 입력해 주세요.");
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = create_app(false).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/scenarios/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"keywords\": ["))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_save_list_and_fetch_scenarios() {
    let app = create_app(false).await;
    let first = save_first_draft(&app, json!(["고액 출금", "야간", "atm"])).await;
    let second = save_first_draft(&app, json!(["고령자", "창구", "점심 시간"])).await;

    assert_eq!(first["SCENARIO_NAME"], "시나리오 1 | 엄격형");
    assert_eq!(first["THRESHOLD_1"], 5_000_000.0);
    assert!(first["THRESHOLD_2"].is_null());
    assert_eq!(first["CREATED_BY"], "POC_USER");

    let (status, listed) = send(&app, Method::GET, "/api/scenarios", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["SCENARIO_ID"].as_i64().unwrap())
        .collect();
    assert_eq!(
        ids,
        [second["SCENARIO_ID"].as_i64().unwrap(), first["SCENARIO_ID"].as_i64().unwrap()]
    );

    let uri = format!("/api/scenarios/{}", first["SCENARIO_ID"]);
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, first);

    let (status, body) = send(&app, Method::GET, "/api/scenarios/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_non_numeric_scenario_id_is_json_client_error() {
    let app = create_app(false).await;
    let (status, body) = send(&app, Method::GET, "/api/scenarios/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "시나리오 ID는 정수여야 합니다: abc" }));
}

#[tokio::test]
async fn test_save_validation() {
    let app = create_app(false).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios",
        Some(json!({
            "name": "",
            "description": "설명",
            "keywords": ["a", "b"],
            "sqlText": "SELECT 1",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "시나리오 이름을 입력하세요., 키워드는 3개가 필요합니다."
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/scenarios",
        Some(json!({
            "name": "이름",
            "description": "설명",
            "keywords": ["a", "b", "c"],
            "numericThresholds": null,
            "sqlText": "SELECT 1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("요청 데이터가 올바르지 않습니다"));
}

#[tokio::test]
async fn test_run_detections_and_list_results() {
    let app = create_app(true).await;
    let saved = save_first_draft(&app, json!(["대규모 출금", "심야", "atm"])).await;
    let scenario_id = saved["SCENARIO_ID"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/detections/run",
        Some(json!({ "scenarioIds": [scenario_id, 777] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["runId"].is_string());

    let runs = body["runs"].as_array().unwrap();
    assert_eq!(runs[0]["status"], "COMPLETED");
    assert_eq!(runs[0]["scenarioName"], "시나리오 1 | 엄격형");
    assert_eq!(runs[1], json!({
        "scenarioId": 777,
        "scenarioName": null,
        "detectedCount": 0,
        "status": "NOT_FOUND",
    }));

    let detected = runs[0]["detectedCount"].as_u64().unwrap();
    let uri = format!("/api/detections?scenarioId={}", scenario_id);
    let (status, rows) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len() as u64, detected);
    for row in rows {
        assert_eq!(row["SCENARIO_ID"], scenario_id);
        assert_eq!(row["WITHDRAWAL_CHANNEL"], "ATM");
        assert!(row["WITHDRAWAL_AMOUNT"].as_f64().unwrap() > 5_000_000.0);
    }
}

#[tokio::test]
async fn test_run_detections_validation() {
    let app = create_app(false).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/detections/run",
        Some(json!({ "scenarioIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/detections/run",
        Some(json!({ "scenarioIds": [-1] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/detections/run",
        Some(json!({ "scenarioIds": ["1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_broken_scenario_sql_is_a_server_error() {
    let app = create_app(false).await;
    let (_, saved) = send(
        &app,
        Method::POST,
        "/api/scenarios",
        Some(json!({
            "name": "broken",
            "description": "broken",
            "keywords": ["a", "b", "c"],
            "sqlText": "SELECT * FROM NO_SUCH_TABLE",
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/detections/run",
        Some(json!({ "scenarioIds": [saved["SCENARIO_ID"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "탐지 실행 중 오류가 발생했습니다.");
    assert!(body["detail"].as_str().unwrap().contains("NO_SUCH_TABLE"));
}

#[tokio::test]
async fn test_detection_listing_filters() {
    let app = create_app(false).await;

    let (status, rows) = send(&app, Method::GET, "/api/detections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows, json!([]));

    let (status, body) = send(&app, Method::GET, "/api/detections?scenarioId=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_app(false).await;
    let (status, body) = send(&app, Method::GET, "/api/unknown", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "해당 API를 찾을 수 없습니다." }));
}
