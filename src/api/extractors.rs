//! Custom extractors
//!
//! Body and query rejections are turned into [`SiranioError::InvalidRequest`]
//! so every client error leaves as the same `{message}` JSON shape.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};

use crate::errors::SiranioError;

/// JSON body extractor with a JSON error response
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SiranioError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("요청 데이터가 올바르지 않습니다: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(err) => {
                        format!("JSON 형식이 올바르지 않습니다: {}", err.body_text())
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "Content-Type: application/json 헤더가 필요합니다.".to_string()
                    }
                    other => format!("요청 본문을 읽을 수 없습니다: {}", other.body_text()),
                };
                Err(SiranioError::InvalidRequest { message })
            }
        }
    }
}

/// Optional `scenarioId` filter of the detection listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioFilter(pub Option<i64>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ScenarioFilter
where
    S: Send + Sync,
{
    type Rejection = SiranioError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| SiranioError::InvalidRequest {
                message: rejection.body_text(),
            })?;

        match params.get("scenarioId").map(|raw| raw.trim()) {
            None | Some("") => Ok(Self(None)),
            Some(raw) => raw
                .parse::<i64>()
                .map(|id| Self(Some(id)))
                .map_err(|_| SiranioError::InvalidRequest {
                    message: format!("scenarioId는 정수여야 합니다: {}", raw),
                }),
        }
    }
}

/// `:id` segment of the scenario routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioIdPath(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ScenarioIdPath
where
    S: Send + Sync,
{
    type Rejection = SiranioError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: PathRejection| SiranioError::InvalidRequest {
                message: rejection.body_text(),
            })?;

        raw.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| SiranioError::InvalidRequest {
                message: format!("시나리오 ID는 정수여야 합니다: {}", raw),
            })
    }
}
