//! Request/response payloads
//!
//! Field names follow the web client: camelCase on requests, while saved
//! scenarios and detection rows go out with their column names.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::scenario::{GeneratedScenario, KEYWORD_COUNT};
use crate::{NewScenario, Siranio};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Siranio>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Either a `keywords` array or the three form fields
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub keywords: Option<Vec<String>>,
    pub condition_keyword1: Option<String>,
    pub condition_keyword2: Option<String>,
    pub condition_keyword3: Option<String>,
}

impl GenerateRequest {
    /// Resolve the keywords to generate from, or the list of problems found
    pub fn into_keywords(self) -> Result<Vec<String>, Vec<&'static str>> {
        if let Some(keywords) = self.keywords {
            let mut issues = Vec::new();
            if keywords.iter().any(|keyword| keyword.is_empty()) {
                issues.push("키워드를 입력하세요.");
            }
            if keywords.len() != KEYWORD_COUNT {
                issues.push("키워드는 3개가 필요합니다.");
            }
            return if issues.is_empty() {
                Ok(keywords)
            } else {
                Err(issues)
            };
        }

        match (
            self.condition_keyword1,
            self.condition_keyword2,
            self.condition_keyword3,
        ) {
            (Some(kw1), Some(kw2), Some(kw3))
                if !kw1.is_empty() && !kw2.is_empty() && !kw3.is_empty() =>
            {
                Ok(vec![kw1, kw2, kw3])
            }
            _ => Err(vec!["키워드 3개를 모두 입력하세요."]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub scenarios: [GeneratedScenario; 3],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScenarioRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// May be omitted, but an explicit `null` is rejected
    #[serde(default, deserialize_with = "present_thresholds")]
    pub numeric_thresholds: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub sql_text: String,
}

/// Only reached when the field is present, so `null` fails as a non-array
fn present_thresholds<'de, D>(deserializer: D) -> Result<Option<Vec<Option<f64>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Option<f64>>::deserialize(deserializer).map(Some)
}

impl SaveScenarioRequest {
    pub fn into_new_scenario(self) -> Result<NewScenario, Vec<&'static str>> {
        let mut issues = Vec::new();
        if self.name.is_empty() {
            issues.push("시나리오 이름을 입력하세요.");
        }
        if self.description.is_empty() {
            issues.push("시나리오 설명을 입력하세요.");
        }
        if self.keywords.iter().any(|keyword| keyword.is_empty()) {
            issues.push("키워드를 입력하세요.");
        }
        let keywords: Option<[String; KEYWORD_COUNT]> = self.keywords.try_into().ok();
        if keywords.is_none() {
            issues.push("키워드는 3개가 필요합니다.");
        }
        let thresholds: Option<[Option<f64>; KEYWORD_COUNT]> = match self.numeric_thresholds {
            None => Some([None; KEYWORD_COUNT]),
            Some(values) => values.try_into().ok(),
        };
        if thresholds.is_none() {
            issues.push("임계값은 3개가 필요합니다.");
        }
        if self.sql_text.is_empty() {
            issues.push("SQL을 입력하세요.");
        }

        match (keywords, thresholds) {
            (Some(keywords), Some(numeric_thresholds)) if issues.is_empty() => Ok(NewScenario {
                name: self.name,
                description: self.description,
                keywords,
                numeric_thresholds,
                sql_text: self.sql_text,
            }),
            _ => Err(issues),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetectionsRequest {
    #[serde(default)]
    pub scenario_ids: Vec<i64>,
}

impl RunDetectionsRequest {
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let mut issues = Vec::new();
        if self.scenario_ids.is_empty() {
            issues.push("실행할 시나리오를 선택하세요.");
        }
        if self.scenario_ids.iter().any(|id| *id <= 0) {
            issues.push("시나리오 ID는 양수여야 합니다.");
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
