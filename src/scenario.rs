//! Scenario generation
//!
//! Turns three analyst keywords into three scenario drafts, one per
//! [`SensitivityVariant`]. Each draft carries the assembled SQL text, which is
//! stored as-is when the draft is saved and executed verbatim by
//! [`crate::detection`] on a later run.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, SiranioError};
use crate::rules::{self, Condition, SensitivityVariant};
use crate::utils;

/// Number of keywords per generation request
pub const KEYWORD_COUNT: usize = 3;

const CONDITION_SEPARATOR: &str = "\n  AND ";

/// Exactly three trimmed, non-empty keywords in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordSet([String; KEYWORD_COUNT]);

impl KeywordSet {
    /// Trim every input, drop blank ones, and require exactly three to remain
    pub fn parse<S: AsRef<str>>(inputs: &[S]) -> Result<Self> {
        let keywords: Vec<String> = inputs
            .iter()
            .map(|keyword| keyword.as_ref().trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect();

        let count = keywords.len();
        keywords
            .try_into()
            .map(KeywordSet)
            .map_err(|_| SiranioError::InvalidInputCount { count })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Per-keyword condition of a draft; the SQL fragment stays internal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDetail {
    pub keyword: String,
    pub label: String,
    pub detail: String,
    #[serde(skip)]
    pub sql: String,
}

/// Unsaved scenario as returned to the UI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedScenario {
    pub temp_scenario_id: String,
    pub variant: SensitivityVariant,
    pub name: String,
    pub description: String,
    pub conditions: Vec<ConditionDetail>,
    pub sql: String,
    pub numeric_thresholds: [Option<u64>; KEYWORD_COUNT],
    pub keywords: KeywordSet,
}

/// Generate the strict, balanced and relaxed drafts for `inputs`
pub fn generate_scenarios<S: AsRef<str>>(inputs: &[S]) -> Result<[GeneratedScenario; 3]> {
    generate_scenarios_with_rng(inputs, &mut rand::thread_rng())
}

/// Same as [`generate_scenarios`] with a caller-supplied source for the temporary ids
pub fn generate_scenarios_with_rng<S, R>(
    inputs: &[S],
    rng: &mut R,
) -> Result<[GeneratedScenario; 3]>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let keywords = KeywordSet::parse(inputs)?;
    Ok(SensitivityVariant::ALL.map(|variant| build_scenario(&keywords, variant, rng)))
}

/// Build the draft for a single variant
pub fn build_scenario<R: Rng + ?Sized>(
    keywords: &KeywordSet,
    variant: SensitivityVariant,
    rng: &mut R,
) -> GeneratedScenario {
    let conditions: Vec<(String, Condition)> = keywords
        .iter()
        .map(|keyword| (keyword.to_string(), rules::build_condition(keyword, variant)))
        .collect();

    let mut numeric_thresholds = [None; KEYWORD_COUNT];
    for (slot, (_, condition)) in numeric_thresholds.iter_mut().zip(&conditions) {
        *slot = condition.numeric_threshold;
    }

    let sql = assemble_sql(conditions.iter().map(|(_, condition)| condition.sql.as_str()));
    debug!(variant = %variant, "assembled scenario SQL:\n{}", sql);

    let description = format!(
        "{} 민감도로 {} 조건을 동시에 만족하는 거래를 탐지합니다.",
        variant.display_name(),
        keywords.as_slice().join(", ")
    );

    GeneratedScenario {
        temp_scenario_id: temp_scenario_id(variant, rng),
        variant,
        name: format!("{} | {}", variant.title(), variant.display_name()),
        description,
        conditions: conditions
            .into_iter()
            .map(|(keyword, condition)| ConditionDetail {
                keyword,
                label: condition.label,
                detail: condition.detail,
                sql: condition.sql,
            })
            .collect(),
        sql,
        numeric_thresholds,
        keywords: keywords.clone(),
    }
}

/// Embed the fragments, joined with `AND` in the given order, into the detection query.
///
/// Plain text templating: nothing is validated or bound as a parameter.
pub fn assemble_sql<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let conditions = fragments.into_iter().collect::<Vec<_>>().join(CONDITION_SEPARATOR);

    format!(
        "SELECT\n  c.CUSTOMER_ID,\n  t.TXN_ID,\n  t.WITHDRAWAL_DATE,\n  t.WITHDRAWAL_TIME,\n  t.WITHDRAWAL_AMOUNT,\n  t.WITHDRAWAL_CHANNEL\n\
         FROM TB_CUSTOMER c\n\
         JOIN TB_TRANSACTION t ON c.CUSTOMER_ID = t.CUSTOMER_ID\n\
         WHERE\n  {}\n\
         ORDER BY t.WITHDRAWAL_DATE DESC, t.WITHDRAWAL_TIME DESC;",
        conditions
    )
}

/// `TEMP-<order>-<6 base-36 chars>`; only has to be unique within one response
pub fn temp_scenario_id<R: Rng + ?Sized>(variant: SensitivityVariant, rng: &mut R) -> String {
    let suffix = rng.gen_range(0..36u64.pow(6));
    format!("TEMP-{}-{}", variant.order(), utils::to_base36(suffix, 6))
}
