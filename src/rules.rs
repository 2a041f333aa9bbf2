//! Keyword rule table
//!
//! Maps a normalized keyword to a [`ConditionKind`] and renders that kind into a
//! SQL predicate for one [`SensitivityVariant`]. Predicates reference the
//! transaction table as `t` and the customer table as `c`.

use serde::{Deserialize, Serialize};

use crate::utils;

/// Sensitivity tier, ordered from most to least restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityVariant {
    Strict,
    Balanced,
    Relaxed,
}

impl SensitivityVariant {
    /// Every generation request produces one scenario per tier, in this order
    pub const ALL: [SensitivityVariant; 3] = [
        SensitivityVariant::Strict,
        SensitivityVariant::Balanced,
        SensitivityVariant::Relaxed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SensitivityVariant::Strict => "strict",
            SensitivityVariant::Balanced => "balanced",
            SensitivityVariant::Relaxed => "relaxed",
        }
    }

    /// 1-based position, used in titles and temporary ids
    pub fn order(self) -> u8 {
        match self {
            SensitivityVariant::Strict => 1,
            SensitivityVariant::Balanced => 2,
            SensitivityVariant::Relaxed => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SensitivityVariant::Strict => "시나리오 1",
            SensitivityVariant::Balanced => "시나리오 2",
            SensitivityVariant::Relaxed => "시나리오 3",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SensitivityVariant::Strict => "엄격형",
            SensitivityVariant::Balanced => "표준형",
            SensitivityVariant::Relaxed => "민감형",
        }
    }

    pub fn amount_threshold(self) -> u64 {
        match self {
            SensitivityVariant::Strict => 5_000_000,
            SensitivityVariant::Balanced => 3_000_000,
            SensitivityVariant::Relaxed => 1_500_000,
        }
    }

    /// Customers younger than this match the youth rule
    pub fn youth_age_threshold(self) -> u64 {
        match self {
            SensitivityVariant::Strict => 28,
            SensitivityVariant::Balanced => 32,
            SensitivityVariant::Relaxed => 38,
        }
    }

    /// Customers at or above this age match the senior rule
    pub fn senior_age_threshold(self) -> u64 {
        match self {
            SensitivityVariant::Strict => 65,
            SensitivityVariant::Balanced => 60,
            SensitivityVariant::Relaxed => 55,
        }
    }

    /// Window crossing midnight: `from` is late evening, `to` early morning
    pub fn night_window(self) -> TimeWindow {
        match self {
            SensitivityVariant::Strict => TimeWindow::new("23:00:00", "04:59:59"),
            SensitivityVariant::Balanced => TimeWindow::new("22:00:00", "05:59:59"),
            SensitivityVariant::Relaxed => TimeWindow::new("21:00:00", "06:59:59"),
        }
    }

    /// Same-day window, `from <= to`
    pub fn lunch_window(self) -> TimeWindow {
        match self {
            SensitivityVariant::Strict => TimeWindow::new("12:00:00", "13:30:00"),
            SensitivityVariant::Balanced => TimeWindow::new("11:30:00", "14:00:00"),
            SensitivityVariant::Relaxed => TimeWindow::new("11:00:00", "15:00:00"),
        }
    }
}

impl std::fmt::Display for SensitivityVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Clock-time bounds in `HH:MM:SS`, compared as text by SQLite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: &'static str,
    pub to: &'static str,
}

impl TimeWindow {
    const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Atm,
    Counter,
    Online,
}

impl Channel {
    /// Value stored in TB_TRANSACTION.WITHDRAWAL_CHANNEL
    pub fn value(self) -> &'static str {
        match self {
            Channel::Atm => "ATM",
            Channel::Counter => "창구",
            Channel::Online => "온라인",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Atm => "ATM 채널",
            Channel::Counter => "창구 채널",
            Channel::Online => "온라인 채널",
        }
    }
}

/// Condition families known to the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    HighWithdrawal,
    NightWindow,
    YouthAge,
    SeniorAge,
    Channel(Channel),
    LunchWindow,
}

/// One keyword rendered under one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub label: String,
    pub detail: String,
    pub sql: String,
    pub numeric_threshold: Option<u64>,
}

/// Lookup key for the rule table: trimmed and lowercased
pub fn normalize_keyword(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// Exact-match lookup on an already normalized keyword
pub fn lookup_rule(normalized: &str) -> Option<ConditionKind> {
    let kind = match normalized {
        "고액 출금" | "대규모 출금" => ConditionKind::HighWithdrawal,
        "야간" | "야간 출금" | "심야" => ConditionKind::NightWindow,
        "젊은 고객" | "청년 고객" => ConditionKind::YouthAge,
        "고령 고객" | "고령자" => ConditionKind::SeniorAge,
        "atm" => ConditionKind::Channel(Channel::Atm),
        "창구" => ConditionKind::Channel(Channel::Counter),
        "인터넷" | "온라인" => ConditionKind::Channel(Channel::Online),
        "점심 시간" => ConditionKind::LunchWindow,
        _ => return None,
    };
    Some(kind)
}

/// Double single quotes so the value stays inside a `'...'` literal.
///
/// LIKE wildcards (`%`, `_`) and every other metacharacter pass through untouched.
/// The fallback predicate is still built by string interpolation and executed
/// verbatim later, so this is NOT an injection guard.
pub fn escape_sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

impl ConditionKind {
    pub fn render(self, variant: SensitivityVariant) -> Condition {
        match self {
            ConditionKind::HighWithdrawal => {
                let threshold = variant.amount_threshold();
                Condition {
                    label: "출금 금액".to_string(),
                    detail: format!("출금 금액이 {} 초과", utils::format_won(threshold)),
                    sql: format!("t.WITHDRAWAL_AMOUNT > {}", threshold),
                    numeric_threshold: Some(threshold),
                }
            }
            ConditionKind::NightWindow => {
                let window = variant.night_window();
                // OR of two comparisons, not a circular interval check
                Condition {
                    label: "야간 시간대".to_string(),
                    detail: format!("{}~{} 사이 출금", window.from, window.to),
                    sql: format!(
                        "((t.WITHDRAWAL_TIME >= '{}') OR (t.WITHDRAWAL_TIME <= '{}'))",
                        window.from, window.to
                    ),
                    numeric_threshold: None,
                }
            }
            ConditionKind::YouthAge => {
                let threshold = variant.youth_age_threshold();
                Condition {
                    label: "고객 나이".to_string(),
                    detail: format!("{}세 미만 고객", threshold),
                    sql: format!("c.CUSTOMER_AGE < {}", threshold),
                    numeric_threshold: Some(threshold),
                }
            }
            ConditionKind::SeniorAge => {
                let threshold = variant.senior_age_threshold();
                Condition {
                    label: "고객 나이".to_string(),
                    detail: format!("{}세 이상 고객", threshold),
                    sql: format!("c.CUSTOMER_AGE >= {}", threshold),
                    numeric_threshold: Some(threshold),
                }
            }
            ConditionKind::Channel(channel) => Condition {
                label: "거래 채널".to_string(),
                detail: format!("{} 이용", channel.label()),
                sql: format!("t.WITHDRAWAL_CHANNEL = '{}'", channel.value()),
                numeric_threshold: None,
            },
            ConditionKind::LunchWindow => {
                let window = variant.lunch_window();
                Condition {
                    label: "점심 시간대".to_string(),
                    detail: format!("{}~{} 출금", window.from, window.to),
                    sql: format!(
                        "(t.WITHDRAWAL_TIME BETWEEN '{}' AND '{}')",
                        window.from, window.to
                    ),
                    numeric_threshold: None,
                }
            }
        }
    }
}

/// Generic "channel contains text" predicate for keywords the table does not know
pub fn fallback_condition(keyword: &str) -> Condition {
    Condition {
        label: format!("{} 사용자 정의 조건", keyword),
        detail: format!("거래 채널 값에 '{}' 포함", keyword),
        sql: format!(
            "t.WITHDRAWAL_CHANNEL LIKE '%{}%'",
            escape_sql_literal(keyword)
        ),
        numeric_threshold: None,
    }
}

/// Resolve a keyword for one variant, falling back to the LIKE predicate
pub fn build_condition(keyword: &str, variant: SensitivityVariant) -> Condition {
    match lookup_rule(&normalize_keyword(keyword)) {
        Some(kind) => kind.render(variant),
        None => fallback_condition(keyword),
    }
}
