//! Utility functions for the Siranio service
//! Formatting helpers shared by the rule table, seeding and the CLI

use chrono::{DateTime, SecondsFormat, Utc};

/// Group digits with commas, e.g. `5000000` -> `5,000,000`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Won amount for condition details, e.g. `3,000,000원`
pub fn format_won(amount: u64) -> String {
    format!("{}원", group_thousands(amount))
}

/// `HH:MM:SS` as stored in TB_TRANSACTION.WITHDRAWAL_TIME
pub fn format_clock(hour: u32, minute: u32, second: u32) -> String {
    format!("{:02}:{:02}:{:02}", hour, minute, second)
}

/// Timestamp written to TB_DETECTION_RESULT.DETECTION_TIME
pub fn detection_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lowercase base-36 rendering, left-padded with zeros to `width`
pub fn to_base36(mut value: u64, width: usize) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    while out.len() < width {
        out.push(b'0');
    }
    out.reverse();

    out.into_iter().map(char::from).collect()
}
