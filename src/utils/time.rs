use std::sync::LazyLock;

use chrono::{NaiveTime, Utc};
use regex::Regex;

/// Strict `HH:MM`, two digits each.
static HHMM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").unwrap());

/// Current wall clock in milliseconds, used to stamp published rows.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a 24-hour `HH:MM` time of day.
///
/// chrono alone accepts single-digit fields, so the shape is checked first.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    if !HHMM_RE.is_match(s) {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}
