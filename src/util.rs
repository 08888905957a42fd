// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" date/text handling so the rest of the
// code can assume clean, typed values.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

pub const TITLE_MAX_CHARS: usize = 80;
pub const ELLIPSIS: &str = "...";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Parse an ISO-8601 date or date-time and keep only its calendar date.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace; empty strings are rejected.
/// - Date-times with an offset keep the date as written, no timezone shift.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // A trailing `Z` is the zero offset.
    let s = match s.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => s.to_string(),
    };
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&s, fmt) {
            return Some(dt.naive_local().date());
        }
    }
    // Date followed by an offset only, e.g. `2024-05-10+02:00`.
    let (date, offset) = (s.get(..10)?, s.get(10..)?);
    DateTime::parse_from_str(&format!("{date}T00:00:00{offset}"), "%Y-%m-%dT%H:%M:%S%:z")
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// Whole days from `today` to `finish`. Negative once `finish` has passed.
pub fn days_until(today: NaiveDate, finish: NaiveDate) -> i64 {
    (finish - today).num_days()
}

/// Keep the first 80 characters (not bytes) and mark the cut.
pub fn truncate_title(s: &str) -> String {
    match s.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &s[..cut], ELLIPSIS),
        None => s.to_string(),
    }
}

/// Split a comma-separated answer into trimmed, non-empty values.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `1,204 tenders loaded`).
    n.to_formatted_string(&Locale::en)
}
