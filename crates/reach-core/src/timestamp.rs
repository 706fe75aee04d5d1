//! Multi-format timestamp parsing.
//!
//! Source feeds mix day-first dotted dates, ISO-ish dates, with and without
//! time of day. [`parse`] tries the known formats in a fixed precedence and
//! is total: any input yields a value or `None`, never a panic or a sentinel
//! date. Callers pick their own null policy (sort placeholder vs. bucket
//! exclusion).

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-time formats tried first, in precedence order. Chrono accepts 1–2
/// digit day/month/hour components for the padded specifiers.
const DATETIME_FORMATS: [&str; 2] = ["%d.%m.%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Date-only formats, parsed as midnight.
const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// Parses a textual timestamp, or returns `None` when no known format
/// matches a valid calendar date.
pub fn parse(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Dotted day-first beats ISO: "05.03.2024" is 5 March, not an error.
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATETIME_FORMATS[0]) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMATS[0]) {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, DATETIME_FORMATS[1]) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMATS[1]) {
        return date.and_hms_opt(0, 0, 0);
    }

    // Generic last resort for anything a spreadsheet export may emit.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }
    None
}
