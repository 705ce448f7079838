//! Field extraction helpers for raw remote records.
//!
//! Every helper tolerates missing, `null`, and wrongly-typed fields by
//! substituting the caller's default. Record mappers are built entirely
//! from these, which is what keeps them total.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// String field, defaulting to the empty string.
pub fn string(record: &Value, field: &str) -> String {
    string_or(record, field, "")
}

/// String field with an explicit default.
pub fn string_or(record: &Value, field: &str, default: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Optional string field; absent, `null`, or non-string becomes `None`.
pub fn opt_string(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn float_or(record: &Value, field: &str, default: f64) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(default)
}

pub fn uint_or(record: &Value, field: &str, default: u32) -> u32 {
    record
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

pub fn bool_or(record: &Value, field: &str, default: bool) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(default)
}

/// String-array field; non-string elements are dropped.
pub fn string_list(record: &Value, field: &str) -> Vec<String> {
    record
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Array field as a slice of raw values; empty when absent.
pub fn items<'a>(record: &'a Value, field: &str) -> &'a [Value] {
    record
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object-valued field, skipping `null`.
pub fn object<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| v.is_object())
}

/// RFC 3339 timestamp field, defaulting to the current instant.
pub fn timestamp_or_now(record: &Value, field: &str) -> DateTime<Utc> {
    record
        .get(field)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now)
}

/// Calendar-date field (`YYYY-MM-DD`); full timestamps are truncated to
/// their date.
pub fn opt_date(record: &Value, field: &str) -> Option<NaiveDate> {
    record
        .get(field)
        .and_then(Value::as_str)
        .and_then(parse_date)
}

/// Calendar-date field, defaulting to today (UTC).
pub fn date_or_today(record: &Value, field: &str) -> NaiveDate {
    opt_date(record, field).unwrap_or_else(|| Utc::now().date_naive())
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|t| t.date_naive()))
}
