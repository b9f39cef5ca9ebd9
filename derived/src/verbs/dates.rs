use super::VerbError;
use crate::value::coerce_number;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`
fn parse_date(value: &Value) -> Result<NaiveDate, VerbError> {
    let Value::String(text) = value else {
        return Err(VerbError::type_conversion("a date", value));
    };
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .ok_or_else(|| VerbError::type_conversion("a date", value))
}

fn parse_days(value: &Value) -> Result<i64, VerbError> {
    coerce_number(value)
        .and_then(|n| n.trunc_i64())
        .ok_or_else(|| VerbError::type_conversion("a number of days", value))
}

fn is_within(date: NaiveDate, days: i64, today: NaiveDate) -> bool {
    today.signed_duration_since(date).num_days() <= days
}

/// Whether a date lies no more than `days` days before `today`
pub(super) fn within_last_days(date: &Value, days: &Value, today: NaiveDate) -> Result<bool, VerbError> {
    Ok(is_within(parse_date(date)?, parse_days(days)?, today))
}

/// The dates of a list that lie within the window, unchanged
pub(super) fn list_within_last_days(dates: &Value, days: &Value, today: NaiveDate) -> Result<Value, VerbError> {
    let Value::Array(items) = dates else {
        return Err(VerbError::type_conversion("a list of dates", dates));
    };
    let days = parse_days(days)?;
    let mut kept = Vec::new();
    for item in items {
        if is_within(parse_date(item)?, days, today) {
            kept.push(item.clone());
        }
    }
    Ok(Value::Array(kept))
}
