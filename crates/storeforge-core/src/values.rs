use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Accepts RFC 3339 and the two naive layouts written by `csv`/`chrono`.
pub fn parse_timestamp_value(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok())
}

/// Round half away from zero to `scale` fractional digits.
pub fn round_to(value: f64, scale: u8) -> f64 {
    let factor = 10_f64.powi(i32::from(scale));
    (value * factor).round() / factor
}

pub fn round_currency(value: f64) -> f64 {
    round_to(value, 2)
}
