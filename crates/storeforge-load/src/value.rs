use chrono::{NaiveDate, NaiveDateTime};

use storeforge_core::ColumnKind;
use storeforge_core::values::{parse_date_value, parse_timestamp_value, round_to};

/// A typed cell read from a staged file. `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Decimal(Option<f64>),
    Date(Option<NaiveDate>),
    Timestamp(Option<NaiveDateTime>),
}

impl CellValue {
    /// Parse a raw field for a column of `kind`. Empty fields are NULL.
    pub fn parse(kind: ColumnKind, raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::null(kind));
        }
        match kind {
            ColumnKind::Text => Ok(CellValue::Text(Some(raw.to_string()))),
            ColumnKind::Integer => raw
                .parse::<i64>()
                .map(|value| CellValue::Integer(Some(value)))
                .map_err(|_| format!("expected integer, found {raw:?}")),
            ColumnKind::Decimal { scale } => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(CellValue::Decimal(Some(round_to(value, scale)))),
                _ => Err(format!("expected decimal, found {raw:?}")),
            },
            ColumnKind::Date => parse_date_value(raw)
                .map(|value| CellValue::Date(Some(value)))
                .ok_or_else(|| format!("expected date, found {raw:?}")),
            ColumnKind::Timestamp => parse_timestamp_value(raw)
                .map(|value| CellValue::Timestamp(Some(value)))
                .ok_or_else(|| format!("expected timestamp, found {raw:?}")),
        }
    }

    pub fn null(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Text => CellValue::Text(None),
            ColumnKind::Integer => CellValue::Integer(None),
            ColumnKind::Decimal { .. } => CellValue::Decimal(None),
            ColumnKind::Date => CellValue::Date(None),
            ColumnKind::Timestamp => CellValue::Timestamp(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Text(value) => value.is_none(),
            CellValue::Integer(value) => value.is_none(),
            CellValue::Decimal(value) => value.is_none(),
            CellValue::Date(value) => value.is_none(),
            CellValue::Timestamp(value) => value.is_none(),
        }
    }

    /// Numeric view used for bound checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(value) => value.map(|v| v as f64),
            CellValue::Decimal(value) => *value,
            _ => None,
        }
    }

    /// Text form used to compare keys with stored ones.
    pub fn key_text(&self) -> Option<String> {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Integer(value) => value.map(|v| v.to_string()),
            CellValue::Decimal(value) => value.map(|v| v.to_string()),
            CellValue::Date(value) => value.map(|v| v.to_string()),
            CellValue::Timestamp(value) => value.map(|v| v.to_string()),
        }
    }
}
