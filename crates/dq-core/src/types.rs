//! Field kinds and typed values
//!
//! Every filterable field declares a kind. Clause values and record values
//! are coerced to that kind before they are compared.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a record field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    String,
    Number,
    Date,
    Bool,
    /// Arbitrary JSON, compared structurally
    Json,
}

impl FieldKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" | "str" | "text" => Some(Self::String),
            "number" | "int" | "integer" | "float" => Some(Self::Number),
            "date" | "datetime" | "timestamp" => Some(Self::Date),
            "bool" | "boolean" => Some(Self::Bool),
            "json" | "object" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Bool => "bool",
            Self::Json => "json",
        }
    }

    /// Whether values of this kind have a meaningful order for gt/lt/ge/le
    pub fn is_ordered(&self) -> bool {
        matches!(self, Self::Number | Self::Date)
    }

    /// Coerce a clause literal (always text on the wire)
    pub fn parse_literal(&self, raw: &str) -> Option<TypedValue> {
        match self {
            Self::String => Some(TypedValue::String(raw.to_lowercase())),
            Self::Number => parse_number(raw).map(TypedValue::Number),
            Self::Date => parse_date(raw).map(TypedValue::Date),
            Self::Bool => parse_bool(raw).map(TypedValue::Bool),
            Self::Json => Some(TypedValue::Json(
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
            )),
        }
    }

    /// Coerce a record value. `Ok(None)` means the value is absent (null).
    pub fn coerce(&self, value: &Value) -> Result<Option<TypedValue>, String> {
        if value.is_null() {
            return Ok(None);
        }

        let typed = match (self, value) {
            (Self::String, Value::String(s)) => Some(TypedValue::String(s.to_lowercase())),
            (Self::String, other) => Some(TypedValue::String(other.to_string().to_lowercase())),
            (Self::Number, Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).map(TypedValue::Number),
            (Self::Number, Value::String(s)) => parse_number(s).map(TypedValue::Number),
            (Self::Date, Value::String(s)) => parse_date(s).map(TypedValue::Date),
            (Self::Date, Value::Number(n)) => n
                .as_i64()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .map(TypedValue::Date),
            (Self::Bool, Value::Bool(b)) => Some(TypedValue::Bool(*b)),
            (Self::Bool, Value::String(s)) => parse_bool(s).map(TypedValue::Bool),
            (Self::Json, other) => Some(TypedValue::Json(other.clone())),
            _ => None,
        };

        typed
            .map(Some)
            .ok_or_else(|| format!("expected {}, found {}", self.as_str(), value))
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value coerced to a field kind. Strings are stored lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    Json(Value),
}

impl TypedValue {
    /// Order two values of the same kind. Mixed kinds are incomparable.
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Json(a), Self::Json(b)) => Some(a.to_string().cmp(&b.to_string())),
            _ => None,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` and plain dates
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_kind_parsing() {
        assert_eq!(FieldKind::from_str("String"), Some(FieldKind::String));
        assert_eq!(FieldKind::from_str("integer"), Some(FieldKind::Number));
        assert_eq!(FieldKind::from_str("timestamp"), Some(FieldKind::Date));
        assert_eq!(FieldKind::from_str("uuid"), None);
        assert!(FieldKind::Date.is_ordered());
        assert!(!FieldKind::Bool.is_ordered());
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(
            FieldKind::String.parse_literal("Web"),
            Some(TypedValue::String("web".to_string()))
        );
        assert_eq!(FieldKind::Number.parse_literal(" 42 "), Some(TypedValue::Number(42.0)));
        assert_eq!(FieldKind::Number.parse_literal("NaN"), None);
        assert_eq!(FieldKind::Bool.parse_literal("TRUE"), Some(TypedValue::Bool(true)));
        assert_eq!(FieldKind::Bool.parse_literal("yes"), None);
        assert_eq!(
            FieldKind::Json.parse_literal("[1,2]"),
            Some(TypedValue::Json(json!([1, 2])))
        );
        assert_eq!(
            FieldKind::Json.parse_literal("plain"),
            Some(TypedValue::Json(json!("plain")))
        );
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(expected));
        assert_eq!(parse_date("2024-03-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("2024-03-01T02:00:00+02:00"), Some(expected));
        assert_eq!(parse_date("2024-03-01T00:00:00"), Some(expected));
        assert_eq!(parse_date("March 1st"), None);
    }

    #[test]
    fn test_coerce_record_values() {
        assert_eq!(FieldKind::Number.coerce(&json!(7)), Ok(Some(TypedValue::Number(7.0))));
        assert_eq!(FieldKind::Number.coerce(&json!("7.5")), Ok(Some(TypedValue::Number(7.5))));
        assert_eq!(FieldKind::Number.coerce(&json!(null)), Ok(None));
        assert!(FieldKind::Number.coerce(&json!("seven")).is_err());
        assert!(FieldKind::Date.coerce(&json!(true)).is_err());
        assert_eq!(
            FieldKind::String.coerce(&json!(12)),
            Ok(Some(TypedValue::String("12".to_string())))
        );
    }

    #[test]
    fn test_compare() {
        let a = TypedValue::Number(1.0);
        let b = TypedValue::Number(2.0);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.compare(&TypedValue::Bool(true)), None);
    }
}
