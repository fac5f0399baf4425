use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::Value;
use crate::types::DType;

/// Boolean tokens (case-insensitive). Digits are left to integer inference so
/// that 0/1 indicator columns load as integers.
const TRUE_TOKENS: &[&str] = &["true", "yes", "y", "t"];
const FALSE_TOKENS: &[&str] = &["false", "no", "n", "f"];

/// Missing value tokens
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "NULL", "null", "NaN", "nan", "None", "none", "#N/A",
    "#VALUE!", "#REF!", "#DIV/0!", "#NUM!", "#NAME?", "#NULL!",
];

/// Strings longer than this (or multiline) count as free text
const FREE_TEXT_MIN_LEN: usize = 100;

// Date format patterns
static DATE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // ISO format: 2024-01-15
        (Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap(), "%Y-%m-%d"),
        // US format: 01/15/2024 or 1/15/2024
        (
            Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap(),
            "%m/%d/%Y",
        ),
        // European format: 15-01-2024
        (
            Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").unwrap(),
            "%d-%m-%Y",
        ),
        // Month name: January 15, 2024
        (
            Regex::new(r"^[A-Za-z]{3,9}\s+\d{1,2},?\s+\d{4}$").unwrap(),
            "%B %d, %Y",
        ),
        // ISO with dots: 2024.01.15
        (Regex::new(r"^\d{4}\.\d{2}\.\d{2}$").unwrap(), "%Y.%m.%d"),
    ]
});

static DATETIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?Z?$").unwrap());

/// Streaming type inference for one column.
///
/// Each candidate type stays alive until a value contradicts it; the most
/// specific surviving candidate wins.
#[derive(Debug, Clone)]
pub struct TypeInferencer {
    boolean: bool,
    integer: bool,
    numeric: bool,
    date: bool,
    datetime: bool,
    free_text: bool,
    observed: u64,
}

impl TypeInferencer {
    pub fn new() -> Self {
        Self {
            boolean: true,
            integer: true,
            numeric: true,
            date: true,
            datetime: true,
            free_text: false,
            observed: 0,
        }
    }

    /// Add a raw cell; missing tokens are ignored
    pub fn observe(&mut self, value: &str) {
        if is_missing(value) {
            return;
        }
        self.observed += 1;

        self.boolean &= is_boolean(value);
        self.integer &= is_integer(value);
        self.numeric &= is_numeric(value);
        self.datetime &= parse_datetime(value).is_some();
        self.date &= parse_date(value).is_some();
        if value.len() > FREE_TEXT_MIN_LEN || value.contains('\n') {
            self.free_text = true;
        }
    }

    pub fn inferred_type(&self) -> DType {
        if self.observed == 0 {
            DType::String
        } else if self.boolean {
            DType::Boolean
        } else if self.integer {
            DType::Integer
        } else if self.numeric {
            DType::Numeric
        } else if self.datetime {
            DType::Datetime
        } else if self.date {
            DType::Date
        } else if self.free_text {
            DType::FreeText
        } else {
            DType::String
        }
    }
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a raw cell into a typed value for a column of type `dtype`
pub fn parse_cell(raw: &str, dtype: DType) -> Value {
    if is_missing(raw) {
        return Value::Null;
    }
    let parsed = match dtype {
        DType::Boolean => parse_boolean(raw).map(Value::Bool),
        DType::Integer => raw.trim().parse::<i64>().ok().map(Value::Int),
        DType::Numeric => parse_numeric(raw).map(Value::float),
        DType::Date => parse_date(raw).map(Value::Date),
        DType::Datetime => parse_datetime(raw)
            .map(Value::DateTime)
            .or_else(|| parse_date(raw).map(Value::Date)),
        DType::String | DType::FreeText => None,
    };
    parsed.unwrap_or_else(|| Value::Text(raw.to_string()))
}

/// Check if a value represents a missing value
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Check if a value is a boolean
pub fn is_boolean(value: &str) -> bool {
    parse_boolean(value).is_some()
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    let lower = value.trim().to_lowercase();
    if TRUE_TOKENS.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Check if a value is an integer
pub fn is_integer(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

/// Check if a value is numeric (integer or float)
pub fn is_numeric(value: &str) -> bool {
    parse_numeric(value).is_some()
}

/// Parse a numeric value
pub fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date in any of the supported layouts
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(trimmed))
        .find_map(|(_, format)| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Parse an ISO datetime (`T` or space separated, optional fraction and `Z`)
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if !DATETIME_PATTERN.is_match(trimmed) {
        return None;
    }
    let normalized = trimmed.replacen(' ', "T", 1);
    let normalized = normalized.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(normalized, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Coerce a cell to a calendar date; anything unparseable becomes `None`
pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::Text(s) => parse_date(s).or_else(|| parse_datetime(s).map(|dt| dt.date())),
        _ => None,
    }
}

/// Coerce a cell to a number the way a lenient numeric cast would
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) => parse_numeric(s),
        other => other.as_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        assert!(is_missing(""));
        assert!(is_missing("NA"));
        assert!(is_missing("N/A"));
        assert!(is_missing("null"));
        assert!(is_missing("NaN"));
        assert!(is_missing("#N/A"));
        assert!(!is_missing("0"));
        assert!(!is_missing("low"));
    }

    #[test]
    fn test_is_boolean() {
        assert!(is_boolean("true"));
        assert!(is_boolean("TRUE"));
        assert!(is_boolean("No"));
        assert!(is_boolean("y"));
        assert!(!is_boolean("1"));
        assert!(!is_boolean("0"));
        assert!(!is_boolean("maybe"));
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_integer("-42"));
        assert!(!is_integer("3.14"));
        assert!(is_numeric("3.14"));
        assert!(is_numeric("1e10"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("abc"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_date("01/15/2024"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_datetime() {
        assert!(parse_datetime("2024-01-15T10:30:00").is_some());
        assert!(parse_datetime("2024-01-15 10:30:00").is_some());
        assert!(parse_datetime("2024-01-15T10:30:00Z").is_some());
        assert!(parse_datetime("2024-01-15T10:30:00.125").is_some());
        assert!(parse_datetime("2024-01-15").is_none());
    }

    #[test]
    fn test_indicator_column_is_integer() {
        let mut inf = TypeInferencer::new();
        for v in ["0", "1", "1", "0"] {
            inf.observe(v);
        }
        assert_eq!(inf.inferred_type(), DType::Integer);
    }

    #[test]
    fn test_inferencer_widens() {
        let mut inf = TypeInferencer::new();
        inf.observe("1");
        inf.observe("2.5");
        assert_eq!(inf.inferred_type(), DType::Numeric);
        inf.observe("low");
        assert_eq!(inf.inferred_type(), DType::String);
    }

    #[test]
    fn test_inferencer_dates_and_missing() {
        let mut inf = TypeInferencer::new();
        for v in ["2024-01-15", "NA", "2024-03-25", ""] {
            inf.observe(v);
        }
        assert_eq!(inf.inferred_type(), DType::Date);
    }

    #[test]
    fn test_inferencer_all_missing() {
        let mut inf = TypeInferencer::new();
        inf.observe("");
        inf.observe("NA");
        assert_eq!(inf.inferred_type(), DType::String);
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("NA", DType::Integer), Value::Null);
        assert_eq!(parse_cell(" 7 ", DType::Integer), Value::Int(7));
        assert_eq!(parse_cell("yes", DType::Boolean), Value::Bool(true));
        assert_eq!(parse_cell("low", DType::String), Value::Text("low".to_string()));
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&Value::Text(" 5 ".to_string())), Some(5.0));
        assert_eq!(coerce_numeric(&Value::Text("abc".to_string())), None);
        assert_eq!(coerce_numeric(&Value::Int(-1)), Some(-1.0));
        assert_eq!(coerce_numeric(&Value::Null), None);
    }
}
