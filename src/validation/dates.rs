use chrono::Datelike;

use super::missing_column_message;
use crate::dataset::{Column, Dataset, Value};
use crate::inference::coerce_date;
use crate::logging::LogSink;
use crate::types::{DType, UNKNOWN_LABEL};

/// Count cells that do and do not coerce to a date.
///
/// A missing column gives `(0, 0)` and a warning.
pub fn validate_datetime_column(dataset: &Dataset, column: &str, sink: &dyn LogSink) -> (usize, usize) {
    let Ok(col) = dataset.column(column) else {
        sink.warn(&missing_column_message(column));
        return (0, 0);
    };
    let valid = col.values().iter().filter(|v| coerce_date(v).is_some()).count();
    let invalid = col.len() - valid;

    sink.info(&format!("Valid '{}' values: {}", column, valid));
    if invalid > 0 {
        sink.warn(&format!("Invalid '{}' values: {}", column, invalid));
    }
    (valid, invalid)
}

/// Add `<prefix>_date_clean`, `<prefix>_year` and `<prefix>_year_label`.
///
/// The prefix defaults to the column name with `_date` removed. Unparseable
/// cells become `UNKNOWN` in the label columns and null in the year column. A
/// missing column leaves the dataset unchanged.
pub fn extract_date_labels(
    dataset: &Dataset,
    column: &str,
    prefix: Option<&str>,
    sink: &dyn LogSink,
) -> Dataset {
    let Ok(col) = dataset.column(column) else {
        sink.warn(&missing_column_message(column));
        return dataset.clone();
    };
    let prefix = prefix
        .map(str::to_string)
        .unwrap_or_else(|| column.replace("_date", ""));

    let dates: Vec<_> = col.values().iter().map(coerce_date).collect();
    let clean = dates
        .iter()
        .map(|d| {
            Value::Text(d.map_or_else(
                || UNKNOWN_LABEL.to_string(),
                |d| d.format("%Y-%m-%d").to_string(),
            ))
        })
        .collect();
    let years: Vec<Value> = dates
        .iter()
        .map(|d| d.map_or(Value::Null, |d| Value::Int(i64::from(d.year()))))
        .collect();
    let labels = years
        .iter()
        .map(|y| match y {
            Value::Null => Value::Text(UNKNOWN_LABEL.to_string()),
            other => Value::Text(other.to_string()),
        })
        .collect();

    let columns = vec![
        Column::new(format!("{}_date_clean", prefix), DType::String, clean),
        Column::new(format!("{}_year", prefix), DType::Integer, years),
        Column::new(format!("{}_year_label", prefix), DType::String, labels),
    ];
    match dataset.with_columns(columns) {
        Ok(out) => {
            sink.info(&format!(
                "Created '{0}_date_clean', '{0}_year', and '{0}_year_label' columns",
                prefix
            ));
            out
        }
        Err(e) => {
            sink.warn(&format!("Could not add date labels for '{}': {}", column, e));
            dataset.clone()
        }
    }
}
