use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::missing_column_message;
use crate::dataset::Dataset;
use crate::inference::coerce_numeric;
use crate::logging::LogSink;
use crate::types::DType;

/// Result of a numeric bounds check
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeCheck {
    /// True where the coerced value lies outside the bounds
    pub mask: Vec<bool>,
    /// Non-null cells that could not be read as numbers
    pub unparseable: usize,
}

impl RangeCheck {
    pub fn violations(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Inclusive bounds for one numeric column; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Flag values below `min` or above `max`.
///
/// Cells that fail numeric coercion are counted in `unparseable` and never
/// flagged. A missing column yields an all-false mask.
pub fn validate_range(
    dataset: &Dataset,
    column: &str,
    min: Option<f64>,
    max: Option<f64>,
    sink: &dyn LogSink,
) -> RangeCheck {
    let Ok(col) = dataset.column(column) else {
        sink.warn(&missing_column_message(column));
        return RangeCheck {
            mask: vec![false; dataset.row_count()],
            unparseable: 0,
        };
    };

    let mut unparseable = 0;
    let mask = col
        .values()
        .iter()
        .map(|value| {
            if value.is_null() {
                return false;
            }
            match coerce_numeric(value) {
                Some(v) => min.is_some_and(|lo| v < lo) || max.is_some_and(|hi| v > hi),
                None => {
                    unparseable += 1;
                    false
                }
            }
        })
        .collect();

    let check = RangeCheck { mask, unparseable };
    let violations = check.violations();
    if violations > 0 {
        sink.warn(&format!(
            "{} values in '{}' outside range [{}, {}]",
            violations,
            column,
            bound_label(min),
            bound_label(max)
        ));
    } else {
        sink.info(&format!("All values in '{}' within range", column));
    }
    if unparseable > 0 {
        sink.warn(&format!(
            "{} values in '{}' could not be parsed as numbers",
            unparseable, column
        ));
    }
    check
}

fn bound_label(bound: Option<f64>) -> String {
    bound.map_or_else(|| "-".to_string(), |b| b.to_string())
}

/// Expected and observed type of a column that failed the dtype check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DtypeMismatch {
    pub expected: DType,
    /// `None` when the column is absent
    pub actual: Option<DType>,
}

fn dtype_matches(expected: DType, actual: DType) -> bool {
    expected == actual || (expected.is_text() && actual.is_text())
}

/// Compare column types against expectations.
///
/// Only mismatches are returned. Absent columns are reported with
/// `actual: None` and a warning.
pub fn check_dtypes(
    dataset: &Dataset,
    expected: &BTreeMap<String, DType>,
    sink: &dyn LogSink,
) -> BTreeMap<String, DtypeMismatch> {
    let mut mismatches = BTreeMap::new();
    for (column, &want) in expected {
        match dataset.column(column) {
            Ok(col) if dtype_matches(want, col.dtype()) => {}
            Ok(col) => {
                sink.warn(&format!(
                    "Column '{}' expected type '{}' but found '{}'",
                    column,
                    want,
                    col.dtype()
                ));
                mismatches.insert(
                    column.clone(),
                    DtypeMismatch {
                        expected: want,
                        actual: Some(col.dtype()),
                    },
                );
            }
            Err(_) => {
                sink.warn(&missing_column_message(column));
                mismatches.insert(
                    column.clone(),
                    DtypeMismatch {
                        expected: want,
                        actual: None,
                    },
                );
            }
        }
    }
    if mismatches.is_empty() {
        sink.info("All column dtypes matched expectations");
    }
    mismatches
}
