pub mod audit;
pub mod categorical;
pub mod dates;
pub mod missing;
pub mod numeric;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use audit::{audit_schema, check_high_cardinality, SchemaAudit};
pub use categorical::{
    get_invalid_rows, normalize, standardize_and_flag_categorical, summarize_categorical_insights,
    summarize_categorical_validation, summarize_unexpected_categories, top_invalid_values,
    validate_categorical, CategoricalInsights, CategoricalSummary,
};
pub use dates::{extract_date_labels, validate_datetime_column};
pub use missing::{render_missingness_markdown, summarize_missingness, MissingEntry};
pub use numeric::{check_dtypes, validate_range, DtypeMismatch, NumericRange, RangeCheck};

/// Accepted values per categorical column
pub type ValidationPlan = BTreeMap<String, BTreeSet<String>>;

/// Outcome of one column's checks inside a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Finding<T> {
    Checked(T),
    Skipped { warning: String },
}

impl<T> Finding<T> {
    pub fn missing_column(column: &str) -> Self {
        Finding::Skipped {
            warning: missing_column_message(column),
        }
    }

    pub fn checked(&self) -> Option<&T> {
        match self {
            Finding::Checked(v) => Some(v),
            Finding::Skipped { .. } => None,
        }
    }
}

pub(crate) fn missing_column_message(column: &str) -> String {
    format!("Column '{}' not found in dataset", column)
}
