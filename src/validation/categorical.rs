use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use super::{missing_column_message, Finding, ValidationPlan};
use crate::dataset::{Column, Dataset, Value};
use crate::logging::LogSink;
use crate::stats::{round_to, ValueCount, ValueCounts};
use crate::types::{DType, Result, DEFAULT_TOP_K, UNKNOWN_LABEL};

/// Label shown for null cells in frequency tables
const NULL_LABEL: &str = "null";

/// Trim and uppercase a raw category
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn normalized_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(normalize(s)),
        other => Some(normalize(&other.to_string())),
    }
}

fn normalized_set<'a, I>(expected: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    expected.into_iter().map(|v| normalize(v)).collect()
}

/// Invalid mask of one column plus the counts of its invalid values
struct CategoricalScan {
    mask: Vec<bool>,
    invalid: ValueCounts,
    unique: usize,
}

fn scan(column: &Column, expected: &BTreeSet<String>) -> CategoricalScan {
    let accepted = normalized_set(expected);
    let mut invalid = ValueCounts::new();
    let mut seen = HashSet::new();
    let mask = column
        .values()
        .iter()
        .map(|value| match normalized_cell(value) {
            None => false,
            Some(v) => {
                let bad = !accepted.contains(&v);
                if bad {
                    invalid.add(&v);
                }
                seen.insert(v);
                bad
            }
        })
        .collect();
    CategoricalScan {
        mask,
        invalid,
        unique: seen.len(),
    }
}

fn log_scan(column: &str, result: &CategoricalScan, sink: &dyn LogSink) {
    sink.info(&format!("Validating {}: {} unique values", column, result.unique));
    let total = result.invalid.total();
    if total > 0 {
        sink.warn(&format!("Found {} invalid entries in '{}'", total, column));
        let sample = result
            .invalid
            .top(DEFAULT_TOP_K)
            .iter()
            .map(|vc| format!("{} ({})", vc.value, vc.count))
            .collect::<Vec<_>>()
            .join(", ");
        sink.warn(&format!("Sample invalid entries for '{}': {}", column, sample));
    }
}

/// Row mask of values outside the accepted set.
///
/// Nulls are never invalid. A missing column yields an all-false mask.
pub fn validate_categorical(
    dataset: &Dataset,
    column: &str,
    expected: &BTreeSet<String>,
    sink: &dyn LogSink,
) -> Vec<bool> {
    let Ok(col) = dataset.column(column) else {
        sink.warn(&missing_column_message(column));
        return vec![false; dataset.row_count()];
    };
    let result = scan(col, expected);
    log_scan(column, &result, sink);
    result.mask
}

/// The `k` most frequent invalid normalized values
pub fn top_invalid_values(
    dataset: &Dataset,
    column: &str,
    expected: &BTreeSet<String>,
    k: usize,
    sink: &dyn LogSink,
) -> Vec<ValueCount> {
    match dataset.column(column) {
        Ok(col) => scan(col, expected).invalid.top(k),
        Err(_) => {
            sink.warn(&missing_column_message(column));
            Vec::new()
        }
    }
}

/// Rows whose value in `column` is outside the accepted set
pub fn get_invalid_rows(
    dataset: &Dataset,
    column: &str,
    expected: &BTreeSet<String>,
    sink: &dyn LogSink,
) -> Result<Dataset> {
    let mask = validate_categorical(dataset, column, expected, sink);
    dataset.filter_rows(&mask)
}

/// Invalid entries found in one categorical column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub top_values: Vec<ValueCount>,
}

/// Validate every column of a plan
pub fn summarize_categorical_validation(
    dataset: &Dataset,
    plan: &ValidationPlan,
    k: usize,
    sink: &dyn LogSink,
) -> BTreeMap<String, Finding<CategoricalSummary>> {
    plan.iter()
        .map(|(column, expected)| {
            let finding = match dataset.column(column) {
                Ok(col) => {
                    let result = scan(col, expected);
                    log_scan(column, &result, sink);
                    Finding::Checked(CategoricalSummary {
                        count: result.invalid.total(),
                        top_values: result.invalid.top(k),
                    })
                }
                Err(_) => {
                    sink.warn(&missing_column_message(column));
                    Finding::missing_column(column)
                }
            };
            (column.clone(), finding)
        })
        .collect()
}

/// Sorted distinct unexpected values per column; clean columns are omitted
pub fn summarize_unexpected_categories(
    dataset: &Dataset,
    plan: &ValidationPlan,
    sink: &dyn LogSink,
) -> BTreeMap<String, Vec<String>> {
    let mut summary = BTreeMap::new();
    for (column, expected) in plan {
        let Ok(col) = dataset.column(column) else {
            sink.warn(&missing_column_message(column));
            continue;
        };
        let unexpected: Vec<String> = scan(col, expected)
            .invalid
            .top(usize::MAX)
            .into_iter()
            .map(|vc| vc.value)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unexpected.is_empty() {
            sink.info(&format!("All values in '{}' match the expected set", column));
        } else {
            sink.warn(&format!(
                "Unexpected values in '{}': {}",
                column,
                unexpected.join(", ")
            ));
            summary.insert(column.clone(), unexpected);
        }
    }
    summary
}

/// Add `<column>_missing` and `<column>_clean`.
///
/// The clean column holds the trimmed uppercase value, or `unknown_label` for
/// nulls and for values outside `valid` when a valid set is given. Both
/// columns are derived from the raw column only, so running it twice gives the
/// same result.
pub fn standardize_and_flag_categorical(
    dataset: &Dataset,
    column: &str,
    valid: Option<&BTreeSet<String>>,
    unknown_label: &str,
    sink: &dyn LogSink,
) -> Result<Dataset> {
    let raw = dataset.column(column)?;
    let accepted = valid.filter(|v| !v.is_empty()).map(normalized_set);

    let missing: Vec<Value> = raw
        .values()
        .iter()
        .map(|v| Value::Bool(v.is_null()))
        .collect();
    let clean: Vec<Value> = raw
        .values()
        .iter()
        .map(|v| {
            let label = match (normalized_cell(v), &accepted) {
                (Some(n), Some(accepted)) if accepted.contains(&n) => n,
                (Some(n), None) => n,
                _ => unknown_label.to_string(),
            };
            Value::Text(label)
        })
        .collect();

    let missing_name = format!("{}_missing", column);
    let clean_name = format!("{}_clean", column);
    let missing_count = missing.iter().filter(|v| **v == Value::Bool(true)).count();

    let distribution: ValueCounts = clean.iter().filter_map(Value::as_str).collect();
    sink.info(&format!(
        "Cleaned '{}': {} missing -> '{}'",
        column, missing_count, unknown_label
    ));
    sink.debug(&format!(
        "'{}' distribution: {}",
        clean_name,
        distribution
            .top(usize::MAX)
            .iter()
            .map(|vc| format!("{}={}", vc.value, vc.count))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    dataset.with_columns(vec![
        Column::new(missing_name, DType::Boolean, missing),
        Column::new(clean_name, DType::String, clean),
    ])
}

/// Missing share of one column, counting the unknown label as missing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingShare {
    pub column: String,
    pub missing_percent: f64,
}

/// Distinct values before and after cleaning, nulls included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueCounts {
    pub column: String,
    pub raw: usize,
    pub clean: usize,
}

/// Relative frequency of one value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueShare {
    pub value: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategoricalInsights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unexpected_values: Option<BTreeMap<String, Vec<String>>>,
    pub missingness: Vec<MissingShare>,
    pub unique_counts: Vec<UniqueCounts>,
    pub top_values: BTreeMap<String, Vec<ValueShare>>,
}

fn value_counts_with_null(column: &Column) -> ValueCounts {
    let mut counts = ValueCounts::new();
    for value in column.values() {
        match value {
            Value::Null => counts.add(NULL_LABEL),
            other => counts.add(&other.to_string()),
        }
    }
    counts
}

/// Missingness, raw vs clean cardinality and top-3 shares per column
pub fn summarize_categorical_insights(
    dataset: &Dataset,
    columns: &[&str],
    plan: Option<&ValidationPlan>,
    sink: &dyn LogSink,
) -> CategoricalInsights {
    let mut insights = CategoricalInsights {
        unexpected_values: plan.map(|p| summarize_unexpected_categories(dataset, p, sink)),
        ..Default::default()
    };
    let rows = dataset.row_count();

    for &name in columns {
        let Ok(col) = dataset.column(name) else {
            sink.warn(&missing_column_message(name));
            continue;
        };

        let missing = col
            .values()
            .iter()
            .filter(|v| v.is_null() || v.as_str() == Some(UNKNOWN_LABEL))
            .count();
        let missing_percent = if rows == 0 {
            0.0
        } else {
            round_to(missing as f64 / rows as f64 * 100.0, 2)
        };
        insights.missingness.push(MissingShare {
            column: name.to_string(),
            missing_percent,
        });

        let raw_counts = value_counts_with_null(col);
        let clean_unique = dataset
            .column(&format!("{}_clean", name))
            .map(|c| value_counts_with_null(c).unique_count())
            .unwrap_or_else(|_| raw_counts.unique_count());
        insights.unique_counts.push(UniqueCounts {
            column: name.to_string(),
            raw: raw_counts.unique_count(),
            clean: clean_unique,
        });

        let total = raw_counts.total().max(1) as f64;
        let shares = raw_counts
            .top(3)
            .into_iter()
            .map(|vc| ValueShare {
                share: round_to(vc.count as f64 / total, 3),
                value: vc.value,
            })
            .collect();
        insights.top_values.insert(name.to_string(), shares);
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;
    use crate::logging::{MemorySink, NoopSink};

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn species() -> Dataset {
        dataset(vec![(
            "species",
            texts(&[
                Some("Adelie"),
                Some(" gentoo "),
                None,
                Some("Emperor"),
                Some("emperor"),
                Some("King"),
            ]),
        )])
    }

    #[test]
    fn test_validate_categorical_normalizes_both_sides() {
        let ds = species();
        let mask = validate_categorical(&ds, "species", &set(&["adelie", "GENTOO"]), &NoopSink);
        assert_eq!(mask, vec![false, false, false, true, true, true]);
    }

    #[test]
    fn test_nulls_never_invalid() {
        let ds = dataset(vec![("sex", texts(&[None, None]))]);
        let mask = validate_categorical(&ds, "sex", &set(&["MALE"]), &NoopSink);
        assert_eq!(mask, vec![false, false]);
    }

    #[test]
    fn test_missing_column_gives_all_false_and_warning() {
        let ds = species();
        let sink = MemorySink::default();
        let mask = validate_categorical(&ds, "island", &set(&["DREAM"]), &sink);
        assert_eq!(mask, vec![false; 6]);
        assert_eq!(sink.warnings().len(), 1);
        assert!(sink.warnings()[0].contains("island"));
    }

    #[test]
    fn test_top_invalid_values_orders_by_count_then_value() {
        let ds = species();
        let top = top_invalid_values(&ds, "species", &set(&["ADELIE", "GENTOO"]), 10, &NoopSink);
        assert_eq!(
            top,
            vec![
                ValueCount {
                    value: "EMPEROR".to_string(),
                    count: 2
                },
                ValueCount {
                    value: "KING".to_string(),
                    count: 1
                },
            ]
        );
        let top1 = top_invalid_values(&ds, "species", &set(&["ADELIE", "GENTOO"]), 1, &NoopSink);
        assert_eq!(top1.len(), 1);
    }

    #[test]
    fn test_get_invalid_rows() {
        let ds = species();
        let rows = get_invalid_rows(&ds, "species", &set(&["ADELIE", "GENTOO"]), &NoopSink).unwrap();
        assert_eq!(rows.row_count(), 3);
    }

    #[test]
    fn test_summarize_plan_with_missing_column() {
        let ds = species();
        let mut plan = ValidationPlan::new();
        plan.insert("species".to_string(), set(&["ADELIE", "GENTOO"]));
        plan.insert("island".to_string(), set(&["DREAM"]));

        let summary = summarize_categorical_validation(&ds, &plan, 10, &NoopSink);
        assert_eq!(summary["species"].checked().map(|s| s.count), Some(3));
        assert!(matches!(summary["island"], Finding::Skipped { .. }));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["species"]["count"], 3);
        assert_eq!(json["species"]["top_values"][0]["value"], "EMPEROR");
        assert!(json["island"]["warning"].as_str().unwrap().contains("island"));
    }

    #[test]
    fn test_unexpected_categories_sorted_and_clean_omitted() {
        let ds = dataset(vec![
            ("species", texts(&[Some("King"), Some("Emperor"), Some("king")])),
            ("sex", texts(&[Some("male"), Some("FEMALE"), None])),
        ]);
        let mut plan = ValidationPlan::new();
        plan.insert("species".to_string(), set(&["ADELIE"]));
        plan.insert("sex".to_string(), set(&["MALE", "FEMALE"]));

        let unexpected = summarize_unexpected_categories(&ds, &plan, &NoopSink);
        assert_eq!(unexpected.len(), 1);
        assert_eq!(unexpected["species"], vec!["EMPEROR", "KING"]);
    }

    #[test]
    fn test_standardize_and_flag() {
        let ds = dataset(vec![(
            "island",
            texts(&[Some(" dream"), None, Some("Atlantis"), Some("BISCOE")]),
        )]);
        let valid = set(&["Dream", "Biscoe"]);
        let out = standardize_and_flag_categorical(&ds, "island", Some(&valid), UNKNOWN_LABEL, &NoopSink)
            .unwrap();

        let missing = out.column("island_missing").unwrap();
        assert_eq!(missing.dtype(), DType::Boolean);
        assert_eq!(
            missing.values(),
            &[
                Value::Bool(false),
                Value::Bool(true),
                Value::Bool(false),
                Value::Bool(false)
            ]
        );
        let clean = out.column("island_clean").unwrap();
        assert_eq!(
            clean.values(),
            texts(&[Some("DREAM"), Some("UNKNOWN"), Some("UNKNOWN"), Some("BISCOE")]).as_slice()
        );
    }

    #[test]
    fn test_standardize_without_valid_set_keeps_values() {
        let ds = dataset(vec![("sex", texts(&[Some(" m "), None]))]);
        let out = standardize_and_flag_categorical(&ds, "sex", None, "N/A", &NoopSink).unwrap();
        assert_eq!(
            out.column("sex_clean").unwrap().values(),
            texts(&[Some("M"), Some("N/A")]).as_slice()
        );
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let ds = species();
        let valid = set(&["ADELIE", "GENTOO"]);
        let once =
            standardize_and_flag_categorical(&ds, "species", Some(&valid), UNKNOWN_LABEL, &NoopSink)
                .unwrap();
        let twice =
            standardize_and_flag_categorical(&once, "species", Some(&valid), UNKNOWN_LABEL, &NoopSink)
                .unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.column_count(), 3);
    }

    #[test]
    fn test_standardize_missing_column_errors() {
        let ds = species();
        assert!(standardize_and_flag_categorical(&ds, "nope", None, UNKNOWN_LABEL, &NoopSink).is_err());
    }

    #[test]
    fn test_categorical_insights() {
        let ds = dataset(vec![(
            "sex",
            texts(&[Some("male"), Some("MALE"), None, Some("UNKNOWN")]),
        )]);
        let valid = set(&["MALE", "FEMALE"]);
        let ds = standardize_and_flag_categorical(&ds, "sex", Some(&valid), UNKNOWN_LABEL, &NoopSink)
            .unwrap();

        let sink = MemorySink::default();
        let insights = summarize_categorical_insights(&ds, &["sex", "absent"], None, &sink);
        assert!(insights.unexpected_values.is_none());
        assert_eq!(insights.missingness[0].missing_percent, 50.0);
        assert_eq!(
            insights.unique_counts[0],
            UniqueCounts {
                column: "sex".to_string(),
                raw: 4,
                clean: 2
            }
        );
        let top = &insights.top_values["sex"];
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].share, 0.25);
        assert_eq!(sink.warnings().len(), 1);
    }
}
