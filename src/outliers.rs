use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::dataset::{Column, Dataset, Value};
use crate::error::Error;
use crate::logging::LogSink;
use crate::stats::{quantile, sorted, WelfordStats};
use crate::types::{DType, Result, IQR_FENCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`
    #[default]
    Iqr,
    /// `|x - mean| / std` above the threshold
    ZScore,
}

impl FromStr for OutlierMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" => Ok(OutlierMethod::ZScore),
            other => Err(Error::InvalidArgument(format!(
                "Invalid outlier method '{}'. Use 'iqr' or 'zscore'.",
                other
            ))),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr => f.write_str("IQR"),
            OutlierMethod::ZScore => f.write_str("ZSCORE"),
        }
    }
}

/// Per-row outlier mask; nulls are never outliers
fn outlier_mask(column: &Column, method: OutlierMethod, threshold: f64) -> Vec<bool> {
    let present = column.present_numbers();
    let test: Box<dyn Fn(f64) -> bool> = match method {
        OutlierMethod::Iqr => {
            let ordered = sorted(&present);
            match (quantile(&ordered, 0.25), quantile(&ordered, 0.75)) {
                (Some(q1), Some(q3)) => {
                    let iqr = q3 - q1;
                    let (lower, upper) = (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr);
                    Box::new(move |x: f64| x < lower || x > upper)
                }
                _ => Box::new(|_: f64| false),
            }
        }
        OutlierMethod::ZScore => {
            let stats = WelfordStats::from_values(&present);
            match (stats.mean(), stats.std_dev()) {
                (Some(mean), Some(std)) if std > 0.0 => {
                    Box::new(move |x: f64| ((x - mean) / std).abs() > threshold)
                }
                _ => Box::new(|_: f64| false),
            }
        }
    };
    column
        .numeric_values()
        .into_iter()
        .map(|v| v.is_some_and(|x| test(x)))
        .collect()
}

fn numeric_column<'a>(dataset: &'a Dataset, column: &str) -> Result<&'a Column> {
    let col = dataset.column(column)?;
    if !col.dtype().is_numeric() {
        return Err(Error::InvalidArgument(format!(
            "{} must be numeric, found {}",
            column,
            col.dtype()
        )));
    }
    Ok(col)
}

/// Add a boolean outlier column, named `<column>_outlier` unless `out` is given
pub fn flag_outliers(
    dataset: &Dataset,
    column: &str,
    method: OutlierMethod,
    threshold: f64,
    out: Option<&str>,
    sink: &dyn LogSink,
) -> Result<Dataset> {
    let col = numeric_column(dataset, column)?;
    let name = out.map_or_else(|| format!("{}_outlier", column), str::to_string);
    let mask = outlier_mask(col, method, threshold);
    let flagged = dataset.with_column(Column::new(
        name.clone(),
        DType::Boolean,
        mask.into_iter().map(Value::Bool).collect(),
    ))?;
    sink.info(&format!("Added column: {} using {} method", name, method));
    Ok(flagged)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlierCount {
    pub column: String,
    pub count: usize,
}

/// Outlier counts, most affected column first, plus the flagged dataset
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSummary {
    pub counts: Vec<OutlierCount>,
    pub flagged: Dataset,
}

/// Flag outliers in every numeric column of `columns`.
///
/// Absent and non-numeric columns are skipped with a warning.
pub fn summarize_outliers(
    dataset: &Dataset,
    columns: &[&str],
    method: OutlierMethod,
    threshold: f64,
    sink: &dyn LogSink,
) -> Result<OutlierSummary> {
    let mut counts = Vec::new();
    let mut flag_columns = Vec::new();

    for &name in columns {
        let col = match numeric_column(dataset, name) {
            Ok(col) => col,
            Err(e) => {
                sink.warn(&format!("Skipping outlier check: {}", e));
                continue;
            }
        };
        let mask = outlier_mask(col, method, threshold);
        counts.push(OutlierCount {
            column: name.to_string(),
            count: mask.iter().filter(|&&m| m).count(),
        });
        flag_columns.push(Column::new(
            format!("{}_outlier", name),
            DType::Boolean,
            mask.into_iter().map(Value::Bool).collect(),
        ));
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    sink.info(&format!(
        "Outlier summary ({} method): {}",
        method,
        counts
            .iter()
            .map(|c| format!("{}={}", c.column, c.count))
            .collect::<Vec<_>>()
            .join(", ")
    ));

    Ok(OutlierSummary {
        counts,
        flagged: dataset.with_columns(flag_columns)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;
    use crate::logging::{MemorySink, NoopSink};
    use crate::types::DEFAULT_ZSCORE_THRESHOLD;

    fn hours() -> Dataset {
        dataset(vec![
            ("hours", ints(&[150, 155, 160, 158, 152, 157, 400])),
            ("dept", texts(&[Some("a"); 7])),
        ])
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("iqr".parse::<OutlierMethod>().unwrap(), OutlierMethod::Iqr);
        assert_eq!("ZScore".parse::<OutlierMethod>().unwrap(), OutlierMethod::ZScore);
        assert!(matches!(
            "mad".parse::<OutlierMethod>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_iqr_flags_extreme_value() {
        let out = flag_outliers(&hours(), "hours", OutlierMethod::Iqr, 3.0, None, &NoopSink).unwrap();
        let flags = out.column("hours_outlier").unwrap();
        assert_eq!(flags.dtype(), DType::Boolean);
        assert_eq!(flags.values()[6], Value::Bool(true));
        assert_eq!(
            flags.values().iter().filter(|v| **v == Value::Bool(true)).count(),
            1
        );
    }

    #[test]
    fn test_zscore_respects_threshold() {
        let ds = hours();
        let strict = flag_outliers(&ds, "hours", OutlierMethod::ZScore, 2.0, Some("z"), &NoopSink).unwrap();
        assert_eq!(strict.column("z").unwrap().values()[6], Value::Bool(true));

        let lenient = flag_outliers(
            &ds,
            "hours",
            OutlierMethod::ZScore,
            DEFAULT_ZSCORE_THRESHOLD,
            Some("z"),
            &NoopSink,
        )
        .unwrap();
        assert!(lenient
            .column("z")
            .unwrap()
            .values()
            .iter()
            .all(|v| *v == Value::Bool(false)));
    }

    #[test]
    fn test_constant_column_has_no_outliers() {
        let ds = dataset(vec![("x", ints(&[5, 5, 5, 5]))]);
        for method in [OutlierMethod::Iqr, OutlierMethod::ZScore] {
            let out = flag_outliers(&ds, "x", method, 3.0, None, &NoopSink).unwrap();
            assert!(out
                .column("x_outlier")
                .unwrap()
                .values()
                .iter()
                .all(|v| *v == Value::Bool(false)));
        }
    }

    #[test]
    fn test_flag_rejects_text_column() {
        assert!(matches!(
            flag_outliers(&hours(), "dept", OutlierMethod::Iqr, 3.0, None, &NoopSink),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_summarize_skips_non_numeric() {
        let ds = hours()
            .with_column(Column::derived("tenure", ints(&[2, 3, 3, 3, 3, 3, 3])))
            .unwrap();
        let sink = MemorySink::default();
        let summary =
            summarize_outliers(&ds, &["tenure", "hours", "dept"], OutlierMethod::Iqr, 3.0, &sink)
                .unwrap();
        assert_eq!(summary.counts.len(), 2);
        assert!(summary.counts[0].count >= summary.counts[1].count);
        assert!(summary.flagged.has_column("hours_outlier"));
        assert!(!summary.flagged.has_column("dept_outlier"));
        assert_eq!(sink.warnings().len(), 1);
    }
}
