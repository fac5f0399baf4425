use serde::Serialize;

use crate::dataset::Dataset;
use crate::logging::LogSink;
use crate::outliers::{summarize_outliers, OutlierCount, OutlierMethod};
use crate::stats::{kurtosis, pearson, skewness, Describe};
use crate::types::{DType, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnType {
    pub column: String,
    pub dtype: DType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescribe {
    pub column: String,
    #[serde(flatten)]
    pub stats: Describe,
}

/// Shape, types, nulls, numeric statistics and duplicates of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicSummary {
    pub rows: usize,
    pub columns: usize,
    pub dtypes: Vec<ColumnType>,
    /// Every column, most nulls first
    pub missing: Vec<ColumnMissing>,
    pub describe: Vec<ColumnDescribe>,
    pub duplicate_rows: usize,
}

pub fn basic_summary(dataset: &Dataset) -> BasicSummary {
    let dtypes = dataset
        .columns()
        .iter()
        .map(|c| ColumnType {
            column: c.name().to_string(),
            dtype: c.dtype(),
        })
        .collect();

    let mut missing: Vec<ColumnMissing> = dataset
        .columns()
        .iter()
        .map(|c| ColumnMissing {
            column: c.name().to_string(),
            missing: c.null_count(),
        })
        .collect();
    missing.sort_by(|a, b| b.missing.cmp(&a.missing));

    let describe = dataset
        .columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(|c| ColumnDescribe {
            column: c.name().to_string(),
            stats: Describe::from_values(&c.present_numbers()),
        })
        .collect();

    BasicSummary {
        rows: dataset.row_count(),
        columns: dataset.column_count(),
        dtypes,
        missing,
        describe,
        duplicate_rows: dataset.duplicate_row_count(),
    }
}

/// Skewness and excess kurtosis of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeStats {
    pub column: String,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Distribution shape of each numeric column, nulls ignored
pub fn shape_statistics(dataset: &Dataset, columns: &[&str], sink: &dyn LogSink) -> Vec<ShapeStats> {
    numeric_columns(dataset, columns, sink)
        .into_iter()
        .map(|name| {
            let values = dataset
                .column(name)
                .map(|c| c.present_numbers())
                .unwrap_or_default();
            ShapeStats {
                column: name.to_string(),
                skewness: skewness(&values),
                kurtosis: kurtosis(&values),
            }
        })
        .collect()
}

/// Pairwise Pearson correlations; `None` where a pair has no variance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn correlation_matrix(dataset: &Dataset, columns: &[&str], sink: &dyn LogSink) -> CorrelationMatrix {
    let names = numeric_columns(dataset, columns, sink);
    let series: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|name| {
            dataset
                .column(name)
                .map(|c| c.numeric_values())
                .unwrap_or_default()
        })
        .collect();
    let values = series
        .iter()
        .map(|xs| series.iter().map(|ys| pearson(xs, ys)).collect())
        .collect();
    CorrelationMatrix {
        columns: names.into_iter().map(str::to_string).collect(),
        values,
    }
}

/// Present numeric columns among `columns`; the rest are reported and dropped
fn numeric_columns<'a>(dataset: &Dataset, columns: &[&'a str], sink: &dyn LogSink) -> Vec<&'a str> {
    columns
        .iter()
        .copied()
        .filter(|name| match dataset.column(name) {
            Ok(col) if col.dtype().is_numeric() => true,
            Ok(col) => {
                sink.warn(&format!("Skipping non-numeric column '{}' ({})", name, col.dtype()));
                false
            }
            Err(e) => {
                sink.warn(&e.to_string());
                false
            }
        })
        .collect()
}

/// Everything `run_eda_suite` computes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaReport {
    pub summary: BasicSummary,
    pub outlier_method: OutlierMethod,
    pub outliers: Vec<OutlierCount>,
    pub shape: Vec<ShapeStats>,
    pub correlations: CorrelationMatrix,
}

/// Basic summary, outlier counts, shape statistics and correlations.
///
/// With an empty `numeric_columns` every numeric column is analysed.
pub fn run_eda_suite(
    dataset: &Dataset,
    numeric_columns: &[&str],
    method: OutlierMethod,
    threshold: f64,
    sink: &dyn LogSink,
) -> Result<EdaReport> {
    let all_numeric: Vec<&str> = dataset
        .columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(|c| c.name())
        .collect();
    let columns = if numeric_columns.is_empty() {
        all_numeric.as_slice()
    } else {
        numeric_columns
    };

    sink.info("Running basic summary");
    let summary = basic_summary(dataset);
    sink.info(&format!(
        "Dataset shape: {} rows x {} columns, {} duplicate rows",
        summary.rows, summary.columns, summary.duplicate_rows
    ));

    sink.info("Checking for outliers");
    let outliers = summarize_outliers(dataset, columns, method, threshold, sink)?.counts;

    let shape = shape_statistics(dataset, columns, sink);
    let correlations = correlation_matrix(dataset, columns, sink);

    Ok(EdaReport {
        summary,
        outlier_method: method,
        outliers,
        shape,
        correlations,
    })
}
