use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::dataset::{Column, Dataset, Value};
use crate::error::Error;
use crate::stats::round_to;
use crate::types::{DType, Result};

/// 1.96 standard errors either side of the mean
const Z_95: f64 = 1.96;

/// Churn outcome for all rows sharing one risk score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBucket {
    pub risk_score: i64,
    pub label: String,
    pub count: usize,
    pub churned: usize,
    pub retained: usize,
    pub churn_rate: f64,
}

/// Churn rates with and without one flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagChurnSummary {
    pub flag: String,
    /// Share of retained rows carrying the flag
    pub retained_with_flag: f64,
    /// Share of churned rows carrying the flag
    pub churned_with_flag: f64,
    pub churn_rate_no_flag: f64,
    pub churn_rate_flagged: f64,
}

/// Churn rate for one group value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupChurn {
    pub group: String,
    pub count: usize,
    pub churn_rate: f64,
    /// Half-width of the 95% normal-approximation interval
    pub ci95: f64,
}

/// Default bucket label: "0 Flags", "1 Flag", "2 Flags", ...
pub fn default_label(score: i64) -> String {
    format!("{} Flag{}", score, if score == 1 { "" } else { "s" })
}

/// Read a 0/1 cell; null counts as 0
fn binary_cell(column: &Column, row: usize) -> Result<i64> {
    match column.values()[row].as_f64() {
        None if column.values()[row].is_null() => Ok(0),
        Some(v) if v == 0.0 => Ok(0),
        Some(v) if v == 1.0 => Ok(1),
        _ => Err(Error::InvalidArgument(format!(
            "Flag column '{}' holds non-binary value '{}' at row {}",
            column.name(),
            column.values()[row],
            row
        ))),
    }
}

/// Read the churn outcome; null rows are skipped by callers
fn churn_cell(column: &Column, row: usize) -> Result<Option<bool>> {
    let value = &column.values()[row];
    if value.is_null() {
        return Ok(None);
    }
    match value.as_f64() {
        Some(v) if v == 0.0 => Ok(Some(false)),
        Some(v) if v == 1.0 => Ok(Some(true)),
        _ => Err(Error::InvalidArgument(format!(
            "Churn column '{}' holds non-binary value '{}' at row {}",
            column.name(),
            value,
            row
        ))),
    }
}

fn ensure_distinct(flag_columns: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    match flag_columns.iter().find(|name| !seen.insert(**name)) {
        Some(name) => Err(Error::InvalidArgument(format!(
            "Flag column '{}' listed more than once",
            name
        ))),
        None => Ok(()),
    }
}

fn risk_scores(dataset: &Dataset, flag_columns: &[&str]) -> Result<Vec<i64>> {
    ensure_distinct(flag_columns)?;
    let columns = flag_columns
        .iter()
        .map(|name| dataset.column(name))
        .collect::<Result<Vec<_>>>()?;

    (0..dataset.row_count())
        .map(|row| {
            columns
                .iter()
                .map(|col| binary_cell(col, row))
                .sum::<Result<i64>>()
        })
        .collect()
}

/// Append `score_column` holding the row-wise sum of the flag columns
pub fn add_risk_score(
    dataset: &Dataset,
    flag_columns: &[&str],
    score_column: &str,
) -> Result<Dataset> {
    let scores = risk_scores(dataset, flag_columns)?;
    let values = scores.into_iter().map(Value::Int).collect();
    dataset.with_column(Column::new(score_column, DType::Integer, values))
}

/// Churn rate per distinct risk score, ascending by score.
///
/// Only scores that occur produce a bucket. Rows with a null churn value are
/// left out.
pub fn summarize_risk_score(
    dataset: &Dataset,
    flag_columns: &[&str],
    churn_column: &str,
    labels: Option<&HashMap<i64, String>>,
) -> Result<Vec<ScoreBucket>> {
    let churn = dataset.column(churn_column)?;
    let scores = risk_scores(dataset, flag_columns)?;

    let mut tallies: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for (row, score) in scores.into_iter().enumerate() {
        let Some(churned) = churn_cell(churn, row)? else {
            continue;
        };
        let entry = tallies.entry(score).or_insert((0, 0));
        if churned {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    Ok(tallies
        .into_iter()
        .map(|(score, (churned, retained))| {
            let count = churned + retained;
            let label = labels
                .and_then(|map| map.get(&score).cloned())
                .unwrap_or_else(|| default_label(score));
            ScoreBucket {
                risk_score: score,
                label,
                count,
                churned,
                retained,
                churn_rate: churned as f64 / count as f64,
            }
        })
        .collect())
}

/// Cross-tabulate each flag against churn.
///
/// Rates are rounded to two decimals; a group with no rows reports 0.0.
pub fn summarize_flag_churn(
    dataset: &Dataset,
    flag_columns: &[&str],
    churn_column: &str,
) -> Result<Vec<FlagChurnSummary>> {
    ensure_distinct(flag_columns)?;
    let churn = dataset.column(churn_column)?;

    flag_columns
        .iter()
        .map(|name| {
            let flag = dataset.column(name)?;
            // [flag][churned] counts
            let mut counts = [[0usize; 2]; 2];
            for row in 0..dataset.row_count() {
                let Some(churned) = churn_cell(churn, row)? else {
                    continue;
                };
                let set = binary_cell(flag, row)? as usize;
                counts[set][usize::from(churned)] += 1;
            }

            let rate = |num: usize, den: usize| {
                if den == 0 {
                    0.0
                } else {
                    round_to(num as f64 / den as f64, 2)
                }
            };
            Ok(FlagChurnSummary {
                flag: name.to_string(),
                retained_with_flag: rate(counts[1][0], counts[0][0] + counts[1][0]),
                churned_with_flag: rate(counts[1][1], counts[0][1] + counts[1][1]),
                churn_rate_no_flag: rate(counts[0][1], counts[0][0] + counts[0][1]),
                churn_rate_flagged: rate(counts[1][1], counts[1][0] + counts[1][1]),
            })
        })
        .collect()
}

/// Numbers first in numeric order, then everything else lexically
fn group_order(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}

/// Churn rate per value of `group_column`, groups in ascending order.
///
/// Rows with a null group or null churn are skipped. Numeric groups sort
/// numerically ahead of everything else, which sorts lexically.
pub fn churn_rate_by(
    dataset: &Dataset,
    group_column: &str,
    churn_column: &str,
) -> Result<Vec<GroupChurn>> {
    let group = dataset.column(group_column)?;
    let churn = dataset.column(churn_column)?;

    let mut tallies: Vec<(Value, usize, usize)> = Vec::new();
    for row in 0..dataset.row_count() {
        let key = &group.values()[row];
        if key.is_null() {
            continue;
        }
        let Some(churned) = churn_cell(churn, row)? else {
            continue;
        };
        let idx = match tallies.iter().position(|(k, _, _)| k == key) {
            Some(idx) => idx,
            None => {
                tallies.push((key.clone(), 0, 0));
                tallies.len() - 1
            }
        };
        tallies[idx].1 += 1;
        if churned {
            tallies[idx].2 += 1;
        }
    }

    tallies.sort_by(|(a, _, _), (b, _, _)| group_order(a, b));

    Ok(tallies
        .into_iter()
        .map(|(key, count, churned)| {
            let p = churned as f64 / count as f64;
            GroupChurn {
                group: key.to_string(),
                count,
                churn_rate: p,
                ci95: Z_95 * (p * (1.0 - p) / count as f64).sqrt(),
            }
        })
        .collect())
}
