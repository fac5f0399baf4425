use std::cmp::Ordering;

use crate::dataset::{Column, Dataset, Value};
use crate::error::Error;
use crate::flags::{BurnoutRule, FlagRule};
use crate::schema::{self, bind_columns, ensure_numeric, HrSchema};
use crate::types::{DType, Result};

/// Ordered bin edges with one label per interval.
///
/// Every interval is right-closed, `(lo, hi]`: a value equal to an interior
/// edge falls in the lower bin, and a value equal to the lowest edge falls in
/// no bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    edges: Vec<f64>,
    labels: Vec<String>,
}

impl Bins {
    pub fn new(edges: Vec<f64>, labels: Vec<&str>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidArgument(
                "Bins need at least two edges".to_string(),
            ));
        }
        if labels.len() != edges.len() - 1 {
            return Err(Error::InvalidArgument(format!(
                "{} edges need {} labels, got {}",
                edges.len(),
                edges.len() - 1,
                labels.len()
            )));
        }
        if edges
            .windows(2)
            .any(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less))
        {
            return Err(Error::InvalidArgument(
                "Bin edges must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            edges,
            labels: labels.into_iter().map(str::to_string).collect(),
        })
    }

    /// Label of the interval containing `value`, if any
    pub fn assign(&self, value: f64) -> Option<&str> {
        self.edges
            .windows(2)
            .position(|w| w[0] < value && value <= w[1])
            .map(|idx| self.labels[idx].as_str())
    }

    /// Projects-per-year engagement tiers
    pub fn engagement_levels() -> Self {
        Self::fixed(
            &[0.0, 0.5, 1.5, 2.5, 10.0],
            &["very low", "low", "average", "high"],
        )
    }

    /// Tenure bands in years
    pub fn tenure_bands() -> Self {
        Self::fixed(
            &[0.0, 3.0, 5.0, 10.0],
            &["Short (≤3 yrs)", "Mid (4–5 yrs)", "Long (6–10 yrs)"],
        )
    }

    fn fixed(edges: &[f64], labels: &[&str]) -> Self {
        Self {
            edges: edges.to_vec(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Ordinal encoding of the salary band
pub fn encode_salary(value: &Value) -> Option<i64> {
    match value.as_str()?.trim() {
        "low" => Some(1),
        "medium" => Some(2),
        "high" => Some(3),
        _ => None,
    }
}

fn numeric_column(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(dataset.column(name)?.numeric_values())
}

/// `numerator / denominator`; a zero or null denominator gives null
pub fn ratio(
    dataset: &Dataset,
    numerator: &str,
    denominator: &str,
    out_column: &str,
) -> Result<Dataset> {
    let num = numeric_column(dataset, numerator)?;
    let den = numeric_column(dataset, denominator)?;
    let values = num
        .into_iter()
        .zip(den)
        .map(|pair| match pair {
            (Some(n), Some(d)) if d != 0.0 => Value::float(n / d),
            _ => Value::Null,
        })
        .collect();
    dataset.with_column(Column::new(out_column, DType::Numeric, values))
}

/// Null-propagating product of two columns.
///
/// The product stays an integer column when both inputs are integers.
pub fn product(dataset: &Dataset, left: &str, right: &str, out_column: &str) -> Result<Dataset> {
    let l = dataset.column(left)?;
    let r = dataset.column(right)?;
    let values = l
        .values()
        .iter()
        .zip(r.values())
        .map(|pair| match pair {
            (Value::Int(a), Value::Int(b)) => a.checked_mul(*b).map_or(Value::Null, Value::Int),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Value::float(x * y),
                _ => Value::Null,
            },
        })
        .collect();
    dataset.with_column(Column::derived(out_column, values))
}

/// Assign each value of `column` to a bin label (null outside every bin)
pub fn bin(dataset: &Dataset, column: &str, bins: &Bins, out_column: &str) -> Result<Dataset> {
    let values = numeric_column(dataset, column)?
        .into_iter()
        .map(|v| {
            v.and_then(|x| bins.assign(x))
                .map_or(Value::Null, |label| Value::Text(label.to_string()))
        })
        .collect();
    dataset.with_column(Column::new(out_column, DType::String, values))
}

/// Add `projects_per_year`, `monthly_project_load` and `engagement_level`
pub fn engineer_engagement_features(dataset: &Dataset, hr: &HrSchema) -> Result<Dataset> {
    let cols = bind_columns(dataset, &[&hr.projects, &hr.tenure, &hr.monthly_hours])?;
    ensure_numeric(&cols)?;
    let out = ratio(dataset, &hr.projects, &hr.tenure, schema::PROJECTS_PER_YEAR)?;
    let out = ratio(&out, &hr.monthly_hours, &hr.projects, schema::MONTHLY_PROJECT_LOAD)?;
    bin(
        &out,
        schema::PROJECTS_PER_YEAR,
        &Bins::engagement_levels(),
        schema::ENGAGEMENT_LEVEL,
    )
}

/// Add the salary encoding, its interaction terms and `tenure_band`
pub fn engineer_interaction_features(dataset: &Dataset, hr: &HrSchema) -> Result<Dataset> {
    let cols = bind_columns(
        dataset,
        &[&hr.salary, &hr.satisfaction, &hr.monthly_hours, &hr.tenure],
    )?;
    ensure_numeric(&cols[1..])?;
    let encoded = cols[0]
        .values()
        .iter()
        .map(|v| encode_salary(v).map_or(Value::Null, Value::Int))
        .collect();
    let out = dataset.with_column(Column::new(schema::SALARY_ENCODED, DType::Integer, encoded))?;

    let out = product(&out, schema::SALARY_ENCODED, &hr.monthly_hours, schema::SALARY_X_HOURS)?;
    let out = product(&out, &hr.tenure, schema::SALARY_ENCODED, schema::TENURE_X_SALARY)?;
    let out = product(
        &out,
        &hr.satisfaction,
        &hr.monthly_hours,
        schema::SATISFACTION_X_HOURS,
    )?;
    bin(&out, &hr.tenure, &Bins::tenure_bands(), schema::TENURE_BAND)
}

/// Add `engagement_burn` (projects per year × monthly hours) and the burnout
/// flag unless the dataset already carries one.
///
/// Expects `projects_per_year` from [`engineer_engagement_features`].
pub fn add_burnout_risk_flag(dataset: &Dataset, rule: &BurnoutRule) -> Result<Dataset> {
    let out = product(
        dataset,
        schema::PROJECTS_PER_YEAR,
        &rule.workload_column,
        schema::ENGAGEMENT_BURN,
    )?;
    if out.has_column(rule.flag_column()) {
        return Ok(out);
    }
    rule.apply(&out)
}
