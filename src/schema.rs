use serde::{Deserialize, Serialize};

use crate::dataset::{Column, Dataset};
use crate::error::Error;
use crate::types::Result;

pub const SATISFACTION_LEVEL: &str = "satisfaction_level";
pub const NUMBER_PROJECT: &str = "number_project";
pub const AVERAGE_MONTHLY_HOURS: &str = "average_monthly_hours";
pub const TIME_SPEND_COMPANY: &str = "time_spend_company";
pub const SALARY: &str = "salary";
pub const CHURNED: &str = "churned";

// Engineered columns
pub const PROJECTS_PER_YEAR: &str = "projects_per_year";
pub const MONTHLY_PROJECT_LOAD: &str = "monthly_project_load";
pub const ENGAGEMENT_LEVEL: &str = "engagement_level";
pub const ENGAGEMENT_BURN: &str = "engagement_burn";
pub const SALARY_ENCODED: &str = "salary_encoded";
pub const SALARY_X_HOURS: &str = "salary_x_hours";
pub const TENURE_X_SALARY: &str = "tenure_x_salary";
pub const SATISFACTION_X_HOURS: &str = "satisfaction_x_hours";
pub const TENURE_BAND: &str = "tenure_band";

// Risk flags
pub const BURNOUT_RISK: &str = "burnout_risk";
pub const PLATEAU_RISK: &str = "plateau_risk";
pub const STAGNATION_RISK: &str = "stagnation_risk";
pub const LOWPAID_LOYAL: &str = "lowpaid_loyal";
pub const FLAG_TOTAL: &str = "flag_total";

/// Columns of the penguin tagging dataset
pub const PENGUIN_COLUMNS: &[&str] = &[
    "tag_id",
    "species",
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
    "age_group",
    "sex",
    "colony_id",
    "island",
    "capture_date",
    "health_status",
];

/// Identity column of the penguin tagging dataset
pub const PENGUIN_IDENTITY: &str = "tag_id";

/// Names of the HR source columns used by feature engineering and flagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrSchema {
    pub satisfaction: String,
    pub projects: String,
    pub monthly_hours: String,
    pub tenure: String,
    pub salary: String,
    pub churn: String,
}

impl Default for HrSchema {
    fn default() -> Self {
        Self {
            satisfaction: SATISFACTION_LEVEL.to_string(),
            projects: NUMBER_PROJECT.to_string(),
            monthly_hours: AVERAGE_MONTHLY_HOURS.to_string(),
            tenure: TIME_SPEND_COMPANY.to_string(),
            salary: SALARY.to_string(),
            churn: CHURNED.to_string(),
        }
    }
}

/// Resolve `names` against `dataset`.
///
/// Fails with a single `MissingColumn` error naming every absent column.
pub fn bind_columns<'a>(dataset: &'a Dataset, names: &[&str]) -> Result<Vec<&'a Column>> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !dataset.has_column(name))
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumn(missing.join(", ")));
    }
    names.iter().map(|name| dataset.column(name)).collect()
}

/// `InvalidInput` naming the first column that is not numeric
pub fn ensure_numeric(columns: &[&Column]) -> Result<()> {
    match columns.iter().find(|c| !c.dtype().is_numeric()) {
        Some(col) => Err(Error::InvalidInput(format!(
            "Column '{}' must be numeric, found {}",
            col.name(),
            col.dtype()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;

    fn hr_dataset() -> Dataset {
        dataset(vec![
            (SATISFACTION_LEVEL, floats(&[0.3, 0.9])),
            (NUMBER_PROJECT, ints(&[2, 5])),
            (AVERAGE_MONTHLY_HOURS, ints(&[157, 262])),
            (TIME_SPEND_COMPANY, ints(&[3, 6])),
            (SALARY, texts(&[Some("low"), Some("medium")])),
            (CHURNED, ints(&[1, 0])),
        ])
    }

    #[test]
    fn test_bind_only_requested_columns() {
        let ds = dataset(vec![
            (NUMBER_PROJECT, ints(&[2, 5])),
            (TIME_SPEND_COMPANY, ints(&[3, 6])),
        ]);
        let cols = bind_columns(&ds, &[NUMBER_PROJECT, TIME_SPEND_COMPANY]).unwrap();
        assert_eq!(cols[1].name(), TIME_SPEND_COMPANY);
        ensure_numeric(&cols).unwrap();
    }

    #[test]
    fn test_bind_reports_every_missing_column() {
        let ds = dataset(vec![(SALARY, texts(&[Some("low")]))]);
        let hr = HrSchema::default();
        match bind_columns(&ds, &[&hr.satisfaction, &hr.salary, &hr.churn]) {
            Err(Error::MissingColumn(names)) => {
                assert_eq!(names, "satisfaction_level, churned");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_tenure_is_not_numeric() {
        let ds = hr_dataset()
            .with_column(Column::derived(
                TIME_SPEND_COMPANY,
                texts(&[Some("three"), Some("six")]),
            ))
            .unwrap();
        let cols = bind_columns(&ds, &[NUMBER_PROJECT, TIME_SPEND_COMPANY]).unwrap();
        assert!(matches!(ensure_numeric(&cols), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_schema_from_partial_json() {
        let schema: HrSchema = serde_json::from_str(r#"{"churn": "left"}"#).unwrap();
        assert_eq!(schema.churn, "left");
        assert_eq!(schema.salary, SALARY);
    }
}
