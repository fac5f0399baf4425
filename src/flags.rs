use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::{Column, Dataset, Value};
use crate::error::Error;
use crate::schema::{self, HrSchema};
use crate::types::{DType, Result};

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Ne),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for Comparator {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Comparator> for String {
    fn from(c: Comparator) -> Self {
        c.symbol().to_string()
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Number(f64),
    Text(String),
}

impl From<f64> for Threshold {
    fn from(v: f64) -> Self {
        Threshold::Number(v)
    }
}

impl From<&str> for Threshold {
    fn from(v: &str) -> Self {
        Threshold::Text(v.to_string())
    }
}

/// One `column <op> threshold` test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "col")]
    pub column: String,
    pub op: Comparator,
    #[serde(rename = "val")]
    pub threshold: Threshold,
}

impl Condition {
    pub fn new(column: &str, op: Comparator, threshold: impl Into<Threshold>) -> Self {
        Self {
            column: column.to_string(),
            op,
            threshold: threshold.into(),
        }
    }

    /// Whether a cell satisfies the condition. Null never does.
    pub fn holds(&self, value: &Value) -> bool {
        let ordering = match (&self.threshold, value) {
            (_, Value::Null) => None,
            (Threshold::Number(t), v) => v.as_f64().and_then(|x| x.partial_cmp(t)),
            (Threshold::Text(t), Value::Text(s)) => Some(s.as_str().cmp(t.as_str())),
            (Threshold::Text(t), v) => Some(v.to_string().as_str().cmp(t.as_str())),
        };
        ordering.is_some_and(|o| self.op.accepts(o))
    }
}

/// Append `flag_column`: 1 where every condition holds, else 0
pub fn flag_all(dataset: &Dataset, conditions: &[Condition], flag_column: &str) -> Result<Dataset> {
    if conditions.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "Flag '{}' needs at least one condition",
            flag_column
        )));
    }

    let columns = conditions
        .iter()
        .map(|c| dataset.column(&c.column))
        .collect::<Result<Vec<&Column>>>()?;

    let values = (0..dataset.row_count())
        .map(|row| {
            let set = conditions
                .iter()
                .zip(&columns)
                .all(|(cond, col)| cond.holds(&col.values()[row]));
            Value::flag(set)
        })
        .collect();

    dataset.with_column(Column::new(flag_column, DType::Integer, values))
}

/// A named rule that produces one flag column
pub trait FlagRule {
    fn flag_column(&self) -> &str;

    fn conditions(&self) -> Vec<Condition>;

    fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        flag_all(dataset, &self.conditions(), self.flag_column())
    }
}

/// High workload and low satisfaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnoutRule {
    pub workload_column: String,
    pub satisfaction_column: String,
    pub workload_threshold: f64,
    pub satisfaction_threshold: f64,
    pub flag_column: String,
}

impl Default for BurnoutRule {
    fn default() -> Self {
        Self::for_schema(&HrSchema::default())
    }
}

impl BurnoutRule {
    pub fn for_schema(hr: &HrSchema) -> Self {
        Self {
            workload_column: hr.monthly_hours.clone(),
            satisfaction_column: hr.satisfaction.clone(),
            workload_threshold: 250.0,
            satisfaction_threshold: 0.4,
            flag_column: schema::BURNOUT_RISK.to_string(),
        }
    }
}

impl FlagRule for BurnoutRule {
    fn flag_column(&self) -> &str {
        &self.flag_column
    }

    fn conditions(&self) -> Vec<Condition> {
        vec![
            Condition::new(&self.workload_column, Comparator::Gt, self.workload_threshold),
            Condition::new(
                &self.satisfaction_column,
                Comparator::Lt,
                self.satisfaction_threshold,
            ),
        ]
    }
}

/// Long tenure and low engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagnationRule {
    pub tenure_column: String,
    pub engagement_column: String,
    pub tenure_threshold: f64,
    pub engagement_threshold: f64,
    pub flag_column: String,
}

impl Default for StagnationRule {
    fn default() -> Self {
        Self::for_schema(&HrSchema::default())
    }
}

impl StagnationRule {
    /// Tenure and satisfaction columns taken from `hr`, written to `stagnation_risk`
    pub fn for_schema(hr: &HrSchema) -> Self {
        Self {
            tenure_column: hr.tenure.clone(),
            engagement_column: hr.satisfaction.clone(),
            tenure_threshold: 3.0,
            engagement_threshold: 0.5,
            flag_column: schema::STAGNATION_RISK.to_string(),
        }
    }

    /// Stagnation over the HR columns, written to `plateau_risk`
    pub fn plateau() -> Self {
        Self::plateau_for(&HrSchema::default())
    }

    pub fn plateau_for(hr: &HrSchema) -> Self {
        Self {
            flag_column: schema::PLATEAU_RISK.to_string(),
            ..Self::for_schema(hr)
        }
    }
}

impl FlagRule for StagnationRule {
    fn flag_column(&self) -> &str {
        &self.flag_column
    }

    fn conditions(&self) -> Vec<Condition> {
        vec![
            Condition::new(&self.tenure_column, Comparator::Gt, self.tenure_threshold),
            Condition::new(
                &self.engagement_column,
                Comparator::Lt,
                self.engagement_threshold,
            ),
        ]
    }
}

/// Long tenure while still in a low-value category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueStagnationRule {
    pub tenure_column: String,
    pub category_column: String,
    pub tenure_threshold: f64,
    pub low_value: String,
    pub flag_column: String,
}

impl Default for ValueStagnationRule {
    fn default() -> Self {
        Self::lowpaid_loyal()
    }
}

impl ValueStagnationRule {
    /// Long tenure with a `low` salary band
    pub fn lowpaid_loyal() -> Self {
        Self::lowpaid_loyal_for(&HrSchema::default())
    }

    pub fn lowpaid_loyal_for(hr: &HrSchema) -> Self {
        Self {
            tenure_column: hr.tenure.clone(),
            category_column: hr.salary.clone(),
            tenure_threshold: 3.0,
            low_value: "low".to_string(),
            flag_column: schema::LOWPAID_LOYAL.to_string(),
        }
    }
}

impl FlagRule for ValueStagnationRule {
    fn flag_column(&self) -> &str {
        &self.flag_column
    }

    fn conditions(&self) -> Vec<Condition> {
        vec![
            Condition::new(&self.tenure_column, Comparator::Gt, self.tenure_threshold),
            Condition::new(&self.category_column, Comparator::Eq, self.low_value.as_str()),
        ]
    }
}

/// Arbitrary condition list loaded from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRule {
    pub flag_column: String,
    pub conditions: Vec<Condition>,
}

impl FlagRule for CustomRule {
    fn flag_column(&self) -> &str {
        &self.flag_column
    }

    fn conditions(&self) -> Vec<Condition> {
        self.conditions.clone()
    }
}

/// `burnout_risk`: workload above and satisfaction below the rule's thresholds
pub fn flag_burnout_risk(dataset: &Dataset, rule: &BurnoutRule) -> Result<Dataset> {
    rule.apply(dataset)
}

pub fn flag_stagnation_risk(dataset: &Dataset, rule: &StagnationRule) -> Result<Dataset> {
    rule.apply(dataset)
}

/// Stagnation over the default HR columns, written to `plateau_risk`
pub fn flag_plateau_risk(dataset: &Dataset) -> Result<Dataset> {
    StagnationRule::plateau().apply(dataset)
}

/// Tenure above 3 years with a `low` salary, written to `lowpaid_loyal`
pub fn flag_lowpaid_loyal(dataset: &Dataset) -> Result<Dataset> {
    ValueStagnationRule::lowpaid_loyal().apply(dataset)
}

pub fn flag_value_stagnation(dataset: &Dataset, rule: &ValueStagnationRule) -> Result<Dataset> {
    rule.apply(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;

    fn flag_values(ds: &Dataset, name: &str) -> Vec<i64> {
        ds.column(name)
            .unwrap()
            .values()
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                other => panic!("non-integer flag {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_comparator_parse() {
        assert_eq!(">=".parse::<Comparator>().unwrap(), Comparator::Ge);
        assert_eq!("!=".parse::<Comparator>().unwrap(), Comparator::Ne);
        assert!(matches!(
            "=>".parse::<Comparator>(),
            Err(Error::UnsupportedOperator(op)) if op == "=>"
        ));
    }

    #[test]
    fn test_lowpaid_loyal_scenario() {
        let ds = dataset(vec![
            ("time_spend_company", ints(&[1, 4, 6])),
            ("salary", texts(&[Some("low"), Some("low"), Some("high")])),
        ]);
        let out = flag_lowpaid_loyal(&ds).unwrap();
        assert_eq!(flag_values(&out, "lowpaid_loyal"), vec![0, 1, 0]);
        assert_eq!(out.column("lowpaid_loyal").unwrap().dtype(), DType::Integer);
    }

    #[test]
    fn test_burnout_thresholds_are_strict() {
        let ds = dataset(vec![
            ("average_monthly_hours", ints(&[250, 251, 300, 300])),
            ("satisfaction_level", floats(&[0.1, 0.1, 0.4, 0.39])),
        ]);
        let out = flag_burnout_risk(&ds, &BurnoutRule::default()).unwrap();
        assert_eq!(flag_values(&out, "burnout_risk"), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_condition_order_does_not_matter() {
        let ds = dataset(vec![
            ("a", ints(&[1, 5, 7, 9])),
            ("b", floats(&[0.2, 0.9, 0.1, 0.3])),
            ("c", texts(&[Some("x"), Some("x"), Some("y"), Some("x")])),
        ]);
        let conds = vec![
            Condition::new("a", Comparator::Ge, 5.0),
            Condition::new("b", Comparator::Le, 0.3),
            Condition::new("c", Comparator::Ne, "y"),
        ];
        let mut reversed = conds.clone();
        reversed.reverse();

        let forward = flag_all(&ds, &conds, "f").unwrap();
        let backward = flag_all(&ds, &reversed, "f").unwrap();
        assert_eq!(flag_values(&forward, "f"), flag_values(&backward, "f"));
        assert_eq!(flag_values(&forward, "f"), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_null_never_flags() {
        let ds = dataset(vec![("a", vec![Value::Null, Value::Int(3)])]);
        let out = flag_all(&ds, &[Condition::new("a", Comparator::Ne, 1.0)], "f").unwrap();
        assert_eq!(flag_values(&out, "f"), vec![0, 1]);
    }

    #[test]
    fn test_missing_column_fails() {
        let ds = dataset(vec![("a", ints(&[1]))]);
        let result = flag_all(&ds, &[Condition::new("zz", Comparator::Gt, 0.0)], "f");
        assert!(matches!(result, Err(Error::MissingColumn(c)) if c == "zz"));
    }

    #[test]
    fn test_empty_conditions_fail() {
        let ds = dataset(vec![("a", ints(&[1]))]);
        assert!(matches!(
            flag_all(&ds, &[], "f"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_plateau_uses_plateau_column() {
        let ds = dataset(vec![
            ("time_spend_company", ints(&[5, 2])),
            ("satisfaction_level", floats(&[0.45, 0.1])),
        ]);
        let out = flag_plateau_risk(&ds).unwrap();
        assert_eq!(flag_values(&out, "plateau_risk"), vec![1, 0]);
        assert!(!out.has_column("stagnation_risk"));
    }

    #[test]
    fn test_custom_rule_from_json() {
        let json = r#"{
            "flag_column": "overworked",
            "conditions": [
                {"col": "hours", "op": ">=", "val": 200},
                {"col": "team", "op": "==", "val": "ops"}
            ]
        }"#;
        let rule: CustomRule = serde_json::from_str(json).unwrap();
        let ds = dataset(vec![
            ("hours", ints(&[200, 199, 210])),
            ("team", texts(&[Some("ops"), Some("ops"), Some("dev")])),
        ]);
        let out = rule.apply(&ds).unwrap();
        assert_eq!(flag_values(&out, "overworked"), vec![1, 0, 0]);
    }

    #[test]
    fn test_unsupported_operator_in_json() {
        let json = r#"{"col": "hours", "op": "~", "val": 1}"#;
        assert!(serde_json::from_str::<Condition>(json).is_err());
    }
}
