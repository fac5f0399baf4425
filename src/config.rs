use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Error;
use crate::flags::{BurnoutRule, CustomRule, FlagRule, StagnationRule, ValueStagnationRule};
use crate::schema::{self, HrSchema, PENGUIN_COLUMNS, PENGUIN_IDENTITY};
use crate::types::{DType, Result, DEFAULT_CARDINALITY_THRESHOLD, DEFAULT_TOP_K};
use crate::validation::{NumericRange, ValidationPlan};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Expectations checked by `summarize_validation_report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub expected_columns: Vec<String>,
    pub identity_column: Option<String>,
    pub validation_plan: ValidationPlan,
    pub expected_dtypes: Option<BTreeMap<String, DType>>,
    pub numeric_ranges: Option<BTreeMap<String, NumericRange>>,
    pub cardinality_threshold: usize,
    pub top_k: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_columns: Vec::new(),
            identity_column: None,
            validation_plan: ValidationPlan::new(),
            expected_dtypes: None,
            numeric_ranges: None,
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn accepted(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn range(min: f64, max: f64) -> NumericRange {
    NumericRange {
        min: Some(min),
        max: Some(max),
    }
}

impl ValidationConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Built-in expectations for the penguin tagging dataset
    pub fn penguin_tagging() -> Self {
        let mut plan = ValidationPlan::new();
        plan.insert(
            "species".to_string(),
            accepted(&["ADELIE", "CHINSTRAP", "GENTOO"]),
        );
        plan.insert("sex".to_string(), accepted(&["MALE", "FEMALE"]));
        plan.insert(
            "island".to_string(),
            accepted(&["BISCOE", "DREAM", "TORGERSEN"]),
        );
        plan.insert(
            "age_group".to_string(),
            accepted(&["CHICK", "JUVENILE", "ADULT"]),
        );
        plan.insert(
            "health_status".to_string(),
            accepted(&["HEALTHY", "INJURED", "SICK"]),
        );

        let dtypes = [
            ("tag_id", DType::String),
            ("species", DType::String),
            ("bill_length_mm", DType::Numeric),
            ("bill_depth_mm", DType::Numeric),
            ("flipper_length_mm", DType::Numeric),
            ("body_mass_g", DType::Numeric),
            ("capture_date", DType::Date),
        ]
        .into_iter()
        .map(|(c, t)| (c.to_string(), t))
        .collect();

        let ranges = [
            ("bill_length_mm", range(25.0, 65.0)),
            ("bill_depth_mm", range(10.0, 25.0)),
            ("flipper_length_mm", range(160.0, 240.0)),
            ("body_mass_g", range(2500.0, 6500.0)),
        ]
        .into_iter()
        .map(|(c, r)| (c.to_string(), r))
        .collect();

        Self {
            expected_columns: PENGUIN_COLUMNS.iter().map(|c| c.to_string()).collect(),
            identity_column: Some(PENGUIN_IDENTITY.to_string()),
            validation_plan: plan,
            expected_dtypes: Some(dtypes),
            numeric_ranges: Some(ranges),
            ..Self::default()
        }
    }
}

/// Column names and thresholds of the HR risk flags.
///
/// Rule fields left out of a JSON file fall back to the rule's defaults
/// over the configured `hr` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFlagConfig")]
pub struct FlagConfig {
    pub hr: HrSchema,
    pub burnout: BurnoutRule,
    pub plateau: StagnationRule,
    pub stagnation: Option<StagnationRule>,
    pub lowpaid_loyal: ValueStagnationRule,
    pub custom: Vec<CustomRule>,
    pub score_column: String,
    /// Display label per risk score; missing scores get "N Flags"
    pub score_labels: HashMap<i64, String>,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self::for_schema(HrSchema::default())
    }
}

/// `FlagConfig` as written in a file, rules still partial
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFlagConfig {
    hr: HrSchema,
    burnout: Option<Map<String, JsonValue>>,
    plateau: Option<Map<String, JsonValue>>,
    stagnation: Option<Map<String, JsonValue>>,
    lowpaid_loyal: Option<Map<String, JsonValue>>,
    custom: Vec<CustomRule>,
    score_column: Option<String>,
    score_labels: HashMap<i64, String>,
}

/// Serialize `base`, replace the fields named in `patch` and read it back
fn overlay<T>(base: T, patch: Option<Map<String, JsonValue>>) -> std::result::Result<T, String>
where
    T: Serialize + DeserializeOwned,
{
    let Some(patch) = patch else {
        return Ok(base);
    };
    let mut merged = serde_json::to_value(base).map_err(|e| e.to_string())?;
    if let JsonValue::Object(fields) = &mut merged {
        fields.extend(patch);
    }
    serde_json::from_value(merged).map_err(|e| e.to_string())
}

impl TryFrom<RawFlagConfig> for FlagConfig {
    type Error = String;

    fn try_from(raw: RawFlagConfig) -> std::result::Result<Self, Self::Error> {
        let defaults = FlagConfig::for_schema(raw.hr.clone());
        let stagnation = match raw.stagnation {
            Some(patch) => Some(overlay(StagnationRule::for_schema(&raw.hr), Some(patch))?),
            None => None,
        };
        let config = FlagConfig {
            burnout: overlay(defaults.burnout, raw.burnout)?,
            plateau: overlay(defaults.plateau, raw.plateau)?,
            stagnation,
            lowpaid_loyal: overlay(defaults.lowpaid_loyal, raw.lowpaid_loyal)?,
            custom: raw.custom,
            score_column: raw.score_column.unwrap_or(defaults.score_column),
            score_labels: raw.score_labels,
            hr: raw.hr,
        };
        config.check_distinct().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

impl FlagConfig {
    /// Default rules reading the columns named by `hr`
    pub fn for_schema(hr: HrSchema) -> Self {
        Self {
            burnout: BurnoutRule::for_schema(&hr),
            plateau: StagnationRule::plateau_for(&hr),
            stagnation: None,
            lowpaid_loyal: ValueStagnationRule::lowpaid_loyal_for(&hr),
            custom: Vec::new(),
            score_column: schema::FLAG_TOTAL.to_string(),
            score_labels: HashMap::new(),
            hr,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Every flag column and the score column must be distinct
    pub fn check_distinct(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.flag_columns() {
            if !seen.insert(name) {
                return Err(Error::InvalidArgument(format!(
                    "Flag column '{}' is produced by more than one rule",
                    name
                )));
            }
        }
        if seen.contains(self.score_column.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "Score column '{}' clashes with a flag column",
                self.score_column
            )));
        }
        Ok(())
    }

    /// Every rule applied after burnout, in application order
    pub fn secondary_rules(&self) -> Vec<&dyn FlagRule> {
        let mut rules: Vec<&dyn FlagRule> =
            vec![&self.plateau as &dyn FlagRule, &self.lowpaid_loyal];
        if let Some(stagnation) = &self.stagnation {
            rules.push(stagnation);
        }
        rules.extend(self.custom.iter().map(|r| r as &dyn FlagRule));
        rules
    }

    /// Names of all flag columns that make up the risk score
    pub fn flag_columns(&self) -> Vec<&str> {
        std::iter::once(self.burnout.flag_column())
            .chain(self.secondary_rules().into_iter().map(|r| r.flag_column()))
            .collect()
    }

    pub fn labels(&self) -> Option<&HashMap<i64, String>> {
        (!self.score_labels.is_empty()).then_some(&self.score_labels)
    }
}
