use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::config::ValidationConfig;
use crate::dataset::Dataset;
use crate::logging::LogSink;
use crate::output;
use crate::types::Result;
use crate::validation::{
    audit_schema, check_dtypes, check_high_cardinality, missing_column_message,
    summarize_categorical_validation, validate_range, CategoricalSummary, DtypeMismatch, Finding,
    SchemaAudit,
};

/// Bounds violations in one numeric column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSummary {
    pub violations: usize,
    pub unparseable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub schema: SchemaAudit,
    pub categorical: BTreeMap<String, Finding<CategoricalSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_ranges: Option<BTreeMap<String, Finding<RangeSummary>>>,
    pub high_cardinality_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtypes: Option<BTreeMap<String, DtypeMismatch>>,
}

/// Run the schema, categorical, range, cardinality and dtype checks
pub fn summarize_validation_report(
    dataset: &Dataset,
    config: &ValidationConfig,
    sink: &dyn LogSink,
) -> ValidationReport {
    let schema = audit_schema(
        dataset,
        &config.expected_columns,
        config.identity_column.as_deref(),
        sink,
    );

    let categorical =
        summarize_categorical_validation(dataset, &config.validation_plan, config.top_k, sink);

    let numeric_ranges = config.numeric_ranges.as_ref().map(|ranges| {
        ranges
            .iter()
            .map(|(column, range)| {
                let finding = if dataset.has_column(column) {
                    let check = validate_range(dataset, column, range.min, range.max, sink);
                    Finding::Checked(RangeSummary {
                        violations: check.violations(),
                        unparseable: check.unparseable,
                    })
                } else {
                    sink.warn(&missing_column_message(column));
                    Finding::missing_column(column)
                };
                (column.clone(), finding)
            })
            .collect()
    });

    let high_cardinality_fields = check_high_cardinality(dataset, config.cardinality_threshold, sink);

    let dtypes = config
        .expected_dtypes
        .as_ref()
        .map(|expected| check_dtypes(dataset, expected, sink));

    ValidationReport {
        schema,
        categorical,
        numeric_ranges,
        high_cardinality_fields,
        dtypes,
    }
}

/// Write the report as pretty-printed JSON
pub fn write_report(report: &ValidationReport, path: &Path, sink: &dyn LogSink) -> Result<()> {
    output::write_json_file(report, path)?;
    sink.info(&format!("Validation report saved to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;
    use crate::logging::{MemorySink, NoopSink};
    use tempfile::tempdir;

    fn penguins() -> Dataset {
        dataset(vec![
            ("tag_id", texts(&[Some("P1"), Some("P2"), Some("P2")])),
            ("species", texts(&[Some("Adelie"), Some("Emperor"), Some("gentoo")])),
            ("body_mass_g", floats(&[3750.0, 9000.0, 5000.0])),
            ("sex", texts(&[Some("MALE"), None, Some("female")])),
        ])
    }

    #[test]
    fn test_report_keys_and_findings() {
        let config = ValidationConfig::penguin_tagging();
        let sink = MemorySink::default();
        let report = summarize_validation_report(&penguins(), &config, &sink);

        assert_eq!(report.schema.duplicate_identity, Some(1));
        assert_eq!(report.categorical["species"].checked().unwrap().count, 1);
        assert_eq!(report.categorical["sex"].checked().unwrap().count, 0);
        assert!(matches!(report.categorical["island"], Finding::Skipped { .. }));

        let ranges = report.numeric_ranges.as_ref().unwrap();
        assert_eq!(ranges["body_mass_g"].checked().unwrap().violations, 1);
        assert!(ranges["bill_length_mm"].checked().is_none());

        let dtypes = report.dtypes.as_ref().unwrap();
        assert_eq!(dtypes["capture_date"].actual, None);
        assert!(!dtypes.contains_key("body_mass_g"));
        assert!(!sink.warnings().is_empty());

        let json = serde_json::to_value(&report).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["schema", "categorical", "numeric_ranges", "high_cardinality_fields", "dtypes"] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
        assert!(json["categorical"]["island"]["warning"].is_string());
    }

    #[test]
    fn test_report_independent_of_sink() {
        let config = ValidationConfig::penguin_tagging();
        let sink = MemorySink::default();
        assert_eq!(
            summarize_validation_report(&penguins(), &config, &NoopSink),
            summarize_validation_report(&penguins(), &config, &sink)
        );
    }

    #[test]
    fn test_optional_sections_omitted() {
        let report = summarize_validation_report(&penguins(), &ValidationConfig::default(), &NoopSink);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("numeric_ranges").is_none());
        assert!(json.get("dtypes").is_none());
        assert!(json["schema"]["duplicate_identity"].is_null());
    }

    #[test]
    fn test_write_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = summarize_validation_report(
            &penguins(),
            &ValidationConfig::penguin_tagging(),
            &NoopSink,
        );
        write_report(&report, &path, &NoopSink).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"schema\": {"));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["schema"]["duplicate_identity"], 1);
    }
}
