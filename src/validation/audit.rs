use std::collections::BTreeSet;

use serde::Serialize;

use super::missing_column_message;
use crate::dataset::Dataset;
use crate::logging::LogSink;

/// Column set and duplicate checks of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaAudit {
    pub unexpected: Vec<String>,
    pub missing: Vec<String>,
    pub duplicate_rows: usize,
    /// `None` when no identity column is configured or it is absent
    pub duplicate_identity: Option<usize>,
}

/// Compare the dataset's columns against the expected set and count duplicates
pub fn audit_schema<S: AsRef<str>>(
    dataset: &Dataset,
    expected_columns: &[S],
    identity_column: Option<&str>,
    sink: &dyn LogSink,
) -> SchemaAudit {
    let expected: BTreeSet<&str> = expected_columns.iter().map(|s| s.as_ref()).collect();
    let actual: BTreeSet<&str> = dataset.column_names().into_iter().collect();

    let unexpected: Vec<String> = actual.difference(&expected).map(|s| s.to_string()).collect();
    let missing: Vec<String> = expected.difference(&actual).map(|s| s.to_string()).collect();

    if !unexpected.is_empty() {
        sink.warn(&format!("Unexpected columns: {}", unexpected.join(", ")));
    }
    if !missing.is_empty() {
        sink.warn(&format!("Missing expected columns: {}", missing.join(", ")));
    }

    let duplicate_rows = dataset.duplicate_row_count();
    if duplicate_rows > 0 {
        sink.warn(&format!("Found {} duplicate rows", duplicate_rows));
    }

    let duplicate_identity = identity_column.and_then(|identity| match dataset.column(identity) {
        Ok(col) => {
            let n = col.duplicate_count();
            if n > 0 {
                sink.warn(&format!("Found {} duplicate '{}' values", n, identity));
            }
            Some(n)
        }
        Err(_) => {
            sink.warn(&missing_column_message(identity));
            None
        }
    });

    if unexpected.is_empty() && missing.is_empty() && duplicate_rows == 0 {
        sink.info("Schema matches expected columns");
    }

    SchemaAudit {
        unexpected,
        missing,
        duplicate_rows,
        duplicate_identity,
    }
}

/// Text columns with more than `threshold` distinct non-null values, in column order
pub fn check_high_cardinality(
    dataset: &Dataset,
    threshold: usize,
    sink: &dyn LogSink,
) -> Vec<String> {
    dataset
        .columns()
        .iter()
        .filter(|col| col.dtype().is_text())
        .filter_map(|col| {
            let unique = col.distinct_count();
            (unique > threshold).then(|| {
                sink.warn(&format!(
                    "High cardinality in {}: {} unique values",
                    col.name(),
                    unique
                ));
                col.name().to_string()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::*;
    use crate::logging::{MemorySink, NoopSink};
    use crate::schema::{PENGUIN_COLUMNS, PENGUIN_IDENTITY};

    #[test]
    fn test_audit_schema() {
        let ds = dataset(vec![
            ("tag_id", texts(&[Some("P1"), Some("P2"), Some("P1")])),
            ("species", texts(&[Some("ADELIE"), Some("GENTOO"), Some("ADELIE")])),
            ("zeta", ints(&[1, 2, 1])),
            ("alpha", ints(&[0, 0, 0])),
        ]);
        let audit = audit_schema(&ds, PENGUIN_COLUMNS, Some(PENGUIN_IDENTITY), &NoopSink);
        assert_eq!(audit.unexpected, vec!["alpha", "zeta"]);
        assert_eq!(audit.missing.len(), PENGUIN_COLUMNS.len() - 2);
        assert!(audit.missing.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(audit.duplicate_rows, 1);
        assert_eq!(audit.duplicate_identity, Some(1));
    }

    #[test]
    fn test_audit_without_identity_column() {
        let ds = dataset(vec![("species", texts(&[Some("ADELIE")]))]);
        let sink = MemorySink::default();
        let audit = audit_schema(&ds, &["species"], Some("tag_id"), &sink);
        assert!(audit.unexpected.is_empty());
        assert!(audit.missing.is_empty());
        assert_eq!(audit.duplicate_identity, None);
        assert_eq!(sink.warnings().len(), 1);

        let quiet = MemorySink::default();
        assert_eq!(audit_schema(&ds, &["species"], None, &quiet).duplicate_identity, None);
        assert!(quiet.warnings().is_empty());
    }

    #[test]
    fn test_high_cardinality_text_only() {
        let names: Vec<String> = (0..12).map(|i| format!("name{}", i)).collect();
        let refs: Vec<Option<&str>> = names.iter().map(|s| Some(s.as_str())).collect();
        let ids: Vec<i64> = (0..12).collect();
        let ds = dataset(vec![
            ("id", ints(&ids)),
            ("name", texts(&refs)),
            ("sex", texts(&[Some("M"); 12])),
        ]);
        assert_eq!(check_high_cardinality(&ds, 10, &NoopSink), vec!["name"]);
        assert!(check_high_cardinality(&ds, 12, &NoopSink).is_empty());
    }
}
