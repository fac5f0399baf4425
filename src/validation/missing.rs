use serde::Serialize;

use crate::dataset::Dataset;
use crate::logging::LogSink;

/// Null statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing_count: usize,
    pub missing_percent: f64,
}

/// Columns with at least one null, most incomplete first.
///
/// With a positive `threshold` only columns whose missing percentage reaches
/// it are kept. Ties keep the dataset's column order.
pub fn summarize_missingness(
    dataset: &Dataset,
    threshold: f64,
    sink: &dyn LogSink,
) -> Vec<MissingEntry> {
    let rows = dataset.row_count();
    let mut entries: Vec<MissingEntry> = dataset
        .columns()
        .iter()
        .filter_map(|col| {
            let missing_count = col.null_count();
            if missing_count == 0 {
                return None;
            }
            let missing_percent = 100.0 * missing_count as f64 / rows as f64;
            if threshold > 0.0 && missing_percent < threshold {
                return None;
            }
            Some(MissingEntry {
                column: col.name().to_string(),
                missing_count,
                missing_percent,
            })
        })
        .collect();

    // stable sort keeps column order on ties
    entries.sort_by(|a, b| b.missing_percent.total_cmp(&a.missing_percent));

    if entries.is_empty() {
        sink.info("No missing values found");
    } else {
        for entry in &entries {
            sink.warn(&format!(
                "{}: {} missing values ({:.1}%)",
                entry.column, entry.missing_count, entry.missing_percent
            ));
        }
    }
    entries
}

/// Markdown block listing each entry on its own bullet
pub fn render_missingness_markdown(entries: &[MissingEntry]) -> String {
    let mut out = String::from("**Missing Values Summary:**\n\n");
    if entries.is_empty() {
        out.push_str("- _None_\n");
        return out;
    }
    for entry in entries {
        out.push_str(&format!(
            "- {:<20}: {:>5} missing ({:>5.1}%)\n",
            entry.column,
            group_thousands(entry.missing_count),
            entry.missing_percent
        ));
    }
    out
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
