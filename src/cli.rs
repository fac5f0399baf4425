use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{FlagConfig, ValidationConfig};
use crate::dataset::Dataset;
use crate::eda::run_eda_suite;
use crate::features::{
    add_burnout_risk_flag, engineer_engagement_features, engineer_interaction_features,
};
use crate::logging::LogSink;
use crate::outliers::OutlierMethod;
use crate::output;
use crate::readers::load_dataset;
use crate::report::{summarize_validation_report, write_report};
use crate::risk::{
    add_risk_score, churn_rate_by, summarize_flag_churn, summarize_risk_score, FlagChurnSummary,
    GroupChurn, ScoreBucket,
};
use crate::types::{Result, DEFAULT_ZSCORE_THRESHOLD, UNKNOWN_LABEL};
use crate::validation::{
    render_missingness_markdown, standardize_and_flag_categorical, summarize_categorical_insights,
    summarize_missingness, ValidationPlan,
};

/// EDA and validation helpers for HR churn and penguin tagging datasets
#[derive(Parser, Debug)]
#[command(name = "churn-eda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the schema, categorical, range, cardinality and dtype checks
    Validate {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Validation config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Use the built-in penguin tagging expectations
        #[arg(long, default_value_t = false, conflicts_with = "config")]
        penguins: bool,

        /// Output JSON file path (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Summarize missing values per column
    Missing {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Minimum missing percentage to report
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
    },

    /// Add engineered features, risk flags and the risk score
    Engineer {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Flag config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output CSV file path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Descriptive statistics, outliers and correlations
    Eda {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Numeric columns to analyse (all numeric columns if omitted)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Outlier method: iqr or zscore
        #[arg(long, default_value = "iqr")]
        method: String,

        /// Z-score threshold
        #[arg(long, default_value_t = DEFAULT_ZSCORE_THRESHOLD)]
        threshold: f64,
    },

    /// Standardize a categorical column and report its quality
    Clean {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Column to standardize
        #[arg(long)]
        column: String,

        /// Accepted values (any value kept if omitted)
        #[arg(long, value_delimiter = ',')]
        valid: Vec<String>,

        /// Output CSV file path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn run_validate(
    input: &Path,
    config: Option<&Path>,
    penguins: bool,
    out: Option<&Path>,
    sink: &dyn LogSink,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let config = match config {
        Some(path) => ValidationConfig::from_json_file(path)?,
        None if penguins => ValidationConfig::penguin_tagging(),
        None => ValidationConfig::default(),
    };
    let report = summarize_validation_report(&dataset, &config, sink);
    match out {
        Some(path) => {
            write_report(&report, path, sink)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => output::write_json_stdout(&report)?,
    }
    Ok(())
}

pub fn run_missing(input: &Path, threshold: f64, sink: &dyn LogSink) -> Result<()> {
    let dataset = load_dataset(input)?;
    let entries = summarize_missingness(&dataset, threshold, sink);
    print!("{}", render_missingness_markdown(&entries));
    Ok(())
}

/// Dataset with every engineered column plus the summaries printed by `engineer`
#[derive(Debug, Clone)]
pub struct Engineered {
    pub dataset: Dataset,
    pub buckets: Vec<ScoreBucket>,
    pub flag_churn: Vec<FlagChurnSummary>,
    pub salary_churn: Vec<GroupChurn>,
}

/// Features, flags, then the composite score over every flag
pub fn engineer_dataset(
    dataset: &Dataset,
    config: &FlagConfig,
    sink: &dyn LogSink,
) -> Result<Engineered> {
    config.check_distinct()?;
    let out = engineer_engagement_features(dataset, &config.hr)?;
    let out = engineer_interaction_features(&out, &config.hr)?;
    let mut out = add_burnout_risk_flag(&out, &config.burnout)?;
    for rule in config.secondary_rules() {
        out = rule.apply(&out)?;
    }

    let flags = config.flag_columns();
    let out = add_risk_score(&out, &flags, &config.score_column)?;
    sink.info(&format!("Added {} from {} flags", config.score_column, flags.len()));

    let buckets = summarize_risk_score(&out, &flags, &config.hr.churn, config.labels())?;
    let flag_churn = summarize_flag_churn(&out, &flags, &config.hr.churn)?;
    let salary_churn = churn_rate_by(&out, &config.hr.salary, &config.hr.churn)?;
    Ok(Engineered {
        dataset: out,
        buckets,
        flag_churn,
        salary_churn,
    })
}

pub fn run_engineer(
    input: &Path,
    config: Option<&Path>,
    out: Option<&Path>,
    sink: &dyn LogSink,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let config = match config {
        Some(path) => FlagConfig::from_json_file(path)?,
        None => FlagConfig::default(),
    };
    let engineered = engineer_dataset(&dataset, &config, sink)?;

    let rows: Vec<Vec<String>> = engineered
        .buckets
        .iter()
        .map(|b| {
            vec![
                b.risk_score.to_string(),
                b.label.clone(),
                b.count.to_string(),
                b.churned.to_string(),
                b.retained.to_string(),
                format!("{:.3}", b.churn_rate),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(
            &["risk_score", "label", "count", "churned", "retained", "churn_rate"],
            &rows
        )
    );

    let rows: Vec<Vec<String>> = engineered
        .flag_churn
        .iter()
        .map(|f| {
            vec![
                f.flag.clone(),
                format!("{:.2}", f.churn_rate_no_flag),
                format!("{:.2}", f.churn_rate_flagged),
                format!("{:.2}", f.retained_with_flag),
                format!("{:.2}", f.churned_with_flag),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(
            &["flag", "churn_no_flag", "churn_flagged", "retained_with_flag", "churned_with_flag"],
            &rows
        )
    );

    let rows: Vec<Vec<String>> = engineered
        .salary_churn
        .iter()
        .map(|g| {
            vec![
                g.group.clone(),
                g.count.to_string(),
                format!("{:.3}", g.churn_rate),
                format!("±{:.3}", g.ci95),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(&["salary", "count", "churn_rate", "ci95"], &rows)
    );

    if let Some(path) = out {
        output::write_csv(&engineered.dataset, path)?;
        eprintln!("Engineered dataset written to: {}", path.display());
    }
    Ok(())
}

pub fn run_eda(
    input: &Path,
    columns: &[String],
    method: &str,
    threshold: f64,
    sink: &dyn LogSink,
) -> Result<()> {
    let method: OutlierMethod = method.parse()?;
    let dataset = load_dataset(input)?;
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let report = run_eda_suite(&dataset, &columns, method, threshold, sink)?;
    output::write_json_stdout(&report)
}

pub fn run_clean(
    input: &Path,
    column: &str,
    valid: &[String],
    out: Option<&Path>,
    sink: &dyn LogSink,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let valid: BTreeSet<String> = valid.iter().cloned().collect();
    let valid = (!valid.is_empty()).then_some(&valid);

    let cleaned = standardize_and_flag_categorical(&dataset, column, valid, UNKNOWN_LABEL, sink)?;
    let plan: Option<ValidationPlan> =
        valid.map(|v| [(column.to_string(), v.clone())].into_iter().collect());
    let insights = summarize_categorical_insights(&cleaned, &[column], plan.as_ref(), sink);
    output::write_json_stdout(&insights)?;

    if let Some(path) = out {
        output::write_csv(&cleaned, path)?;
        eprintln!("Cleaned dataset written to: {}", path.display());
    }
    Ok(())
}
