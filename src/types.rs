use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of most frequent invalid values kept per column in reports
pub const DEFAULT_TOP_K: usize = 10;

/// Distinct-value count above which a text column is high cardinality
pub const DEFAULT_CARDINALITY_THRESHOLD: usize = 10;

/// Label substituted for missing or rejected categorical values
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Default z-score cutoff for outlier detection
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// Multiplier applied to the interquartile range for outlier fences
pub const IQR_FENCE: f64 = 1.5;

/// Data type classification for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    #[serde(alias = "int64", alias = "int32", alias = "Int64")]
    Integer,
    #[serde(alias = "float64", alias = "float32", alias = "float")]
    Numeric,
    #[serde(alias = "object", alias = "str", alias = "category")]
    String,
    Date,
    #[serde(alias = "datetime64[ns]", alias = "datetime64")]
    Datetime,
    #[serde(alias = "bool")]
    Boolean,
    FreeText,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Integer => "integer",
            DType::Numeric => "numeric",
            DType::String => "string",
            DType::Date => "date",
            DType::Datetime => "datetime",
            DType::Boolean => "boolean",
            DType::FreeText => "free_text",
        }
    }

    /// Integer and float columns
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Integer | DType::Numeric)
    }

    /// Columns holding categorical or free text values
    pub fn is_text(&self) -> bool {
        matches!(self, DType::String | DType::FreeText)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" | "tab" => Some(FileFormat::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" => Some(FileFormat::Excel),
            _ => None,
        }
    }
}

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;
