pub mod cli;
pub mod config;
pub mod dataset;
pub mod eda;
pub mod error;
pub mod features;
pub mod flags;
pub mod inference;
pub mod logging;
pub mod outliers;
pub mod output;
pub mod readers;
pub mod report;
pub mod risk;
pub mod schema;
pub mod stats;
pub mod types;
pub mod validation;

pub use dataset::{Column, Dataset, Value};
pub use error::Error;
pub use types::{DType, Result};
