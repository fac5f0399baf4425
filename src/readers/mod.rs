pub mod csv;
pub mod excel;

use std::path::Path;

use crate::dataset::{Column, Dataset};
use crate::inference::{parse_cell, TypeInferencer};
use crate::types::{FileFormat, Result};

/// Common trait for tabular file readers
pub trait DataReader {
    /// Read the file into a typed dataset
    fn read(&mut self) -> Result<Dataset>;
}

/// Create a reader for the given file path
pub fn create_reader(path: &Path) -> Result<Box<dyn DataReader>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let format = FileFormat::from_extension(ext).ok_or_else(|| {
        crate::error::Error::UnsupportedFormat(format!(
            "Unsupported file extension: .{}",
            ext
        ))
    })?;

    match format {
        FileFormat::Csv => Ok(Box::new(csv::CsvReader::new(path)?)),
        FileFormat::Tsv => Ok(Box::new(csv::CsvReader::new_tsv(path)?)),
        FileFormat::Excel => Ok(Box::new(excel::ExcelReader::new(path)?)),
    }
}

/// Load a dataset, choosing the reader from the file extension
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    create_reader(path)?.read()
}

/// Infer column types from raw string cells and build a dataset.
///
/// Rows shorter than the header are padded with missing cells; extra cells
/// are ignored.
pub(crate) fn build_dataset(
    name: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<Dataset> {
    let mut inferencers: Vec<TypeInferencer> =
        headers.iter().map(|_| TypeInferencer::new()).collect();

    for row in rows {
        for (inf, field) in inferencers.iter_mut().zip(row) {
            inf.observe(field);
        }
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let dtype = inferencers[col_idx].inferred_type();
            let values = rows
                .iter()
                .map(|row| parse_cell(row.get(col_idx).map_or("", String::as_str), dtype))
                .collect();
            Column::new(header.trim(), dtype, values)
        })
        .collect();

    Dataset::from_columns(name, columns)
}
