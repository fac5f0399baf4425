use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder};

use crate::dataset::Dataset;
use crate::types::Result;

use super::{build_dataset, DataReader};

/// CSV/TSV file reader
pub struct CsvReader {
    path: PathBuf,
    delimiter: u8,
}

impl CsvReader {
    /// Create a new CSV reader
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            delimiter: b',',
        })
    }

    /// Create a new TSV reader
    pub fn new_tsv(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            delimiter: b'\t',
        })
    }

    fn create_reader(&self) -> Result<Reader<BufReader<File>>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Ok(csv_reader)
    }

    fn dataset_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

impl DataReader for CsvReader {
    fn read(&mut self) -> Result<Dataset> {
        let mut reader = self.create_reader()?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        build_dataset(&self.dataset_name(), &headers, &rows)
    }
}
