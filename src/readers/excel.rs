use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};

use crate::dataset::Dataset;
use crate::error::Error;
use crate::types::Result;

use super::{build_dataset, DataReader};

/// Excel file reader (supports .xlsx, .xls, .xlsm, .xlsb).
///
/// Reads the first worksheet; its first row is the header.
pub struct ExcelReader {
    path: PathBuf,
}

impl ExcelReader {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Convert Excel Data to string representation
    fn data_to_string(dt: &Data) -> String {
        match dt {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(d) => Self::excel_serial_to_date_string(d.as_f64()),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            // Error cells (#N/A, #DIV/0!) load as missing
            Data::Error(_) => String::new(),
        }
    }

    /// Convert Excel serial date to ISO date string
    fn excel_serial_to_date_string(serial: f64) -> String {
        // Excel epoch is 1899-12-30 (with the 1900 leap year bug)
        let days = serial as i64;
        chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|base| base.checked_add_signed(chrono::Duration::days(days)))
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| serial.to_string())
    }
}

impl DataReader for ExcelReader {
    fn read(&mut self) -> Result<Dataset> {
        let mut workbook = open_workbook_auto(&self.path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::InvalidInput("Workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(Self::data_to_string).collect::<Vec<String>>());

        let headers = rows.next().unwrap_or_default();
        let data_rows: Vec<Vec<String>> = rows.collect();

        build_dataset(&sheet_name, &headers, &data_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_to_string() {
        assert_eq!(ExcelReader::data_to_string(&Data::Empty), "");
        assert_eq!(
            ExcelReader::data_to_string(&Data::String("low".to_string())),
            "low"
        );
        assert_eq!(ExcelReader::data_to_string(&Data::Int(42)), "42");
        assert_eq!(ExcelReader::data_to_string(&Data::Float(0.38)), "0.38");
        assert_eq!(ExcelReader::data_to_string(&Data::Float(3.0)), "3");
        assert_eq!(ExcelReader::data_to_string(&Data::Bool(true)), "true");
    }

    #[test]
    fn test_excel_serial_to_date() {
        // Excel serial date 44927 should be 2023-01-01
        let result = ExcelReader::excel_serial_to_date_string(44927.0);
        assert_eq!(result, "2023-01-01");
    }

    #[test]
    fn test_missing_workbook_is_error() {
        let mut reader = ExcelReader::new(Path::new("/nonexistent/staff.xlsx")).unwrap();
        assert!(reader.read().is_err());
    }
}
