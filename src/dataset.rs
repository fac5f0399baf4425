use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Error;
use crate::types::{DType, Result};

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Binary flag value (0 or 1)
    pub fn flag(set: bool) -> Self {
        Value::Int(i64::from(set))
    }

    /// Float value, mapping NaN and infinities to `Null`
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value; booleans count as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn dtype(&self) -> Option<DType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DType::Boolean),
            Value::Int(_) => Some(DType::Integer),
            Value::Float(_) => Some(DType::Numeric),
            Value::Text(_) => Some(DType::String),
            Value::Date(_) => Some(DType::Date),
            Value::DateTime(_) => Some(DType::Datetime),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Build a column whose type is derived from its values.
    ///
    /// Integer and float cells together give `numeric`; other mixtures fall
    /// back to `string`. An all-null column is `numeric`, like a column of NaN.
    pub fn derived(name: impl Into<String>, values: Vec<Value>) -> Self {
        let mut dtype: Option<DType> = None;
        for value in &values {
            let Some(next) = value.dtype() else {
                continue;
            };
            dtype = Some(match dtype {
                None => next,
                Some(current) if current == next => current,
                Some(current) if current.is_numeric() && next.is_numeric() => DType::Numeric,
                Some(_) => DType::String,
            });
        }
        Self::new(name, dtype.unwrap_or(DType::Numeric), values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Numeric view of every cell (`None` for nulls and non-numeric cells)
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_f64).collect()
    }

    /// Non-null numeric cells
    pub fn present_numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    /// Number of distinct non-null values
    pub fn distinct_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Cells equal to an earlier cell; nulls compare equal to each other
    pub fn duplicate_count(&self) -> usize {
        let mut seen = HashSet::new();
        self.values.iter().filter(|v| !seen.insert(row_key(v))).count()
    }
}

/// An ordered collection of equally long columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut dataset = Self::new(name);
        for column in columns {
            if dataset.has_column(column.name()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate column name '{}'",
                    column.name()
                )));
            }
            dataset.push_column(column)?;
        }
        Ok(dataset)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Return a copy of the dataset with `column` appended, or replacing the
    /// existing column of the same name at its current position.
    pub fn with_column(&self, column: Column) -> Result<Dataset> {
        let mut next = self.clone();
        next.push_column(column)?;
        Ok(next)
    }

    pub fn with_columns(&self, columns: Vec<Column>) -> Result<Dataset> {
        let mut next = self.clone();
        for column in columns {
            next.push_column(column)?;
        }
        Ok(next)
    }

    fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(Error::InvalidArgument(format!(
                "Column '{}' has {} rows, dataset has {}",
                column.name(),
                column.len(),
                self.row_count()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keep the rows where `mask` is true
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Dataset> {
        if mask.len() != self.row_count() {
            return Err(Error::InvalidArgument(format!(
                "Mask has {} entries, dataset has {} rows",
                mask.len(),
                self.row_count()
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = c
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect();
                Column::new(c.name.clone(), c.dtype, values)
            })
            .collect();
        Ok(Dataset {
            name: self.name.clone(),
            columns,
        })
    }

    /// Cells of row `index`, in column order
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }

    /// Rows identical to an earlier row
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = HashSet::new();
        (0..self.row_count())
            .filter(|&i| {
                let key: Vec<String> = self.row(i).iter().map(|v| row_key(v)).collect();
                !seen.insert(key)
            })
            .count()
    }
}

/// Hashable representation that keeps null distinct from empty text
fn row_key(value: &Value) -> String {
    match value {
        Value::Null => "\u{0}null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a dataset from `(name, values)` pairs with derived dtypes
    pub fn dataset(columns: Vec<(&str, Vec<Value>)>) -> Dataset {
        let columns = columns
            .into_iter()
            .map(|(name, values)| Column::derived(name, values))
            .collect();
        Dataset::from_columns("test", columns).unwrap()
    }

    pub fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int(v)).collect()
    }

    pub fn floats(values: &[f64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Float(v)).collect()
    }

    pub fn texts(values: &[Option<&str>]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }
}
