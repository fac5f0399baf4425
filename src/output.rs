use crate::dataset::Dataset;
use crate::types::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Write any serializable value to a pretty-printed JSON file
pub fn write_json_file<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn write_json_stdout<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = to_json_string(value)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}

/// Serialize a dataset as CSV with a header row; nulls become empty cells
pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.column_names())?;
    for row in 0..dataset.row_count() {
        csv_writer.write_record(dataset.row(row).iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(dataset, std::io::BufWriter::new(file))
}

fn aligned_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell, w = w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render rows as a plain aligned text table
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    let dashes: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();

    let mut out = String::new();
    out.push_str(&aligned_line(headers, &widths));
    out.push('\n');
    out.push_str(&aligned_line(
        &dashes.iter().map(String::as_str).collect::<Vec<_>>(),
        &widths,
    ));
    out.push('\n');
    for row in rows {
        out.push_str(&aligned_line(
            &row.iter().map(String::as_str).collect::<Vec<_>>(),
            &widths,
        ));
        out.push('\n');
    }
    out
}
