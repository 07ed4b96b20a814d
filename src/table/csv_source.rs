use std::path::Path;

use csv::ReaderBuilder;
use log::debug;

use super::{CellValue, Table};
use crate::error::TableError;

const UTF8_BOM: char = '\u{feff}';

/// Read a CSV file with a header row into a [`Table`] named after the file.
pub fn load_csv_table(path: &Path) -> Result<Table, TableError> {
    let wrap = |source: csv::Error| TableError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .map_err(wrap)?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(wrap)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches(UTF8_BOM) } else { h };
            h.trim().to_string()
        })
        .collect();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut table = Table::new(name, headers);
    for record in rdr.records() {
        let record = record.map_err(wrap)?;
        table.push_row(record.iter().map(CellValue::parse).collect());
    }
    debug!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}
