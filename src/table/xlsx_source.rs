use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveTime;
use log::debug;

use super::{CellValue, Table};
use crate::error::TableError;

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::parse(s),
        Data::DateTimeIso(s) => CellValue::parse(s),
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(ts) => {
                let raw = if ts.time() == NaiveTime::MIN {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                };
                CellValue::date(ts.date(), raw)
            }
            None => CellValue::text(cell.to_string()),
        },
        other => CellValue::text(other.to_string()),
    }
}

/// Read every sheet of a workbook, first row as headers, and stack the sheets
/// in workbook order. Sheets without a header row are skipped.
pub fn load_xlsx_table(path: &Path) -> Result<Table, TableError> {
    let wrap = |source: calamine::Error| TableError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(wrap)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut sheets = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook.worksheet_range(&sheet).map_err(wrap)?;
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            debug!("skipping empty sheet {} in {}", sheet, path.display());
            continue;
        };
        let headers = header_row
            .iter()
            .map(|h| h.to_string().trim().to_string())
            .collect();
        let mut table = Table::new(format!("{name}:{sheet}"), headers);
        for row in rows {
            table.push_row(row.iter().map(cell_value).collect());
        }
        debug!(
            "loaded {} rows x {} columns from sheet {} of {}",
            table.len(),
            table.headers().len(),
            sheet,
            path.display()
        );
        sheets.push(table);
    }
    Ok(Table::concat(name, sheets))
}
