//! In-memory tables as loaded from the input files.
//!
//! Tables are fully materialized before the mapping core sees them and are
//! never mutated by it; derived values live in their own vectors.

pub mod csv_source;
pub mod xlsx_source;

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{MappingError, TableError};

pub use csv_source::load_csv_table;
pub use xlsx_source::load_xlsx_table;

/// Title columns of the sales-channel content list, in priority order.
pub const CHANNEL_TITLE_CANDIDATES: &[&str] =
    &["콘텐츠명", "콘텐츠 제목", "Title", "ContentName", "제목"];

/// Title columns of a platform settlement report, in priority order.
pub const SETTLEMENT_TITLE_CANDIDATES: &[&str] = &[
    "컨텐츠",
    "타이틀",
    "작품명",
    "도서명",
    "작품 제목",
    "상품명",
    "이용상품명",
    "상품 제목",
    "ProductName",
    "Title",
    "제목",
    "컨텐츠명",
    "콘텐츠명",
    "시리즈명",
];

/// Title columns of a content-master reference table, in priority order.
pub const MASTER_TITLE_CANDIDATES: &[&str] =
    &["콘텐츠명", "콘텐츠 제목", "Title", "ContentName", "제목"];

/// Identifier columns of a content-master reference table, in priority order.
pub const MASTER_ID_CANDIDATES: &[&str] = &["판매채널콘텐츠ID", "콘텐츠ID", "ID", "ContentID"];

/// Native identifier column of the sales-channel content list.
pub const CHANNEL_ID_COLUMN: &str = "판매채널콘텐츠ID";

/// A single cell. Dates are kept apart from text so the normalizer can tell a
/// genuine calendar date from a title that merely looks like one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    /// `raw` is what the source held and what gets written back out.
    Date { date: NaiveDate, raw: String },
}

impl CellValue {
    /// Classify raw cell text. Strict ISO dates, optionally with a
    /// `HH:MM:SS` time part, become [`CellValue::Date`].
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return CellValue::Empty;
        }
        if let Some(d) = parse_date_strict(s) {
            return CellValue::date(d, raw);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn date(date: NaiveDate, raw: impl Into<String>) -> Self {
        CellValue::Date {
            date,
            raw: raw.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Date { .. } => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date { raw, .. } => f.write_str(raw),
        }
    }
}

fn parse_date_strict(s: &str) -> Option<NaiveDate> {
    match s.len() {
        10 => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
        19 => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Make header names unique. A repeated name gets a `.N` suffix, counting
/// from 1 for its second occurrence, so `금액,금액` reads as `금액,금액.1`.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for h in headers {
        let mut name = h.clone();
        let mut n = 0;
        while out.contains(&name) {
            n += 1;
            name = format!("{h}.{n}");
        }
        out.push(name);
    }
    out
}

impl Table {
    /// Create an empty table. Duplicate header names are suffixed, see
    /// [`dedupe_headers`].
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers: dedupe_headers(headers),
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; mostly useful for fixtures.
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut t = Table::new(name, headers.iter().map(|h| h.to_string()).collect());
        for r in rows {
            t.push_row(r.iter().map(|c| CellValue::parse(c)).collect());
        }
        t
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of the named column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Like [`Table::column`] but a missing column is a `MissingColumn` error.
    pub fn require_column(&self, name: &str) -> Result<Vec<&CellValue>, MappingError> {
        self.column(name).ok_or_else(|| MappingError::MissingColumn {
            table: self.name.clone(),
            candidates: vec![name.to_string()],
        })
    }

    /// Return the first candidate that is an actual column name.
    pub fn pick_column<'c>(&self, candidates: &[&'c str]) -> Result<&'c str, MappingError> {
        candidates
            .iter()
            .copied()
            .find(|c| self.column_index(c).is_some())
            .ok_or_else(|| MappingError::MissingColumn {
                table: self.name.clone(),
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            })
    }

    /// Stack tables vertically. Headers are the union of all headers in
    /// first-appearance order; cells a source table lacks stay empty.
    /// Header names are unique within each source, so every source column
    /// lands in exactly one output column.
    pub fn concat(name: impl Into<String>, tables: Vec<Table>) -> Table {
        let mut headers: Vec<String> = Vec::new();
        for t in &tables {
            for h in &t.headers {
                if !headers.contains(h) {
                    headers.push(h.clone());
                }
            }
        }
        let mut out = Table::new(name, headers);
        for t in tables {
            let positions: Vec<Option<usize>> =
                t.headers.iter().map(|h| out.column_index(h)).collect();
            for row in t.rows {
                let mut cells = vec![CellValue::Empty; out.headers.len()];
                for (cell, pos) in row.into_iter().zip(&positions) {
                    if let Some(pos) = *pos {
                        cells[pos] = cell;
                    }
                }
                out.rows.push(cells);
            }
        }
        out
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xls"))
}

/// Load one input file, picking the reader by extension. Workbooks are read
/// with every sheet stacked in order; anything else is read as CSV.
pub fn load_table(path: &Path) -> Result<Table, TableError> {
    if is_workbook(path) {
        load_xlsx_table(path)
    } else {
        load_csv_table(path)
    }
}

/// Load several input files of any supported kind and stack them.
pub fn load_tables<P: AsRef<Path>>(name: &str, paths: &[P]) -> Result<Table, TableError> {
    let tables = paths
        .iter()
        .map(|p| load_table(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::concat(name, tables))
}
