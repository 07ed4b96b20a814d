use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("invalid normalization rule at line {line}: {reason}")]
    InvalidRule { line: usize, reason: String },
}

/// Fatal conditions of a mapping run. Either aborts the whole run.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("no candidate column found in {table}: {candidates:?}")]
    MissingColumn {
        table: String,
        candidates: Vec<String>,
    },
    #[error("reference table for {profile} not found at {}", path.display())]
    MissingReferenceFile { profile: String, path: PathBuf },
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("output file error: {0}")]
    Io(#[from] std::io::Error),
}
