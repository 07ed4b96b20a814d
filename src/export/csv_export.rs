use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExportError;
use crate::orchestrator::summary::RunSummary;
use crate::report::{MappingReport, SideTable};

fn writer(path: &Path) -> Result<Writer<BufWriter<File>>, ExportError> {
    let file = File::create(path)?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    Ok(WriterBuilder::new().from_writer(buf_writer))
}

/// Main table in declared column order. Hidden columns are kept.
pub fn export_report_csv(path: &Path, report: &MappingReport) -> Result<(), ExportError> {
    let mut w = writer(path)?;
    w.write_record(report.headers())?;
    for row in &report.rows {
        w.write_record(report.record(row))?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_side_table_csv(path: &Path, table: &SideTable) -> Result<(), ExportError> {
    let mut w = writer(path)?;
    w.write_record(&table.headers)?;
    for row in &table.rows {
        w.write_record(row)?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_summary_csv(path: &Path, summary: &RunSummary) -> Result<(), ExportError> {
    let mut w = writer(path)?;
    w.write_record(["Key", "Value"])?;
    for (k, v) in summary.entries() {
        w.write_record([k, v.as_str()])?;
    }
    w.flush()?;
    Ok(())
}
