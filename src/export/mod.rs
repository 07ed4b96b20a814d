//! Report writers.
//!
//! Every output goes to a staging file first; the staged files are renamed
//! into place only after all of them were written, so a failed run leaves no
//! partial report behind.

pub mod csv_export;
pub mod xlsx_export;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::ExportFormat;
use crate::error::ExportError;
use crate::orchestrator::summary::RunSummary;
use crate::report::MappingReport;

enum Output<'a> {
    Workbook,
    Report,
    Side(&'a crate::report::SideTable),
    Summary,
}

/// `base` with `suffix` appended to its file name and `ext` as extension.
fn sibling(base: &Path, suffix: &str, ext: &str) -> PathBuf {
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{name}{suffix}.{ext}"))
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.partial"))
}

fn ensure_parent_dir(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Final output paths for `base` (no extension) and `format`.
pub fn output_paths(base: &Path, format: ExportFormat, report: &MappingReport) -> Vec<PathBuf> {
    planned(base, format, report)
        .into_iter()
        .map(|(path, _)| path)
        .collect()
}

fn planned<'a>(
    base: &Path,
    format: ExportFormat,
    report: &'a MappingReport,
) -> Vec<(PathBuf, Output<'a>)> {
    let mut out = Vec::new();
    if format.writes_xlsx() {
        out.push((sibling(base, "", "xlsx"), Output::Workbook));
    }
    if format.writes_csv() {
        out.push((sibling(base, "", "csv"), Output::Report));
        for table in &report.side_tables {
            out.push((
                sibling(base, &format!("_{}", table.file_suffix), "csv"),
                Output::Side(table),
            ));
        }
        out.push((sibling(base, "_summary", "csv"), Output::Summary));
    }
    out
}

fn write_one(
    path: &Path,
    output: &Output<'_>,
    report: &MappingReport,
    summary: &RunSummary,
) -> Result<(), ExportError> {
    match output {
        Output::Workbook => xlsx_export::export_report_xlsx(path, report, summary),
        Output::Report => csv_export::export_report_csv(path, report),
        Output::Side(table) => csv_export::export_side_table_csv(path, table),
        Output::Summary => csv_export::export_summary_csv(path, summary),
    }
}

fn discard(staged: &[PathBuf]) {
    for p in staged {
        if let Err(e) = fs::remove_file(p) {
            warn!("could not remove staging file {}: {}", p.display(), e);
        }
    }
}

/// Write every output for `format` under `base` and return the final paths.
pub fn write_outputs(
    base: &Path,
    format: ExportFormat,
    report: &MappingReport,
    summary: &RunSummary,
) -> Result<Vec<PathBuf>, ExportError> {
    ensure_parent_dir(base)?;
    let plan = planned(base, format, report);

    let mut staged = Vec::with_capacity(plan.len());
    for (target, output) in &plan {
        let stage = staging_path(target);
        staged.push(stage.clone());
        if let Err(e) = write_one(&stage, output, report, summary) {
            discard(&staged);
            return Err(e);
        }
        debug!("staged {}", stage.display());
    }

    let mut committed = Vec::with_capacity(plan.len());
    for ((target, _), stage) in plan.iter().zip(&staged) {
        if let Err(e) = fs::rename(stage, target) {
            discard(&staged[committed.len()..]);
            for p in &committed {
                let _ = fs::remove_file(p);
            }
            return Err(e.into());
        }
        committed.push(target.clone());
    }
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, SourceTables, run_mapping};
    use crate::normalize::RuleSet;
    use crate::orchestrator::summary::SummaryBuilder;
    use crate::report::Layout;
    use crate::table::Table;

    fn report(layout: Layout) -> MappingReport {
        let tables = SourceTables {
            channel: Table::from_rows("c.csv", &["콘텐츠명", "판매채널콘텐츠ID"], &[&["a", "1"]]),
            settlement: Table::from_rows("s.csv", &["상품명"], &[&["a"], &["b"]]),
            master: Table::from_rows("m.csv", &["콘텐츠명", "ID"], &[&["b", "M1"]]),
        };
        let opts = EngineOptions {
            layout,
            parallel: false,
        };
        run_mapping(&tables, RuleSet::builtin(), opts).unwrap().report
    }

    #[test]
    fn test_naming_of_outputs() {
        let base = Path::new("out/정산_매핑");
        let paths = output_paths(base, ExportFormat::Both, &report(Layout::Relational));
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "정산_매핑.xlsx",
                "정산_매핑.csv",
                "정산_매핑_channel_list.csv",
                "정산_매핑_mapped.csv",
                "정산_매핑_unmapped.csv",
                "정산_매핑_unmatched.csv",
                "정산_매핑_summary.csv",
            ]
        );
        assert_eq!(
            staging_path(&paths[0]),
            PathBuf::from("out/.정산_매핑.xlsx.partial")
        );
    }

    #[test]
    fn test_writes_all_outputs_and_leaves_no_staging_files() {
        let dir = std::env::temp_dir().join("content_mapper_write_outputs");
        let _ = fs::remove_dir_all(&dir);
        let base = dir.join("report");
        let summary = SummaryBuilder::new("레진KR", "builtin-1").build();
        let written =
            write_outputs(&base, ExportFormat::Both, &report(Layout::Legacy), &summary).unwrap();
        assert_eq!(written.len(), 3);
        for p in &written {
            assert!(fs::metadata(p).unwrap().len() > 0);
        }
        let leftovers = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
