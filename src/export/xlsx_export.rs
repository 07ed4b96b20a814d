use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::error::ExportError;
use crate::orchestrator::summary::RunSummary;
use crate::report::{Highlight, MappingReport, SideTable};

pub const REPORT_SHEET: &str = "매핑결과";
pub const SUMMARY_SHEET: &str = "Summary";

const MAPPED_FILL: u32 = 0xFFFFCC;
const UNMAPPED_FILL: u32 = 0x99FFCC;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
}

fn highlight_format(highlight: Option<Highlight>) -> Format {
    match highlight {
        Some(Highlight::Mapped) => header_format().set_background_color(Color::RGB(MAPPED_FILL)),
        Some(Highlight::Unmapped) => {
            header_format().set_background_color(Color::RGB(UNMAPPED_FILL))
        }
        None => header_format(),
    }
}

/// Header length or first value length, whichever is longer, plus one.
fn column_width(header: &str, first_value: Option<&str>) -> f64 {
    let header_len = header.chars().count();
    let value_len = first_value.map_or(0, |v| v.chars().count());
    (header_len.max(value_len) + 1) as f64
}

fn write_report_sheet(ws: &mut Worksheet, report: &MappingReport) -> Result<(), ExportError> {
    let headers = report.headers();
    let first = report.rows.first().map(|r| report.record(r));

    for (c, (column, header)) in report.columns.iter().zip(&headers).enumerate() {
        let col = c as u16;
        ws.write_string_with_format(0, col, *header, &highlight_format(column.highlight()))?;
        let first_value = first.as_ref().map(|values| values[c]);
        ws.set_column_width(col, column_width(header, first_value))?;
        if !column.is_visible() {
            ws.set_column_hidden(col)?;
        }
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = (i as u32) + 1;
        for (c, value) in report.record(row).into_iter().enumerate() {
            if !value.is_empty() {
                ws.write_string(r, c as u16, value)?;
            }
        }
    }
    Ok(())
}

fn write_side_sheet(ws: &mut Worksheet, table: &SideTable) -> Result<(), ExportError> {
    let hfmt = header_format();
    for (c, h) in table.headers.iter().enumerate() {
        let col = c as u16;
        ws.write_string_with_format(0, col, *h, &hfmt)?;
        let first_value = table.rows.first().and_then(|r| r.get(c)).map(String::as_str);
        ws.set_column_width(col, column_width(h, first_value))?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                ws.write_string((i as u32) + 1, c as u16, value)?;
            }
        }
    }
    Ok(())
}

/// Widest key in characters, plus one.
fn key_column_width<'a>(keys: impl Iterator<Item = &'a str>) -> f64 {
    let widest = keys.map(|k| k.chars().count()).max().unwrap_or(3);
    (widest + 1) as f64
}

fn write_summary_sheet(ws: &mut Worksheet, summary: &RunSummary) -> Result<(), ExportError> {
    let hfmt = header_format();
    ws.write_string_with_format(0, 0, "Key", &hfmt)?;
    ws.write_string_with_format(0, 1, "Value", &hfmt)?;
    let entries = summary.entries();
    ws.set_column_width(0, key_column_width(entries.iter().map(|(k, _)| *k)))?;
    ws.set_column_width(1, 40.0)?;
    for (i, (k, v)) in entries.iter().enumerate() {
        let r = (i as u32) + 1;
        ws.write_string(r, 0, *k)?;
        ws.write_string(r, 1, v)?;
    }
    Ok(())
}

/// Write the report workbook: the main sheet, one sheet per side table and a
/// summary sheet.
pub fn export_report_xlsx(
    path: &Path,
    report: &MappingReport,
    summary: &RunSummary,
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();

    let ws = workbook.add_worksheet();
    ws.set_name(REPORT_SHEET)?;
    write_report_sheet(ws, report)?;

    for table in &report.side_tables {
        let ws = workbook.add_worksheet();
        ws.set_name(table.sheet_name)?;
        write_side_sheet(ws, table)?;
    }

    let ws = workbook.add_worksheet();
    ws.set_name(SUMMARY_SHEET)?;
    write_summary_sheet(ws, summary)?;

    workbook.save(path)?;
    Ok(())
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
            channel: Table::from_rows(
                "channel.csv",
                &["콘텐츠명", "판매채널콘텐츠ID"],
                &[&["검신", "CH001"]],
            ),
            settlement: Table::from_rows(
                "settlement.csv",
                &["상품명", "금액"],
                &[&["검신 1권", "100"], &["마스터 소설", "200"], &["없는 소설", "300"]],
            ),
            master: Table::from_rows("master.csv", &["콘텐츠명", "ID"], &[&["마스터 소설", "M1"]]),
        };
        let opts = EngineOptions {
            layout,
            parallel: false,
        };
        run_mapping(&tables, RuleSet::builtin(), opts).unwrap().report
    }

    #[test]
    fn test_summary_key_width_counts_characters() {
        assert_eq!(key_column_width(["메모리", "Key"].into_iter()), 4.0);
        assert_eq!(key_column_width(std::iter::empty()), 4.0);
    }

    #[test]
    fn test_width_uses_longer_of_header_and_first_value() {
        assert_eq!(column_width("ID", Some("CH0001")), 7.0);
        assert_eq!(column_width("정제_상품명", Some("")), 7.0);
        assert_eq!(column_width("금액", None), 3.0);
    }

    #[test]
    fn test_write_legacy_workbook() {
        let out = std::env::temp_dir().join("content_mapper_legacy_test.xlsx");
        let _ = std::fs::remove_file(&out);
        let summary = SummaryBuilder::new("키다리스튜디오 소설", "builtin-1").build();
        export_report_xlsx(&out, &report(Layout::Legacy), &summary).unwrap();
        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn test_write_relational_workbook_with_side_sheets() {
        let out = std::env::temp_dir().join("content_mapper_relational_test.xlsx");
        let _ = std::fs::remove_file(&out);
        let report = report(Layout::Relational);
        assert_eq!(report.side_tables.len(), 4);
        let summary = SummaryBuilder::new("레진KR", "builtin-1")
            .with_layout(Layout::Relational)
            .build();
        export_report_xlsx(&out, &report, &summary).unwrap();
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
    }
}
