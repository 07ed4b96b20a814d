//! Report assembly.
//!
//! Every output row is a [`ReportRow`] record with named fields; the column
//! order of the written table is declared once per [`Layout`] in
//! [`Layout::columns`].

pub mod columns;

use std::collections::HashMap;

use crate::matching::{MappingPair, PairingOutcome, ResolvedRow};
use crate::table::{CHANNEL_ID_COLUMN, CellValue, Table};

pub use columns::{Highlight, Layout, ReportColumn};

/// One output record. Empty strings stand for blank cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub channel_title: String,
    pub channel_normalized_title: String,
    pub channel_id: String,
    /// Original settlement cells, aligned with the settlement headers.
    pub settlement: Vec<String>,
    pub normalized_product: String,
    pub settlement_title: String,
    pub channel_mapping: String,
    pub master_mapping: String,
    pub channel_name_lookup: String,
    pub mapped_master_title: String,
    pub mapped_master_id: String,
    pub unmapped_master_title: String,
    pub unmapped_master_id: String,
    pub sorted_unmatched_title: String,
    pub row_unmatched_title: String,
}

impl ReportRow {
    pub fn with_channel(mut self, entry: &ChannelEntry) -> Self {
        self.channel_title = entry.title.clone();
        self.channel_normalized_title = entry.normalized_title.clone();
        self.channel_id = entry.id.clone();
        self
    }

    pub fn with_settlement(
        mut self,
        cells: Vec<String>,
        raw_title: &str,
        resolved: &ResolvedRow,
        unmatched: bool,
    ) -> Self {
        self.settlement = cells;
        self.normalized_product = resolved.normalized_product.clone();
        self.settlement_title = raw_title.to_string();
        self.channel_mapping = resolved.first_pass.to_string();
        self.master_mapping = resolved.final_result.to_string();
        if unmatched {
            self.row_unmatched_title = resolved.normalized_product.clone();
        }
        self
    }

    pub fn with_mapped(mut self, pair: &MappingPair, channel_name: &str) -> Self {
        self.mapped_master_title = pair.title.clone();
        self.mapped_master_id = pair.id.clone();
        self.channel_name_lookup = channel_name.to_string();
        self
    }

    pub fn with_unmapped(mut self, pair: &MappingPair) -> Self {
        self.unmapped_master_title = pair.title.clone();
        self.unmapped_master_id = pair.id.clone();
        self
    }

    pub fn with_sorted_unmatched(mut self, title: &str) -> Self {
        self.sorted_unmatched_title = title.to_string();
        self
    }

    pub fn value(&self, column: ReportColumn) -> &str {
        match column {
            ReportColumn::ChannelTitle => &self.channel_title,
            ReportColumn::ChannelNormalizedTitle => &self.channel_normalized_title,
            ReportColumn::ChannelId => &self.channel_id,
            ReportColumn::Settlement(i) => self.settlement.get(i).map_or("", String::as_str),
            ReportColumn::NormalizedProduct => &self.normalized_product,
            ReportColumn::SettlementTitle => &self.settlement_title,
            ReportColumn::ChannelMapping => &self.channel_mapping,
            ReportColumn::MasterMapping => &self.master_mapping,
            ReportColumn::ChannelNameLookup => &self.channel_name_lookup,
            ReportColumn::MappedMasterTitle => &self.mapped_master_title,
            ReportColumn::MappedMasterId => &self.mapped_master_id,
            ReportColumn::UnmappedMasterTitle => &self.unmapped_master_title,
            ReportColumn::UnmappedMasterId => &self.unmapped_master_id,
            ReportColumn::SortedUnmatchedTitle => &self.sorted_unmatched_title,
            ReportColumn::RowUnmatchedTitle => &self.row_unmatched_title,
        }
    }
}

/// One row of the channel content list as shown in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub title: String,
    pub normalized_title: String,
    pub id: String,
}

/// A secondary sheet (xlsx) or sibling file (csv).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideTable {
    pub sheet_name: &'static str,
    /// Suffix for the sibling CSV file name.
    pub file_suffix: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MappingReport {
    pub layout: Layout,
    pub settlement_headers: Vec<String>,
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<ReportRow>,
    pub side_tables: Vec<SideTable>,
}

impl MappingReport {
    pub fn headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.header(&self.settlement_headers))
            .collect()
    }

    pub fn record<'r>(&self, row: &'r ReportRow) -> Vec<&'r str> {
        self.columns.iter().map(|c| row.value(*c)).collect()
    }

    pub fn column_position(&self, column: ReportColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

/// Raw settlement title by normalized product. Later rows overwrite earlier ones.
struct TitleLookup<'a>(HashMap<&'a str, &'a str>);

impl<'a> TitleLookup<'a> {
    fn new(resolved: &'a [ResolvedRow], raw_titles: &'a [String]) -> Self {
        Self(
            resolved
                .iter()
                .zip(raw_titles)
                .map(|(r, t)| (r.normalized_product.as_str(), t.as_str()))
                .collect(),
        )
    }

    fn get(&self, title: &str) -> &'a str {
        if title.is_empty() {
            return "";
        }
        self.0.get(title).copied().unwrap_or("")
    }
}

/// Everything the assembler reads. All slices are aligned with their tables.
pub struct AssemblyInput<'a> {
    pub channel: &'a Table,
    pub channel_title_column: &'a str,
    pub channel_keys: &'a [String],
    pub settlement: &'a Table,
    pub settlement_title_column: &'a str,
    pub resolved: &'a [ResolvedRow],
    pub pairing: &'a PairingOutcome,
}

pub fn channel_entries(input: &AssemblyInput<'_>) -> Vec<ChannelEntry> {
    let title_idx = input.channel.column_index(input.channel_title_column);
    let id_idx = input.channel.column_index(CHANNEL_ID_COLUMN);
    let cell = |row: &[CellValue], idx: Option<usize>| {
        idx.map(|i| row[i].to_string()).unwrap_or_default()
    };
    input
        .channel
        .rows()
        .iter()
        .zip(input.channel_keys)
        .map(|(row, key)| ChannelEntry {
            title: cell(row.as_slice(), title_idx),
            normalized_title: key.clone(),
            id: cell(row.as_slice(), id_idx),
        })
        .collect()
}

/// Build the report. In the legacy layout, channel entries, pairs and
/// unmatched titles are attached by position, not by relation, and the table
/// is as tall as the longer of the channel list and the settlement.
pub fn assemble(input: &AssemblyInput<'_>, layout: Layout) -> MappingReport {
    let settlement_headers = input.settlement.headers().to_vec();
    let title_idx = input.settlement.column_index(input.settlement_title_column);
    let raw_titles: Vec<String> = input
        .settlement
        .rows()
        .iter()
        .map(|r| title_idx.map(|i| r[i].to_string()).unwrap_or_default())
        .collect();

    let lookup = TitleLookup::new(input.resolved, &raw_titles);

    let channel = channel_entries(input);
    let pairing = input.pairing;
    let height = match layout {
        Layout::Legacy => input.settlement.len().max(channel.len()),
        Layout::Relational => input.settlement.len(),
    };

    let mut rows = Vec::with_capacity(height);
    for i in 0..height {
        let mut row = ReportRow::default();
        if layout == Layout::Legacy {
            if let Some(entry) = channel.get(i) {
                row = row.with_channel(entry);
            }
        }
        if let (Some(cells), Some(resolved)) =
            (input.settlement.rows().get(i), input.resolved.get(i))
        {
            row = row.with_settlement(
                cells.iter().map(ToString::to_string).collect(),
                &raw_titles[i],
                resolved,
                pairing.is_unmatched(&resolved.normalized_product),
            );
        }
        if let Some(pair) = pairing.distinct.get(i) {
            row = row.with_mapped(pair, lookup.get(&pair.title));
        }
        if let Some(pair) = pairing.identity.get(i) {
            row = row.with_unmapped(pair);
        }
        if let Some(title) = pairing.unmatched.get(i) {
            row = row.with_sorted_unmatched(title);
        }
        rows.push(row);
    }

    let side_tables = match layout {
        Layout::Legacy => Vec::new(),
        Layout::Relational => relational_side_tables(&channel, pairing, &lookup),
    };

    MappingReport {
        layout,
        columns: layout.columns(settlement_headers.len()),
        settlement_headers,
        rows,
        side_tables,
    }
}

fn relational_side_tables(
    channel: &[ChannelEntry],
    pairing: &PairingOutcome,
    lookup: &TitleLookup<'_>,
) -> Vec<SideTable> {
    vec![
        SideTable {
            sheet_name: "S2_콘텐츠목록",
            file_suffix: "channel_list",
            headers: vec![
                columns::CHANNEL_TITLE,
                columns::CHANNEL_NORMALIZED_TITLE,
                columns::CHANNEL_ID,
            ],
            rows: channel
                .iter()
                .map(|e| vec![e.title.clone(), e.normalized_title.clone(), e.id.clone()])
                .collect(),
        },
        SideTable {
            sheet_name: "매핑_콘텐츠마스터",
            file_suffix: "mapped",
            headers: vec![
                columns::MAPPED_MASTER_TITLE,
                columns::MAPPED_MASTER_ID,
                columns::CHANNEL_NAME_LOOKUP,
            ],
            rows: pairing
                .distinct
                .iter()
                .map(|p| {
                    vec![
                        p.title.clone(),
                        p.id.clone(),
                        lookup.get(&p.title).to_string(),
                    ]
                })
                .collect(),
        },
        SideTable {
            sheet_name: "미매핑_콘텐츠마스터",
            file_suffix: "unmapped",
            headers: vec![columns::UNMAPPED_MASTER_TITLE],
            rows: pairing
                .identity
                .iter()
                .map(|p| vec![p.title.clone()])
                .collect(),
        },
        SideTable {
            sheet_name: "최종_미매핑",
            file_suffix: "unmatched",
            headers: vec![columns::SORTED_UNMATCHED_TITLE],
            rows: pairing.unmatched.iter().map(|t| vec![t.clone()]).collect(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ContentIndex;
    use crate::matching::{PairPartition, derive_pairs, resolve};
    use crate::normalize::RuleSet;

    struct Fixture {
        channel: Table,
        channel_keys: Vec<String>,
        settlement: Table,
        resolved: Vec<ResolvedRow>,
        pairing: PairingOutcome,
    }

    impl Fixture {
        fn new() -> Self {
            let channel = Table::from_rows(
                "channel",
                &["콘텐츠명", "판매채널콘텐츠ID"],
                &[&["채널 소설", "CH001"]],
            );
            let channel_keys = vec!["채널소설".to_string()];
            let settlement = Table::from_rows(
                "settlement",
                &["상품명", "금액"],
                &[
                    &["채널 소설 1권", "100"],
                    &["마스터 소설 (완결)", "200"],
                    &["없는 소설", "300"],
                    &["마스터 소설 2권", "400"],
                ],
            );
            let keys: Vec<String> = ["채널소설", "마스터소설", "없는소설", "마스터소설"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            let channel_index = ContentIndex::from_pairs(vec![("채널소설", "CH001")]);
            let master = ContentIndex::from_pairs(vec![("마스터소설", "M100")]);
            let resolved = resolve(&keys, &channel_index, &master, false);
            let pairing =
                derive_pairs(&resolved, &master, RuleSet::builtin(), PairPartition::TitleEquality);
            Self {
                channel,
                channel_keys,
                settlement,
                resolved,
                pairing,
            }
        }

        fn input(&self) -> AssemblyInput<'_> {
            AssemblyInput {
                channel: &self.channel,
                channel_title_column: "콘텐츠명",
                channel_keys: &self.channel_keys,
                settlement: &self.settlement,
                settlement_title_column: "상품명",
                resolved: &self.resolved,
                pairing: &self.pairing,
            }
        }
    }

    #[test]
    fn test_legacy_headers_follow_declared_order() {
        let f = Fixture::new();
        let report = assemble(&f.input(), Layout::Legacy);
        assert_eq!(
            report.headers(),
            vec![
                "S2_콘텐츠명",
                "S2_정제콘텐츠명",
                "S2_판매채널콘텐츠ID",
                "상품명",
                "금액",
                "정제_상품명",
                "정산서_콘텐츠명",
                "매핑_판매채널콘텐츠ID",
                "매핑_콘텐츠마스터ID",
                "판매채널_콘텐츠명",
                "매핑_콘텐츠마스터명",
                "매핑_콘텐츠마스터ID",
                "미매핑_콘텐츠마스터명",
            ]
        );
    }

    #[test]
    fn test_legacy_rows_attach_pairs_by_position() {
        let f = Fixture::new();
        let report = assemble(&f.input(), Layout::Legacy);
        assert_eq!(report.rows.len(), 4);

        let first = &report.rows[0];
        assert_eq!(first.channel_title, "채널 소설");
        assert_eq!(first.channel_id, "CH001");
        assert_eq!(first.channel_mapping, "CH001");
        assert_eq!(first.master_mapping, "CH001");
        // first distinct pair lands on row 0 regardless of where it came from
        assert_eq!(first.mapped_master_title, "마스터소설");
        assert_eq!(first.mapped_master_id, "M100");
        assert_eq!(first.channel_name_lookup, "마스터 소설 2권");
        assert_eq!(first.unmapped_master_title, "없는소설");

        let second = &report.rows[1];
        assert_eq!(second.channel_title, "");
        assert_eq!(second.normalized_product, "마스터소설");
        assert_eq!(second.settlement_title, "마스터 소설 (완결)");
        assert_eq!(second.channel_mapping, "마스터소설");
        assert_eq!(second.master_mapping, "M100");
        assert_eq!(second.mapped_master_title, "");
        assert_eq!(second.channel_name_lookup, "");
    }

    #[test]
    fn test_legacy_height_covers_longer_channel_list() {
        let mut f = Fixture::new();
        f.channel = Table::from_rows(
            "channel",
            &["콘텐츠명", "판매채널콘텐츠ID"],
            &[&["a", "1"], &["b", "2"], &["c", "3"], &["d", "4"], &["e", "5"]],
        );
        f.channel_keys = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let report = assemble(&f.input(), Layout::Legacy);
        assert_eq!(report.rows.len(), 5);
        let last = &report.rows[4];
        assert_eq!(last.channel_id, "5");
        assert_eq!(last.normalized_product, "");
        let amount = report.column_position(ReportColumn::Settlement(1)).unwrap();
        assert_eq!(report.record(last)[amount], "");
    }

    #[test]
    fn test_relational_layout_moves_lists_to_side_tables() {
        let f = Fixture::new();
        let report = assemble(&f.input(), Layout::Relational);
        assert_eq!(report.rows.len(), 4);
        assert!(report.column_position(ReportColumn::ChannelTitle).is_none());
        assert!(report.column_position(ReportColumn::MappedMasterTitle).is_none());
        assert!(report.column_position(ReportColumn::RowUnmatchedTitle).is_some());

        let mapped = report
            .side_tables
            .iter()
            .find(|t| t.file_suffix == "mapped")
            .unwrap();
        assert_eq!(
            mapped.rows,
            vec![vec![
                "마스터소설".to_string(),
                "M100".to_string(),
                "마스터 소설 2권".to_string()
            ]]
        );
        let unmapped = report
            .side_tables
            .iter()
            .find(|t| t.file_suffix == "unmapped")
            .unwrap();
        assert_eq!(unmapped.rows, vec![vec!["없는소설".to_string()]]);
    }

    #[test]
    fn test_hidden_internal_columns_are_still_computed() {
        let f = Fixture::new();
        let report = assemble(&f.input(), Layout::Legacy);
        assert_eq!(report.rows[0].unmapped_master_id, "없는소설");
        assert!(report.column_position(ReportColumn::UnmappedMasterId).is_none());
    }
}
