use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::matching::PairPartition;

pub const CHANNEL_TITLE: &str = "S2_콘텐츠명";
pub const CHANNEL_NORMALIZED_TITLE: &str = "S2_정제콘텐츠명";
pub const CHANNEL_ID: &str = "S2_판매채널콘텐츠ID";
pub const NORMALIZED_PRODUCT: &str = "정제_상품명";
pub const SETTLEMENT_TITLE: &str = "정산서_콘텐츠명";
pub const CHANNEL_MAPPING: &str = "매핑_판매채널콘텐츠ID";
pub const MASTER_MAPPING: &str = "매핑_콘텐츠마스터ID";
pub const CHANNEL_NAME_LOOKUP: &str = "판매채널_콘텐츠명";
pub const MAPPED_MASTER_TITLE: &str = "매핑_콘텐츠마스터명";
// Same label as MASTER_MAPPING in the legacy workbook.
pub const MAPPED_MASTER_ID: &str = "매핑_콘텐츠마스터ID";
pub const UNMAPPED_MASTER_TITLE: &str = "미매핑_콘텐츠마스터명";
pub const UNMAPPED_MASTER_ID: &str = "동일_콘텐츠ID";
pub const SORTED_UNMATCHED_TITLE: &str = "최종_정렬된_매핑되지않은_상품명";
pub const ROW_UNMATCHED_TITLE: &str = "최종_매핑되지않은_상품명";

/// Output row layout.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// The legacy workbook: lists attached to the row table by position.
    #[default]
    Legacy,
    /// Row-aligned columns only; pair and unmatched lists as separate tables.
    Relational,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Relational => "relational",
        }
    }

    /// Legacy consumers expect the workbook's string comparisons.
    pub fn pair_partition(&self) -> PairPartition {
        match self {
            Self::Legacy => PairPartition::TitleEquality,
            Self::Relational => PairPartition::ByResolution,
        }
    }

    /// Declared column order for a settlement table with `settlement_width` columns.
    pub fn columns(&self, settlement_width: usize) -> Vec<ReportColumn> {
        use ReportColumn::*;
        let settlement = (0..settlement_width).map(Settlement);
        match self {
            Self::Legacy => [ChannelTitle, ChannelNormalizedTitle, ChannelId]
                .into_iter()
                .chain(settlement)
                .chain([
                    NormalizedProduct,
                    SettlementTitle,
                    ChannelMapping,
                    MasterMapping,
                    ChannelNameLookup,
                    MappedMasterTitle,
                    MappedMasterId,
                    UnmappedMasterTitle,
                ])
                .collect(),
            Self::Relational => settlement
                .chain([
                    NormalizedProduct,
                    SettlementTitle,
                    ChannelMapping,
                    MasterMapping,
                    RowUnmatchedTitle,
                ])
                .collect(),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Header emphasis tiers of the output workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Mapped,
    Unmapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportColumn {
    ChannelTitle,
    ChannelNormalizedTitle,
    ChannelId,
    /// Original settlement column by position.
    Settlement(usize),
    NormalizedProduct,
    SettlementTitle,
    ChannelMapping,
    MasterMapping,
    ChannelNameLookup,
    MappedMasterTitle,
    MappedMasterId,
    UnmappedMasterTitle,
    UnmappedMasterId,
    SortedUnmatchedTitle,
    RowUnmatchedTitle,
}

impl ReportColumn {
    pub fn header<'a>(&self, settlement_headers: &'a [String]) -> &'a str {
        match self {
            Self::ChannelTitle => CHANNEL_TITLE,
            Self::ChannelNormalizedTitle => CHANNEL_NORMALIZED_TITLE,
            Self::ChannelId => CHANNEL_ID,
            Self::Settlement(i) => settlement_headers.get(*i).map_or("", String::as_str),
            Self::NormalizedProduct => NORMALIZED_PRODUCT,
            Self::SettlementTitle => SETTLEMENT_TITLE,
            Self::ChannelMapping => CHANNEL_MAPPING,
            Self::MasterMapping => MASTER_MAPPING,
            Self::ChannelNameLookup => CHANNEL_NAME_LOOKUP,
            Self::MappedMasterTitle => MAPPED_MASTER_TITLE,
            Self::MappedMasterId => MAPPED_MASTER_ID,
            Self::UnmappedMasterTitle => UNMAPPED_MASTER_TITLE,
            Self::UnmappedMasterId => UNMAPPED_MASTER_ID,
            Self::SortedUnmatchedTitle => SORTED_UNMATCHED_TITLE,
            Self::RowUnmatchedTitle => ROW_UNMATCHED_TITLE,
        }
    }

    pub fn highlight(&self) -> Option<Highlight> {
        match self {
            Self::MappedMasterTitle
            | Self::MappedMasterId
            | Self::MasterMapping
            | Self::ChannelNameLookup => Some(Highlight::Mapped),
            Self::UnmappedMasterTitle => Some(Highlight::Unmapped),
            _ => None,
        }
    }

    /// Columns outside this allow-list are written but hidden.
    pub fn is_visible(&self) -> bool {
        matches!(
            self,
            Self::ChannelTitle
                | Self::ChannelNormalizedTitle
                | Self::ChannelId
                | Self::NormalizedProduct
                | Self::SettlementTitle
                | Self::ChannelMapping
                | Self::MasterMapping
                | Self::ChannelNameLookup
                | Self::MappedMasterTitle
                | Self::MappedMasterId
                | Self::UnmappedMasterTitle
                | Self::RowUnmatchedTitle
        )
    }
}
