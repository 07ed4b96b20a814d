//! The mapping core, end to end: three loaded tables in, one assembled report
//! out. Nothing here touches the filesystem.

use log::{debug, info};

use crate::error::MappingError;
use crate::index::{ContentIndex, build_index_with_keys};
use crate::matching::{PairingOutcome, ResolvedRow, derive_pairs, resolve};
use crate::normalize::{RuleSet, normalize_column};
use crate::report::{AssemblyInput, Layout, MappingReport, assemble};
use crate::table::{
    CHANNEL_ID_COLUMN, CHANNEL_TITLE_CANDIDATES, MASTER_ID_CANDIDATES, MASTER_TITLE_CANDIDATES,
    SETTLEMENT_TITLE_CANDIDATES, Table,
};

/// The materialized inputs of one run.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub channel: Table,
    pub settlement: Table,
    pub master: Table,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub layout: Layout,
    pub parallel: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Legacy,
            parallel: true,
        }
    }
}

/// Columns picked from the candidate lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub channel_title: &'static str,
    pub settlement_title: &'static str,
    pub master_title: &'static str,
    pub master_id: &'static str,
}

impl ResolvedColumns {
    pub fn pick(tables: &SourceTables) -> Result<Self, MappingError> {
        let columns = Self {
            channel_title: tables.channel.pick_column(CHANNEL_TITLE_CANDIDATES)?,
            settlement_title: tables.settlement.pick_column(SETTLEMENT_TITLE_CANDIDATES)?,
            master_title: tables.master.pick_column(MASTER_TITLE_CANDIDATES)?,
            master_id: tables.master.pick_column(MASTER_ID_CANDIDATES)?,
        };
        tables.channel.require_column(CHANNEL_ID_COLUMN)?;
        Ok(columns)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub channel_rows: usize,
    pub settlement_rows: usize,
    pub master_rows: usize,
    pub channel_index_size: usize,
    pub master_index_size: usize,
    /// Settlement rows the channel index resolved.
    pub channel_hits: usize,
    /// Settlement rows the master index resolved.
    pub master_hits: usize,
    pub distinct_pairs: usize,
    pub identity_pairs: usize,
    pub unmatched: usize,
}

impl MappingStats {
    fn collect(
        tables: &SourceTables,
        channel: &ContentIndex,
        master: &ContentIndex,
        resolved: &[ResolvedRow],
        pairing: &PairingOutcome,
    ) -> Self {
        Self {
            channel_rows: tables.channel.len(),
            settlement_rows: tables.settlement.len(),
            master_rows: tables.master.len(),
            channel_index_size: channel.len(),
            master_index_size: master.len(),
            channel_hits: resolved.iter().filter(|r| !r.channel_missed()).count(),
            master_hits: resolved
                .iter()
                .filter(|r| master.get(&r.normalized_product).is_some())
                .count(),
            distinct_pairs: pairing.distinct.len(),
            identity_pairs: pairing.identity.len(),
            unmatched: pairing.unmatched.len(),
        }
    }
}

/// Everything a run computed.
#[derive(Debug, Clone)]
pub struct MappingRun {
    pub columns: ResolvedColumns,
    pub resolved: Vec<ResolvedRow>,
    pub pairing: PairingOutcome,
    pub report: MappingReport,
    pub stats: MappingStats,
}

/// Normalize, index, resolve, pair and assemble.
///
/// Fails only when a required column is missing; column checks run before any
/// computation.
pub fn run_mapping(
    tables: &SourceTables,
    rules: &RuleSet,
    opts: EngineOptions,
) -> Result<MappingRun, MappingError> {
    let columns = ResolvedColumns::pick(tables)?;
    info!(
        "columns: channel title={}, settlement title={}, master title={}, master id={}",
        columns.channel_title, columns.settlement_title, columns.master_title, columns.master_id
    );

    let channel_keys = normalize_column(
        rules,
        &tables.channel.require_column(columns.channel_title)?,
        opts.parallel,
    );
    let master_keys = normalize_column(
        rules,
        &tables.master.require_column(columns.master_title)?,
        opts.parallel,
    );
    let settlement_keys = normalize_column(
        rules,
        &tables.settlement.require_column(columns.settlement_title)?,
        opts.parallel,
    );
    debug!("normalized titles with rule set {}", rules.version());

    let channel_index = build_index_with_keys(&tables.channel, &channel_keys, CHANNEL_ID_COLUMN)?;
    let master_index = build_index_with_keys(&tables.master, &master_keys, columns.master_id)?;
    info!(
        "index sizes: channel={}, master={}",
        channel_index.len(),
        master_index.len()
    );

    let resolved = resolve(&settlement_keys, &channel_index, &master_index, opts.parallel);
    let pairing = derive_pairs(
        &resolved,
        &master_index,
        rules,
        opts.layout.pair_partition(),
    );

    let report = assemble(
        &AssemblyInput {
            channel: &tables.channel,
            channel_title_column: columns.channel_title,
            channel_keys: &channel_keys,
            settlement: &tables.settlement,
            settlement_title_column: columns.settlement_title,
            resolved: &resolved,
            pairing: &pairing,
        },
        opts.layout,
    );

    let stats = MappingStats::collect(tables, &channel_index, &master_index, &resolved, &pairing);
    info!(
        "resolved {} settlement rows: channel hits={}, master hits={}, distinct pairs={}, identity pairs={}, unmatched={}",
        stats.settlement_rows,
        stats.channel_hits,
        stats.master_hits,
        stats.distinct_pairs,
        stats.identity_pairs,
        stats.unmatched
    );

    Ok(MappingRun {
        columns,
        resolved,
        pairing,
        report,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Resolution;

    fn tables() -> SourceTables {
        SourceTables {
            channel: Table::from_rows(
                "channel.csv",
                &["콘텐츠명", "판매채널콘텐츠ID"],
                &[&["검신", "CH001"], &["화산귀환 (개정판)", "CH002"]],
            ),
            settlement: Table::from_rows(
                "settlement.csv",
                &["작품명", "정산액"],
                &[
                    &["검신 1권", "1000"],
                    &["어떤 소설 제3권(완결)", "2000"],
                    &["없는 작품", "300"],
                    &["화산귀환", "500"],
                ],
            ),
            master: Table::from_rows(
                "master.csv",
                &["콘텐츠명", "콘텐츠ID"],
                &[&["어떤 소설", "M100"], &["어떤 소설 외전", "M200"]],
            ),
        }
    }

    #[test]
    fn test_full_chain_on_small_tables() {
        let run = run_mapping(&tables(), RuleSet::builtin(), EngineOptions::default()).unwrap();
        assert_eq!(run.columns.settlement_title, "작품명");
        assert_eq!(run.columns.master_id, "콘텐츠ID");

        let finals: Vec<&str> = run.resolved.iter().map(|r| r.final_result.as_str()).collect();
        assert_eq!(finals, vec!["CH001", "M100", "없는작품", "CH002"]);
        assert_eq!(
            run.resolved[2].final_result,
            Resolution::Unresolved("없는작품".into())
        );

        assert_eq!(run.stats.channel_hits, 2);
        assert_eq!(run.stats.master_hits, 1);
        // "어떤 소설 외전" normalizes onto the same key; first row wins
        assert_eq!(run.stats.master_index_size, 1);
        assert_eq!(run.stats.distinct_pairs, 1);
        assert_eq!(run.stats.identity_pairs, 1);
        assert_eq!(run.stats.unmatched, 0);
        assert_eq!(run.report.rows.len(), 4);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let t = tables();
        let par = run_mapping(&t, RuleSet::builtin(), EngineOptions::default()).unwrap();
        let seq = run_mapping(
            &t,
            RuleSet::builtin(),
            EngineOptions {
                parallel: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(par.resolved, seq.resolved);
        assert_eq!(par.pairing, seq.pairing);
        assert_eq!(par.stats, seq.stats);
    }

    #[test]
    fn test_missing_settlement_title_names_every_candidate() {
        let mut t = tables();
        t.settlement = Table::from_rows("settlement.csv", &["금액"], &[&["1"]]);
        let err = run_mapping(&t, RuleSet::builtin(), EngineOptions::default()).unwrap_err();
        match err {
            MappingError::MissingColumn { table, candidates } => {
                assert_eq!(table, "settlement.csv");
                assert_eq!(candidates.len(), SETTLEMENT_TITLE_CANDIDATES.len());
                assert_eq!(candidates[0], "컨텐츠");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_channel_list_needs_its_fixed_id_column() {
        let mut t = tables();
        t.channel = Table::from_rows("channel.csv", &["콘텐츠명", "ID"], &[&["검신", "1"]]);
        let err = run_mapping(&t, RuleSet::builtin(), EngineOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingColumn { ref candidates, .. } if candidates == &vec![CHANNEL_ID_COLUMN.to_string()]
        ));
    }

    #[test]
    fn test_layout_decides_where_self_titled_master_ids_go() {
        let mut t = tables();
        t.master = Table::from_rows(
            "master.csv",
            &["콘텐츠명", "콘텐츠ID"],
            &[&["없는 작품", "없는작품"]],
        );

        let legacy = run_mapping(&t, RuleSet::builtin(), EngineOptions::default()).unwrap();
        assert!(legacy.pairing.distinct.is_empty());
        let identity: Vec<&str> = legacy
            .pairing
            .identity
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(identity, vec!["어떤소설", "없는작품"]);

        let opts = EngineOptions {
            layout: Layout::Relational,
            ..Default::default()
        };
        let relational = run_mapping(&t, RuleSet::builtin(), opts).unwrap();
        assert_eq!(relational.pairing.identity.len(), 1);
        assert_eq!(relational.pairing.distinct.len(), 1);
        assert_eq!(relational.pairing.distinct[0].id, "없는작품");
    }
}
