//! Derive the (title, id) pairs the master index produced for rows the channel
//! index could not resolve, split them into resolved and unresolved buckets, and
//! collect the titles left without any id.

use std::collections::BTreeSet;

use crate::index::ContentIndex;
use crate::matching::resolve::{Resolution, ResolvedRow};
use crate::normalize::RuleSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MappingPair {
    pub title: String,
    pub id: String,
}

/// How pair candidates are selected and split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PairPartition {
    /// Rows whose first pass still equals the normalized title are eligible;
    /// a pair is identity when the title equals the final result text. A
    /// master id that spells its own title is an identity pair here.
    #[default]
    TitleEquality,
    /// Rows the channel index missed are eligible; a pair is distinct when
    /// the master index resolved it.
    ByResolution,
}

/// Pairing output. All three sequences are ascending by title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingOutcome {
    /// Titles mapped to an id other than themselves.
    pub distinct: Vec<MappingPair>,
    /// Titles mapped to themselves; `id` is the title.
    pub identity: Vec<MappingPair>,
    /// Eligible titles absent from the master index and from every pair.
    pub unmatched: Vec<String>,
}

impl PairingOutcome {
    pub fn is_unmatched(&self, key: &str) -> bool {
        self.unmatched
            .binary_search_by(|u| u.as_str().cmp(key))
            .is_ok()
    }
}

impl PairPartition {
    fn eligible(&self, row: &ResolvedRow) -> bool {
        match self {
            Self::TitleEquality => row.normalized_product == row.first_pass.as_str(),
            Self::ByResolution => row.channel_missed(),
        }
    }

    fn is_identity(&self, title: &str, result: &Resolution) -> bool {
        match self {
            Self::TitleEquality => title == result.as_str(),
            Self::ByResolution => !result.is_resolved(),
        }
    }
}

pub fn derive_pairs(
    rows: &[ResolvedRow],
    master: &ContentIndex,
    rules: &RuleSet,
    partition: PairPartition,
) -> PairingOutcome {
    let eligible: Vec<&ResolvedRow> = rows.iter().filter(|r| partition.eligible(r)).collect();

    // Titles are re-normalized; ordering comes from the set.
    let mut candidates: BTreeSet<(String, &Resolution)> = BTreeSet::new();
    for r in &eligible {
        let title = rules.normalize_str(&r.normalized_product);
        if title.trim().is_empty() {
            continue;
        }
        candidates.insert((title, &r.final_result));
    }

    let titles: BTreeSet<&str> = candidates.iter().map(|(t, _)| t.as_str()).collect();
    let unmatched: BTreeSet<String> = eligible
        .iter()
        .map(|r| r.normalized_product.as_str())
        .filter(|k| !master.contains_key(k) && !titles.contains(k))
        .map(str::to_string)
        .collect();

    let mut distinct: BTreeSet<MappingPair> = BTreeSet::new();
    let mut identity: BTreeSet<MappingPair> = BTreeSet::new();
    for (title, result) in candidates {
        if partition.is_identity(&title, result) {
            identity.insert(MappingPair {
                id: title.clone(),
                title,
            });
        } else {
            distinct.insert(MappingPair {
                id: result.as_str().to_string(),
                title,
            });
        }
    }
    PairingOutcome {
        distinct: distinct.into_iter().collect(),
        identity: identity.into_iter().collect(),
        unmatched: unmatched.into_iter().collect(),
    }
}
