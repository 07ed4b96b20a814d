//! Two-level resolution chain: channel index first, then master index.

use std::fmt;

use rayon::prelude::*;

use crate::index::ContentIndex;

/// Outcome of one lookup step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolution {
    /// An index produced an identifier.
    Resolved(String),
    /// Nothing resolved; the value is still the normalized title.
    Unresolved(String),
}

impl Resolution {
    pub fn as_str(&self) -> &str {
        match self {
            Resolution::Resolved(s) | Resolution::Unresolved(s) => s,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    fn lookup(index: &ContentIndex, key: &str) -> Option<Resolution> {
        index.get(key).map(|id| Resolution::Resolved(id.to_string()))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-row result of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub normalized_product: String,
    /// Channel index hit, else the normalized title.
    pub first_pass: Resolution,
    /// Master index hit, else `first_pass`.
    pub final_result: Resolution,
}

impl ResolvedRow {
    /// The channel index missed, so the row's mapping result is still its own title.
    pub fn channel_missed(&self) -> bool {
        !self.first_pass.is_resolved()
    }
}

pub fn resolve_row(key: &str, channel: &ContentIndex, master: &ContentIndex) -> ResolvedRow {
    let first_pass = Resolution::lookup(channel, key)
        .unwrap_or_else(|| Resolution::Unresolved(key.to_string()));
    let final_result = match Resolution::lookup(master, key) {
        Some(hit) => hit,
        None => first_pass.clone(),
    };
    ResolvedRow {
        normalized_product: key.to_string(),
        first_pass,
        final_result,
    }
}

/// Resolve every settlement key. Rows are independent, so this may run in parallel.
pub fn resolve(
    keys: &[String],
    channel: &ContentIndex,
    master: &ContentIndex,
    parallel: bool,
) -> Vec<ResolvedRow> {
    if parallel {
        keys.par_iter()
            .map(|k| resolve_row(k, channel, master))
            .collect()
    } else {
        keys.iter().map(|k| resolve_row(k, channel, master)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(pairs: &[(&str, &str)]) -> ContentIndex {
        ContentIndex::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_master_miss_falls_back_to_channel_hit() {
        let channel = idx(&[("foo", "CH001")]);
        let master = idx(&[]);
        let r = resolve_row("foo", &channel, &master);
        assert_eq!(r.first_pass, Resolution::Resolved("CH001".into()));
        assert_eq!(r.final_result, Resolution::Resolved("CH001".into()));
        assert!(!r.channel_missed());
    }

    #[test]
    fn test_double_miss_keeps_the_title() {
        let r = resolve_row("bar", &idx(&[]), &idx(&[]));
        assert_eq!(r.first_pass, Resolution::Unresolved("bar".into()));
        assert_eq!(r.final_result.as_str(), "bar");
        assert!(!r.final_result.is_resolved());
        assert!(r.channel_missed());
    }

    #[test]
    fn test_master_hit_overrides_channel_hit() {
        let channel = idx(&[("foo", "CH001")]);
        let master = idx(&[("foo", "M001")]);
        let r = resolve_row("foo", &channel, &master);
        assert_eq!(r.first_pass.as_str(), "CH001");
        assert_eq!(r.final_result.as_str(), "M001");
    }

    #[test]
    fn test_fallback_chain_holds_for_every_row() {
        let channel = idx(&[("a", "C1"), ("b", "C2")]);
        let master = idx(&[("b", "M2"), ("c", "M3")]);
        let keys: Vec<String> = ["a", "b", "c", "d", ""].iter().map(|s| s.to_string()).collect();
        let rows = resolve(&keys, &channel, &master, true);
        assert_eq!(rows, resolve(&keys, &channel, &master, false));
        for r in &rows {
            let k = r.normalized_product.as_str();
            match channel.get(k) {
                Some(id) => assert_eq!(r.first_pass.as_str(), id),
                None => assert_eq!(r.first_pass.as_str(), k),
            }
            match master.get(k) {
                Some(id) => assert_eq!(r.final_result.as_str(), id),
                None => assert_eq!(r.final_result, r.first_pass),
            }
        }
    }
}
