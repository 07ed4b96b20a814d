//! Title normalization.
//!
//! Every title from every source table goes through the same pipeline, and the
//! resulting key is the only thing the tables are joined on. See
//! [`rules`] for the pipeline itself.

pub mod rules;

use rayon::prelude::*;

use crate::table::CellValue;

pub use rules::{Rule, RuleKind, RuleRecord, RuleSet};

/// Normalize a raw title with the built-in rules.
pub fn normalize_title(raw: &CellValue) -> String {
    RuleSet::builtin().normalize(raw)
}

/// Normalize a column of cells, in parallel when asked to. Output order
/// matches input order either way.
pub fn normalize_column(rules: &RuleSet, cells: &[&CellValue], parallel: bool) -> Vec<String> {
    if parallel {
        cells.par_iter().map(|c| rules.normalize(c)).collect()
    } else {
        cells.iter().map(|c| rules.normalize(c)).collect()
    }
}
