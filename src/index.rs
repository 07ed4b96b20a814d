use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::MappingError;
use crate::table::Table;

/// Lookup from normalized title to identifier.
///
/// Built once per run and read-only afterwards. When a key occurs more than
/// once in the source, the first row wins and later rows are dropped. A key
/// whose first row has an empty identifier is still present (it shadows later
/// rows) but never resolves.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    entries: HashMap<String, String>,
}

impl ContentIndex {
    /// Sequential first-occurrence fold over `(key, id)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = HashMap::new();
        for (k, v) in pairs {
            if let Entry::Vacant(slot) = entries.entry(k.into()) {
                slot.insert(v.into());
            }
        }
        Self { entries }
    }

    /// Identifier for `key`, if the key is indexed with a non-empty id.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|id| !id.trim().is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build an index from two columns of `table`. The key column must already
/// hold normalized titles.
pub fn build_index(
    table: &Table,
    key_column: &str,
    id_column: &str,
) -> Result<ContentIndex, MappingError> {
    let keys = table.require_column(key_column)?;
    let ids = table.require_column(id_column)?;
    Ok(ContentIndex::from_pairs(
        keys.into_iter()
            .zip(ids)
            .map(|(k, id)| (k.to_string(), id.to_string())),
    ))
}

/// Build an index from precomputed keys aligned with the rows of `table`.
pub fn build_index_with_keys(
    table: &Table,
    keys: &[String],
    id_column: &str,
) -> Result<ContentIndex, MappingError> {
    let ids = table.require_column(id_column)?;
    Ok(ContentIndex::from_pairs(
        keys.iter().zip(ids).map(|(k, id)| (k.as_str(), id.to_string())),
    ))
}
