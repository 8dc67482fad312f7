//! Batch-wide duplicate key detection

use crate::record::RawRecord;
use std::collections::{HashMap, HashSet};

/// Keys that occur on two or more rows of one batch.
///
/// Built once over the whole input, including rows that fail other checks,
/// and queried by key value so that filtering or reordering rows later cannot
/// attach a flag to the wrong row. Null and empty keys are never counted.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    duplicated: HashSet<String>,
}

impl DuplicateIndex {
    /// Scan `keys` once
    pub fn build<'a>(keys: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut seen: HashMap<&'a str, usize> = HashMap::new();
        for key in keys.into_iter().flatten().filter(|k| !k.is_empty()) {
            *seen.entry(key).or_default() += 1;
        }

        let duplicated = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key.to_string())
            .collect();

        Self { duplicated }
    }

    /// Scan the `key_field` column of `records`
    pub fn from_records(records: &[RawRecord], key_field: &str) -> Self {
        Self::build(records.iter().map(|r| r.get(key_field)))
    }

    pub fn is_duplicated(&self, key: Option<&str>) -> bool {
        key.is_some_and(|k| self.duplicated.contains(k))
    }

    /// Number of distinct duplicated keys
    pub fn len(&self) -> usize {
        self.duplicated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duplicated.is_empty()
    }
}
