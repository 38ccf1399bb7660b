// aggregate.rs
// Phase 3: Merge per-file tables into one, later files winning

use super::parse::ParsedFile;
use crate::table::OffsetTable;

/// Result of merging every parsed header.
#[derive(Debug, Default)]
pub struct AggregateResult {
    pub table: OffsetTable,
    pub files_merged: usize,
    pub overrides: usize,
}

/// Fold `incoming` into `table`. Returns how many existing values changed.
pub fn merge_into(table: &mut OffsetTable, incoming: &OffsetTable) -> usize {
    let mut overrides = 0;
    for (ns, sym, value) in incoming.entries() {
        if let Some(previous) = table.insert(ns, sym, value) {
            if previous != value {
                log::debug!("{}.{} overridden: {} -> {}", ns, sym, previous, value);
                overrides += 1;
            }
        }
    }
    overrides
}

/// Merge files in the order given, then drop empty namespaces.
pub fn aggregate<I>(files: I) -> AggregateResult
where
    I: IntoIterator<Item = ParsedFile>,
{
    let mut result = AggregateResult::default();

    for file in files {
        log::debug!("Merging {}", file.path.display());
        result.overrides += merge_into(&mut result.table, &file.offsets);
        result.files_merged += 1;
    }

    result.table.prune_empty();
    result
}
