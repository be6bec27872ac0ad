use std::collections::BTreeMap;

use health_model::Record;

/// Counts records per observation type, keyed alphabetically.
pub fn type_tally(records: &[Record]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.record_type.clone()).or_insert(0) += 1;
    }
    counts
}
