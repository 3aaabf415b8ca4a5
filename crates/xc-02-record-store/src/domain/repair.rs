//! # Index Repair Report
//!
//! Outcome of rebuilding or checking secondary indexes against primary
//! records after an unclean shutdown.

/// Result of an index repair operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Primary records that decoded cleanly.
    pub records_scanned: u64,
    /// Index entries that were missing and have been written.
    pub indexes_added: u64,
    /// Index entries with no matching record, removed.
    pub indexes_removed: u64,
    /// Hex keys of primary entries that failed to decode, removed.
    pub corrupt_removed: Vec<String>,
    /// Highest block number among surviving records.
    pub highest_block: Option<u64>,
    /// Duration of repair in milliseconds
    pub duration_ms: u64,
}

impl RepairReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the indexes already matched the records.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.indexes_added == 0 && self.indexes_removed == 0 && self.corrupt_removed.is_empty()
    }

    pub(crate) fn add_record(&mut self, block_num: u64) {
        self.records_scanned += 1;
        self.highest_block = Some(self.highest_block.map_or(block_num, |h| h.max(block_num)));
    }
}
