//! Ordered, id-unique collection of listing records
//!
//! Merge semantics are union-with-override keyed by `listing_id`. Order is
//! pinned to first-seen-key order: an overwrite updates the record in place,
//! a new key appends. This keeps diffs between successive output files
//! minimal for the downstream upsert.

use std::collections::HashMap;

use crate::domain::listing::ListingRecord;

/// Counts reported by one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
}

/// An ordered set of records in which every `listing_id` appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ListingRecord>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from records in the given order. Later duplicates of
    /// a key override earlier ones without adding a second entry.
    pub fn from_records(records: impl IntoIterator<Item = ListingRecord>) -> Self {
        let mut dataset = Self::new();
        for record in records {
            dataset.upsert(record);
        }
        dataset
    }

    /// Inserts or overwrites one record keyed by its `listing_id`.
    pub fn upsert(&mut self, record: ListingRecord) -> bool {
        match self.index.get(&record.listing_id) {
            Some(&pos) => {
                self.records[pos] = record;
                false
            }
            None => {
                self.index.insert(record.listing_id.clone(), self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    /// Merges a batch into the dataset, new records overriding existing ones
    /// that share a key. Idempotent: merging the same batch twice leaves the
    /// dataset identical to the first merge.
    pub fn merge(&mut self, batch: impl IntoIterator<Item = ListingRecord>) -> MergeStats {
        let mut stats = MergeStats::default();
        for record in batch {
            if self.upsert(record) {
                stats.added += 1;
            } else {
                stats.updated += 1;
            }
        }
        stats
    }

    pub fn get(&self, listing_id: &str) -> Option<&ListingRecord> {
        self.index.get(listing_id).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
