//! Insertion-ordered record index shared by the store implementations

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

use crate::types::{
    ApplicationEndpointList, ApplicationEndpointListId, ApplicationEndpointsInfo, Pagination,
};

/// Records keyed by a monotonically increasing sequence number, plus an id lookup.
///
/// Not synchronized; callers wrap it in a lock.
#[derive(Debug, Default)]
pub(crate) struct RecordIndex {
    records: BTreeMap<u64, ApplicationEndpointList>,
    positions: HashMap<ApplicationEndpointListId, u64>,
    next_sequence: u64,
}

impl RecordIndex {
    /// Build a new record with a fresh id and the next sequence number.
    /// Nothing is stored until [`RecordIndex::insert`] is called.
    pub fn allocate(&self, info: ApplicationEndpointsInfo) -> (u64, ApplicationEndpointList) {
        let id = loop {
            let candidate = ApplicationEndpointListId::generate();
            if !self.positions.contains_key(&candidate) {
                break candidate;
            }
        };

        let record = ApplicationEndpointList {
            id,
            info,
            created_at: Utc::now(),
        };
        (self.next_sequence, record)
    }

    /// Insert or overwrite the record stored at `sequence`
    pub fn insert(&mut self, sequence: u64, record: ApplicationEndpointList) {
        self.next_sequence = self.next_sequence.max(sequence + 1);
        self.positions.insert(record.id, sequence);
        self.records.insert(sequence, record);
    }

    pub fn get(&self, id: &ApplicationEndpointListId) -> Option<&ApplicationEndpointList> {
        self.positions.get(id).and_then(|seq| self.records.get(seq))
    }

    pub fn contains_sequence(&self, sequence: u64) -> bool {
        self.records.contains_key(&sequence)
    }

    pub fn sequence_of(&self, id: &ApplicationEndpointListId) -> Option<u64> {
        self.positions.get(id).copied()
    }

    /// The record `id` would become after a replace, keeping id, position and creation time
    pub fn replaced(
        &self,
        id: &ApplicationEndpointListId,
        info: ApplicationEndpointsInfo,
    ) -> Option<(u64, ApplicationEndpointList)> {
        let sequence = self.sequence_of(id)?;
        let current = self.records.get(&sequence)?;
        let record = ApplicationEndpointList {
            id: current.id,
            info,
            created_at: current.created_at,
        };
        Some((sequence, record))
    }

    pub fn remove(&mut self, id: &ApplicationEndpointListId) -> Option<ApplicationEndpointList> {
        let sequence = self.positions.remove(id)?;
        self.records.remove(&sequence)
    }

    pub fn page(&self, page: Pagination) -> Vec<ApplicationEndpointList> {
        self.records
            .values()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
