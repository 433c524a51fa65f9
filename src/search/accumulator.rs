//! Result Accumulator
//!
//! Shared, de-duplicating collection of entries found by concurrent strategies.
//!
//! ## Capacity
//! The size check and the insert happen under one lock acquisition, but
//! strategies call [`ResultAccumulator::is_full`] for early exit without
//! holding the lock afterwards, so the observed size may change immediately.
//! [`ResultAccumulator::drain`] truncates to the requested limit.

use super::types::VocabularyEntry;
use crate::storage::table::EntryKey;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct ResultAccumulator {
    entries: Mutex<HashMap<EntryKey, VocabularyEntry>>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntryKey, VocabularyEntry>> {
        // A panicking strategy cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts `entry` unless `limit` entries are already held.
    ///
    /// Returns `false` only when the accumulator is full. Re-adding an identity
    /// that is already present keeps the first entry and returns `true`.
    pub fn try_add(&self, entry: VocabularyEntry, limit: usize) -> bool {
        let mut entries = self.lock();
        if entries.len() >= limit {
            return false;
        }
        entries.entry(entry.key()).or_insert(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self, limit: usize) -> bool {
        self.len() >= limit
    }

    /// Takes up to `limit` entries out of the accumulator, in no particular order.
    pub fn drain(&self, limit: usize) -> Vec<VocabularyEntry> {
        let mut entries = self.lock();
        entries.drain().map(|(_, entry)| entry).take(limit).collect()
    }
}
