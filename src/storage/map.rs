//! Plain map engine
//!
//! The simplest storage adapter: a hash map behind a reader-writer lock.
//! Reads and writes apply immediately; begin/commit/abort are no-ops and a
//! commit never conflicts.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{CommitOutcome, ReadOutcome, StorageEngine, WriteOutcome};

/// Non-transactional in-memory store
#[derive(Default)]
pub struct MapEngine {
    map: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MapEngine {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True when no keys are stored
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl StorageEngine for MapEngine {
    type Txn = ();

    fn new_txn(&self) -> Self::Txn {}

    fn begin(&self, _txn: &mut Self::Txn) {}

    fn read(&self, _txn: &mut Self::Txn, key: &[u8], out: &mut Vec<u8>) -> ReadOutcome {
        out.clear();
        match self.map.read().get(key) {
            Some(value) => {
                out.extend_from_slice(value);
                ReadOutcome::Found
            }
            None => ReadOutcome::Missing,
        }
    }

    fn write(&self, _txn: &mut Self::Txn, key: &[u8], value: &[u8]) -> WriteOutcome {
        self.map.write().insert(key.to_vec(), value.to_vec());
        WriteOutcome::Staged
    }

    fn commit(&self, _txn: &mut Self::Txn) -> CommitOutcome {
        CommitOutcome::Committed
    }

    fn abort(&self, _txn: &mut Self::Txn) {}
}
