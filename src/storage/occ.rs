//! Optimistic-transactional map engine
//!
//! A versioned hash map with optimistic concurrency control. A transaction
//! records the version of every key it reads and buffers its writes; commit
//! re-validates the read set under the map's write lock and applies the
//! write set only if every observed version is still current.
//!
//! This gives single-command isolation with conflicts signaled as typed
//! outcomes, and a transaction object whose read/write sets are recycled
//! across requests by `begin`.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{CommitOutcome, ReadOutcome, StorageEngine, WriteOutcome};

/// Version stamp for a key that does not exist
const ABSENT: u64 = 0;

/// A stored value with its current version
struct Slot {
    version: u64,
    value: Vec<u8>,
}

/// Reusable transaction state: read set (key, observed version) and
/// buffered write set.
#[derive(Default)]
pub struct OccTxn {
    reads: Vec<(Vec<u8>, u64)>,
    writes: Vec<(Vec<u8>, Vec<u8>)>,
}

impl OccTxn {
    fn clear(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }
}

/// Optimistic-transactional in-memory store
#[derive(Default)]
pub struct OccEngine {
    map: RwLock<HashMap<Vec<u8>, Slot>>,
}

impl OccEngine {
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

    /// Current version of `key` (ABSENT if missing)
    fn version_of(map: &HashMap<Vec<u8>, Slot>, key: &[u8]) -> u64 {
        map.get(key).map(|slot| slot.version).unwrap_or(ABSENT)
    }
}

impl StorageEngine for OccEngine {
    type Txn = OccTxn;

    fn new_txn(&self) -> Self::Txn {
        OccTxn::default()
    }

    fn begin(&self, txn: &mut Self::Txn) {
        txn.clear();
    }

    fn read(&self, txn: &mut Self::Txn, key: &[u8], out: &mut Vec<u8>) -> ReadOutcome {
        out.clear();

        // Read-your-writes within the same transaction
        if let Some((_, value)) = txn.writes.iter().rev().find(|(k, _)| k.as_slice() == key) {
            out.extend_from_slice(value);
            return ReadOutcome::Found;
        }

        let map = self.map.read();
        let version = Self::version_of(&map, key);
        txn.reads.push((key.to_vec(), version));

        match map.get(key) {
            Some(slot) => {
                out.extend_from_slice(&slot.value);
                ReadOutcome::Found
            }
            None => ReadOutcome::Missing,
        }
    }

    fn write(&self, txn: &mut Self::Txn, key: &[u8], value: &[u8]) -> WriteOutcome {
        // Last write wins within the transaction
        if let Some((_, staged)) = txn.writes.iter_mut().find(|(k, _)| k.as_slice() == key) {
            staged.clear();
            staged.extend_from_slice(value);
        } else {
            txn.writes.push((key.to_vec(), value.to_vec()));
        }
        WriteOutcome::Staged
    }

    fn commit(&self, txn: &mut Self::Txn) -> CommitOutcome {
        let mut map = self.map.write();

        // Validate: every key read must still carry the observed version
        for (key, observed) in &txn.reads {
            if Self::version_of(&map, key) != *observed {
                txn.clear();
                return CommitOutcome::Conflict;
            }
        }

        // Apply buffered writes, bumping each key's version
        for (key, value) in txn.writes.drain(..) {
            match map.get_mut(&key) {
                Some(slot) => {
                    slot.version += 1;
                    slot.value = value;
                }
                None => {
                    map.insert(key, Slot { version: 1, value });
                }
            }
        }

        txn.clear();
        CommitOutcome::Committed
    }

    fn abort(&self, txn: &mut Self::Txn) {
        txn.clear();
    }
}
