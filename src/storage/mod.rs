//! Storage Module
//!
//! The storage capability interface consumed by the execution bridge, plus
//! two in-memory adapters:
//!
//! - [`MapEngine`] — a plain locked hash map; transactions are free and
//!   never conflict.
//! - [`OccEngine`] — a versioned map with optimistic concurrency control;
//!   commits validate the transaction's read set and may conflict.
//!
//! Every outcome crossing this boundary is a typed value — no engine
//! failure mode is signaled by panic or error propagation. Conflict is
//! always distinct from "not found".

mod map;
mod occ;

pub use map::MapEngine;
pub use occ::{OccEngine, OccTxn};

// =============================================================================
// Outcome types
// =============================================================================

/// Outcome of a transactional read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Key present; the value was copied into the caller's buffer
    Found,

    /// Key absent (not an error)
    Missing,

    /// The transaction observed contention and cannot continue
    Conflict,
}

/// Outcome of a transactional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Write staged in the transaction (or applied, for non-transactional
    /// engines)
    Staged,

    /// The transaction observed contention and cannot continue
    Conflict,
}

/// Outcome of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// All effects are durable in the store
    Committed,

    /// Validation failed; no effects were applied
    Conflict,
}

// =============================================================================
// Capability interface
// =============================================================================

/// The storage capability consumed by the execution bridge.
///
/// The engine is the only component shared across workers; its internal
/// concurrency control is the only synchronization crossing worker
/// boundaries. The transaction object is worker-owned scratch state:
/// allocated once via [`StorageEngine::new_txn`], stored in the worker's
/// arena, and recycled by [`StorageEngine::begin`] for every request.
pub trait StorageEngine: Send + Sync {
    /// Reusable per-worker transaction state
    type Txn: Send;

    /// Allocate a fresh transaction object (once per worker)
    fn new_txn(&self) -> Self::Txn;

    /// Activate a transaction, recycling the object's internal buffers
    fn begin(&self, txn: &mut Self::Txn);

    /// Read `key` within the transaction, copying the value into `out`.
    ///
    /// `out` is cleared first; on [`ReadOutcome::Found`] it holds the value.
    fn read(&self, txn: &mut Self::Txn, key: &[u8], out: &mut Vec<u8>) -> ReadOutcome;

    /// Write `key = value` within the transaction
    fn write(&self, txn: &mut Self::Txn, key: &[u8], value: &[u8]) -> WriteOutcome;

    /// Terminate the transaction, attempting to make its effects visible
    fn commit(&self, txn: &mut Self::Txn) -> CommitOutcome;

    /// Terminate the transaction, discarding its effects
    fn abort(&self, txn: &mut Self::Txn);
}
