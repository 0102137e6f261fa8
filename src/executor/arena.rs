//! Per-worker execution arena
//!
//! Request-scoped scratch memory owned by exactly one worker thread:
//! staging buffers for the key and value crossing into the storage engine,
//! and the engine's reusable transaction object. Reset logically truncates;
//! nothing is deallocated between requests.
//!
//! The arena is an explicit owned resource constructed once at worker
//! startup and passed by reference into each request, not a hidden
//! thread-local.

use crate::storage::StorageEngine;

/// Per-worker reusable scratch memory
pub struct Arena<E: StorageEngine> {
    /// Key staging buffer
    pub(crate) key_buf: Vec<u8>,

    /// Value staging buffer; GET replies borrow it until encoded
    pub(crate) val_buf: Vec<u8>,

    /// The engine's transaction object, allocated once and recycled by
    /// `StorageEngine::begin` on every transactional request
    pub(crate) txn: E::Txn,
}

/// Default initial staging capacity (bytes)
const DEFAULT_STAGING_CAPACITY: usize = 4 * 1024;

impl<E: StorageEngine> Arena<E> {
    /// Create an arena for a worker, allocating the engine's transaction
    /// object up front
    pub fn new(engine: &E) -> Self {
        Self::with_capacity(engine, DEFAULT_STAGING_CAPACITY, DEFAULT_STAGING_CAPACITY)
    }

    /// Create an arena with explicit staging buffer capacities
    pub fn with_capacity(engine: &E, key_capacity: usize, value_capacity: usize) -> Self {
        Self {
            key_buf: Vec::with_capacity(key_capacity),
            val_buf: Vec::with_capacity(value_capacity),
            txn: engine.new_txn(),
        }
    }

    /// Truncate the staging buffers for the next request.
    ///
    /// Capacity is retained; the hot path never reallocates once the
    /// buffers have grown to the workload's sizes.
    pub fn reset(&mut self) {
        self.key_buf.clear();
        self.val_buf.clear();
    }

    /// Current key staging capacity (bytes)
    pub fn key_capacity(&self) -> usize {
        self.key_buf.capacity()
    }

    /// Current value staging capacity (bytes)
    pub fn value_capacity(&self) -> usize {
        self.val_buf.capacity()
    }
}
