//! Bridge Tests
//!
//! Tests for the execution bridge: command semantics, transaction
//! termination, the retry policy, and arena buffer reuse. Storage engine
//! stubs with call accounting verify the bridge's side-effect contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coralkv::protocol::{Command, Reply};
use coralkv::storage::{CommitOutcome, ReadOutcome, WriteOutcome};
use coralkv::{Arena, Bridge, MapEngine, StorageEngine};

// =============================================================================
// Engine stubs
// =============================================================================

/// Counts every capability call; used to assert storage interaction (or the
/// absence of it).
#[derive(Default)]
struct CountingEngine {
    inner: MapEngine,
    begins: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    commits: AtomicUsize,
    aborts: AtomicUsize,
}

impl CountingEngine {
    fn total_calls(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
            + self.reads.load(Ordering::SeqCst)
            + self.writes.load(Ordering::SeqCst)
            + self.commits.load(Ordering::SeqCst)
            + self.aborts.load(Ordering::SeqCst)
    }
}

impl StorageEngine for CountingEngine {
    type Txn = ();

    fn new_txn(&self) -> Self::Txn {}

    fn begin(&self, txn: &mut Self::Txn) {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.inner.begin(txn);
    }

    fn read(&self, txn: &mut Self::Txn, key: &[u8], out: &mut Vec<u8>) -> ReadOutcome {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(txn, key, out)
    }

    fn write(&self, txn: &mut Self::Txn, key: &[u8], value: &[u8]) -> WriteOutcome {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(txn, key, value)
    }

    fn commit(&self, txn: &mut Self::Txn) -> CommitOutcome {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(txn)
    }

    fn abort(&self, txn: &mut Self::Txn) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.inner.abort(txn);
    }
}

/// Forces the next N commits to conflict, then behaves normally. Writes are
/// staged in the transaction and applied only on a successful commit.
#[derive(Default)]
struct FlakyEngine {
    map: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    forced_conflicts: AtomicUsize,
    begins: AtomicUsize,
    commits: AtomicUsize,
    aborts: AtomicUsize,
}

impl FlakyEngine {
    fn with_conflicts(count: usize) -> Self {
        let engine = Self::default();
        engine.forced_conflicts.store(count, Ordering::SeqCst);
        engine
    }

    fn preload(&self, key: &[u8], value: &[u8]) {
        self.map.lock().unwrap().insert(key.to_vec(), value.to_vec());
    }

    fn stored(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.map.lock().unwrap().get(key).cloned()
    }
}

impl StorageEngine for FlakyEngine {
    type Txn = Vec<(Vec<u8>, Vec<u8>)>;

    fn new_txn(&self) -> Self::Txn {
        Vec::new()
    }

    fn begin(&self, txn: &mut Self::Txn) {
        self.begins.fetch_add(1, Ordering::SeqCst);
        txn.clear();
    }

    fn read(&self, _txn: &mut Self::Txn, key: &[u8], out: &mut Vec<u8>) -> ReadOutcome {
        out.clear();
        match self.map.lock().unwrap().get(key) {
            Some(value) => {
                out.extend_from_slice(value);
                ReadOutcome::Found
            }
            None => ReadOutcome::Missing,
        }
    }

    fn write(&self, txn: &mut Self::Txn, key: &[u8], value: &[u8]) -> WriteOutcome {
        txn.push((key.to_vec(), value.to_vec()));
        WriteOutcome::Staged
    }

    fn commit(&self, txn: &mut Self::Txn) -> CommitOutcome {
        self.commits.fetch_add(1, Ordering::SeqCst);

        let remaining = self.forced_conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.forced_conflicts.store(remaining - 1, Ordering::SeqCst);
            txn.clear();
            return CommitOutcome::Conflict;
        }

        let mut map = self.map.lock().unwrap();
        for (key, value) in txn.drain(..) {
            map.insert(key, value);
        }
        CommitOutcome::Committed
    }

    fn abort(&self, txn: &mut Self::Txn) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        txn.clear();
    }
}

// =============================================================================
// Basic Semantics Tests
// =============================================================================

#[test]
fn test_set_then_get_round_trip() {
    let engine = Arc::new(MapEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(
        &Command::Set {
            key: b"k",
            value: b"v",
        },
        &mut arena,
    );
    assert_eq!(reply, Reply::Ok);

    let reply = bridge.execute(&Command::Get { key: b"k" }, &mut arena);
    assert_eq!(reply, Reply::Value(b"v"));
}

#[test]
fn test_get_missing_key_is_miss_not_error() {
    let engine = Arc::new(MapEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(&Command::Get { key: b"absent" }, &mut arena);
    assert_eq!(reply, Reply::Miss);
}

#[test]
fn test_set_is_idempotent_at_the_protocol_level() {
    let engine = Arc::new(MapEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let set = Command::Set {
        key: b"k",
        value: b"v",
    };
    assert_eq!(bridge.execute(&set, &mut arena), Reply::Ok);
    assert_eq!(bridge.execute(&set, &mut arena), Reply::Ok);

    assert_eq!(
        bridge.execute(&Command::Get { key: b"k" }, &mut arena),
        Reply::Value(b"v")
    );
    assert_eq!(engine.len(), 1);
}

#[test]
fn test_unsupported_command_is_invalid_operation() {
    let engine = Arc::new(CountingEngine::default());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(&Command::Unsupported { raw: b"FLUSHALL" }, &mut arena);
    match reply {
        Reply::Error(message) => assert!(
            message.contains("invalid operation") && message.contains("FLUSHALL"),
            "unexpected error text: {message}"
        ),
        other => panic!("expected error reply, got {other:?}"),
    }
    assert_eq!(engine.total_calls(), 0);
}

// =============================================================================
// PING Tests
// =============================================================================

#[test]
fn test_ping_bypasses_storage_entirely() {
    let engine = Arc::new(CountingEngine::default());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(&Command::Ping, &mut arena);
    assert_eq!(reply, Reply::Pong);
    assert_eq!(engine.total_calls(), 0);
}

// =============================================================================
// Transaction Accounting Tests
// =============================================================================

#[test]
fn test_get_opens_and_terminates_exactly_one_transaction() {
    let engine = Arc::new(CountingEngine::default());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    bridge.execute(&Command::Get { key: b"k" }, &mut arena);

    assert_eq!(engine.begins.load(Ordering::SeqCst), 1);
    assert_eq!(engine.commits.load(Ordering::SeqCst), 1);
    assert_eq!(engine.aborts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_set_opens_and_terminates_exactly_one_transaction() {
    let engine = Arc::new(CountingEngine::default());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    bridge.execute(
        &Command::Set {
            key: b"k",
            value: b"v",
        },
        &mut arena,
    );

    assert_eq!(engine.begins.load(Ordering::SeqCst), 1);
    assert_eq!(engine.commits.load(Ordering::SeqCst), 1);
    assert_eq!(engine.aborts.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Conflict Policy Tests
// =============================================================================

#[test]
fn test_get_conflict_is_retried_once_and_succeeds() {
    let engine = Arc::new(FlakyEngine::with_conflicts(1));
    engine.preload(b"k", b"v");
    let bridge = Bridge::with_retry_limit(Arc::clone(&engine), 1);
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(&Command::Get { key: b"k" }, &mut arena);
    assert_eq!(reply, Reply::Value(b"v"));

    // One original attempt plus exactly one retry
    assert_eq!(engine.begins.load(Ordering::SeqCst), 2);
    assert_eq!(engine.commits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_get_conflict_surfaces_after_retries_exhaust() {
    let engine = Arc::new(FlakyEngine::with_conflicts(2));
    engine.preload(b"k", b"v");
    let bridge = Bridge::with_retry_limit(Arc::clone(&engine), 1);
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(&Command::Get { key: b"k" }, &mut arena);
    assert_eq!(reply, Reply::aborted());

    // Bounded: never more than limit + 1 attempts
    assert_eq!(engine.begins.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_conflict_is_never_retried() {
    let engine = Arc::new(FlakyEngine::with_conflicts(1));
    let bridge = Bridge::with_retry_limit(Arc::clone(&engine), 1);
    let mut arena = Arena::new(engine.as_ref());

    let reply = bridge.execute(
        &Command::Set {
            key: b"k",
            value: b"v",
        },
        &mut arena,
    );
    assert_eq!(reply, Reply::aborted());

    // Exactly one attempt, and the write must not have been applied
    assert_eq!(engine.begins.load(Ordering::SeqCst), 1);
    assert_eq!(engine.commits.load(Ordering::SeqCst), 1);
    assert_eq!(engine.stored(b"k"), None);
}

#[test]
fn test_set_succeeds_after_unrelated_conflict_drained() {
    let engine = Arc::new(FlakyEngine::with_conflicts(1));
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let set = Command::Set {
        key: b"k",
        value: b"v",
    };
    assert_eq!(bridge.execute(&set, &mut arena), Reply::aborted());

    // The client re-issues the SET; this is the client's decision, the
    // bridge itself never retried.
    assert_eq!(bridge.execute(&set, &mut arena), Reply::Ok);
    assert_eq!(engine.stored(b"k").as_deref(), Some(&b"v"[..]));
}

// =============================================================================
// Arena Reuse Tests
// =============================================================================

#[test]
fn test_arena_buffers_are_reused_not_reallocated() {
    let engine = Arc::new(MapEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    let value = vec![0xabu8; 64 * 1024];
    bridge.execute(
        &Command::Set {
            key: b"big",
            value: &value,
        },
        &mut arena,
    );

    let grown_key = arena.key_capacity();
    let grown_val = arena.value_capacity();
    assert!(grown_val >= value.len());

    // Subsequent smaller requests must not shrink or reallocate
    for i in 0..32 {
        let key = format!("k{i}");
        bridge.execute(
            &Command::Set {
                key: key.as_bytes(),
                value: b"small",
            },
            &mut arena,
        );
        bridge.execute(&Command::Get { key: key.as_bytes() }, &mut arena);
    }

    assert_eq!(arena.key_capacity(), grown_key);
    assert_eq!(arena.value_capacity(), grown_val);
}

#[test]
fn test_arena_reset_between_requests_prevents_leakage() {
    let engine = Arc::new(MapEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine));
    let mut arena = Arena::new(engine.as_ref());

    bridge.execute(
        &Command::Set {
            key: b"long-key-name",
            value: b"long-value-content",
        },
        &mut arena,
    );

    // A shorter key must not pick up stale staged bytes
    bridge.execute(
        &Command::Set {
            key: b"k",
            value: b"v",
        },
        &mut arena,
    );

    assert_eq!(
        bridge.execute(&Command::Get { key: b"k" }, &mut arena),
        Reply::Value(b"v")
    );
    assert_eq!(
        bridge.execute(&Command::Get { key: b"long-key-name" }, &mut arena),
        Reply::Value(b"long-value-content")
    );
}
