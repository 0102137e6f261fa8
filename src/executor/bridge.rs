//! Execution bridge
//!
//! Hands a decoded command to the storage engine and produces a typed
//! reply. The bridge instance is owned by the server and handed to each
//! worker explicitly; there is no process-wide singleton.
//!
//! ## Policy
//! - GET: read inside a fresh transaction, commit immediately. A conflict
//!   (at read or commit) is retried immediately — the transaction did no
//!   writes, so a re-run is safe — up to a small bound, then surfaced as
//!   `-ERR transaction aborted`.
//! - SET: write inside a fresh transaction, commit. A conflict is never
//!   retried: the bridge cannot assume the write is idempotent, so it
//!   always surfaces to the client.
//! - PING: constant `+PONG`, zero storage calls.

use std::sync::Arc;

use crate::error::CoralError;
use crate::protocol::{Command, Reply};
use crate::storage::{CommitOutcome, ReadOutcome, StorageEngine, WriteOutcome};
use super::Arena;

/// Default bound on immediate GET conflict retries
const DEFAULT_GET_RETRY_LIMIT: usize = 1;

/// Terminal state of a GET attempt sequence
enum GetStatus {
    Found,
    Missing,
    Aborted,
}

/// Synchronous bridge between protocol commands and the storage engine
pub struct Bridge<E: StorageEngine> {
    engine: Arc<E>,
    get_retry_limit: usize,
}

impl<E: StorageEngine> Clone for Bridge<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            get_retry_limit: self.get_retry_limit,
        }
    }
}

impl<E: StorageEngine> Bridge<E> {
    /// Create a bridge over an engine with the default GET retry bound
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_retry_limit(engine, DEFAULT_GET_RETRY_LIMIT)
    }

    /// Create a bridge with an explicit GET retry bound
    pub fn with_retry_limit(engine: Arc<E>, get_retry_limit: usize) -> Self {
        Self {
            engine,
            get_retry_limit,
        }
    }

    /// The engine this bridge executes against
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Execute one command against the storage engine.
    ///
    /// Callable only from the worker thread owning `arena`. The returned
    /// reply may borrow the arena's value buffer and must be encoded before
    /// the arena is touched again.
    pub fn execute<'a>(&self, command: &Command<'_>, arena: &'a mut Arena<E>) -> Reply<'a> {
        arena.reset();

        match command {
            Command::Ping => Reply::Pong,
            Command::Get { key } => self.execute_get(key, arena),
            Command::Set { key, value } => self.execute_set(key, value, arena),
            Command::Unsupported { raw } => {
                let name = String::from_utf8_lossy(raw);
                tracing::debug!(command = %name, "rejecting unsupported command");
                Reply::from(&CoralError::Operation(name.into_owned()))
            }
        }
    }

    fn execute_get<'a>(&self, key: &[u8], arena: &'a mut Arena<E>) -> Reply<'a> {
        let Arena { key_buf, val_buf, txn } = arena;
        key_buf.extend_from_slice(key);

        let mut status = GetStatus::Aborted;
        for attempt in 0..=self.get_retry_limit {
            self.engine.begin(txn);

            let read = self.engine.read(txn, key_buf, val_buf);
            if read == ReadOutcome::Conflict {
                self.engine.abort(txn);
                tracing::trace!(attempt, "GET read conflict");
                continue;
            }

            match self.engine.commit(txn) {
                CommitOutcome::Committed => {
                    status = match read {
                        ReadOutcome::Found => GetStatus::Found,
                        _ => GetStatus::Missing,
                    };
                    break;
                }
                CommitOutcome::Conflict => {
                    // Read-only transaction: nothing was applied, retrying
                    // immediately is safe.
                    tracing::trace!(attempt, "GET commit conflict");
                }
            }
        }

        match status {
            GetStatus::Found => Reply::Value(val_buf.as_slice()),
            GetStatus::Missing => Reply::Miss,
            GetStatus::Aborted => Reply::aborted(),
        }
    }

    fn execute_set<'a>(&self, key: &[u8], value: &[u8], arena: &'a mut Arena<E>) -> Reply<'a> {
        let Arena { key_buf, val_buf, txn } = arena;
        key_buf.extend_from_slice(key);
        val_buf.extend_from_slice(value);

        self.engine.begin(txn);

        match self.engine.write(txn, key_buf, val_buf) {
            WriteOutcome::Conflict => {
                self.engine.abort(txn);
                Reply::aborted()
            }
            WriteOutcome::Staged => match self.engine.commit(txn) {
                CommitOutcome::Committed => Reply::Ok,
                CommitOutcome::Conflict => Reply::aborted(),
            },
        }
    }
}
