//! # coralkv
//!
//! A Redis-protocol-compatible, in-memory key-value server with:
//! - Thread-per-core serving model (blocking I/O, no async runtime)
//! - Streaming, resumable RESP decoder with pipelining support
//! - Per-worker execution arenas (staging buffers reset, never reallocated)
//! - Synchronous execution bridge over a pluggable storage capability
//! - Optional single-command transactional isolation (optimistic concurrency)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Server                               │
//! │        (spawns N workers, startup barrier, shutdown)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one listening socket per worker
//!                       │ (SO_REUSEPORT kernel fan-out)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Worker                               │
//! │   accept → read → decode → execute → encode → write → loop   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ execute(Command, Arena) -> Reply
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Execution Bridge                          │
//! │        (begin / read / write / commit / abort per cmd)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  MapEngine  │          │  OccEngine  │
//!   │ (no txns)   │          │ (versioned) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! Workers share nothing but the storage engine; every other resource
//! (listener, connection buffers, decoder, arena) is owned by exactly one
//! worker thread for its whole lifetime.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod storage;
pub mod executor;
pub mod server;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CoralError, Result};
pub use config::Config;
pub use executor::{Arena, Bridge};
pub use server::Server;
pub use storage::{MapEngine, OccEngine, StorageEngine};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of coralkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
