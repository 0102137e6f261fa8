//! Error types for coralkv
//!
//! Provides a unified error type for all operations.
//!
//! A GET miss is deliberately NOT represented here: "not found" is a normal
//! reply (`Reply::Miss`), never an error.

use thiserror::Error;

/// Result type alias using CoralError
pub type Result<T> = std::result::Result<T, CoralError>;

/// Unified error type for coralkv operations
#[derive(Debug, Error)]
pub enum CoralError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// A frame could not be parsed at the framing level. Connection-fatal:
    /// RESP offers no reliable resynchronization point past a bad frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Execution Errors
    // -------------------------------------------------------------------------
    /// A well-framed request named an unknown command or used the wrong
    /// arity. Per-request: the connection stays open.
    #[error("invalid operation: {0}")]
    Operation(String),

    /// A storage transaction could not commit due to contention.
    #[error("transaction aborted")]
    Conflict,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
