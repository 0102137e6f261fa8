//! Executor Module
//!
//! The synchronous execution bridge between decoded protocol commands and
//! the storage capability, plus the per-worker arena it stages through.
//!
//! ## Contract
//! - `Bridge::execute(Command, Arena) -> Reply` is synchronous and is only
//!   ever called from the worker thread that owns the arena.
//! - Exactly one transaction is opened per GET/SET attempt and always
//!   terminated (commit or abort) before the reply is produced.
//! - Every engine outcome is mapped to a reply; nothing propagates uncaught.
//! - The reply's payload borrows the arena's value buffer, so the borrow
//!   checker forbids resetting the arena before the reply is encoded.

mod arena;
mod bridge;

pub use arena::Arena;
pub use bridge::Bridge;
