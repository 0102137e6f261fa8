//! Reply definitions
//!
//! Represents replies sent to clients.

use std::borrow::Cow;

use crate::error::CoralError;

/// A reply to a single command.
///
/// `Value` borrows the arena's value staging buffer; the borrow checker
/// guarantees the reply is encoded before the arena can be reset or reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<'a> {
    /// `+OK` simple status (successful SET)
    Ok,

    /// `+PONG` simple status (PING)
    Pong,

    /// `$<len>` bulk string (GET hit)
    Value(&'a [u8]),

    /// `$-1` null bulk string (GET miss — not an error)
    Miss,

    /// `-<message>` error reply
    Error(Cow<'static, str>),
}

impl<'a> Reply<'a> {
    /// Error reply for a transaction that could not commit
    pub fn aborted() -> Self {
        Reply::from(&CoralError::Conflict)
    }

    /// True for error replies
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

/// Render an error as a RESP error reply. Every per-request failure mode
/// funnels through here; the connection-fatal ones are additionally
/// surfaced to the worker loop.
impl From<&CoralError> for Reply<'static> {
    fn from(err: &CoralError) -> Self {
        Reply::Error(Cow::Owned(format!("ERR {err}")))
    }
}
