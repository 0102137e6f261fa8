//! Command definitions
//!
//! Represents commands decoded from clients.

/// A parsed command.
///
/// Key and value are borrowed views into the decoder's frame buffer and are
/// valid only until the next decode call; copy them if they must outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Get a value by key
    Get { key: &'a [u8] },

    /// Set a key-value pair
    Set { key: &'a [u8], value: &'a [u8] },

    /// Ping (health check, never touches storage)
    Ping,

    /// A well-framed command this server does not implement, or a known
    /// command with the wrong number of arguments. `raw` is the command
    /// name as sent.
    Unsupported { raw: &'a [u8] },
}

impl<'a> Command<'a> {
    /// Build a command from a decoded array frame.
    ///
    /// `args` holds the byte ranges of each bulk-string argument within
    /// `frame`; `args[0]` is the command name, matched case-insensitively.
    pub(crate) fn from_frame(frame: &'a [u8], args: &[(usize, usize)]) -> Self {
        let arg = |i: usize| -> &'a [u8] {
            let (start, end) = args[i];
            &frame[start..end]
        };
        let name = arg(0);

        if name.eq_ignore_ascii_case(b"GET") && args.len() == 2 {
            Command::Get { key: arg(1) }
        } else if name.eq_ignore_ascii_case(b"SET") && args.len() == 3 {
            Command::Set {
                key: arg(1),
                value: arg(2),
            }
        } else if name.eq_ignore_ascii_case(b"PING") && args.len() == 1 {
            Command::Ping
        } else {
            Command::Unsupported { raw: name }
        }
    }

    /// Command name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Ping => "PING",
            Command::Unsupported { .. } => "UNSUPPORTED",
        }
    }
}
