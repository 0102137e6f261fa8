//! Protocol codec
//!
//! Streaming RESP decoder and reply encoder.
//!
//! The decoder is resumable: bytes are accumulated with [`Decoder::feed`],
//! and [`Decoder::next`] yields one complete command per call, returning
//! `Ok(None)` while the current frame is still partial. Remaining bytes stay
//! buffered for the next read, so pipelined and split frames both work.
//!
//! A framing-level parse failure is unrecoverable for the connection: RESP
//! has no self-synchronizing frame boundary, so the caller is expected to
//! send one error reply and close (see the server module).

use bytes::BytesMut;

use crate::error::{CoralError, Result};
use super::{Command, Reply};

/// Maximum bulk string length accepted from a client (Redis's own limit)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Maximum number of elements in a command array
pub const MAX_ARGS: usize = 128;

/// Maximum digits accepted in a length line
const MAX_LEN_DIGITS: usize = 10;

const CRLF: &[u8; 2] = b"\r\n";

// =============================================================================
// Decoder
// =============================================================================

/// Streaming command decoder.
///
/// Owns the accumulation buffer and the storage for the most recently
/// decoded frame; the `Command` returned by [`Decoder::next`] borrows that
/// frame and is valid until the next call.
pub struct Decoder {
    /// Unconsumed stream bytes
    buf: BytesMut,

    /// Bytes of the most recently decoded frame
    frame: BytesMut,

    /// Argument byte ranges into `frame`, reused across frames
    args: Vec<(usize, usize)>,
}

impl Decoder {
    /// Create a decoder with the default buffer capacity
    pub fn new() -> Self {
        Self::with_capacity(16 * 1024)
    }

    /// Create a decoder with a specific initial buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            frame: BytesMut::new(),
            args: Vec::with_capacity(8),
        }
    }

    /// Append bytes read from the socket
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of buffered, not-yet-consumed bytes
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop all buffered state, retaining capacity.
    ///
    /// Workers call this between connections so one client's leftover bytes
    /// never leak into the next connection's stream.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.frame.clear();
        self.args.clear();
    }

    /// Decode the next complete command, if one is fully buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. On success the frame's
    /// bytes are moved out of the stream buffer, so the returned command's
    /// borrowed key/value stay valid until the next `next()` call.
    pub fn next(&mut self) -> Result<Option<Command<'_>>> {
        self.args.clear();

        let consumed = match scan_frame(&self.buf, &mut self.args)? {
            Some(len) => len,
            None => return Ok(None),
        };

        self.frame = self.buf.split_to(consumed);
        Ok(Some(Command::from_frame(&self.frame, &self.args)))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Frame scanning
// =============================================================================

/// Scan one complete array-of-bulk-strings frame at the start of `buf`.
///
/// On success returns the total frame length in bytes and fills `args` with
/// the byte range of each argument. Returns `Ok(None)` if the frame is not
/// yet complete.
fn scan_frame(buf: &[u8], args: &mut Vec<(usize, usize)>) -> Result<Option<usize>> {
    if buf.is_empty() {
        return Ok(None);
    }

    if buf[0] != b'*' {
        return Err(CoralError::Protocol(format!(
            "expected array frame, found type byte 0x{:02x}",
            buf[0]
        )));
    }

    let mut pos = 1;

    // Element count line
    let count = match read_length(buf, &mut pos, "multibulk")? {
        Some(n) => n,
        None => return Ok(None),
    };
    if count < 1 || count as usize > MAX_ARGS {
        return Err(CoralError::Protocol(format!(
            "invalid multibulk length {count}"
        )));
    }

    // Each element must be a bulk string: $<len>\r\n<data>\r\n
    for _ in 0..count {
        if pos >= buf.len() {
            return Ok(None);
        }
        if buf[pos] != b'$' {
            return Err(CoralError::Protocol(format!(
                "expected bulk string, found type byte 0x{:02x}",
                buf[pos]
            )));
        }
        pos += 1;

        let len = match read_length(buf, &mut pos, "bulk")? {
            Some(n) => n,
            None => return Ok(None),
        };
        if len < 0 || len as usize > MAX_BULK_LEN {
            return Err(CoralError::Protocol(format!("invalid bulk length {len}")));
        }

        let start = pos;
        let end = start + len as usize;
        if buf.len() < end + CRLF.len() {
            return Ok(None);
        }
        if &buf[end..end + CRLF.len()] != CRLF {
            return Err(CoralError::Protocol(
                "bulk string missing CRLF terminator".to_string(),
            ));
        }

        args.push((start, end));
        pos = end + CRLF.len();
    }

    Ok(Some(pos))
}

/// Parse a CRLF-terminated decimal length starting at `*pos`.
///
/// Advances `*pos` past the CRLF on success. Returns `Ok(None)` if the line
/// is not complete yet.
fn read_length(buf: &[u8], pos: &mut usize, what: &str) -> Result<Option<i64>> {
    let start = *pos;
    let mut i = start;
    let mut value: i64 = 0;
    let mut negative = false;
    let mut digits = 0;

    loop {
        let Some(&byte) = buf.get(i) else {
            return Ok(None);
        };

        match byte {
            b'\r' => {
                let Some(&next) = buf.get(i + 1) else {
                    return Ok(None);
                };
                if next != b'\n' {
                    return Err(CoralError::Protocol(format!(
                        "{what} length line missing LF"
                    )));
                }
                if digits == 0 {
                    return Err(CoralError::Protocol(format!("empty {what} length")));
                }
                *pos = i + 2;
                return Ok(Some(if negative { -value } else { value }));
            }
            b'-' if i == start => negative = true,
            b'0'..=b'9' => {
                digits += 1;
                if digits > MAX_LEN_DIGITS {
                    return Err(CoralError::Protocol(format!(
                        "{what} length out of range"
                    )));
                }
                value = value * 10 + i64::from(byte - b'0');
            }
            _ => {
                return Err(CoralError::Protocol(format!(
                    "invalid character 0x{byte:02x} in {what} length"
                )));
            }
        }
        i += 1;
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// Append the exact RESP wire representation of a reply.
///
/// The output buffer is worker-owned and reused across requests; the caller
/// clears it per write batch.
pub fn encode_reply(reply: &Reply<'_>, out: &mut Vec<u8>) {
    match reply {
        Reply::Ok => out.extend_from_slice(b"+OK\r\n"),
        Reply::Pong => out.extend_from_slice(b"+PONG\r\n"),
        Reply::Miss => out.extend_from_slice(b"$-1\r\n"),
        Reply::Value(data) => {
            out.push(b'$');
            out.extend_from_slice(data.len().to_string().as_bytes());
            out.extend_from_slice(CRLF);
            out.extend_from_slice(data);
            out.extend_from_slice(CRLF);
        }
        Reply::Error(message) => {
            out.push(b'-');
            out.extend_from_slice(message.as_bytes());
            out.extend_from_slice(CRLF);
        }
    }
}
