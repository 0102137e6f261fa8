//! Protocol Module
//!
//! RESP wire protocol for client-server communication.
//!
//! ## Wire Format (RESP2 subset)
//!
//! ### Requests
//! A command is an array of bulk strings:
//! ```text
//! *2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n          GET foo
//! *3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n   SET foo bar
//! *1\r\n$4\r\nPING\r\n                      PING
//! ```
//!
//! ### Replies
//! - `+OK\r\n`            simple status (SET)
//! - `+PONG\r\n`          simple status (PING)
//! - `$<len>\r\n<data>\r\n` bulk string (GET hit)
//! - `$-1\r\n`            null bulk string (GET miss)
//! - `-ERR <message>\r\n` error
//!
//! Decoding is streaming and resumable: a frame split across multiple
//! `read()` calls is reassembled, and pipelined frames in one read are
//! yielded one at a time in arrival order.

mod command;
mod reply;
mod codec;

pub use command::Command;
pub use reply::Reply;
pub use codec::{encode_reply, Decoder, MAX_ARGS, MAX_BULK_LEN};
