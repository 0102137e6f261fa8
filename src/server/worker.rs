//! Worker
//!
//! One OS thread owning one listening socket and the full lifecycle of the
//! connections it accepts. Connections are handled sequentially; within a
//! connection, pipelined frames are decoded, executed, and answered in
//! strict arrival order.
//!
//! Per-connection state machine:
//! `Accepted → Reading → (Decoding → Executing → Encoding → Writing)* → Closed`
//!
//! All scratch resources (arena, decoder, read chunk, write buffer) are
//! allocated once during the worker's startup and reused for every
//! connection; closing a connection returns them to the worker's pool,
//! it never deallocates them.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use crate::config::Config;
use crate::error::{CoralError, Result};
use crate::executor::{Arena, Bridge};
use crate::protocol::{encode_reply, Decoder, Reply};
use crate::storage::StorageEngine;

/// How long an idle accept loop sleeps before re-checking shutdown
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Worker-owned scratch state, allocated once at startup
struct Scratch<E: StorageEngine> {
    arena: Arena<E>,
    decoder: Decoder,
    chunk: Vec<u8>,
    write_buf: Vec<u8>,
}

/// One serving thread: listener + accept/serve loop
pub(crate) struct Worker<E: StorageEngine> {
    id: usize,
    listener: TcpListener,
    bridge: Bridge<E>,
    config: Config,
    shutdown: Arc<AtomicBool>,
}

impl<E: StorageEngine> Worker<E> {
    pub(crate) fn new(
        id: usize,
        listener: TcpListener,
        bridge: Bridge<E>,
        config: Config,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            listener,
            bridge,
            config,
            shutdown,
        }
    }

    /// Thread entry point: one-time setup, barrier, then the accept loop.
    pub(crate) fn run(self, ready: Arc<Barrier>) {
        // One-time thread-local setup before signaling readiness
        let setup = self.setup();

        // The server blocks on this barrier; reach it even if setup failed
        // so startup cannot deadlock.
        ready.wait();

        let mut scratch = match setup {
            Ok(scratch) => scratch,
            Err(e) => {
                tracing::error!(worker = self.id, error = %e, "worker setup failed");
                return;
            }
        };

        tracing::info!(worker = self.id, "worker ready");
        self.accept_loop(&mut scratch);
        tracing::info!(worker = self.id, "worker stopped");
    }

    /// Allocate the worker's reusable resources and prepare the listener
    fn setup(&self) -> Result<Scratch<E>> {
        // Non-blocking accepts let the loop poll the shutdown flag
        self.listener.set_nonblocking(true)?;

        Ok(Scratch {
            arena: Arena::new(self.bridge.engine().as_ref()),
            decoder: Decoder::with_capacity(self.config.read_chunk_size),
            chunk: vec![0u8; self.config.read_chunk_size],
            write_buf: Vec::with_capacity(self.config.read_chunk_size),
        })
    }

    /// Accept connections until shutdown, serving each one to completion
    fn accept_loop(&self, scratch: &mut Scratch<E>) {
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!(worker = self.id, %peer, "connection established");
                    match self.serve_connection(stream, scratch) {
                        Ok(()) => {
                            tracing::debug!(worker = self.id, %peer, "connection closed")
                        }
                        Err(e) => {
                            tracing::warn!(worker = self.id, %peer, error = %e, "connection closed")
                        }
                    }
                    // Buffers return to the worker's pool for the next
                    // connection; the decoder must not carry bytes over.
                    scratch.decoder.reset();
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!(worker = self.id, error = %e, "accept failed");
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }

    /// Serve one connection until EOF, shutdown, or a fatal error.
    ///
    /// `Ok(())` is a clean close (peer EOF, reset, or shutdown); `Err` is a
    /// connection-fatal condition worth a warning. Neither ever terminates
    /// the worker.
    fn serve_connection(&self, mut stream: TcpStream, scratch: &mut Scratch<E>) -> Result<()> {
        // The listener is non-blocking; the accepted stream must not be.
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        if self.config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(self.config.read_timeout_ms)))?;
        }

        loop {
            // Reading
            let n = match stream.read(&mut scratch.chunk) {
                Ok(0) => return Ok(()), // peer closed
                Ok(n) => n,
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    // Idle: close on shutdown, otherwise keep waiting
                    if self.shutdown.load(Ordering::Relaxed) {
                        return Ok(());
                    }
                    continue;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::ConnectionReset
                        || e.kind() == std::io::ErrorKind::ConnectionAborted =>
                {
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            scratch.decoder.feed(&scratch.chunk[..n]);

            // Decoding → Executing → Encoding, in strict arrival order for
            // every complete frame already buffered (pipelining)
            scratch.write_buf.clear();
            loop {
                match scratch.decoder.next() {
                    Ok(Some(command)) => {
                        tracing::trace!(worker = self.id, command = command.name(), "executing");
                        let reply = self.bridge.execute(&command, &mut scratch.arena);
                        encode_reply(&reply, &mut scratch.write_buf);
                    }
                    Ok(None) => break, // partial frame: wait for more bytes
                    Err(err @ CoralError::Protocol(_)) => {
                        // Malformed frame: answer it and close; RESP gives
                        // no safe resynchronization point past this.
                        encode_reply(&Reply::from(&err), &mut scratch.write_buf);
                        let _ = stream.write_all(&scratch.write_buf);
                        return Err(err);
                    }
                    Err(e) => return Err(e),
                }
            }

            // Writing
            if !scratch.write_buf.is_empty() {
                stream.write_all(&scratch.write_buf)?;
            }
        }
    }
}
