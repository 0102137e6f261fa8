//! Server Module
//!
//! Thread-per-core TCP serving layer.
//!
//! ## Architecture
//! - One worker per OS thread, each exclusively owning one listening socket
//!   bound to the shared address with `SO_REUSEPORT`; the kernel distributes
//!   incoming connections, so workers never coordinate over accepts.
//! - Startup barrier: `Server::start` returns only after every worker has
//!   finished its thread-local setup (arena and buffer allocation) and is
//!   entering its accept loop.
//! - Cooperative shutdown: a shared flag, polled by non-blocking accepts and
//!   read timeouts. In-flight requests run to completion; sockets close;
//!   threads are joined.

mod worker;

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::JoinHandle;

use socket2::{Domain, Protocol, Socket, Type};

use crate::config::Config;
use crate::error::{CoralError, Result};
use crate::executor::Bridge;
use crate::storage::StorageEngine;
use worker::Worker;

/// Listen backlog per worker socket
const LISTEN_BACKLOG: i32 = 1024;

/// A running coralkv server
pub struct Server {
    /// Cooperative shutdown flag shared with all workers
    shutdown: Arc<AtomicBool>,

    /// Worker thread handles, joined by [`Server::join`]
    handles: Vec<JoinHandle<()>>,

    /// The concrete bound address (resolves port 0)
    local_addr: SocketAddr,
}

impl Server {
    /// Start the server: spawn one worker per core (or per
    /// `Config::worker_threads`), wait until all of them are initialized,
    /// and return a running handle.
    pub fn start<E: StorageEngine + 'static>(config: Config, engine: Arc<E>) -> Result<Self> {
        let n_workers = config.effective_workers();

        let requested = config
            .listen_addr
            .to_socket_addrs()
            .map_err(|e| CoralError::Config(format!("invalid listen address: {e}")))?
            .next()
            .ok_or_else(|| {
                CoralError::Config(format!(
                    "listen address '{}' resolved to nothing",
                    config.listen_addr
                ))
            })?;

        // Bind the first socket to resolve port 0, then bind the remaining
        // workers to the same concrete address.
        let first = bind_reuseport(requested)?;
        let local_addr = first.local_addr()?;

        let mut listeners = vec![first];
        for _ in 1..n_workers {
            listeners.push(bind_reuseport(local_addr)?);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let ready = Arc::new(Barrier::new(n_workers + 1));
        let bridge = Bridge::with_retry_limit(engine, config.get_retry_limit);

        let mut handles = Vec::with_capacity(n_workers);
        for (id, listener) in listeners.into_iter().enumerate() {
            let worker = Worker::new(
                id,
                listener,
                bridge.clone(),
                config.clone(),
                Arc::clone(&shutdown),
            );
            let barrier = Arc::clone(&ready);

            let handle = std::thread::Builder::new()
                .name(format!("coralkv-worker-{id}"))
                .spawn(move || worker.run(barrier))?;
            handles.push(handle);
        }

        // Block until every worker has completed its one-time setup
        ready.wait();
        tracing::info!(%local_addr, workers = n_workers, "server ready");

        Ok(Self {
            shutdown,
            handles,
            local_addr,
        })
    }

    /// The concrete address the workers are listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal shutdown. Workers finish their current request, close their
    /// sockets, and exit; no in-flight request is forcibly terminated.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for all worker threads to exit
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
        tracing::info!("server stopped");
    }

    /// Signal shutdown and wait for the workers to exit
    pub fn stop(self) {
        self.shutdown();
        self.join();
    }
}

/// Bind a listening socket with `SO_REUSEPORT` so multiple workers can
/// share one address and let the kernel fan out connections.
fn bind_reuseport(addr: SocketAddr) -> Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    Ok(socket.into())
}
