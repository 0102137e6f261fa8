//! Configuration for coralkv
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a coralkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address. Every worker binds its own socket to this address
    /// with `SO_REUSEPORT`; the kernel distributes incoming connections.
    pub listen_addr: String,

    /// Number of worker threads. 0 means "one per available core".
    pub worker_threads: usize,

    /// Per-connection read timeout (milliseconds). Workers use it to poll
    /// the shutdown flag while a connection is idle; it does not drop the
    /// connection unless shutdown was requested.
    pub read_timeout_ms: u64,

    /// Size of the socket read chunk each worker reuses (bytes).
    pub read_chunk_size: usize,

    // -------------------------------------------------------------------------
    // Execution Configuration
    // -------------------------------------------------------------------------
    /// How many times a read-only GET transaction is immediately retried
    /// after a conflict before the error is surfaced to the client.
    pub get_retry_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:6379".to_string(),
            worker_threads: 0,
            read_timeout_ms: 100,
            read_chunk_size: 16 * 1024,
            get_retry_limit: 1,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve the effective worker count (0 = auto-detect)
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads (0 = one per core)
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the socket read chunk size (in bytes)
    pub fn read_chunk_size(mut self, bytes: usize) -> Self {
        self.config.read_chunk_size = bytes;
        self
    }

    /// Set the GET conflict retry limit
    pub fn get_retry_limit(mut self, retries: usize) -> Self {
        self.config.get_retry_limit = retries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
