//! coralkv Server Binary
//!
//! Starts the thread-per-core TCP server.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use coralkv::{Config, MapEngine, OccEngine, Server};

/// Storage engine selection
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Optimistic-transactional versioned map (single-command isolation)
    Occ,
    /// Plain locked map (no transactions, never conflicts)
    Map,
}

/// coralkv Server
#[derive(Parser, Debug)]
#[command(name = "coralkv-server")]
#[command(about = "Redis-protocol-compatible, thread-per-core, in-memory key-value server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Number of worker threads (0 = one per core)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Storage engine
    #[arg(short, long, value_enum, default_value = "occ")]
    engine: EngineKind,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,coralkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("coralkv Server v{}", coralkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .build();

    let server = match args.engine {
        EngineKind::Occ => Server::start(config, Arc::new(OccEngine::new())),
        EngineKind::Map => Server::start(config, Arc::new(MapEngine::new())),
    };

    let server = match server {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Serving on {} with {} workers",
        server.local_addr(),
        server.worker_count()
    );

    // Block until the workers exit (the process runs until killed)
    server.join();
}
