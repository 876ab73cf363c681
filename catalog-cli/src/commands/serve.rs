//! HTTP server command
//!
//! Builds the two runtimes (single-threaded event loop, bounded persistence
//! workers), runs startup orchestration, and serves until Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Builder;

use catalog_server::db::{MemoryStore, SessionFactory};
use catalog_server::http::shutdown_signal;
use catalog_server::{start, start_with, PersistenceError, StartupConfig, WorkerPool};

/// How long in-flight persistence work gets to finish at shutdown.
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// TOML config file (flags below override it)
    #[arg(long, short = 'c', env = "CATALOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind to (default: 127.0.0.1:8080)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// PostgreSQL host (default: localhost)
    #[arg(long, env = "CATALOG_PG_HOST")]
    pub pg_host: Option<String>,

    /// PostgreSQL port (default: 5432)
    #[arg(long, env = "CATALOG_PG_PORT")]
    pub pg_port: Option<u16>,

    /// PostgreSQL password
    #[arg(long, env = "CATALOG_PG_PASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    /// Persistence worker threads (default: 2)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Use the in-process store instead of PostgreSQL
    #[arg(long)]
    pub in_memory: bool,
}

impl ServeArgs {
    /// Defaults, then the config file, then flags/environment.
    pub fn resolve_config(&self) -> Result<StartupConfig> {
        let mut config = match &self.config {
            Some(path) => StartupConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => StartupConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(host) = &self.pg_host {
            config.store.host = host.clone();
        }
        if let Some(port) = self.pg_port {
            config.store.port = port;
        }
        if let Some(password) = &self.pg_password {
            config.store.password = Some(password.clone());
        }
        if let Some(workers) = self.workers {
            config.persistence_workers = workers;
        }

        Ok(config)
    }
}

/// Run the HTTP server (blocks until shutdown)
pub fn run_serve(args: ServeArgs, launched: Instant) -> Result<()> {
    let config = args.resolve_config()?;

    let (workers, persistence_runtime) = WorkerPool::dedicated(config.persistence_workers)
        .context("Failed to start persistence worker pool")?;

    let event_loop = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start event loop")?;

    let result = event_loop.block_on(serve(config, workers, args.in_memory, launched));

    drop(event_loop);
    persistence_runtime.shutdown_timeout(WORKER_SHUTDOWN_TIMEOUT);
    result
}

async fn serve(
    config: StartupConfig,
    workers: WorkerPool,
    in_memory: bool,
    launched: Instant,
) -> Result<()> {
    tracing::info!(
        bind = %config.bind_addr,
        store_port = config.store.port,
        in_memory,
        "Starting catalog"
    );

    let started = if in_memory {
        start_with(&config, workers, async {
            Ok::<Arc<dyn SessionFactory>, PersistenceError>(Arc::new(MemoryStore::new()))
        })
        .await
    } else {
        start(&config, workers).await
    };

    let ready = match started {
        Ok(ready) => ready,
        Err(err) => {
            tracing::error!(subsystem = %err.subsystem(), error = %err, "Deployment failure");
            return Err(err).context("Startup failed");
        }
    };

    tracing::info!(
        addr = %ready.local_addr(),
        elapsed_ms = elapsed_ms(launched),
        "Deployment success"
    );

    ready.serve(shutdown_signal()).await.context("Server error")
}

/// Milliseconds since `since`, saturating at `u64::MAX`.
fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
