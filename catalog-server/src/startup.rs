//! Startup orchestration
//!
//! Two subsystems come up independently:
//! - the persistence gateway, initialized on the worker pool
//! - the HTTP listener, bound on the event loop
//!
//! `start` resolves once both are ready. The first failure wins and is
//! returned immediately; whatever the other subsystem does afterwards is
//! only logged.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};

use crate::config::StartupConfig;
use crate::db::{Gateway, PersistenceError, PgSessionFactory, SessionFactory, WorkerPool};
use crate::http::server;

/// The two independently started subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    Persistence,
    Listener,
}

impl Subsystem {
    /// Everything `start` waits for, in start order.
    pub const ALL: [Subsystem; 2] = [Subsystem::Persistence, Subsystem::Listener];
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence => f.write_str("persistence"),
            Self::Listener => f.write_str("listener"),
        }
    }
}

/// Startup failed; the process must not serve traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("persistence gateway failed to initialize: {0}")]
    Persistence(#[source] PersistenceError),

    #[error("failed to bind listener on {addr}: {source}")]
    Listener {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{subsystem} startup task aborted: {source}")]
    Aborted {
        subsystem: Subsystem,
        #[source]
        source: JoinError,
    },
}

impl StartupError {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            Self::Persistence(_) => Subsystem::Persistence,
            Self::Listener { .. } => Subsystem::Listener,
            Self::Aborted { subsystem, .. } => *subsystem,
        }
    }
}

type StartupTask<T> = JoinHandle<Result<T, StartupError>>;

/// Both subsystems are up. Nothing has been dispatched yet.
pub struct Ready {
    gateway: Gateway,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Ready {
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until `shutdown` resolves, then close the gateway.
    pub async fn serve<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let gateway = self.gateway.clone();
        let app = server::build_router(server::AppState::new(self.gateway));

        tracing::info!(addr = %self.local_addr, "serving requests");
        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        gateway.close().await;
        tracing::info!("server shutdown complete");
        served
    }
}

/// Start against the PostgreSQL store described by `config.store`.
pub async fn start(config: &StartupConfig, workers: WorkerPool) -> Result<Ready, StartupError> {
    let store = config.store.clone();
    start_with(config, workers, async move {
        let factory = PgSessionFactory::connect(&store).await?;
        Ok::<Arc<dyn SessionFactory>, PersistenceError>(Arc::new(factory))
    })
    .await
}

/// Start with any session-factory initializer.
///
/// `init` runs on the worker pool; the listener is bound on the caller's
/// runtime. Neither waits for the other.
pub async fn start_with<I>(
    config: &StartupConfig,
    workers: WorkerPool,
    init: I,
) -> Result<Ready, StartupError>
where
    I: Future<Output = Result<Arc<dyn SessionFactory>, PersistenceError>> + Send + 'static,
{
    let persistence = workers.spawn(async move {
        let factory = init.await.map_err(StartupError::Persistence)?;
        tracing::info!(subsystem = %Subsystem::Persistence, "persistence gateway ready");
        Ok::<_, StartupError>(factory)
    });

    let bind_addr = config.bind_addr;
    let listener = tokio::spawn(async move {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| StartupError::Listener {
                addr: bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr().unwrap_or(bind_addr);
        tracing::info!(subsystem = %Subsystem::Listener, addr = %local_addr, "HTTP listener bound");
        Ok::<_, StartupError>(listener)
    });

    let (factory, listener) = join_ready(persistence, listener).await?;
    let local_addr = listener.local_addr().unwrap_or(bind_addr);

    Ok(Ready {
        gateway: Gateway::new(factory, workers),
        listener,
        local_addr,
    })
}

/// Wait for both startup tasks; the first failure wins.
async fn join_ready<P, L>(
    mut persistence: StartupTask<P>,
    mut listener: StartupTask<L>,
) -> Result<(P, L), StartupError>
where
    P: Send + 'static,
    L: Send + 'static,
{
    tokio::select! {
        outcome = &mut persistence => {
            match settle(outcome, Subsystem::Persistence) {
                Ok(factory) => Ok((factory, settle(listener.await, Subsystem::Listener)?)),
                Err(err) => {
                    watch_straggler(listener, Subsystem::Listener);
                    Err(err)
                }
            }
        }
        outcome = &mut listener => {
            match settle(outcome, Subsystem::Listener) {
                Ok(bound) => Ok((settle(persistence.await, Subsystem::Persistence)?, bound)),
                Err(err) => {
                    watch_straggler(persistence, Subsystem::Persistence);
                    Err(err)
                }
            }
        }
    }
}

fn settle<T>(
    outcome: Result<Result<T, StartupError>, JoinError>,
    subsystem: Subsystem,
) -> Result<T, StartupError> {
    outcome.map_err(|source| StartupError::Aborted { subsystem, source })?
}

/// Log how a subsystem finishes after startup was already abandoned.
/// Its result is dropped, so a bound listener is closed here.
fn watch_straggler<T: Send + 'static>(task: StartupTask<T>, subsystem: Subsystem) {
    tokio::spawn(async move {
        match settle(task.await, subsystem) {
            Ok(_) => tracing::debug!(%subsystem, "subsystem became ready after startup failed; discarded"),
            Err(err) => tracing::warn!(%subsystem, error = %err, "subsystem also failed during startup"),
        }
    });
}
