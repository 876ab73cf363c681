//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::AppState;
use crate::startup::Subsystem;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Subsystems that completed startup
    pub subsystems: [Subsystem; 2],
    pub uptime_secs: u64,
}

/// GET /health
///
/// The router is only built from a `Ready`, so every subsystem listed here
/// finished startup before the first request was accepted.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        subsystems: Subsystem::ALL,
        uptime_secs: state.ready_at.elapsed().as_secs(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Gateway, MemoryStore, WorkerPool};

    #[tokio::test]
    async fn reports_started_subsystems() {
        let gateway = Gateway::new(Arc::new(MemoryStore::new()), WorkerPool::current());
        let Json(body) = health(State(Arc::new(AppState::new(gateway)))).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.subsystems, [Subsystem::Persistence, Subsystem::Listener]);
        assert_eq!(body.uptime_secs, 0);
    }
}
