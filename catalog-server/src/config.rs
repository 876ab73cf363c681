//! Startup configuration
//!
//! Built once before orchestration starts and never mutated afterwards.
//! Every field has a default, so an empty TOML file is a valid config.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// Default PostgreSQL port when the supervisor does not supply one.
pub const DEFAULT_STORE_PORT: u16 = 5432;

/// Default number of persistence worker threads.
const DEFAULT_PERSISTENCE_WORKERS: usize = 2;

/// Default maximum connections for the pool.
/// Kept low for a single-resource service.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level startup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Address the HTTP listener binds to (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Threads in the persistence worker pool
    pub persistence_workers: usize,

    pub store: StoreConfig,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            persistence_workers: DEFAULT_PERSISTENCE_WORKERS,
            store: StoreConfig::default(),
        }
    }
}

impl StartupConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Connection parameters for the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_STORE_PORT,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: 5,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// sqlx connect options for this store.
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username);

        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}
