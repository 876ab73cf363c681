//! catalog-server: product catalog over HTTP
//!
//! Brings up two independent subsystems, the persistence gateway and the
//! HTTP listener, and only serves traffic once both report ready.
//! Handlers never touch the store from the event loop; every unit of work
//! runs on a dedicated persistence worker pool.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod startup;

pub use config::{ConfigError, StartupConfig, StoreConfig};
pub use db::{Gateway, PersistenceError, WorkerPool};
pub use models::{ClientInputError, NewProduct, Product, ProductId};
pub use startup::{start, start_with, Ready, StartupError, Subsystem};
