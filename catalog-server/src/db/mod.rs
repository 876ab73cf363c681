//! Persistence layer - session factories, worker pool, gateway
//!
//! # Design Principles
//!
//! - One session (one transaction, one pooled connection) per unit of work
//! - Units of work run on the persistence worker pool, never on the event loop
//! - Commit on success, roll back on failure or drop
//! - Errors carry a transient/permanent kind and no retry happens here

pub mod error;
pub mod gateway;
pub mod memory;
pub mod pool;
pub mod session;
pub mod workers;

pub use error::PersistenceError;
pub use gateway::Gateway;
pub use memory::MemoryStore;
pub use pool::PgSessionFactory;
pub use session::{Session, SessionFactory};
pub use workers::WorkerPool;
