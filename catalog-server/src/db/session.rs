//! Session and session-factory seams
//!
//! A `Session` is one transaction against the store. Implementations must
//! roll back any uncommitted work when dropped.

use async_trait::async_trait;

use super::PersistenceError;
use crate::models::{NewProduct, Product, ProductId};

/// One unit of work's view of the store.
#[async_trait]
pub trait Session: Send {
    /// All products, in store-defined order.
    async fn find_all(&mut self) -> Result<Vec<Product>, PersistenceError>;

    /// Look up a product. Absence is `Ok(None)`.
    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, PersistenceError>;

    /// Assign an identifier and write the product within this session.
    async fn persist(&mut self, product: NewProduct) -> Result<Product, PersistenceError>;

    async fn commit(&mut self) -> Result<(), PersistenceError>;

    async fn rollback(&mut self) -> Result<(), PersistenceError>;
}

/// Opens sessions. Shared by every request for the life of the process.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError>;

    /// Release pooled resources at shutdown.
    async fn close(&self) {}
}
