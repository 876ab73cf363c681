//! Persistence gateway
//!
//! The only way handlers reach the store. Each call opens one session on
//! the worker pool, runs one unit of work, and commits or rolls back before
//! the result comes back to the caller.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{PersistenceError, Session, SessionFactory, WorkerPool};
use crate::models::{NewProduct, Product, ProductId};

/// Process-scoped handle to the store, built once at startup.
#[derive(Clone)]
pub struct Gateway {
    factory: Arc<dyn SessionFactory>,
    workers: WorkerPool,
}

impl Gateway {
    pub fn new(factory: Arc<dyn SessionFactory>, workers: WorkerPool) -> Self {
        Self { factory, workers }
    }

    /// Run `work` inside a fresh session.
    ///
    /// Writes are committed before `Ok` is returned. On `Err` the session is
    /// rolled back and nothing the unit of work wrote becomes visible.
    pub async fn with_session<T, F>(&self, work: F) -> Result<T, PersistenceError>
    where
        F: for<'s> FnOnce(&'s mut dyn Session) -> BoxFuture<'s, Result<T, PersistenceError>>
            + Send
            + 'static,
        T: Send + 'static,
    {
        let factory = Arc::clone(&self.factory);

        self.workers
            .run(async move {
                let mut session = factory.open().await?;

                match work(&mut *session).await {
                    Ok(value) => {
                        session.commit().await?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = session.rollback().await {
                            tracing::warn!(error = %rollback_err, "rollback failed after unit of work error");
                        }
                        Err(err)
                    }
                }
            })
            .await
    }

    pub async fn find_all(&self) -> Result<Vec<Product>, PersistenceError> {
        self.with_session(|session| session.find_all()).await
    }

    pub async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, PersistenceError> {
        self.with_session(move |session| session.find_by_id(id)).await
    }

    pub async fn persist(&self, product: NewProduct) -> Result<Product, PersistenceError> {
        let product = self
            .with_session(move |session| session.persist(product))
            .await?;
        tracing::debug!(id = ?product.id, "product persisted");
        Ok(product)
    }

    /// Release the underlying pool. Sessions opened afterwards fail.
    pub async fn close(&self) {
        let factory = Arc::clone(&self.factory);
        let closed = self
            .workers
            .run(async move {
                factory.close().await;
                Ok(())
            })
            .await;

        if let Err(err) = closed {
            tracing::warn!(error = %err, "failed to close persistence gateway");
        }
    }
}
