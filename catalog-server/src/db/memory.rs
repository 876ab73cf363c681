//! In-process store
//!
//! Behaves like the PostgreSQL factory from a handler's point of view:
//! writes stay private to their session until commit, identifiers are
//! assigned at persist time and never reused, even after a rollback.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{PersistenceError, Session, SessionFactory};
use crate::models::{NewProduct, Product, ProductId};

#[derive(Default)]
struct Committed {
    rows: BTreeMap<ProductId, Product>,
    last_id: ProductId,
}

/// Shared in-memory product table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Committed>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows. Still counts after a session panicked
    /// while holding the lock.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(inner: &Mutex<Committed>) -> Result<MutexGuard<'_, Committed>, PersistenceError> {
    inner
        .lock()
        .map_err(|_| PersistenceError::permanent("memory store lock poisoned"))
}

#[async_trait]
impl SessionFactory for MemoryStore {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError> {
        Ok(Box::new(MemorySession {
            store: Arc::clone(&self.inner),
            pending: Vec::new(),
        }))
    }
}

struct MemorySession {
    store: Arc<Mutex<Committed>>,
    pending: Vec<Product>,
}

#[async_trait]
impl Session for MemorySession {
    async fn find_all(&mut self) -> Result<Vec<Product>, PersistenceError> {
        let committed = lock(&self.store)?;
        Ok(committed
            .rows
            .values()
            .chain(self.pending.iter())
            .cloned()
            .collect())
    }

    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, PersistenceError> {
        if let Some(product) = self.pending.iter().find(|p| p.id == Some(id)) {
            return Ok(Some(product.clone()));
        }
        Ok(lock(&self.store)?.rows.get(&id).cloned())
    }

    async fn persist(&mut self, product: NewProduct) -> Result<Product, PersistenceError> {
        let id = {
            let mut committed = lock(&self.store)?;
            committed.last_id += 1;
            committed.last_id
        };

        let product = product.identified(id);
        self.pending.push(product.clone());
        Ok(product)
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        let mut committed = lock(&self.store)?;
        for product in self.pending.drain(..) {
            if let Some(id) = product.id {
                committed.rows.insert(id, product);
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.pending.clear();
        Ok(())
    }
}
