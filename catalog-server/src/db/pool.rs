//! PostgreSQL session factory
//!
//! Uses sqlx PgPool with explicit connection limits. Each session owns one
//! pooled connection inside a transaction; sqlx rolls the transaction back
//! and returns the connection if the session is dropped uncommitted.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use super::{PersistenceError, Session, SessionFactory};
use crate::config::StoreConfig;
use crate::models::{NewProduct, Product, ProductId};

const CREATE_PRODUCTS: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id    BIGSERIAL PRIMARY KEY,
        name  TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )
"#;

/// Session factory backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgSessionFactory {
    pool: PgPool,
}

impl PgSessionFactory {
    /// Connect, validate one connection, and make sure the products table
    /// exists.
    ///
    /// # Errors
    ///
    /// Unreachable stores are `Transient`; bad credentials or a failing
    /// schema bootstrap are `Permanent`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, PersistenceError> {
        tracing::debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "connecting to store"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(config.connect_options())
            .await?;

        let factory = Self::from_pool(pool);
        factory.bootstrap_schema().await?;
        Ok(factory)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn bootstrap_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_PRODUCTS).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for PgSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, PersistenceError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx: Some(tx) }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// One transaction on one pooled connection.
struct PgSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, PersistenceError> {
        self.tx
            .as_mut()
            .ok_or_else(|| PersistenceError::permanent("session already closed"))
    }
}

#[async_trait]
impl Session for PgSession {
    async fn find_all(&mut self) -> Result<Vec<Product>, PersistenceError> {
        let tx = self.tx()?;
        let products = sqlx::query_as::<_, Product>("SELECT id, name, price FROM products")
            .fetch_all(&mut **tx)
            .await?;
        Ok(products)
    }

    async fn find_by_id(&mut self, id: ProductId) -> Result<Option<Product>, PersistenceError> {
        let tx = self.tx()?;
        let product =
            sqlx::query_as::<_, Product>("SELECT id, name, price FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(product)
    }

    async fn persist(&mut self, product: NewProduct) -> Result<Product, PersistenceError> {
        let tx = self.tx()?;
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price)
            VALUES ($1, $2)
            RETURNING id, name, price
            "#,
        )
        .bind(&product.name)
        .bind(product.price)
        .fetch_one(&mut **tx)
        .await?;
        Ok(product)
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Err(PersistenceError::permanent("session already closed")),
        }
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Ok(()),
        }
    }
}
