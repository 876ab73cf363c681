//! Product records

use serde::{Deserialize, Serialize};

use super::ClientInputError;

/// Store-assigned product identifier.
pub type ProductId = i64;

/// A product as read from the store.
///
/// `Product::default()` is the empty record returned for lookups that
/// find nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    pub price: f64,
}

/// A product that has not been persisted yet.
///
/// Carries no identifier; the store assigns one on persist.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    /// Attach a store-assigned identifier.
    pub(crate) fn identified(self, id: ProductId) -> Product {
        Product {
            id: Some(id),
            name: self.name,
            price: self.price,
        }
    }
}

/// Parse an identifier path segment.
pub fn parse_product_id(raw: &str) -> Result<ProductId, ClientInputError> {
    raw.parse().map_err(|_| ClientInputError::InvalidIdentifier {
        value: raw.to_owned(),
    })
}
