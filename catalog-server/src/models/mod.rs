//! Domain models
//!
//! Client input is parsed into these types at the HTTP boundary.
//! Anything that fails to parse is a `ClientInputError`, not a server fault.

pub mod product;
pub mod validation;

pub use product::{NewProduct, Product, ProductId};
pub use validation::ClientInputError;
