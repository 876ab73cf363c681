//! Client input errors

use thiserror::Error;

/// Input the client got wrong. Always answered with a 4xx, never logged
/// as a server fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientInputError {
    /// Path identifier is not a valid integer
    #[error("invalid product id '{value}': expected an integer")]
    InvalidIdentifier { value: String },

    /// Path did not carry a usable id segment
    #[error("malformed request path: {reason}")]
    MalformedPath { reason: String },

    /// Request body could not be decoded into a product
    #[error("malformed request body: {reason}")]
    MalformedBody { reason: String },
}
