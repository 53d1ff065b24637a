//! Error handling module for the cart core.
//!
//! Provides the error type returned by backend collaborators, with stable error codes for logging.

use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const WRITE_ERROR: &str = "WRITE_ERROR";
    pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_LOGGED_IN: &str = "NOT_LOGGED_IN";
}

/// Tags naming the operation a logged failure came from.
pub mod tags {
    pub const GET_WRITABLE_CART: &str = "get writable cart";
    pub const UPDATE_CART: &str = "update cart";
    pub const CREATE_CART: &str = "create cart";
    pub const SEARCH_CART: &str = "search cart";
}

/// Cart error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// Record does not exist on the server
    #[error("cart record not found: {0}")]
    NotFound(String),

    /// Transport failure before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// Server answered a write with a non-success status
    #[error("write rejected with status {status}")]
    Write {
        status: u16,
        body: serde_json::Value,
    },

    /// Record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Disallowed item or malformed input
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation needs a logged-in owner
    #[error("no logged-in user to own the cart")]
    NotLoggedIn,
}

impl CartError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CartError::NotFound(_) => codes::NOT_FOUND,
            CartError::Network(_) => codes::NETWORK_ERROR,
            CartError::Write { .. } => codes::WRITE_ERROR,
            CartError::Serialization(_) => codes::SERIALIZATION_ERROR,
            CartError::Validation(_) => codes::VALIDATION_ERROR,
            CartError::NotLoggedIn => codes::NOT_LOGGED_IN,
        }
    }

    /// Raw server response for rejected writes.
    pub fn response_body(&self) -> Option<&serde_json::Value> {
        match self {
            CartError::Write { body, .. } => Some(body),
            _ => None,
        }
    }
}
