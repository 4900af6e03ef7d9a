//! Crate-level error types.
//!
//! [`ConciergeError`] unifies every error source (configuration, storage,
//! HTTP, WebSocket, JSON) behind a single enum so callers can match on the
//! variant they care about while still using the `?` operator for easy
//! propagation.

use crate::checkout::CheckoutError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConciergeError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum ConciergeError {
    /// An environment variable was missing or could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored snapshot could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("api error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// A WebSocket operation (connect, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// A pushed event did not have the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// An order was rejected before submission.
    #[error("checkout rejected: {0}")]
    Checkout(#[from] CheckoutError),

    /// A service request draft is incomplete.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
