//! Error types for liveo
//!
//! This module defines the application-level `Error` used by every liveo crate.
//! Errors are handled at the boundary where they occur: a malformed envelope is
//! logged and dropped, a failed API call rejects its pending future, and a
//! connectivity loss becomes a state transition. Nothing here is meant to escape
//! as an unrecoverable fault.
//!
//! Reconciliation failures are deliberately *not* errors. A delta built against a
//! different base is an expected condition and is reported through
//! [`Reconciliation::RebaseRequired`](crate::reconcile::Reconciliation).
//!
//! # Examples
//!
//! ```rust
//! use liveo_core::Error;
//!
//! let error = Error::Api("no such action".into());
//! assert_eq!(error.to_string(), "API error: no such action");
//! ```

use thiserror::Error;

/// Result type for liveo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for liveo operations
///
/// The type is `Clone` so that a single failure (for example a dropped
/// connection) can be delivered to every pending request at once.
///
/// # Error Categories
///
/// - **Envelope errors**: Parse, InvalidEnvelope, UnknownEnvelopeType
/// - **Protocol errors**: Api (a `Success: false` response)
/// - **Connectivity**: NotConnected, ConnectionClosed, WebSocket
/// - **Processing errors**: Serialization, Internal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Serialization or deserialization of a typed payload failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Incoming text is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The envelope is JSON but misses a field its `Type` requires
    ///
    /// Examples: an `Event` without `Name`, an `API` message without `Resp`.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The envelope `Type` is missing or not one of `Error`, `API`, `Event`
    #[error("Unknown envelope type: {0}")]
    UnknownEnvelopeType(String),

    /// The server answered an API request with `Success: false`
    ///
    /// Carries the server's `ErrorMessage` verbatim.
    #[error("API error: {0}")]
    Api(String),

    /// A send was attempted while the channel is not open
    #[error("Websocket not connected")]
    NotConnected,

    /// The channel closed while a request was still pending
    #[error("Connection closed")]
    ConnectionClosed,

    /// WebSocket transport layer error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Unexpected internal condition
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
