//! Error types for the dispatcher and the typed task client.
//!
//! # Design
//! `DispatchError` covers everything that stops an exchange from reaching a
//! status code: caller mistakes (unsupported media, unencodable payload)
//! surface before any I/O, transport faults surface after. A status outside
//! the success set is not an error at this layer; it is `Outcome::Failure`.
//!
//! `ApiError` is the typed client's view, where a failure status does become
//! an error. `NotFound` gets its own variant because callers frequently
//! distinguish "the task does not exist" from any other rejection.

use crate::transport::TransportError;

/// Errors raised by `Dispatcher` and `Exchange`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The caller asked for a media format other than `application/json`.
    #[error("media format not supported: {0:?}")]
    UnsupportedMediaFormat(String),

    /// The payload could not be serialized to JSON.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The exchange never produced a status code.
    #[error("transport fault: {0}")]
    Transport(#[from] TransportError),

    /// An asynchronous exchange's worker exited without reporting a result.
    #[error("exchange abandoned before completion")]
    Abandoned,
}

impl DispatchError {
    /// True for errors caused by how the dispatcher was called.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DispatchError::UnsupportedMediaFormat(_) | DispatchError::Serialization(_)
        )
    }
}

/// Errors returned by `TaskClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("task not found")]
    NotFound,

    /// The server returned a status outside the success set other than 404.
    #[error("request rejected with HTTP {status}")]
    Http { status: u16 },

    /// The server reported success but sent no body to decode.
    #[error("response body was empty")]
    EmptyBody,

    /// The response body was not the expected JSON shape.
    #[error("response deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
