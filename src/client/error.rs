//! Error types for the users client.

use thiserror::Error;

/// Errors returned by [`UsersClient`](super::UsersClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote answered `404`.
    #[error("user not found")]
    NotFound,

    /// The remote rejected a write with `400`.
    #[error("invalid user data")]
    InvalidData,

    /// The health probe at construction did not answer `200`.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// Any other status the operation does not expect.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// Connecting, sending or timing out.
    #[error("http request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("json decode failed: {0}")]
    Decode(#[source] reqwest::Error),

    /// The base URL cannot carry a path.
    #[error("invalid base url `{0}`")]
    InvalidBaseUrl(String),
}
