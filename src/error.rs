//! Unified error type.

use thiserror::Error;

/// The error type returned by kelp's fallible operations.
///
/// Application-level failures are not `Error`s: a handler reports them as an
/// [`ErrorResponse`](crate::ErrorResponse) inside a `200` envelope, and route
/// misses become bare `404`/`405` responses. This type surfaces infrastructure
/// failures: binding a port, reading a request body, talking to an upstream.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("request body: {0}")]
    Body(#[from] hyper::Error),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("logging: {0}")]
    Logging(String),
}
