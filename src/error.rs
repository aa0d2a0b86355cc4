//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for a single proxied connection.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The client request could not be parsed
    #[error("malformed request: {0}")]
    BadRequest(String),

    /// The client used a method other than GET
    #[error("method not implemented: {0}")]
    NotImplemented(String),

    /// Could not open a connection to the origin server
    #[error("cannot connect to origin {host}:{port}: {source}")]
    OriginConnect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Failed to write the forwarded request to the origin
    #[error("cannot write request to origin: {0}")]
    OriginWrite(#[source] io::Error),

    /// Failed reading the origin's response mid-stream
    #[error("error reading response from origin: {0}")]
    OriginRead(#[source] io::Error),

    /// Failed writing to the client socket
    #[error("error writing to client: {0}")]
    ClientWrite(#[source] io::Error),
}

impl ProxyError {
    // == Status Mapping ==
    /// Maps the error to the HTTP/1.0 status line it should produce, if any.
    ///
    /// Mid-stream transfer errors return `None`: the client has already
    /// received part of a real response, so no error page may be injected.
    pub fn status(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ProxyError::BadRequest(_) => Some(("400", "Bad Request")),
            ProxyError::NotImplemented(_) => Some(("501", "Not Implemented")),
            ProxyError::OriginConnect { .. } => Some(("500", "Server Error")),
            ProxyError::OriginWrite(_) => Some(("500", "Server Error")),
            ProxyError::OriginRead(_) => None,
            ProxyError::ClientWrite(_) => None,
        }
    }
}

// == Cache Error Enum ==
/// Failure modes of a cache store. Both are non-fatal for the connection:
/// the client already received its bytes by the time a store runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The key is already cached; existing entries are never replaced
    #[error("key already cached: {0}")]
    AlreadyPresent(String),

    /// The payload can never fit within the cache capacity
    #[error("object of {size} bytes exceeds cache capacity of {capacity} bytes")]
    ObjectTooLarge { size: usize, capacity: usize },
}

// == Result Type Alias ==
/// Convenience Result type for connection handling.
pub type Result<T> = std::result::Result<T, ProxyError>;
