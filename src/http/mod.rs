//! HTTP Module
//!
//! Request translation (client request in, normalized forward request out)
//! and the minimal HTTP/1.0 error pages the proxy can send back.

pub mod request;
pub mod response;

// Re-export public types
pub use request::{translate, ForwardRequest, PROXY_USER_AGENT};
pub use response::error_page;
