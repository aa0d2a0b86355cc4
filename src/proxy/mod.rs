//! Proxy Module
//!
//! The accept loop and the per-connection worker.

mod listener;
mod worker;

// Re-export public types
pub use listener::run;
pub use worker::handle_connection;
