//! Proxy Cache - a concurrent caching HTTP forward proxy
//!
//! Relays GET requests from browser clients to origin servers and memoizes
//! small responses in a capacity-bounded, LRU-evicting in-memory cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;

pub use cache::ObjectCache;
pub use config::Config;
