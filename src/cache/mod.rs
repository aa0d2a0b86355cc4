//! Cache Module
//!
//! Provides the in-memory object cache shared by all connection workers:
//! bounded total capacity, LRU eviction by logical timestamp, and payload
//! handles that stay valid across concurrent eviction.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::ObjectCache;

// == Public Constants ==
/// Default total byte capacity of the cache
pub const MAX_CACHE_SIZE: usize = 1024 * 1024;

/// Default maximum size of a single cached response body in bytes
pub const MAX_OBJECT_SIZE: usize = 100 * 1024;
