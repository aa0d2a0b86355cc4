//! Cache Entry Module
//!
//! Defines the structure for individual cached response objects.

use bytes::Bytes;

// == Cache Entry ==
/// A single cached response body plus its LRU bookkeeping.
///
/// The payload is an immutable, reference-counted byte sequence. Handing a
/// clone of it to a reader keeps the memory alive until that reader drops
/// the clone, so an entry evicted from the index mid-read is never freed
/// out from under the reader.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The full captured response body
    pub payload: Bytes,
    /// Logical timestamp of the last lookup hit (or creation); smallest
    /// value across all live entries marks the eviction candidate
    pub last_used: u64,
}

impl CacheEntry {
    /// Creates a new entry stamped with the given logical time.
    pub fn new(payload: Bytes, now: u64) -> Self {
        Self {
            payload,
            last_used: now,
        }
    }

    /// Payload length in bytes, the entry's contribution to `used_bytes`.
    pub fn len(&self) -> usize {
        self.payload.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(Bytes::from_static(b"hello"), 7);

        assert_eq!(entry.payload, Bytes::from_static(b"hello"));
        assert_eq!(entry.last_used, 7);
        assert_eq!(entry.len(), 5);
    }

    #[test]
    fn test_payload_clone_shares_memory() {
        let entry = CacheEntry::new(Bytes::from(vec![1u8, 2, 3]), 0);

        // A handle handed to a reader stays valid after the entry is dropped.
        let handle = entry.payload.clone();
        drop(entry);
        assert_eq!(&handle[..], &[1, 2, 3]);
    }
}
