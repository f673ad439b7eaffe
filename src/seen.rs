//! Duplicate suppression for routed messages.
//!
//! Flooding forwards every new message to every interested neighbor, so
//! a message reaches a well-connected node many times. The [`SeenCache`]
//! remembers message identities for a retention window and lets exactly
//! one copy through.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::identity::PeerId;

/// The identity of a message: origin plus the origin-unique seqno.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct MessageKey {
    pub from: PeerId,
    pub seqno: Vec<u8>,
}

/// Time-windowed set of message identities.
///
/// Entries expire after the retention TTL. The capacity bound is a
/// safety net, not part of the protocol: under sustained overload the
/// oldest identities fall out early and a late duplicate may slip
/// through, which flood semantics tolerate.
///
/// Touched only from the router loop; no interior locking.
pub(crate) struct SeenCache {
    entries: LruCache<MessageKey, Instant>,
    ttl: Duration,
}

impl SeenCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Returns true iff `key` was not already present, inserting it.
    ///
    /// An entry older than the TTL counts as absent and is refreshed.
    pub fn test_and_insert(&mut self, key: MessageKey) -> bool {
        self.purge_expired();
        let now = Instant::now();
        match self.entries.get_mut(&key) {
            Some(inserted_at) if now.duration_since(*inserted_at) <= self.ttl => false,
            Some(inserted_at) => {
                *inserted_at = now;
                true
            }
            None => {
                self.entries.put(key, now);
                true
            }
        }
    }

    /// Drop expired entries from the cold end of the cache.
    ///
    /// Insertion order and recency order coincide here because lookups
    /// only happen in `test_and_insert`, so walking the LRU tail visits
    /// the oldest entries first.
    fn purge_expired(&mut self) {
        let now = Instant::now();
        while let Some((_, inserted_at)) = self.entries.peek_lru() {
            if now.duration_since(*inserted_at) > self.ttl {
                self.entries.pop_lru();
            } else {
                break;
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8, seqno: u64) -> MessageKey {
        MessageKey {
            from: PeerId::from_bytes([seed; 32]),
            seqno: seqno.to_be_bytes().to_vec(),
        }
    }

    #[test]
    fn first_insert_passes_duplicate_rejected() {
        let mut cache = SeenCache::new(128, Duration::from_secs(120));
        assert!(cache.test_and_insert(key(1, 1)));
        assert!(!cache.test_and_insert(key(1, 1)));
        assert!(!cache.test_and_insert(key(1, 1)));
    }

    #[test]
    fn identity_is_origin_and_seqno() {
        let mut cache = SeenCache::new(128, Duration::from_secs(120));
        assert!(cache.test_and_insert(key(1, 7)));
        // Same seqno from a different origin is a different message.
        assert!(cache.test_and_insert(key(2, 7)));
        // Different seqno from the same origin likewise.
        assert!(cache.test_and_insert(key(1, 8)));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = SeenCache::new(128, Duration::from_millis(20));
        assert!(cache.test_and_insert(key(1, 1)));
        assert!(!cache.test_and_insert(key(1, 1)));

        std::thread::sleep(Duration::from_millis(40));

        // The retention window elapsed: the identity counts as new again.
        assert!(cache.test_and_insert(key(1, 1)));
        assert!(!cache.test_and_insert(key(1, 1)));
    }

    #[test]
    fn expired_entries_are_purged_on_insert() {
        let mut cache = SeenCache::new(128, Duration::from_millis(20));
        for i in 0..10 {
            assert!(cache.test_and_insert(key(1, i)));
        }
        assert_eq!(cache.len(), 10);

        std::thread::sleep(Duration::from_millis(40));

        assert!(cache.test_and_insert(key(2, 0)));
        // The ten stale identities fell out during the insert.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn capacity_bounds_growth() {
        let mut cache = SeenCache::new(4, Duration::from_secs(120));
        for i in 0..100 {
            assert!(cache.test_and_insert(key(1, i)));
        }
        assert_eq!(cache.len(), 4);
    }
}
