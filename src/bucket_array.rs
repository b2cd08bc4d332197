//! BucketArray: the power-of-two-sized array of buckets.
//!
//! Capacity is always a power of two so that bucket indexing is
//! `hash & (capacity - 1)` instead of a modulo. The array owns its buckets
//! and, transitively, every entry; a resize replaces the array wholesale.

use crate::bucket::Bucket;

/// Capacity used when none is requested, and the floor clear() resets to.
pub const DEFAULT_CAPACITY: usize = 16;

/// Largest representable power-of-two capacity. Growing stops here; the
/// table keeps operating with longer buckets instead of failing.
pub(crate) const MAX_CAPACITY: usize = 1 << (usize::BITS - 1);

pub(crate) struct BucketArray<K, V> {
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> BucketArray<K, V> {
    /// Allocate an array of `capacity` empty buckets. A zero request gets
    /// the default capacity; anything else rounds up to the next power of
    /// two, capped at `MAX_CAPACITY`. Explicit requests may go below the
    /// default.
    pub(crate) fn new(requested: usize) -> Self {
        let capacity = Self::normalize(requested);
        let buckets = (0..capacity).map(|_| Bucket::new()).collect();
        Self { buckets }
    }

    /// Build directly from pre-filled buckets; the resize path uses this.
    /// `buckets.len()` must already be a power of two.
    pub(crate) fn from_buckets(buckets: Vec<Bucket<K, V>>) -> Self {
        debug_assert!(buckets.len().is_power_of_two());
        Self { buckets }
    }

    pub(crate) fn normalize(requested: usize) -> usize {
        if requested == 0 {
            DEFAULT_CAPACITY
        } else if requested >= MAX_CAPACITY {
            MAX_CAPACITY
        } else {
            requested.next_power_of_two()
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    pub(crate) fn bucket(&self, index: usize) -> &Bucket<K, V> {
        &self.buckets[index]
    }

    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket<K, V> {
        &mut self.buckets[index]
    }

    pub(crate) fn buckets(&self) -> &[Bucket<K, V>] {
        &self.buckets
    }

    pub(crate) fn buckets_mut(&mut self) -> &mut Vec<Bucket<K, V>> {
        &mut self.buckets
    }

    pub(crate) fn into_buckets(self) -> Vec<Bucket<K, V>> {
        self.buckets
    }
}
