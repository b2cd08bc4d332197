//! ResizeController: load-factor policy and the capacity-doubling rehash.
//!
//! Growth doubles capacity, so every entry's new bucket index differs from
//! its old one by at most the old capacity: entries whose next hash bit is
//! zero stay put, the rest move to `index + old_capacity`. The split reuses
//! each entry's cached hash; no key is rehashed.

use crate::bucket::{Bucket, MIN_TREEIFY_CAPACITY, TREEIFY_THRESHOLD};
use crate::bucket_array::{BucketArray, MAX_CAPACITY};

/// Load factor used when none is requested.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ResizeController {
    load_factor: f64,
}

impl ResizeController {
    /// Panics if the load factor is not a finite positive number.
    pub(crate) fn new(load_factor: f64) -> Self {
        assert!(
            load_factor.is_finite() && load_factor > 0.0,
            "load factor must be a finite positive number, got {load_factor}"
        );
        Self { load_factor }
    }

    pub(crate) fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Check-after-insert policy: grow once `size` strictly exceeds
    /// `capacity * load_factor`.
    pub(crate) fn needs_grow(&self, size: usize, capacity: usize) -> bool {
        size as f64 > capacity as f64 * self.load_factor
    }

    /// Whether growth is still possible. At `MAX_CAPACITY` doubling would
    /// overflow, so the grow is skipped and the table degrades to longer
    /// buckets instead of failing.
    pub(crate) fn can_grow(&self, capacity: usize) -> bool {
        capacity < MAX_CAPACITY
    }

    /// Double the capacity and redistribute every entry by its cached hash.
    /// Each old bucket splits into a low half (same index) and a high half
    /// (index + old capacity). Chains that ended up at or past the treeify
    /// threshold are converted once the new capacity permits trees.
    pub(crate) fn grow<K, V>(&self, array: &mut BucketArray<K, V>) {
        let old_capacity = array.capacity();
        debug_assert!(old_capacity < MAX_CAPACITY);
        let new_capacity = old_capacity * 2;

        let old_buckets = std::mem::take(array.buckets_mut());
        let mut buckets: Vec<Bucket<K, V>> = (0..new_capacity).map(|_| Bucket::new()).collect();
        for (index, bucket) in old_buckets.into_iter().enumerate() {
            for entry in bucket.into_entries() {
                let target = if entry.hash & (old_capacity as u64) == 0 {
                    index
                } else {
                    index + old_capacity
                };
                buckets[target].insert_new(entry);
            }
        }

        if new_capacity >= MIN_TREEIFY_CAPACITY {
            for bucket in &mut buckets {
                if bucket.len() >= TREEIFY_THRESHOLD {
                    bucket.treeify();
                }
            }
        }

        *array = BucketArray::from_buckets(buckets);
    }
}

impl Default for ResizeController {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_FACTOR)
    }
}
