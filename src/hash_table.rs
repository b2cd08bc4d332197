//! HashTable: the public container.
//!
//! Composes the bucket array with the resize controller and routes all key
//! hashing/equality through the injected `KeyAdapter`. Every entry caches
//! its hash at insertion; lookups compare cached hashes before calling the
//! adapter's equality, and resizes redistribute entries without rehashing.
//!
//! Structural mutations (insert of a new key, removal, resize, clear) bump
//! an internal modification counter. Cursors snapshot it and fail fast with
//! `StructuralChange` instead of yielding possibly inconsistent elements.
//! Value-only replacement of an existing key is not structural and does not
//! bump the counter.

use core::fmt;
use core::mem;

use crate::bucket::{Bucket, Entry, MIN_TREEIFY_CAPACITY, TREEIFY_THRESHOLD, UNTREEIFY_THRESHOLD};
use crate::bucket_array::BucketArray;
use crate::cursor::{Cursor, IntoIter, Iter};
use crate::key_adapter::{HashEqAdapter, KeyAdapter};
use crate::reentrancy::DebugReentrancy;
use crate::resize::ResizeController;

pub use crate::bucket_array::DEFAULT_CAPACITY;
pub use crate::resize::DEFAULT_LOAD_FACTOR;

/// A chained hash table mapping `K` to `V` through a `KeyAdapter`.
///
/// Single-threaded by contract: there is no internal locking, and callers
/// needing cross-thread access must wrap the whole table behind an external
/// lock. All operations are synchronous and run to completion; `insert`,
/// `get`, and `remove` are amortized O(1), with an O(capacity) rehash when
/// an insert pushes the size past `capacity * load_factor`.
///
/// Once the table reaches the maximum power-of-two capacity, growth is
/// skipped and the table keeps operating with longer buckets (degraded
/// collision performance) rather than failing.
pub struct HashTable<K, V, A = HashEqAdapter> {
    array: BucketArray<K, V>,
    size: usize,
    mod_count: u64,
    next_seq: u64,
    adapter: A,
    resize: ResizeController,
    initial_capacity: usize,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V>
where
    K: core::hash::Hash + Eq,
{
    /// An empty table with the default capacity, load factor, and adapter.
    pub fn new() -> Self {
        Self::with_adapter(HashEqAdapter::new())
    }

    /// An empty table holding at least `capacity` buckets (rounded up to a
    /// power of two; zero means the default capacity).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(capacity, DEFAULT_LOAD_FACTOR, HashEqAdapter::new())
    }
}

impl<K, V, A> HashTable<K, V, A>
where
    A: KeyAdapter<K>,
{
    /// An empty table routing hashing and equality through `adapter`.
    pub fn with_adapter(adapter: A) -> Self {
        Self::with_config(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, adapter)
    }

    /// Full-control constructor. Panics if `load_factor` is not a finite
    /// positive number.
    pub fn with_config(capacity: usize, load_factor: f64, adapter: A) -> Self {
        let array: BucketArray<K, V> = BucketArray::new(capacity);
        let initial_capacity = array.capacity();
        Self {
            array,
            size: 0,
            mod_count: 0,
            next_seq: 0,
            adapter,
            resize: ResizeController::new(load_factor),
            initial_capacity,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Insert or replace. Returns the previous value when the key was
    /// already present; replacement is value-only and not a structural
    /// change. A fresh insert may treeify the target bucket or grow the
    /// table before returning (check-after-insert policy).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let guard = self.reentrancy.enter();
        let hash = self.adapter.hash(&key);
        let index = self.array.index_of(hash);

        let adapter = &self.adapter;
        if let Some(entry) = self
            .array
            .bucket_mut(index)
            .find_mut(hash, &|k| adapter.equals(k, &key))
        {
            return Some(mem::replace(&mut entry.value, value));
        }
        // Past this point no adapter code runs; the structural tail needs
        // the table mutably.
        drop(guard);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.array.bucket_mut(index).insert_new(Entry {
            key,
            value,
            hash,
            seq,
        });
        self.size += 1;
        self.mod_count += 1;

        // A long chain either becomes a tree or, below the treeify
        // capacity, pushes the whole table to grow instead.
        let bucket = self.array.bucket(index);
        if !bucket.is_tree() && bucket.len() >= TREEIFY_THRESHOLD {
            if self.array.capacity() >= MIN_TREEIFY_CAPACITY {
                self.array.bucket_mut(index).treeify();
            } else if self.resize.can_grow(self.array.capacity()) {
                self.grow();
            }
        }

        // Small capacities with low load factors may need more than one
        // doubling to restore len <= capacity * load_factor.
        while self.resize.needs_grow(self.size, self.array.capacity())
            && self.resize.can_grow(self.array.capacity())
        {
            self.grow();
        }
        None
    }

    /// Borrow the value stored for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(key);
        let index = self.array.index_of(hash);
        self.array
            .bucket(index)
            .find(hash, &|k| self.adapter.equals(k, key))
            .map(|entry| &entry.value)
    }

    /// Mutably borrow the value stored for `key`, if present.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let _g = self.reentrancy.enter();
        let hash = self.adapter.hash(key);
        let index = self.array.index_of(hash);
        let adapter = &self.adapter;
        self.array
            .bucket_mut(index)
            .find_mut(hash, &|k| adapter.equals(k, key))
            .map(|entry| &mut entry.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`'s entry and return its value. Removing an absent key is
    /// not an error; it returns `None` and changes nothing.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let guard = self.reentrancy.enter();
        let hash = self.adapter.hash(key);
        let index = self.array.index_of(hash);
        let adapter = &self.adapter;
        let entry = self
            .array
            .bucket_mut(index)
            .remove(hash, &|k| adapter.equals(k, key))?;
        drop(guard);
        self.size -= 1;
        self.mod_count += 1;
        self.shrink_bucket(index);
        Some(entry.value)
    }

    fn grow(&mut self) {
        self.resize.grow(&mut self.array);
        self.mod_count += 1;
    }
}

impl<K, V, A> HashTable<K, V, A> {
    /// Number of live key-to-value mappings.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current bucket count; always a power of two.
    pub fn capacity(&self) -> usize {
        self.array.capacity()
    }

    /// The configured maximum of `len / capacity` before a grow triggers.
    pub fn load_factor(&self) -> f64 {
        self.resize.load_factor()
    }

    /// Drop every entry and reset to the construction capacity. A single
    /// structural change as far as cursors are concerned.
    pub fn clear(&mut self) {
        self.array = BucketArray::new(self.initial_capacity);
        self.size = 0;
        self.mod_count += 1;
    }

    /// Borrowing iterator over all entries in bucket order (chain order
    /// within chains, ascending `(hash, seq)` within tree buckets). Holding
    /// it borrows the table, so no structural change can race it.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.array.buckets())
    }

    /// Detached fail-fast traversal. The cursor does not borrow the table;
    /// each call re-validates the modification counter snapshot and reports
    /// `StructuralChange` if the table was structurally modified since the
    /// cursor was created (or since its last `remove_current`). A cursor
    /// must only be used with the table that created it.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.mod_count)
    }

    pub(crate) fn mod_count(&self) -> u64 {
        self.mod_count
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.array.capacity()
    }

    pub(crate) fn bucket_at(&self, index: usize) -> &Bucket<K, V> {
        self.array.bucket(index)
    }

    /// Remove the entry at a (bucket, traversal ordinal) position. Cursor
    /// removal path; calls no adapter code.
    pub(crate) fn remove_at_position(&mut self, bucket: usize, ordinal: usize) -> Option<V> {
        let entry = self.array.bucket_mut(bucket).remove_nth(ordinal)?;
        self.size -= 1;
        self.mod_count += 1;
        self.shrink_bucket(bucket);
        Some(entry.value)
    }

    fn shrink_bucket(&mut self, index: usize) {
        let bucket = self.array.bucket_mut(index);
        if bucket.is_tree() && bucket.len() <= UNTREEIFY_THRESHOLD {
            bucket.untreeify();
        }
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: core::hash::Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A> fmt::Debug for HashTable<K, V, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, A> Extend<(K, V)> for HashTable<K, V, A>
where
    A: KeyAdapter<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, A> FromIterator<(K, V)> for HashTable<K, V, A>
where
    A: KeyAdapter<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::with_adapter(A::default());
        table.extend(iter);
        table
    }
}

impl<'a, K, V, A> IntoIterator for &'a HashTable<K, V, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, A> IntoIterator for HashTable<K, V, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Forces every key into one bucket; the standard collision rig.
    #[derive(Clone, Debug, Default)]
    struct ConstHashAdapter;

    impl KeyAdapter<u32> for ConstHashAdapter {
        fn hash(&self, _key: &u32) -> u64 {
            0
        }
        fn equals(&self, a: &u32, b: &u32) -> bool {
            a == b
        }
    }

    /// Invariant: replacing an existing key's value returns the old value,
    /// keeps size constant, and is not a structural change.
    #[test]
    fn replace_is_value_only() {
        let mut t: HashTable<String, i32> = HashTable::new();
        assert_eq!(t.insert("k".to_string(), 1), None);
        let structural = t.mod_count;
        assert_eq!(t.insert("k".to_string(), 2), Some(1));
        assert_eq!(t.len(), 1);
        assert_eq!(t.mod_count, structural);
        assert_eq!(t.get(&"k".to_string()), Some(&2));
    }

    /// Invariant: fresh inserts and removals each bump the modification
    /// counter once; a load-factor resize bumps it exactly once more.
    #[test]
    fn mod_count_accounting() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        assert_eq!(t.capacity(), 16);
        for i in 0..12 {
            t.insert(i, i);
        }
        // 12 entries at capacity 16 sit exactly on the 0.75 threshold.
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.mod_count, 12);

        // The 13th insert crosses the threshold: one bump for the insert,
        // one for the resize.
        t.insert(12, 12);
        assert_eq!(t.capacity(), 32);
        assert_eq!(t.mod_count, 14);

        t.remove(&0);
        assert_eq!(t.mod_count, 15);
        t.remove(&0);
        assert_eq!(t.mod_count, 15, "absent removal is not structural");
        t.clear();
        assert_eq!(t.mod_count, 16);
    }

    /// Invariant: while capacity is below the treeify minimum, a long chain
    /// grows the table instead of treeifying; the grow that reaches the
    /// minimum treeifies the still-long chain in its post-split pass.
    #[test]
    fn treeify_prefers_growth_below_min_capacity() {
        let mut t: HashTable<u32, u32, ConstHashAdapter> =
            HashTable::with_adapter(ConstHashAdapter);
        for i in 0..7 {
            t.insert(i, i * 100);
        }
        assert_eq!(t.capacity(), 16);
        assert!(!t.bucket_at(0).is_tree());

        // 8th colliding insert: chain hits the threshold but 16 < 64, grow.
        t.insert(7, 700);
        assert_eq!(t.capacity(), 32);
        assert!(!t.bucket_at(0).is_tree());

        // 9th: still below the treeify capacity, grow again. The split
        // lands at capacity 64 with the chain still at 9 entries, so the
        // post-split pass converts it.
        t.insert(8, 800);
        assert_eq!(t.capacity(), 64);
        assert!(t.bucket_at(0).is_tree());

        // 10th inserts straight into the tree.
        t.insert(9, 900);
        assert!(t.bucket_at(0).is_tree());

        for i in 0..10 {
            assert_eq!(t.get(&i), Some(&(i * 100)));
        }
    }

    /// Invariant: a tree bucket reverts to a chain when removals bring it
    /// to the untreeify threshold, with no entries lost.
    #[test]
    fn untreeify_on_removal() {
        let mut t: HashTable<u32, u32, ConstHashAdapter> =
            HashTable::with_adapter(ConstHashAdapter);
        for i in 0..12 {
            t.insert(i, i);
        }
        assert!(t.bucket_at(0).is_tree());

        for i in 0..6 {
            assert_eq!(t.remove(&i), Some(i));
        }
        assert!(!t.bucket_at(0).is_tree());
        assert_eq!(t.len(), 6);
        for i in 6..12 {
            assert_eq!(t.get(&i), Some(&i));
        }
    }

    /// Invariant: clear resets to the construction capacity and the table
    /// remains usable.
    #[test]
    fn clear_resets_capacity() {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(16);
        for i in 0..100 {
            t.insert(i, i);
        }
        assert!(t.capacity() > 16);
        t.clear();
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        t.insert(1, 1);
        assert_eq!(t.get(&1), Some(&1));
    }

    /// Invariant: a key adapter that re-enters the table from `equals`
    /// panics in debug builds instead of corrupting the structure.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_adapter_panics_in_debug() {
        use std::cell::Cell;
        use std::rc::Rc;

        type Target = Cell<*const HashTable<u32, u32, Reentering>>;

        #[derive(Clone)]
        struct Reentering {
            target: Rc<Target>,
        }

        impl KeyAdapter<u32> for Reentering {
            fn hash(&self, _key: &u32) -> u64 {
                0
            }
            fn equals(&self, a: &u32, b: &u32) -> bool {
                let ptr = self.target.get();
                if !ptr.is_null() {
                    // Re-enter the same table during probing.
                    unsafe {
                        let _ = (*ptr).get(&0);
                    }
                }
                a == b
            }
        }

        let target: Rc<Target> = Rc::new(Cell::new(std::ptr::null()));
        let mut table = HashTable::with_adapter(Reentering {
            target: Rc::clone(&target),
        });
        table.insert(1u32, 10u32);
        target.set(&table as *const _);

        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = table.get(&1);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
        // Disarm before the table (and adapter) drop.
        target.set(std::ptr::null());
    }

    /// Invariant: Debug, Extend, and FromIterator compose with the default
    /// adapter.
    #[test]
    fn std_trait_impls() {
        let t: HashTable<u32, u32> = (0..4u32).map(|i| (i, i * i)).collect();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(&3), Some(&9));

        let mut t2: HashTable<u32, u32> = HashTable::new();
        t2.extend([(1, 1), (1, 2)]);
        assert_eq!(t2.len(), 1);
        assert_eq!(t2.get(&1), Some(&2));

        let rendered = format!("{t2:?}");
        assert_eq!(rendered, "{1: 2}");

        let pairs: Vec<(u32, u32)> = t2.into_iter().collect();
        assert_eq!(pairs, vec![(1, 2)]);
    }
}
