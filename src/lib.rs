//! chained-hashmap: a single-threaded, separately chained hash table with
//! bucket treeification, load-factor resizing, and fail-fast cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build HashTable in safe, verifiable layers so each piece can be
//!   reasoned about independently.
//! - Layers:
//!   - KeyAdapter<K>: the capability contract a key type must satisfy
//!     (hash + equals), injected at construction instead of baked into the
//!     key type; HashEqAdapter covers ordinary `Hash + Eq` keys.
//!   - Chain / TreeBucket / Bucket: a bucket is a tail-append linked chain
//!     until it crosses the treeify threshold, then an AVL tree ordered by
//!     `(hash, seq)`; it reverts to a chain when removals shrink it.
//!   - BucketArray: power-of-two array of buckets; bucket index is
//!     `hash & (capacity - 1)`.
//!   - ResizeController: the load-factor policy plus the capacity-doubling
//!     rehash, which splits each bucket in two by the next hash bit using
//!     only cached hashes.
//!   - HashTable<K, V, A>: the public container composing the above;
//!     insert/get/remove/clear plus iteration.
//!   - Iter / Cursor: borrowing iteration, and a detached cursor that
//!     re-validates a modification-counter snapshot on every call and
//!     reports `StructuralChange` instead of yielding stale elements.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics; callers wanting cross-thread
//!   access wrap the table behind an external lock.
//! - Every entry caches its hash at insertion; `KeyAdapter::hash` is never
//!   invoked for stored keys after insertion, so resizes call no user code.
//! - Keys are immutable post-insert as far as hashing is concerned;
//!   mutating a stored key's hash-relevant state makes it silently
//!   unfindable (a documented caller obligation, not a detectable error).
//! - Trees order by `(hash, seq)` where `seq` is a per-table insertion
//!   counter; keys are never required to be `Ord`, and `seq` never
//!   participates in equality.
//!
//! Why this split?
//! - Localize invariants: chain splicing, AVL rebalancing, the split
//!   rehash, and the fail-fast bookkeeping are each testable in isolation.
//! - Clear failure boundaries: user code runs only inside `KeyAdapter`
//!   calls during probing; a debug-only reentrancy guard panics if that
//!   code calls back into the table while it is mid-mutation.
//!
//! Sizing policy
//! - Capacity is a power of two, default 16; a grow doubles it and runs
//!   when an insert pushes `len` strictly past `capacity * load_factor`
//!   (default 0.75).
//! - A chain reaching 8 entries treeifies if capacity is at least 64,
//!   otherwise the table grows instead; a tree at 6 or fewer entries
//!   reverts to a chain.
//! - At the maximum power-of-two capacity, growth is skipped and the table
//!   degrades to longer buckets rather than failing.
//!
//! Notes and non-goals
//! - No persistence, no network exposure, no sharding.
//! - No concurrent variant here; if one is ever needed it should compose N
//!   independently locked tables rather than retrofit locks onto this core.
//! - Absent-key `get`/`remove` return `None`, never an error.

mod bucket;
mod bucket_array;
mod cursor;
mod hash_table;
mod hash_table_proptest;
pub mod key_adapter;
mod reentrancy;
mod resize;
mod tree_bucket;

// Public surface
pub use cursor::{Cursor, IntoIter, Iter, StructuralChange};
pub use hash_table::{HashTable, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
pub use key_adapter::{HashEqAdapter, KeyAdapter};
