//! KeyAdapter: the capability contract a key type must satisfy.
//!
//! The table never calls `K: Hash` or `K: Eq` directly. Hashing and equality
//! are routed through an adapter injected at construction, which makes the
//! contract explicit and lets tests substitute degenerate hash functions to
//! exercise collision paths.
//!
//! Contract (documented, not enforced):
//! - If `equals(a, b)` is true then `hash(a) == hash(b)`. The converse need
//!   not hold; hash collisions are legal and expected.
//! - A key's hash-relevant state must not change while the key is stored in
//!   a table. The table caches each key's hash at insertion and never
//!   recomputes it, so a mutated key silently becomes unfindable. This is a
//!   caller obligation, not a detectable error.

use core::hash::BuildHasher;
use core::hash::Hash;
use rustc_hash::FxBuildHasher;

/// Hash and equality capability for key type `K`.
///
/// Violating the equals-implies-equal-hash contract, or mutating a stored
/// key's hash-relevant state, yields silent lookup failure: an `equals` key
/// can no longer be found. It never causes a crash or memory unsafety.
pub trait KeyAdapter<K> {
    /// Hash a key. Called once per key at insertion and once per probe key
    /// on lookup; stored entries keep their hash cached.
    fn hash(&self, key: &K) -> u64;

    /// Compare two keys for equality. `a` is always the stored key, `b` the
    /// probe key.
    fn equals(&self, a: &K, b: &K) -> bool;
}

/// Default adapter for keys that implement `Hash + Eq`, built over any
/// `BuildHasher`. The default hash builder is `FxBuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct HashEqAdapter<S = FxBuildHasher> {
    build_hasher: S,
}

impl HashEqAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> HashEqAdapter<S> {
    /// Build an adapter over an explicit hash builder, e.g. `RandomState`
    /// for DoS-resistant hashing.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<K, S> KeyAdapter<K> for HashEqAdapter<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.build_hasher.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the default adapter satisfies equals-implies-equal-hash
    /// for a plain `Hash + Eq` key type.
    #[test]
    fn default_adapter_contract() {
        let a = HashEqAdapter::new();
        let x = "same".to_string();
        let y = "same".to_string();
        assert!(<HashEqAdapter as KeyAdapter<String>>::equals(&a, &x, &y));
        assert_eq!(
            <HashEqAdapter as KeyAdapter<String>>::hash(&a, &x),
            <HashEqAdapter as KeyAdapter<String>>::hash(&a, &y)
        );
    }

    /// Invariant: an adapter built over a different hash builder still
    /// resolves equality through `Eq`, not through the hash.
    #[test]
    fn explicit_hasher_adapter() {
        use std::collections::hash_map::RandomState;
        let a = HashEqAdapter::with_hasher(RandomState::new());
        assert!(<HashEqAdapter<RandomState> as KeyAdapter<u32>>::equals(
            &a, &7, &7
        ));
        assert!(!<HashEqAdapter<RandomState> as KeyAdapter<u32>>::equals(
            &a, &7, &8
        ));
    }
}
