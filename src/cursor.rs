//! Traversal over the table: borrowing iteration and fail-fast cursors.
//!
//! `Iter` borrows the table, so the borrow checker already rules out
//! structural changes while it lives. `Cursor` is the detached form: it
//! holds no borrow, the caller passes the table to every call, and each
//! call re-validates the modification-counter snapshot taken at creation.
//! A structural change (new key, removal, resize, clear) between calls
//! surfaces as `StructuralChange` instead of a possibly inconsistent
//! element. `remove_current` is the sanctioned way to remove during
//! traversal; it re-snapshots the counter so the cursor stays live.

use core::fmt;

use crate::bucket::{Bucket, BucketDrain, BucketIter};
use crate::bucket_array::BucketArray;
use crate::hash_table::HashTable;

/// The table was structurally modified while a cursor was traversing it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StructuralChange;

impl fmt::Display for StructuralChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("hash table was structurally modified during traversal")
    }
}

impl std::error::Error for StructuralChange {}

/// Borrowing iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    buckets: &'a [Bucket<K, V>],
    index: usize,
    current: Option<BucketIter<'a, K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(buckets: &'a [Bucket<K, V>]) -> Self {
        Self {
            buckets,
            index: 0,
            current: None,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(bucket_iter) = self.current.as_mut() {
                if let Some(entry) = bucket_iter.next() {
                    return Some((&entry.key, &entry.value));
                }
            }
            if self.index >= self.buckets.len() {
                return None;
            }
            self.current = Some(self.buckets[self.index].iter());
            self.index += 1;
        }
    }
}

/// Owning iterator over `(K, V)`, draining buckets front to back.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Bucket<K, V>>,
    current: Option<BucketDrain<K, V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(array: BucketArray<K, V>) -> Self {
        Self {
            buckets: array.into_buckets().into_iter(),
            current: None,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(drain) = self.current.as_mut() {
                if let Some(entry) = drain.next() {
                    return Some((entry.key, entry.value));
                }
            }
            self.current = Some(self.buckets.next()?.into_entries());
        }
    }
}

/// Detached fail-fast traversal position.
///
/// Created by `HashTable::cursor`. The cursor snapshots the table's
/// modification counter; `next` and `remove_current` re-check it and fail
/// with `StructuralChange` if the table was structurally modified by
/// anything other than this cursor. Value-only replacement of an existing
/// key is not structural and does not trip it.
///
/// A cursor is only meaningful with the table that created it; pass it
/// another table and the snapshot check will reject it (or, if the
/// counters happen to coincide, the traversal is simply over that table).
#[derive(Clone, Debug)]
pub struct Cursor {
    expected_mod_count: u64,
    bucket: usize,
    offset: usize,
    has_current: bool,
}

impl Cursor {
    pub(crate) fn new(mod_count: u64) -> Self {
        Self {
            expected_mod_count: mod_count,
            bucket: 0,
            offset: 0,
            has_current: false,
        }
    }

    /// Advance to the next entry. `None` means the traversal is complete;
    /// `Some(Err(StructuralChange))` means the table changed underneath the
    /// cursor and the traversal cannot safely continue.
    pub fn next<'a, K, V, A>(
        &mut self,
        table: &'a HashTable<K, V, A>,
    ) -> Option<Result<(&'a K, &'a V), StructuralChange>> {
        if table.mod_count() != self.expected_mod_count {
            return Some(Err(StructuralChange));
        }
        while self.bucket < table.bucket_count() {
            let bucket = table.bucket_at(self.bucket);
            if let Some(entry) = bucket.nth(self.offset) {
                self.offset += 1;
                self.has_current = true;
                return Some(Ok((&entry.key, &entry.value)));
            }
            self.bucket += 1;
            self.offset = 0;
        }
        self.has_current = false;
        None
    }

    /// Remove the entry most recently yielded by `next` and re-snapshot the
    /// modification counter, keeping this cursor valid. `Ok(None)` when
    /// there is no current entry (before the first `next`, after the end,
    /// or immediately after a previous `remove_current`).
    pub fn remove_current<K, V, A>(
        &mut self,
        table: &mut HashTable<K, V, A>,
    ) -> Result<Option<V>, StructuralChange> {
        if table.mod_count() != self.expected_mod_count {
            return Err(StructuralChange);
        }
        if !self.has_current || self.offset == 0 {
            return Ok(None);
        }
        let removed = table.remove_at_position(self.bucket, self.offset - 1);
        if removed.is_some() {
            self.offset -= 1;
            self.has_current = false;
            self.expected_mod_count = table.mod_count();
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a cursor visits every entry exactly once on an
    /// unmodified table.
    #[test]
    fn cursor_full_traversal() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for i in 0..50 {
            t.insert(i, i + 1000);
        }
        let mut cursor = t.cursor();
        let mut seen = Vec::new();
        while let Some(item) = cursor.next(&t) {
            let (k, v) = item.expect("no structural change");
            assert_eq!(*v, *k + 1000);
            seen.push(*k);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        // Exhausted cursor stays exhausted.
        assert!(cursor.next(&t).is_none());
    }

    /// Invariant: iter() and cursor traversal agree on content and order.
    #[test]
    fn iter_matches_cursor_order() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for i in 0..40 {
            t.insert(i, i);
        }
        let via_iter: Vec<u32> = t.iter().map(|(k, _)| *k).collect();
        let mut cursor = t.cursor();
        let mut via_cursor = Vec::new();
        while let Some(item) = cursor.next(&t) {
            via_cursor.push(*item.expect("no structural change").0);
        }
        assert_eq!(via_iter, via_cursor);
    }

    /// Invariant: remove_current removes the last yielded entry, keeps the
    /// cursor valid, and the traversal still visits every other entry.
    #[test]
    fn remove_current_keeps_cursor_live() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        for i in 0..30 {
            t.insert(i, i);
        }
        let mut cursor = t.cursor();
        let mut kept = Vec::new();
        loop {
            let key = match cursor.next(&t) {
                None => break,
                Some(item) => *item.expect("no structural change").0,
            };
            if key % 3 == 0 {
                let removed = cursor.remove_current(&mut t).expect("snapshot in sync");
                assert_eq!(removed, Some(key));
            } else {
                kept.push(key);
            }
        }
        assert_eq!(t.len(), kept.len());
        for key in kept {
            assert!(t.contains_key(&key));
        }
        for key in (0..30).filter(|k| k % 3 == 0) {
            assert!(!t.contains_key(&key));
        }
    }

    /// Invariant: remove_current with no current entry is Ok(None), and a
    /// double remove_current does not remove twice.
    #[test]
    fn remove_current_without_current() {
        let mut t: HashTable<u32, u32> = HashTable::new();
        t.insert(1, 1);
        let mut cursor = t.cursor();
        assert_eq!(cursor.remove_current(&mut t), Ok(None));
        let _ = cursor.next(&t).expect("one entry").expect("in sync");
        assert_eq!(cursor.remove_current(&mut t), Ok(Some(1)));
        assert_eq!(cursor.remove_current(&mut t), Ok(None));
        assert!(t.is_empty());
    }

    /// Invariant: the error type renders and composes as std error.
    #[test]
    fn structural_change_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(StructuralChange);
        assert!(err.to_string().contains("structurally modified"));
    }
}
