//! Bucket: a single slot of the bucket array.
//!
//! A bucket starts life as a singly linked chain of entries and converts to
//! a balanced tree (`TreeBucket`) once the chain grows past
//! `TREEIFY_THRESHOLD` while the table capacity is at least
//! `MIN_TREEIFY_CAPACITY`. It reverts to a chain when a removal leaves it at
//! or below `UNTREEIFY_THRESHOLD`. The conversions preserve the entry set;
//! untreeify emits the tree's in-order sequence as the chain order.
//!
//! Chain order is deterministic: new entries append at the tail.

use crate::tree_bucket::{TreeBucket, TreeIter};

/// Chain length at which an insert converts the bucket to a tree (given
/// sufficient table capacity).
pub(crate) const TREEIFY_THRESHOLD: usize = 8;

/// Tree size at or below which a removal converts the bucket back to a chain.
pub(crate) const UNTREEIFY_THRESHOLD: usize = 6;

/// Minimum table capacity for treeification; below it the table grows
/// instead, which thins buckets directly.
pub(crate) const MIN_TREEIFY_CAPACITY: usize = 64;

/// An owned key/value pair with its cached hash and insertion sequence
/// number. The hash is computed once at insertion; the sequence number is
/// the tree tie-breaker and never participates in equality.
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) seq: u64,
}

struct Node<K, V> {
    entry: Entry<K, V>,
    next: Option<Box<Node<K, V>>>,
}

/// Singly linked chain of entries with a cached length.
pub(crate) struct Chain<K, V> {
    head: Option<Box<Node<K, V>>>,
    len: usize,
}

impl<K, V> Chain<K, V> {
    pub(crate) fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn find<F>(&self, hash: u64, eq: &F) -> Option<&Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            if node.entry.hash == hash && eq(&node.entry.key) {
                return Some(&node.entry);
            }
            cur = node.next.as_deref();
        }
        None
    }

    pub(crate) fn find_mut<F>(&mut self, hash: u64, eq: &F) -> Option<&mut Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        let mut cur = self.head.as_deref_mut();
        while let Some(node) = cur {
            if node.entry.hash == hash && eq(&node.entry.key) {
                return Some(&mut node.entry);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    /// Append at the tail; keeps chain order equal to insertion order.
    pub(crate) fn push_back(&mut self, entry: Entry<K, V>) {
        let mut cur = &mut self.head;
        while let Some(node) = cur {
            cur = &mut node.next;
        }
        *cur = Some(Box::new(Node { entry, next: None }));
        self.len += 1;
    }

    /// Splice out the first entry matching `hash` and `eq`.
    pub(crate) fn remove<F>(&mut self, hash: u64, eq: &F) -> Option<Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        self.remove_where(|e| e.hash == hash && eq(&e.key))
    }

    /// Splice out the nth entry.
    pub(crate) fn remove_nth(&mut self, n: usize) -> Option<Entry<K, V>> {
        let mut index = 0;
        self.remove_where(|_| {
            let hit = index == n;
            index += 1;
            hit
        })
    }

    fn remove_where<F>(&mut self, mut pred: F) -> Option<Entry<K, V>>
    where
        F: FnMut(&Entry<K, V>) -> bool,
    {
        let mut cur = &mut self.head;
        loop {
            match cur {
                None => return None,
                Some(node) if pred(&node.entry) => {
                    let node = cur.take().expect("slot checked non-empty");
                    let node = *node;
                    *cur = node.next;
                    self.len -= 1;
                    return Some(node.entry);
                }
                Some(node) => cur = &mut node.next,
            }
        }
    }

    pub(crate) fn nth(&self, n: usize) -> Option<&Entry<K, V>> {
        let mut cur = self.head.as_deref();
        let mut remaining = n;
        while let Some(node) = cur {
            if remaining == 0 {
                return Some(&node.entry);
            }
            remaining -= 1;
            cur = node.next.as_deref();
        }
        None
    }

    pub(crate) fn iter(&self) -> ChainIter<'_, K, V> {
        ChainIter {
            next: self.head.as_deref(),
        }
    }

    pub(crate) fn drain(&mut self) -> ChainDrain<K, V> {
        self.len = 0;
        ChainDrain {
            next: self.head.take(),
        }
    }
}

pub(crate) struct ChainIter<'a, K, V> {
    next: Option<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next.as_deref();
        Some(&node.entry)
    }
}

/// Owning iterator over a chain's entries, front to back.
pub(crate) struct ChainDrain<K, V> {
    next: Option<Box<Node<K, V>>>,
}

impl<K, V> Iterator for ChainDrain<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = *self.next.take()?;
        self.next = node.next;
        Some(node.entry)
    }
}

/// A bucket is a chain until treeified, then a tree until untreeified.
pub(crate) enum Bucket<K, V> {
    Chain(Chain<K, V>),
    Tree(TreeBucket<K, V>),
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new() -> Self {
        Bucket::Chain(Chain::new())
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Bucket::Chain(chain) => chain.len(),
            Bucket::Tree(tree) => tree.len(),
        }
    }

    pub(crate) fn is_tree(&self) -> bool {
        matches!(self, Bucket::Tree(_))
    }

    pub(crate) fn find<F>(&self, hash: u64, eq: &F) -> Option<&Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        match self {
            Bucket::Chain(chain) => chain.find(hash, eq),
            Bucket::Tree(tree) => tree.find(hash, eq),
        }
    }

    pub(crate) fn find_mut<F>(&mut self, hash: u64, eq: &F) -> Option<&mut Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        match self {
            Bucket::Chain(chain) => chain.find_mut(hash, eq),
            Bucket::Tree(tree) => tree.find_mut(hash, eq),
        }
    }

    /// Insert an entry known not to duplicate any stored key.
    pub(crate) fn insert_new(&mut self, entry: Entry<K, V>) {
        match self {
            Bucket::Chain(chain) => chain.push_back(entry),
            Bucket::Tree(tree) => tree.insert(entry),
        }
    }

    pub(crate) fn remove<F>(&mut self, hash: u64, eq: &F) -> Option<Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        match self {
            Bucket::Chain(chain) => chain.remove(hash, eq),
            Bucket::Tree(tree) => tree.remove(hash, eq),
        }
    }

    /// Remove the nth entry in traversal order (chain order / tree
    /// in-order). Cursor removal support.
    pub(crate) fn remove_nth(&mut self, n: usize) -> Option<Entry<K, V>> {
        match self {
            Bucket::Chain(chain) => chain.remove_nth(n),
            Bucket::Tree(tree) => {
                let (hash, seq) = {
                    let entry = tree.nth(n)?;
                    (entry.hash, entry.seq)
                };
                tree.remove_exact(hash, seq)
            }
        }
    }

    pub(crate) fn nth(&self, n: usize) -> Option<&Entry<K, V>> {
        match self {
            Bucket::Chain(chain) => chain.nth(n),
            Bucket::Tree(tree) => tree.nth(n),
        }
    }

    pub(crate) fn iter(&self) -> BucketIter<'_, K, V> {
        match self {
            Bucket::Chain(chain) => BucketIter::Chain(chain.iter()),
            Bucket::Tree(tree) => BucketIter::Tree(tree.iter()),
        }
    }

    /// Consume the bucket into an owning entry iterator.
    pub(crate) fn into_entries(self) -> BucketDrain<K, V> {
        match self {
            Bucket::Chain(mut chain) => BucketDrain::Chain(chain.drain()),
            Bucket::Tree(tree) => BucketDrain::Tree(tree.into_entries().into_iter()),
        }
    }

    /// Convert a chain to a tree. Caller checks the thresholds.
    pub(crate) fn treeify(&mut self) {
        if let Bucket::Chain(chain) = self {
            let mut tree = TreeBucket::new();
            for entry in chain.drain() {
                tree.insert(entry);
            }
            *self = Bucket::Tree(tree);
        }
    }

    /// Convert a tree back to a chain, preserving in-order sequence.
    pub(crate) fn untreeify(&mut self) {
        if let Bucket::Tree(_) = self {
            let old = std::mem::replace(self, Bucket::Chain(Chain::new()));
            if let (Bucket::Tree(tree), Bucket::Chain(chain)) = (old, &mut *self) {
                for entry in tree.into_entries() {
                    chain.push_back(entry);
                }
            }
        }
    }
}

pub(crate) enum BucketIter<'a, K, V> {
    Chain(ChainIter<'a, K, V>),
    Tree(TreeIter<'a, K, V>),
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            BucketIter::Chain(it) => it.next(),
            BucketIter::Tree(it) => it.next(),
        }
    }
}

pub(crate) enum BucketDrain<K, V> {
    Chain(ChainDrain<K, V>),
    Tree(std::vec::IntoIter<Entry<K, V>>),
}

impl<K, V> Iterator for BucketDrain<K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            BucketDrain::Chain(it) => it.next(),
            BucketDrain::Tree(it) => it.next(),
        }
    }
}
