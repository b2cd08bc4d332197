//! TreeBucket: balanced-tree fallback for heavily collided buckets.
//!
//! A bucket converts from a chain to this AVL tree once its chain grows past
//! the treeify threshold, bounding worst-case per-bucket lookup at O(log n)
//! under adversarial hash collisions. Keys are not assumed `Ord`, so the
//! tree orders entries by `(hash, seq)`: the cached hash first, then the
//! per-table insertion sequence number as a deterministic tie-breaker. The
//! tie-breaker never participates in key equality; it exists only to make
//! the tree's order total.
//!
//! Entries sharing a hash are adjacent in the order but may sit in either
//! subtree of an equal-hash node, so hash-equal searches fan out on ties.

use crate::bucket::Entry;

struct TreeNode<K, V> {
    entry: Entry<K, V>,
    height: u8,
    left: Option<Box<TreeNode<K, V>>>,
    right: Option<Box<TreeNode<K, V>>>,
}

type Slot<K, V> = Option<Box<TreeNode<K, V>>>;

impl<K, V> TreeNode<K, V> {
    fn new(entry: Entry<K, V>) -> Self {
        Self {
            entry,
            height: 1,
            left: None,
            right: None,
        }
    }

    #[inline]
    fn order_key(&self) -> (u64, u64) {
        (self.entry.hash, self.entry.seq)
    }
}

pub(crate) struct TreeBucket<K, V> {
    root: Slot<K, V>,
    len: usize,
}

impl<K, V> TreeBucket<K, V> {
    pub(crate) fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Insert an entry. `(hash, seq)` pairs are unique per table, so there
    /// is never an equal-order duplicate to replace.
    pub(crate) fn insert(&mut self, entry: Entry<K, V>) {
        Self::insert_at(&mut self.root, entry);
        self.len += 1;
    }

    /// Find the entry whose key satisfies `eq`, restricted to nodes with a
    /// matching cached hash.
    pub(crate) fn find<F>(&self, hash: u64, eq: &F) -> Option<&Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        Self::find_in(&self.root, hash, eq)
    }

    pub(crate) fn find_mut<F>(&mut self, hash: u64, eq: &F) -> Option<&mut Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        Self::find_in_mut(&mut self.root, hash, eq)
    }

    /// Remove the entry whose key satisfies `eq`. Resolves the entry's full
    /// `(hash, seq)` order key first, then deletes by that key.
    pub(crate) fn remove<F>(&mut self, hash: u64, eq: &F) -> Option<Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        let seq = Self::find_in(&self.root, hash, eq)?.seq;
        let removed = Self::remove_at(&mut self.root, (hash, seq));
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Remove the entry with the exact `(hash, seq)` order key. Used by
    /// cursor removal, where the target entry is already resolved.
    pub(crate) fn remove_exact(&mut self, hash: u64, seq: u64) -> Option<Entry<K, V>> {
        let removed = Self::remove_at(&mut self.root, (hash, seq));
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// In-order nth entry; the order is ascending `(hash, seq)`.
    pub(crate) fn nth(&self, n: usize) -> Option<&Entry<K, V>> {
        let mut remaining = n;
        Self::nth_in(&self.root, &mut remaining)
    }

    pub(crate) fn iter(&self) -> TreeIter<'_, K, V> {
        TreeIter::new(self.root.as_deref())
    }

    /// Consume the tree into its entries in order. Used when a bucket
    /// reverts to a chain and when the table is drained.
    pub(crate) fn into_entries(self) -> Vec<Entry<K, V>> {
        let mut out = Vec::with_capacity(self.len);
        Self::drain_into(self.root, &mut out);
        out
    }

    fn insert_at(slot: &mut Slot<K, V>, entry: Entry<K, V>) {
        match slot {
            None => *slot = Some(Box::new(TreeNode::new(entry))),
            Some(node) => {
                if (entry.hash, entry.seq) < node.order_key() {
                    Self::insert_at(&mut node.left, entry);
                } else {
                    Self::insert_at(&mut node.right, entry);
                }
                Self::rebalance(slot);
            }
        }
    }

    fn find_in<'a, F>(slot: &'a Slot<K, V>, hash: u64, eq: &F) -> Option<&'a Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        let node = slot.as_ref()?;
        if hash < node.entry.hash {
            Self::find_in(&node.left, hash, eq)
        } else if hash > node.entry.hash {
            Self::find_in(&node.right, hash, eq)
        } else if eq(&node.entry.key) {
            Some(&node.entry)
        } else {
            // Hash tie: equal-hash entries may be on either side.
            Self::find_in(&node.left, hash, eq).or_else(|| Self::find_in(&node.right, hash, eq))
        }
    }

    fn find_in_mut<'a, F>(slot: &'a mut Slot<K, V>, hash: u64, eq: &F) -> Option<&'a mut Entry<K, V>>
    where
        F: Fn(&K) -> bool,
    {
        let node = slot.as_mut()?;
        if hash < node.entry.hash {
            Self::find_in_mut(&mut node.left, hash, eq)
        } else if hash > node.entry.hash {
            Self::find_in_mut(&mut node.right, hash, eq)
        } else if eq(&node.entry.key) {
            Some(&mut node.entry)
        } else {
            match Self::find_in_mut(&mut node.left, hash, eq) {
                Some(found) => Some(found),
                None => Self::find_in_mut(&mut node.right, hash, eq),
            }
        }
    }

    fn remove_at(slot: &mut Slot<K, V>, key: (u64, u64)) -> Option<Entry<K, V>> {
        let node = slot.as_mut()?;
        let node_key = node.order_key();
        let removed = if key < node_key {
            Self::remove_at(&mut node.left, key)
        } else if key > node_key {
            Self::remove_at(&mut node.right, key)
        } else {
            let mut node = slot.take().expect("slot checked non-empty");
            match (node.left.take(), node.right.take()) {
                (None, None) => {}
                (Some(child), None) | (None, Some(child)) => *slot = Some(child),
                (Some(left), Some(right)) => {
                    // Replace with the in-order successor from the right
                    // subtree, then let the slot rebalance below.
                    let mut right = Some(right);
                    let successor = Self::take_min(&mut right).expect("right subtree non-empty");
                    let mut replacement = Box::new(TreeNode {
                        entry: successor,
                        height: 1,
                        left: Some(left),
                        right,
                    });
                    Self::update_height(&mut replacement);
                    *slot = Some(replacement);
                }
            }
            Some(node.entry)
        };
        if removed.is_some() && slot.is_some() {
            Self::rebalance(slot);
        }
        removed
    }

    /// Detach the minimum entry of the subtree, rebalancing along the path.
    fn take_min(slot: &mut Slot<K, V>) -> Option<Entry<K, V>> {
        let node = slot.as_mut()?;
        if node.left.is_some() {
            let entry = Self::take_min(&mut node.left);
            Self::rebalance(slot);
            entry
        } else {
            let mut node = slot.take().expect("slot checked non-empty");
            *slot = node.right.take();
            Some(node.entry)
        }
    }

    fn nth_in<'a>(slot: &'a Slot<K, V>, remaining: &mut usize) -> Option<&'a Entry<K, V>> {
        let node = slot.as_ref()?;
        if let Some(found) = Self::nth_in(&node.left, remaining) {
            return Some(found);
        }
        if *remaining == 0 {
            return Some(&node.entry);
        }
        *remaining -= 1;
        Self::nth_in(&node.right, remaining)
    }

    fn drain_into(slot: Slot<K, V>, out: &mut Vec<Entry<K, V>>) {
        if let Some(node) = slot {
            let node = *node;
            Self::drain_into(node.left, out);
            out.push(node.entry);
            Self::drain_into(node.right, out);
        }
    }

    #[inline]
    fn height(slot: &Slot<K, V>) -> i32 {
        slot.as_ref().map_or(0, |n| i32::from(n.height))
    }

    fn update_height(node: &mut TreeNode<K, V>) {
        let h = 1 + Self::height(&node.left).max(Self::height(&node.right));
        node.height = h as u8;
    }

    #[inline]
    fn balance(node: &TreeNode<K, V>) -> i32 {
        Self::height(&node.left) - Self::height(&node.right)
    }

    fn rotate_left(slot: &mut Slot<K, V>) {
        let mut node = slot.take().expect("rotate on empty slot");
        let mut pivot = node.right.take().expect("left rotation needs right child");
        node.right = pivot.left.take();
        Self::update_height(&mut node);
        pivot.left = Some(node);
        Self::update_height(&mut pivot);
        *slot = Some(pivot);
    }

    fn rotate_right(slot: &mut Slot<K, V>) {
        let mut node = slot.take().expect("rotate on empty slot");
        let mut pivot = node.left.take().expect("right rotation needs left child");
        node.left = pivot.right.take();
        Self::update_height(&mut node);
        pivot.right = Some(node);
        Self::update_height(&mut pivot);
        *slot = Some(pivot);
    }

    fn rebalance(slot: &mut Slot<K, V>) {
        let node = slot.as_mut().expect("rebalance on empty slot");
        Self::update_height(node);
        let balance = Self::balance(node);
        if balance > 1 {
            if Self::balance(node.left.as_ref().expect("left-heavy implies left child")) < 0 {
                Self::rotate_left(&mut node.left);
            }
            Self::rotate_right(slot);
        } else if balance < -1 {
            if Self::balance(node.right.as_ref().expect("right-heavy implies right child")) > 0 {
                Self::rotate_right(&mut node.right);
            }
            Self::rotate_left(slot);
        }
    }
}

/// In-order borrowing iterator over tree entries.
pub(crate) struct TreeIter<'a, K, V> {
    stack: Vec<&'a TreeNode<K, V>>,
}

impl<'a, K, V> TreeIter<'a, K, V> {
    fn new(root: Option<&'a TreeNode<K, V>>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: Option<&'a TreeNode<K, V>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for TreeIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.entry)
    }
}
