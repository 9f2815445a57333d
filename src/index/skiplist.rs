//! Skip List Module
//!
//! Arena-backed skip list mapping ordered keys to expiring entries.
//!
//! Nodes live in a slot vector and link to each other by slot index. Freed
//! slots are recycled through a free list, so a deleted node can never leave a
//! dangling successor behind: every link is either `None` or the index of an
//! occupied slot.

use std::fmt;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entry::{Entry, Expiry};
use crate::index::{DeleteOutcome, InsertOutcome, MAX_LEVEL_LIMIT};

type NodeId = usize;
type Link = Option<NodeId>;

// == Node ==
struct Node<K, V> {
    key: K,
    entry: Entry<V>,
    /// One successor per level the node participates in (`0..=node_level`).
    forward: Vec<Link>,
}

/// Position of a predecessor during a walk: the header or an arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Head,
    Node(NodeId),
}

// == Skip List ==
/// Ordered map with expected logarithmic insert, search and delete.
///
/// Level 0 links every node in ascending key order; higher levels are sparse
/// express lanes. A node's level is drawn once when it is inserted.
pub struct SkipList<K, V> {
    /// Header forward links, one per possible level. The header holds no key.
    head: Vec<Link>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    /// Highest level currently occupied by any node (0 when empty).
    level: usize,
    max_level: usize,
    len: usize,
    rng: StdRng,
}

impl<K: Ord, V> SkipList<K, V> {
    // == Constructors ==
    /// Creates an empty skip list whose nodes may reach `max_level`.
    ///
    /// `max_level` is clamped to `1..=MAX_LEVEL_LIMIT`.
    pub fn new(max_level: usize) -> Self {
        Self::with_rng(max_level, StdRng::from_entropy())
    }

    /// Creates an empty skip list with a deterministic level generator.
    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        Self::with_rng(max_level, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_level: usize, rng: StdRng) -> Self {
        let max_level = max_level.clamp(1, MAX_LEVEL_LIMIT);
        Self {
            head: vec![None; max_level + 1],
            nodes: Vec::new(),
            free: Vec::new(),
            level: 0,
            max_level,
            len: 0,
            rng,
        }
    }

    // == Len ==
    /// Number of entries linked in, expired ones included until removed.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    /// Returns true when no entry is linked in.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Level ==
    /// Highest level currently occupied by a node.
    pub fn level(&self) -> usize {
        self.level
    }

    // == Max Level ==
    /// Highest level a node may be drawn at.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    // == Insert ==
    /// Inserts `key` unless a live entry already holds it.
    ///
    /// Existing entries are never updated in place. An expired entry under the
    /// same key counts as absent: it is unlinked and replaced.
    pub fn insert(&mut self, key: K, value: V, expiry: Expiry) -> InsertOutcome {
        let mut update = self.find_predecessors(&key);

        if let Some(next) = self.next(update[0], 0) {
            let node = self.node(next);
            if node.key == key {
                if !node.entry.is_expired() {
                    return InsertOutcome::AlreadyExists;
                }
                self.unlink(&update, next);
            }
        }

        let node_level = self.random_level();
        if node_level > self.level {
            for slot in update.iter_mut().take(node_level + 1).skip(self.level + 1) {
                *slot = Cursor::Head;
            }
            self.level = node_level;
        }

        let forward = (0..=node_level)
            .map(|lvl| self.next(update[lvl], lvl))
            .collect();
        let id = self.alloc(Node {
            key,
            entry: Entry::new(value, expiry),
            forward,
        });

        for (lvl, pred) in update.iter().enumerate().take(node_level + 1) {
            self.set_next(*pred, lvl, Some(id));
        }
        self.len += 1;

        InsertOutcome::Inserted
    }

    // == Search ==
    /// Looks up `key`, returning a copy of its entry.
    ///
    /// An expired entry is removed on the spot and reported as absent.
    pub fn search(&mut self, key: &K) -> Option<Entry<V>>
    where
        V: Clone,
    {
        let update = self.find_predecessors(key);
        let id = self.matching(&update, key)?;

        if self.node(id).entry.is_expired() {
            self.unlink(&update, id);
            return None;
        }
        Some(self.node(id).entry.clone())
    }

    // == Delete ==
    /// Removes `key`. Removing an entry that had already expired reports
    /// `NotFound`, though the node is still reclaimed.
    pub fn delete(&mut self, key: &K) -> DeleteOutcome {
        let update = self.find_predecessors(key);
        let Some(id) = self.matching(&update, key) else {
            return DeleteOutcome::NotFound;
        };

        let node = self.unlink(&update, id);
        if node.entry.is_expired() {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        }
    }

    // == Remove Expired ==
    /// Deletes every expired node and returns how many were removed.
    pub fn remove_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();
        let mut cursor = self.head[0];
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.entry.expiry.is_expired_at(now) {
                expired.push(id);
            }
            cursor = node.forward[0];
        }

        for &id in &expired {
            let update = self.find_predecessors(&self.node(id).key);
            self.unlink(&update, id);
        }
        expired.len()
    }

    // == Traversal ==
    /// Iterates level 0 in ascending key order, expired entries included.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            next: self.head[0],
        }
    }

    /// Keys linked at `level`, in chain order.
    pub fn keys_at_level(&self, level: usize) -> Vec<&K> {
        let mut keys = Vec::new();
        if level > self.max_level {
            return keys;
        }
        let mut cursor = self.head[level];
        while let Some(id) = cursor {
            let node = self.node(id);
            keys.push(&node.key);
            cursor = node.forward[level];
        }
        keys
    }

    // == Internals ==
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    /// Walks down from the current top level and records, per level, the last
    /// position whose successor is not less than `key`.
    fn find_predecessors(&self, key: &K) -> Vec<Cursor> {
        let mut update = vec![Cursor::Head; self.max_level + 1];
        let mut cursor = Cursor::Head;
        for lvl in (0..=self.level).rev() {
            while let Some(next) = self.next(cursor, lvl) {
                if self.node(next).key < *key {
                    cursor = Cursor::Node(next);
                } else {
                    break;
                }
            }
            update[lvl] = cursor;
        }
        update
    }

    fn matching(&self, update: &[Cursor], key: &K) -> Option<NodeId> {
        self.next(update[0], 0)
            .filter(|&id| self.node(id).key == *key)
    }

    /// Splices `id` out of every level it occupies and frees its slot.
    fn unlink(&mut self, update: &[Cursor], id: NodeId) -> Node<K, V> {
        for lvl in 0..=self.level {
            // Absent here means absent from every higher level too.
            if self.next(update[lvl], lvl) != Some(id) {
                break;
            }
            let successor = self.node(id).forward[lvl];
            self.set_next(update[lvl], lvl, successor);
        }

        while self.level > 0 && self.head[self.level].is_none() {
            self.level -= 1;
        }

        self.len -= 1;
        self.release(id)
    }

    fn next(&self, cursor: Cursor, level: usize) -> Link {
        match cursor {
            Cursor::Head => self.head[level],
            Cursor::Node(id) => self.node(id).forward[level],
        }
    }

    fn set_next(&mut self, cursor: Cursor, level: usize, link: Link) {
        match cursor {
            Cursor::Head => self.head[level] = link,
            Cursor::Node(id) => self.node_mut(id).forward[level] = link,
        }
    }

    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.nodes[id].as_ref().expect("skip list link points at a freed slot")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.nodes[id].as_mut().expect("skip list link points at a freed slot")
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.nodes[id].take().expect("skip list slot freed twice");
        self.free.push(id);
        node
    }

    /// Panics unless every structural invariant holds.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: fmt::Debug,
    {
        let mut occurrences = vec![0usize; self.nodes.len()];

        for lvl in 0..=self.max_level {
            let mut prev: Option<&K> = None;
            let mut cursor = self.head[lvl];
            while let Some(id) = cursor {
                let node = self.node(id);
                assert!(node.forward.len() > lvl, "node linked above its own level");
                if let Some(prev) = prev {
                    assert!(
                        prev < &node.key,
                        "level {lvl} not ascending: {prev:?} !< {:?}",
                        node.key
                    );
                }
                occurrences[id] += 1;
                prev = Some(&node.key);
                cursor = node.forward[lvl];
            }
            if lvl > self.level {
                assert!(self.head[lvl].is_none(), "level {lvl} occupied above current level");
            }
        }

        let mut live = 0;
        for (id, slot) in self.nodes.iter().enumerate() {
            if let Some(node) = slot {
                live += 1;
                assert!(node.forward.len() >= 2, "node level below 1");
                assert_eq!(occurrences[id], node.forward.len(), "node missing from a lower level");
            }
        }
        assert_eq!(live, self.len);
        assert_eq!(self.nodes.len() - self.free.len(), self.len);
        if self.len == 0 {
            assert_eq!(self.level, 0);
        } else {
            assert!(self.head[self.level].is_some());
        }
    }
}

// == Iterator ==
/// Ascending iterator over `(key, entry)` pairs.
pub struct Iter<'a, K, V> {
    list: &'a SkipList<K, V>,
    next: Link,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a Entry<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.list.node(id);
        self.next = node.forward[0];
        Some((&node.key, &node.entry))
    }
}

impl<K: Ord + fmt::Display, V: fmt::Display> fmt::Display for SkipList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lvl in 0..=self.level {
            write!(f, "Level {}: ", lvl)?;
            let mut cursor = self.head[lvl];
            while let Some(id) = cursor {
                let node = self.node(id);
                write!(f, "{}:{};", node.key, node.entry.value)?;
                cursor = node.forward[lvl];
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
