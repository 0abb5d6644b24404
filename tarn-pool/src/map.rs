// tarn-pool - Persistent hash-array-mapped-trie pool
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Pooled persistent hash maps.
//!
//! A 32-bit key hash is split into six 5-bit slices and a 2-bit tail:
//!
//! ```text
//! level  0     1     2     3     4     5    6
//!     |aaaaa|bbbbb|ccccc|ddddd|eeeee|fffff|gg|
//! ```
//!
//! Each slice selects a child slot in a 32-wide node. A node stores a
//! `used` bitfield, a reference run sized to `popcount(used)` reserved
//! consecutively in a dedicated chunk box, and one entry: nothing (the
//! root), a single key/value cell, or - only at the deepest level - a
//! chain of key/value cells held in a nested list pool for keys whose full
//! 32-bit hashes collide.
//!
//! Updates are persistent: an insertion allocates a fresh root and copies
//! the nodes on the hash path, re-reserving each copied node's reference
//! run; every branch off the path is shared with the previous version.
//! Removal rebuilds the root without the top-level branch holding the
//! victim and reinserts that branch's surviving cells.
//!
//! Roots are anchored in a refcount table exactly as in the list pool, and
//! collection is the same mark/sweep over the three chunk boxes followed by
//! a collection of the collision sub-pool, whose root set is rebuilt from
//! the live collision nodes during marking.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use crate::chunk::{CellId, ChunkBox};
use crate::list::ListPool;

/// 32-bit hash used to address the trie. Implementations must agree with
/// `PartialEq`: equal keys must produce equal hashes.
pub trait Hash32 {
    fn hash32(&self) -> u32;
}

/// Six 5-bit levels plus the 2-bit tail.
const HASH_LEVELS: u32 = 7;

fn local_index(hash: u32, level: u32) -> u32 {
    if level < 6 {
        (hash >> (level * 5)) & 0x1f
    } else {
        (hash >> 30) & 0x3
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Entry {
    Empty,
    Value(CellId),
    Collision(CellId),
}

#[derive(Clone, Copy, Debug)]
struct Node {
    used: u32,
    children: Option<CellId>,
    entry: Entry,
}

impl Node {
    fn empty() -> Node {
        Node {
            used: 0,
            children: None,
            entry: Entry::Empty,
        }
    }

    fn child_count(&self) -> usize {
        self.used.count_ones() as usize
    }

    fn has(&self, local: u32) -> bool {
        self.used & (1 << local) != 0
    }

    /// Position of `local` within the compressed reference run.
    fn slot_of(&self, local: u32) -> usize {
        (self.used & ((1u32 << local) - 1)).count_ones() as usize
    }
}

struct KeyValue<K, V> {
    hash: u32,
    key: K,
    value: V,
}

struct Shared<K, V> {
    nodes: RefCell<ChunkBox<Node>>,
    refs: RefCell<ChunkBox<CellId>>,
    kvs: RefCell<ChunkBox<KeyValue<K, V>>>,
    collisions: ListPool<CellId>,
    roots: RefCell<HashMap<CellId, u32>>,
}

/// Pool manager and collector for persistent maps from `K` to `V`.
pub struct MapPool<K, V> {
    shared: Rc<Shared<K, V>>,
}

impl<K, V> Clone for MapPool<K, V> {
    fn clone(&self) -> Self {
        MapPool {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<K, V> MapPool<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        MapPool {
            shared: Rc::new(Shared {
                nodes: RefCell::new(ChunkBox::new()),
                refs: RefCell::new(ChunkBox::new()),
                kvs: RefCell::new(ChunkBox::new()),
                collisions: ListPool::new(),
                roots: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The empty map.
    pub fn new_map(&self) -> Map<K, V> {
        Map::new(Rc::clone(&self.shared), None)
    }

    /// Build a map from key/value pairs; later pairs overwrite earlier ones.
    pub fn new_map_from_iter<I>(&self, pairs: I) -> Map<K, V>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut root = None;
        for (key, value) in pairs {
            let hash = key.hash32();
            let kvid = self.shared.alloc_kv(hash, key.clone(), value);
            root = Some(self.shared.instantiate_path(root, kvid, hash, &key));
        }
        Map::new(Rc::clone(&self.shared), root)
    }

    pub fn add_ref(&self, root: CellId) {
        self.shared.add_ref(root);
    }

    pub fn remove_ref(&self, root: CellId) {
        self.shared.remove_ref(root);
    }

    /// Forget every root. The next collection frees everything that is not
    /// re-rooted before it runs.
    pub fn clear_root_refcounts(&self) {
        self.shared.roots.borrow_mut().clear();
    }

    /// Mark-and-sweep collection: mark the three boxes empty, re-root the
    /// collision sub-pool from live collision nodes while marking, sweep,
    /// then collect the sub-pool.
    pub fn gc(&self) {
        self.shared.nodes.borrow_mut().mark_all_empty();
        self.shared.refs.borrow_mut().mark_all_empty();
        self.shared.kvs.borrow_mut().mark_all_empty();
        self.shared.collisions.clear_root_refcounts();
        let roots: Vec<CellId> = {
            let mut roots = self.shared.roots.borrow_mut();
            roots.retain(|_, count| *count > 0);
            roots.keys().copied().collect()
        };
        for root in roots {
            self.shared.mark_tree(root);
        }
        self.shared.nodes.borrow_mut().sweep();
        self.shared.refs.borrow_mut().sweep();
        // Dropping key/value payloads may release root refcounts on this or
        // other pools; only the kv storage borrow is held here.
        self.shared.kvs.borrow_mut().sweep();
        self.shared.collisions.gc();
    }

    pub fn reserved_bytes(&self) -> usize {
        self.shared.nodes.borrow().reserved_bytes()
            + self.shared.refs.borrow().reserved_bytes()
            + self.shared.kvs.borrow().reserved_bytes()
            + self.shared.collisions.reserved_bytes()
            + self.roots_bytes()
    }

    pub fn live_bytes(&self) -> usize {
        self.shared.nodes.borrow().live_bytes()
            + self.shared.refs.borrow().live_bytes()
            + self.shared.kvs.borrow().live_bytes()
            + self.shared.collisions.live_bytes()
            + self.roots_bytes()
    }

    /// Occupied key/value cell count, for tests and diagnostics.
    pub fn live_kvs(&self) -> usize {
        self.shared.kvs.borrow().live_cells()
    }

    fn roots_bytes(&self) -> usize {
        self.shared.roots.borrow().len() * (mem::size_of::<CellId>() + mem::size_of::<u32>())
    }
}

impl<K, V> Default for MapPool<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    fn default() -> Self {
        MapPool::new()
    }
}

impl<K, V> Shared<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    fn add_ref(&self, root: CellId) {
        *self.roots.borrow_mut().entry(root).or_insert(0) += 1;
    }

    fn remove_ref(&self, root: CellId) {
        if let Some(count) = self.roots.borrow_mut().get_mut(&root) {
            if *count > 0 {
                *count -= 1;
            }
        }
    }

    fn node(&self, id: CellId) -> Node {
        self.nodes
            .borrow()
            .get(id)
            .copied()
            .expect("map pool invariant: node cell missing")
    }

    fn alloc_node(&self, node: Node) -> CellId {
        self.nodes.borrow_mut().reserve(node)
    }

    fn update_node(&self, id: CellId, f: impl FnOnce(&mut Node)) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(node) = nodes.get_mut(id) {
            f(node);
        }
    }

    fn alloc_kv(&self, hash: u32, key: K, value: V) -> CellId {
        self.kvs.borrow_mut().reserve(KeyValue { hash, key, value })
    }

    fn kv_hash(&self, kvid: CellId) -> u32 {
        self.kvs
            .borrow()
            .get(kvid)
            .map(|kv| kv.hash)
            .expect("map pool invariant: key/value cell missing")
    }

    fn kv_key(&self, kvid: CellId) -> Option<K> {
        self.kvs.borrow().get(kvid).map(|kv| kv.key.clone())
    }

    fn kv_pair(&self, kvid: CellId) -> Option<(K, V)> {
        self.kvs
            .borrow()
            .get(kvid)
            .map(|kv| (kv.key.clone(), kv.value.clone()))
    }

    /// Compare the key stored in `kvid` against `key`. The stored key is
    /// cloned out first so the comparison runs with no storage borrow held;
    /// key equality may traverse arbitrary pool structures.
    fn key_matches(&self, kvid: CellId, hash: u32, key: &K) -> bool {
        let candidate = {
            let kvs = self.kvs.borrow();
            match kvs.get(kvid) {
                Some(kv) if kv.hash == hash => Some(kv.key.clone()),
                _ => None,
            }
        };
        match candidate {
            Some(stored) => stored == *key,
            None => false,
        }
    }

    fn child_at(&self, node: &Node, local: u32) -> Option<CellId> {
        if !node.has(local) {
            return None;
        }
        let start = node.children?;
        self.refs
            .borrow()
            .get(start + node.slot_of(local) as u32)
            .copied()
    }

    fn children_vec(&self, node: &Node) -> Vec<CellId> {
        let start = match node.children {
            Some(start) => start,
            None => return Vec::new(),
        };
        let refs = self.refs.borrow();
        (0..node.child_count() as u32)
            .filter_map(|i| refs.get(start + i).copied())
            .collect()
    }

    fn new_run(&self, ids: Vec<CellId>) -> Option<CellId> {
        if ids.is_empty() {
            return None;
        }
        // popcount(used) never exceeds 32, so the run always fits a slab.
        self.refs.borrow_mut().reserve_run(ids)
    }

    /// Give `parent` a new reference run with `child` added at `local`.
    fn attach_child(&self, parent: CellId, local: u32, child: CellId) {
        let node = self.node(parent);
        let mut ids = self.children_vec(&node);
        ids.insert(node.slot_of(local), child);
        let run = self.new_run(ids);
        self.update_node(parent, |n| {
            n.used |= 1 << local;
            n.children = run;
        });
    }

    /// Give `parent` a new reference run with the slot at `local` swapped
    /// for `child`.
    fn replace_child(&self, parent: CellId, local: u32, child: CellId) {
        let node = self.node(parent);
        let mut ids = self.children_vec(&node);
        ids[node.slot_of(local)] = child;
        let run = self.new_run(ids);
        self.update_node(parent, |n| n.children = run);
    }

    /// Walk `hash` from a copy of `old_root`, copying every node on the
    /// path, and plant `kvid` where the walk ends: a fresh leaf below the
    /// first vacant slot, a replacement when the key already occurs on the
    /// path, or the deepest node's collision chain.
    fn instantiate_path(
        &self,
        old_root: Option<CellId>,
        kvid: CellId,
        hash: u32,
        key: &K,
    ) -> CellId {
        let root_copy = match old_root {
            Some(id) => self.node(id),
            None => Node::empty(),
        };
        let new_root = self.alloc_node(root_copy);
        let mut current = new_root;
        for level in 0..HASH_LEVELS {
            let local = local_index(hash, level);
            let cur = self.node(current);
            if !cur.has(local) {
                let leaf = self.alloc_node(Node {
                    used: 0,
                    children: None,
                    entry: Entry::Value(kvid),
                });
                self.attach_child(current, local, leaf);
                break;
            }
            let child_id = match self.child_at(&cur, local) {
                Some(id) => id,
                None => break,
            };
            let child = self.node(child_id);
            let new_child = self.alloc_node(child);
            self.replace_child(current, local, new_child);
            if level < HASH_LEVELS - 1 {
                if let Entry::Value(existing) = child.entry {
                    if self.key_matches(existing, hash, key) {
                        self.update_node(new_child, |n| n.entry = Entry::Value(kvid));
                        break;
                    }
                }
                current = new_child;
            } else {
                let entry = self.terminal_entry(child.entry, kvid, hash, key);
                self.update_node(new_child, |n| n.entry = entry);
                break;
            }
        }
        new_root
    }

    /// Hash bits are exhausted: replace a matching key or chain the cell
    /// into a collision list.
    fn terminal_entry(&self, existing: Entry, kvid: CellId, hash: u32, key: &K) -> Entry {
        match existing {
            Entry::Empty => Entry::Value(kvid),
            Entry::Value(other) => {
                if self.key_matches(other, hash, key) {
                    Entry::Value(kvid)
                } else {
                    let chain = self.collisions.new_list_from_iter(vec![other, kvid]);
                    match chain.head_id() {
                        Some(head) => Entry::Collision(head),
                        None => Entry::Value(kvid),
                    }
                }
            }
            Entry::Collision(head) => {
                let chain = self.collisions.adopt(Some(head));
                let mut matched = None;
                let mut it = chain.iter();
                while let Some((node_id, chained_kv)) = it.next_entry() {
                    if self.key_matches(chained_kv, hash, key) {
                        matched = Some(node_id);
                        break;
                    }
                }
                let new_chain = match matched {
                    Some(node_id) => chain.remove_at(node_id).prepend(kvid),
                    None => chain.prepend(kvid),
                };
                match new_chain.head_id() {
                    Some(head) => Entry::Collision(head),
                    None => Entry::Value(kvid),
                }
            }
        }
    }

    /// Follow the hash down the trie, checking each node on the path for a
    /// matching key. Returns the kv cell of the first match.
    fn lookup_kv(&self, root: Option<CellId>, hash: u32, key: &K) -> Option<CellId> {
        let mut current = root?;
        for level in 0..HASH_LEVELS {
            let node = self.node(current);
            let local = local_index(hash, level);
            let child_id = self.child_at(&node, local)?;
            let child = self.node(child_id);
            match child.entry {
                Entry::Value(kvid) => {
                    if self.key_matches(kvid, hash, key) {
                        return Some(kvid);
                    }
                }
                Entry::Collision(head) => {
                    let mut it = self.collisions.iter_raw(Some(head));
                    while let Some((_, kvid)) = it.next_entry() {
                        if self.key_matches(kvid, hash, key) {
                            return Some(kvid);
                        }
                    }
                }
                Entry::Empty => {}
            }
            current = child_id;
        }
        None
    }

    /// Every kv cell stored at or below `node_id`.
    fn collect_kvs(&self, node_id: CellId, out: &mut Vec<CellId>) {
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            match node.entry {
                Entry::Value(kvid) => out.push(kvid),
                Entry::Collision(head) => {
                    let mut it = self.collisions.iter_raw(Some(head));
                    while let Some((_, kvid)) = it.next_entry() {
                        out.push(kvid);
                    }
                }
                Entry::Empty => {}
            }
            stack.extend(self.children_vec(&node));
        }
    }

    /// Mark a whole tree: every node, its reference run, its kv cell, and
    /// for collision nodes the chain head (re-rooted) plus the chained kv
    /// cells.
    fn mark_tree(&self, root: CellId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = match self.nodes.borrow().get(id).copied() {
                Some(node) => node,
                None => continue,
            };
            self.nodes.borrow_mut().mark(id);
            if let Some(start) = node.children {
                self.refs.borrow_mut().mark_run(start, node.child_count());
            }
            match node.entry {
                Entry::Value(kvid) => self.kvs.borrow_mut().mark(kvid),
                Entry::Collision(head) => {
                    self.collisions.add_ref(head);
                    let mut it = self.collisions.iter_raw(Some(head));
                    while let Some((_, kvid)) = it.next_entry() {
                        self.kvs.borrow_mut().mark(kvid);
                    }
                }
                Entry::Empty => {}
            }
            stack.extend(self.children_vec(&node));
        }
    }
}

/// A persistent hash map: a shared pool plus an optional root node.
///
/// Cloning takes a root refcount; dropping releases it. Two versions of a
/// map share every node not on the path of the update that separated them.
pub struct Map<K, V> {
    shared: Rc<Shared<K, V>>,
    root: Option<CellId>,
}

impl<K, V> Map<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    fn new(shared: Rc<Shared<K, V>>, root: Option<CellId>) -> Self {
        if let Some(r) = root {
            shared.add_ref(r);
        }
        Map { shared, root }
    }

    pub fn root_id(&self) -> Option<CellId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// New map with `key` bound to `value`.
    pub fn insert(&self, key: K, value: V) -> Map<K, V> {
        let hash = key.hash32();
        let kvid = self.shared.alloc_kv(hash, key.clone(), value);
        let root = self.shared.instantiate_path(self.root, kvid, hash, &key);
        Map::new(Rc::clone(&self.shared), Some(root))
    }

    /// New map without `key`. A missing key returns this map unchanged.
    ///
    /// The top-level branch holding the key is dropped from a copy of the
    /// root and every other cell found under that branch is reinserted.
    pub fn remove(&self, key: &K) -> Map<K, V> {
        let hash = key.hash32();
        if self.shared.lookup_kv(self.root, hash, key).is_none() {
            return self.clone();
        }
        let root_id = match self.root {
            Some(id) => id,
            None => return self.clone(),
        };
        let root = self.shared.node(root_id);
        let top_local = local_index(hash, 0);
        let branch = match self.shared.child_at(&root, top_local) {
            Some(id) => id,
            None => return self.clone(),
        };
        let mut kept = Vec::new();
        self.shared.collect_kvs(branch, &mut kept);
        kept.retain(|kvid| !self.shared.key_matches(*kvid, hash, key));

        let mut ids = self.shared.children_vec(&root);
        ids.remove(root.slot_of(top_local));
        let children = self.shared.new_run(ids);
        let mut new_root = self.shared.alloc_node(Node {
            used: root.used & !(1 << top_local),
            children,
            entry: root.entry,
        });
        for kvid in kept {
            let kv_hash = self.shared.kv_hash(kvid);
            if let Some(kv_key) = self.shared.kv_key(kvid) {
                new_root = self
                    .shared
                    .instantiate_path(Some(new_root), kvid, kv_hash, &kv_key);
            }
        }
        Map::new(Rc::clone(&self.shared), Some(new_root))
    }

    pub fn try_get(&self, key: &K) -> Option<V> {
        let hash = key.hash32();
        let kvid = self.shared.lookup_kv(self.root, hash, key)?;
        self.shared.kv_pair(kvid).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        let hash = key.hash32();
        self.shared.lookup_kv(self.root, hash, key).is_some()
    }

    /// Rewrite the value held in an existing cell in place. Every map
    /// version sharing the cell observes the new value. Returns false when
    /// the key is absent.
    pub fn try_replace(&self, key: &K, value: V) -> bool {
        let hash = key.hash32();
        let kvid = match self.shared.lookup_kv(self.root, hash, key) {
            Some(id) => id,
            None => return false,
        };
        let mut kvs = self.shared.kvs.borrow_mut();
        match kvs.get_mut(kvid) {
            Some(kv) => {
                kv.value = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> MapIter<K, V> {
        let mut iter = MapIter {
            shared: Rc::clone(&self.shared),
            stack: Vec::with_capacity(8),
            pending: Vec::new(),
        };
        if let Some(root) = self.root {
            iter.push_node(root);
        }
        iter
    }

    /// Linear count of stored pairs.
    pub fn size(&self) -> usize {
        self.iter().count()
    }
}

impl<K, V> Clone for Map<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Map::new(Rc::clone(&self.shared), self.root)
    }
}

impl<K, V> Drop for Map<K, V> {
    fn drop(&mut self) {
        if let Some(r) = self.root {
            if let Some(count) = self.shared.roots.borrow_mut().get_mut(&r) {
                if *count > 0 {
                    *count -= 1;
                }
            }
        }
    }
}

impl<K, V> PartialEq for Map<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: PartialEq + Clone,
{
    /// Key-coverage equality: every pair of each map is looked up in the
    /// other.
    fn eq(&self, other: &Self) -> bool {
        fn covers<K, V>(a: &Map<K, V>, b: &Map<K, V>) -> bool
        where
            K: Hash32 + PartialEq + Clone,
            V: PartialEq + Clone,
        {
            for (key, value) in a.iter() {
                match b.try_get(&key) {
                    Some(found) if found == value => {}
                    _ => return false,
                }
            }
            true
        }
        covers(self, other) && covers(other, self)
    }
}

impl<K, V> std::fmt::Debug for Map<K, V>
where
    K: Hash32 + PartialEq + Clone + std::fmt::Debug,
    V: Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Unordered iterator over map pairs.
///
/// A stack of per-node child cursors, bounded by the trie depth (six 5-bit
/// levels, the 2-bit tail, and the root frame), plus the current node's
/// pending cells. A node's own cells are emitted before its children.
/// Iteration order is unspecified but stable for a given map value.
pub struct MapIter<K, V> {
    shared: Rc<Shared<K, V>>,
    stack: Vec<Frame>,
    pending: Vec<CellId>,
}

struct Frame {
    node: CellId,
    next_child: usize,
}

impl<K, V> MapIter<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    fn push_node(&mut self, id: CellId) {
        let node = match self.shared.nodes.borrow().get(id).copied() {
            Some(node) => node,
            None => return,
        };
        match node.entry {
            Entry::Value(kvid) => self.pending.push(kvid),
            Entry::Collision(head) => {
                let mut it = self.shared.collisions.iter_raw(Some(head));
                while let Some((_, kvid)) = it.next_entry() {
                    self.pending.push(kvid);
                }
            }
            Entry::Empty => {}
        }
        self.stack.push(Frame {
            node: id,
            next_child: 0,
        });
    }
}

impl<K, V> Iterator for MapIter<K, V>
where
    K: Hash32 + PartialEq + Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        loop {
            if let Some(kvid) = self.pending.pop() {
                if let Some(pair) = self.shared.kv_pair(kvid) {
                    return Some(pair);
                }
                continue;
            }
            let frame = self.stack.last_mut()?;
            let node = match self.shared.nodes.borrow().get(frame.node).copied() {
                Some(node) => node,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            if frame.next_child < node.child_count() {
                let idx = frame.next_child as u32;
                frame.next_child += 1;
                let child = {
                    let refs = self.shared.refs.borrow();
                    node.children.and_then(|start| refs.get(start + idx).copied())
                };
                if let Some(child) = child {
                    self.push_node(child);
                }
            } else {
                self.stack.pop();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
