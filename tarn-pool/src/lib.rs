// tarn-pool - Pooled persistent containers
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! # tarn-pool
//!
//! Persistent (immutable-on-update) containers backed by chunked slab
//! allocation and an explicit mark-and-sweep collector driven from a
//! root-refcount table.
//!
//! Two containers are provided:
//!
//! - [`ListPool`] / [`List`]: persistent singly-linked lists with distinct
//!   head cells anchoring the root set.
//! - [`MapPool`] / [`Map`]: a persistent hash-array-mapped trie keyed by a
//!   32-bit hash, with node copying along the update path and structural
//!   sharing everywhere else.
//!
//! Neither pool collects on its own; a collection runs only when a caller
//! invokes `gc()`. Handles that are alive at that point are the root set.

pub mod chunk;
pub mod list;
pub mod map;

pub use chunk::{CellId, ChunkBox, SLAB_SLOTS};
pub use list::{List, ListIter, ListPool};
pub use map::{Hash32, Map, MapIter, MapPool};

// ============================================================================
// Hash32 for common key types
// ============================================================================

impl Hash32 for u32 {
    fn hash32(&self) -> u32 {
        *self
    }
}

impl Hash32 for i32 {
    fn hash32(&self) -> u32 {
        *self as u32
    }
}

impl Hash32 for i64 {
    fn hash32(&self) -> u32 {
        (*self as u64).hash32()
    }
}

impl Hash32 for u64 {
    fn hash32(&self) -> u32 {
        (*self >> 32) as u32 ^ *self as u32
    }
}

/// FNV-1a over the bytes.
impl Hash32 for str {
    fn hash32(&self) -> u32 {
        let mut h: u32 = 0x811c_9dc5;
        for b in self.bytes() {
            h ^= u32::from(b);
            h = h.wrapping_mul(0x0100_0193);
        }
        h
    }
}

impl Hash32 for String {
    fn hash32(&self) -> u32 {
        self.as_str().hash32()
    }
}
