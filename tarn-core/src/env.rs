// tarn-core - Environment over the persistent map
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Binding environment.
//!
//! An environment is a cell holding the current version of a persistent
//! symbol→value map. `def` swaps in a derived version; `set` rewrites the
//! shared cell of an existing binding in place, so every map version
//! sharing that cell, including environments captured by closures,
//! observes the new value.
//!
//! There is no parent chain: a closure captures the whole map version
//! current at `fn`-evaluation time, and application derives a fresh map
//! from the captured one. Structural sharing makes the derivation cheap.

use std::cell::RefCell;

use tarn_parser::{Heap, MapHandle, Value};

pub struct Env {
    map: RefCell<MapHandle>,
}

impl Env {
    /// Fresh empty environment over `heap`.
    pub fn new(heap: &Heap) -> Env {
        Env {
            map: RefCell::new(heap.new_map()),
        }
    }

    /// Environment over an existing map version.
    pub fn from_map(map: MapHandle) -> Env {
        Env {
            map: RefCell::new(map),
        }
    }

    /// The current map version. Cheap: a handle clone.
    pub fn snapshot(&self) -> MapHandle {
        self.map.borrow().clone()
    }

    /// Add or replace a binding; the environment advances to a derived map
    /// version.
    pub fn define(&self, key: Value, value: Value) {
        let next = self.map.borrow().insert(key, value);
        *self.map.borrow_mut() = next;
    }

    /// Rewrite an existing binding in place. Returns false when the key is
    /// not bound.
    pub fn set(&self, key: &Value, value: Value) -> bool {
        self.map.borrow().try_replace(key, value)
    }

    pub fn lookup(&self, key: &Value) -> Option<Value> {
        self.map.borrow().try_get(key)
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<Value> {
        self.lookup(&Value::symbol(name))
    }
}

// ============================================================================
// Tests
// ============================================================================
