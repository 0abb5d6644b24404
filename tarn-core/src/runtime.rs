// tarn-core - Runtime instance
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! The runtime: value heap, root environment, output sink.
//!
//! All state lives in the instance; there are no globals. The runtime is
//! single-threaded and interiorly mutable, so every method takes `&self`.
//!
//! # Garbage collection
//!
//! The root environment map is the sole declared root. A collection
//! clears both pools' root-refcount tables, re-roots them by walking the
//! environment's value graph, then collects the map pool followed by the
//! list pool. Values produced by `eval` but not bound in the environment
//! do not survive a collection.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::{self, Write};

use tarn_parser::{parse_source, Heap, MapHandle, Value};
use tarn_pool::CellId;

use crate::builtins::register_builtins;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{eval, make_primitive};

pub struct Runtime {
    heap: Heap,
    env: Env,
    out: RefCell<Box<dyn Write>>,
}

impl Runtime {
    /// Construct a runtime with the default environment populated.
    pub fn new() -> Runtime {
        let heap = Heap::new();
        let env = Env::new(&heap);
        let rt = Runtime {
            heap,
            env,
            out: RefCell::new(Box::new(io::stdout())),
        };
        register_builtins(&rt);
        rt
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Parse a program into a value tree wrapped in `(begin …)`.
    pub fn parse(&self, src: &str) -> Result<Value> {
        parse_source(src, &self.heap).map_err(Error::from)
    }

    /// Evaluate a parsed tree against the current root environment.
    pub fn eval(&self, v: &Value) -> Result<Value> {
        eval(v, &self.env, self)
    }

    /// Parse and evaluate.
    pub fn read_eval(&self, src: &str) -> Result<Value> {
        let parsed = self.parse(src)?;
        self.eval(&parsed)
    }

    /// Register a primitive procedure in the root environment.
    pub fn add_primitive(
        &self,
        name: &str,
        f: impl Fn(&Runtime, &[Value], &Env) -> Result<Value> + 'static,
    ) {
        self.env.define(Value::symbol(name), make_primitive(name, f));
    }

    /// Redirect the printing primitives.
    pub fn set_output(&self, sink: Box<dyn Write>) {
        *self.out.borrow_mut() = sink;
    }

    pub(crate) fn write_output(&self, text: &str) -> Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| Error::io("print", None, e))
    }

    /// Force a collection over both pools, rooted at the environment.
    ///
    /// The list pool's marks are taken before the map pool sweeps: a value
    /// dropped by the map sweep may hold the last counted reference to a
    /// list that the environment still reaches.
    pub fn gc(&self) {
        self.heap.maps().clear_root_refcounts();
        self.heap.lists().clear_root_refcounts();
        let root = self.env.snapshot();
        let mut seen = HashSet::new();
        mark_map(&root, &self.heap, &mut seen);
        self.heap.lists().mark_from_roots();
        self.heap.maps().gc();
        self.heap.lists().sweep();
    }

    /// Bytes held by the pools, live or not.
    pub fn reserved_bytes(&self) -> usize {
        self.heap.reserved_bytes()
    }

    /// Bytes held by occupied pool cells.
    pub fn live_bytes(&self) -> usize {
        self.heap.live_bytes()
    }

    /// Look up a value by `/`-separated symbolic path, walking into nested
    /// maps. The whole path is tried as a single symbol first, so bindings
    /// like `sys/args` resolve directly.
    pub fn get(&self, path: &str) -> Option<Value> {
        let root = self.env.snapshot();
        if let Some(v) = root.try_get(&Value::symbol(path)) {
            return Some(v);
        }
        let mut parts = path.split('/');
        let first = parts.next()?;
        let mut current = root.try_get(&Value::symbol(first))?;
        for part in parts {
            let map = current.as_map()?.clone();
            current = map
                .try_get(&Value::symbol(part))
                .or_else(|| map.try_get(&Value::string(part)))?;
        }
        Some(current)
    }

    /// Bind the command-line tokens at `sys/args` as a map from argument
    /// index to token, with backslashes normalised to forward slashes.
    pub fn set_args(&self, args: &[String]) {
        let pairs = args.iter().enumerate().map(|(i, arg)| {
            (
                Value::int(i as i64),
                Value::string(normalize_separators(arg)),
            )
        });
        let map = self.heap.map_from_iter(pairs);
        self.env.define(Value::symbol("sys/args"), Value::map(map));
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

impl Drop for Runtime {
    // Values stored in pool cells hold pool references of their own, which
    // would keep the pools alive past the runtime. Sweeping with an empty
    // root set drops every stored value and breaks those cycles.
    fn drop(&mut self) {
        self.heap.maps().clear_root_refcounts();
        self.heap.lists().clear_root_refcounts();
        self.heap.maps().gc();
        self.heap.lists().gc();
    }
}

/// `\` becomes `/`; an escaped backslash pair is left alone.
fn normalize_separators(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if chars.peek() == Some(&'\\') {
                out.push('\\');
                out.push('\\');
                chars.next();
            } else {
                out.push('/');
            }
        } else {
            out.push(c);
        }
    }
    out
}

// Re-root both pools from the environment's value graph. Each reachable
// list head and map root takes one refcount. The seen set guards against
// environment cells that `set` has pointed back into their own chain.
fn mark_map(map: &MapHandle, heap: &Heap, seen: &mut HashSet<(u8, CellId)>) {
    if let Some(root) = map.root_id() {
        if !seen.insert((b'm', root)) {
            return;
        }
        heap.maps().add_ref(root);
    }
    for (key, value) in map.iter() {
        mark_value(&key, heap, seen);
        mark_value(&value, heap, seen);
    }
}

fn mark_value(v: &Value, heap: &Heap, seen: &mut HashSet<(u8, CellId)>) {
    match v {
        Value::List(list) => {
            if let Some(head) = list.head_id() {
                if !seen.insert((b'l', head)) {
                    return;
                }
                heap.lists().add_ref(head);
            }
            for item in list.iter() {
                mark_value(&item, heap, seen);
            }
        }
        Value::Map(map) => mark_map(map, heap, seen),
        Value::Vector(items) => {
            for item in items.iter() {
                mark_value(item, heap, seen);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_single_backslashes_only() {
        assert_eq!(normalize_separators(r"C:\foo\bar"), "C:/foo/bar");
        assert_eq!(normalize_separators(r"\\server\share"), r"\\server/share");
        assert_eq!(normalize_separators("plain"), "plain");
    }

    #[test]
    fn set_args_binds_an_indexed_map() {
        let rt = Runtime::new();
        rt.set_args(&["tarn".to_string(), r"scripts\run.tn".to_string()]);
        let args = rt.get("sys/args").expect("sys/args bound");
        let map = args.as_map().expect("a map");
        assert_eq!(map.try_get(&Value::int(0)), Some(Value::string("tarn")));
        assert_eq!(
            map.try_get(&Value::int(1)),
            Some(Value::string("scripts/run.tn"))
        );
    }

    #[test]
    fn get_walks_nested_maps() {
        let rt = Runtime::new();
        rt.read_eval("(def conf (insert (make-map) \"port\" 8080))")
            .expect("eval failed");
        assert_eq!(rt.get("conf/port"), Some(Value::int(8080)));
        assert_eq!(rt.get("conf/missing"), None);
        assert_eq!(rt.get("nothing/here"), None);
    }
}
