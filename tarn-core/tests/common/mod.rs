// tarn-core - Shared test helpers
// Copyright (c) 2025 the tarn authors. MIT licensed.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tarn_core::Runtime;
use tarn_parser::Value;

/// Evaluate source in a fresh runtime.
pub fn eval_str(src: &str) -> Result<Value, String> {
    let rt = Runtime::new();
    rt.read_eval(src).map_err(|e| e.to_string())
}

/// Evaluate source against an existing runtime.
pub fn eval_with(rt: &Runtime, src: &str) -> Result<Value, String> {
    rt.read_eval(src).map_err(|e| e.to_string())
}

/// A clonable in-memory sink for capturing primitive output.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        SharedBuffer::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
