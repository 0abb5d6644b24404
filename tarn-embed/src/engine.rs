// tarn-embed - Engine implementation
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! The Engine struct - main entry point for embedding Tarn.

use std::io::Write;
use std::path::Path;

use tarn_core::{apply, Env, Error, Result, Runtime};
use tarn_parser::Value;

use crate::convert::{FromValue, IntoValue};

/// The Tarn scripting engine.
///
/// `Engine` wraps a [`Runtime`] with a high-level interface for evaluating
/// code, registering Rust functions, and converting values.
///
/// # Thread Safety
///
/// **`Engine` is NOT thread-safe.** The runtime uses `Rc` and `RefCell`
/// internally. Create one engine per thread if you need concurrency.
///
/// # Example
///
/// ```rust
/// use tarn_embed::Engine;
///
/// let engine = Engine::new();
/// let result = engine.eval("(+ 1 2 3)").unwrap();
/// assert_eq!(result.to_string(), "6");
/// ```
pub struct Engine {
    rt: Runtime,
}

impl Engine {
    /// Create a new engine with the default environment populated.
    pub fn new() -> Self {
        Engine {
            rt: Runtime::new(),
        }
    }

    /// The underlying runtime, for operations the wrapper does not cover.
    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    /// Evaluate a string of Tarn code and return the result of the last
    /// form.
    ///
    /// # Errors
    ///
    /// Returns an error for syntax errors and for any evaluation failure.
    pub fn eval(&self, code: &str) -> Result<Value> {
        self.rt.read_eval(code)
    }

    /// Evaluate a file of Tarn code.
    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let code = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::io("eval_file", Some(path.as_ref().display().to_string()), e))?;
        self.eval(&code)
    }

    /// Parse without evaluating.
    pub fn parse(&self, code: &str) -> Result<Value> {
        self.rt.parse(code)
    }

    /// Get a value by `/`-separated symbolic path.
    ///
    /// Returns `None` if nothing is bound there.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Value> {
        self.rt.get(path)
    }

    /// Get a typed value. Returns `None` when the path is unbound or the
    /// value does not convert.
    #[must_use]
    pub fn get_as<T: FromValue>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| T::from_value(&v).ok())
    }

    /// Get a typed value, distinguishing "not bound" (`Ok(None)`) from a
    /// conversion failure (`Err`).
    pub fn try_get_as<T: FromValue>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path) {
            Some(v) => T::from_value(&v).map(Some),
            None => Ok(None),
        }
    }

    /// Bind a value in the root environment.
    pub fn set(&self, name: &str, value: impl IntoValue) {
        self.rt
            .env()
            .define(Value::symbol(name), value.into_value(self.rt.heap()));
    }

    /// Call a bound procedure by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .get(name)
            .ok_or_else(|| Error::undefined(name.to_string()))?;
        apply(&func, args.to_vec(), self.rt.env(), &self.rt)
    }

    /// Register a native Rust function as a primitive procedure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tarn_embed::Engine;
    /// use tarn_parser::Value;
    ///
    /// let engine = Engine::new();
    /// engine.register_native("greet", |_rt, args, _env| {
    ///     let name = args.first().and_then(Value::as_str).unwrap_or("world");
    ///     Ok(Value::string(format!("hello, {}", name)))
    /// });
    /// assert_eq!(
    ///     engine.eval("(greet \"tarn\")").unwrap(),
    ///     Value::string("hello, tarn")
    /// );
    /// ```
    pub fn register_native(
        &self,
        name: &str,
        func: impl Fn(&Runtime, &[Value], &Env) -> Result<Value> + 'static,
    ) {
        self.rt.add_primitive(name, func);
    }

    /// Bind command-line tokens at `sys/args`.
    pub fn set_args(&self, args: &[String]) {
        self.rt.set_args(args);
    }

    /// Redirect the printing primitives.
    pub fn set_output(&self, sink: Box<dyn Write>) {
        self.rt.set_output(sink);
    }

    /// Force a collection.
    pub fn gc(&self) {
        self.rt.gc();
    }

    /// Bytes held by the value pools, live or not.
    #[must_use]
    pub fn reserved_bytes(&self) -> usize {
        self.rt.reserved_bytes()
    }

    /// Bytes held by occupied pool cells.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.rt.live_bytes()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
