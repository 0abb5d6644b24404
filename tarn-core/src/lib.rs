// tarn-core - Runtime, evaluator and primitives for the Tarn language
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! # tarn-core
//!
//! The Tarn runtime: a tree-walking evaluator over the value model of
//! `tarn-parser`, a persistent-map environment, the primitive-procedure
//! table, and the collector driver rooted at the environment.

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod runtime;

pub use builtins::register_builtins;
pub use env::Env;
pub use error::{AritySpec, Error, Result};
pub use eval::{apply, eval, is_callable, make_primitive, set_max_eval_depth, PrimitiveFn};
pub use runtime::Runtime;
