// tarn-embed - High-level embedding API for the Tarn language
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! # tarn-embed
//!
//! High-level embedding API for Tarn: an [`Engine`] wrapping the runtime,
//! plus conversions between Rust and Tarn values.

pub mod convert;
pub mod engine;

pub use convert::{FromValue, IntoValue};
pub use engine::Engine;
pub use tarn_core::{Env, Error, Result, Runtime};
pub use tarn_parser::{Number, Value};
