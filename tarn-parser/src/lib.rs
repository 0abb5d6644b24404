// tarn-parser - Value model and reader for the Tarn language
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! # tarn-parser
//!
//! Value model and reader for the Tarn language. Produces a `Value` tree
//! from source text; compound values are allocated from the pools of a
//! [`Heap`].

pub mod parser;
pub mod value;

pub use parser::{check_delimiters, parse_source, ParseError};
pub use value::{
    to_typed_string, Heap, ListHandle, MapHandle, NativeFn, Number, ObjectHandle, Value,
};
