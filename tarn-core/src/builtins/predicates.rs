// tarn-core - Type predicate built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Type predicates. A missing argument answers false rather than erroring.

use tarn_parser::{Number, Value};

use crate::env::Env;
use crate::error::Result;
use crate::eval::is_callable;
use crate::runtime::Runtime;

fn check(args: &[Value], pred: impl Fn(&Value) -> bool) -> Result<Value> {
    Ok(Value::bool(args.first().map(pred).unwrap_or(false)))
}

pub(crate) fn op_is_integer(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Number(Number::Int(_))))
}

pub(crate) fn op_is_float(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Number(Number::Float(_))))
}

pub(crate) fn op_is_string(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::String(_)))
}

pub(crate) fn op_is_boolean(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Bool(_)))
}

pub(crate) fn op_is_symbol(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Symbol(_)))
}

pub(crate) fn op_is_map(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Map(_)))
}

pub(crate) fn op_is_vector(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Vector(_)))
}

pub(crate) fn op_is_list(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::List(_)))
}

/// True for primitives and compound procedures alike.
pub(crate) fn op_is_fn(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, is_callable)
}

pub(crate) fn op_is_object(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    check(args, |v| matches!(v, Value::Object(_)))
}
