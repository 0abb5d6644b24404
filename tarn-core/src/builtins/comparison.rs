// tarn-core - Comparison built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Chained comparisons. `=` and `!=` accept any values; the numeric
//! orderings make the whole chain false when a non-number appears, they
//! do not error.

use tarn_parser::{Number, Value};

use crate::env::Env;
use crate::error::Result;
use crate::runtime::Runtime;

pub(crate) fn op_equal(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(args.windows(2).all(|w| w[0] == w[1])))
}

pub(crate) fn op_not_equal(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(args.windows(2).all(|w| w[0] != w[1])))
}

fn numeric_chain(args: &[Value], cmp: impl Fn(Number, Number) -> bool) -> bool {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        match arg.as_number() {
            Some(n) => numbers.push(n),
            None => return false,
        }
    }
    numbers.windows(2).all(|w| cmp(w[0], w[1]))
}

pub(crate) fn op_less(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(numeric_chain(args, |a, b| a.lt(b))))
}

pub(crate) fn op_greater(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(numeric_chain(args, |a, b| a.gt(b))))
}

pub(crate) fn op_less_or_equal(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(numeric_chain(args, |a, b| a.le(b))))
}

pub(crate) fn op_greater_or_equal(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::bool(numeric_chain(args, |a, b| a.ge(b))))
}
