// tarn-core - Sequence built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Sequence access over lists and vectors: `first next fnext nnext
//! ffirst nfirst count cons conj`. The accessors are nil-safe; counting
//! an uncountable value counts zero.

use tarn_parser::Value;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

fn first_of(v: &Value) -> Option<Value> {
    match v {
        Value::List(l) => l.first(),
        Value::Vector(items) => items.get(0).cloned(),
        _ => None,
    }
}

fn next_of(v: &Value) -> Value {
    match v {
        Value::List(l) => Value::list(l.rest()),
        Value::Vector(items) => Value::Vector(items.iter().skip(1).cloned().collect()),
        _ => Value::nil(),
    }
}

pub(crate) fn op_first(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(args.first().and_then(first_of).unwrap_or_else(Value::nil))
}

pub(crate) fn op_next(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(args.first().map(next_of).unwrap_or_else(Value::nil))
}

pub(crate) fn op_fnext(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let second = match args.first() {
        Some(Value::List(l)) => l.second(),
        Some(Value::Vector(items)) => items.get(1).cloned(),
        _ => None,
    };
    Ok(second.unwrap_or_else(Value::nil))
}

pub(crate) fn op_nnext(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    match args.first() {
        Some(Value::List(l)) => Ok(Value::list(l.rest().rest())),
        Some(Value::Vector(items)) => {
            Ok(Value::Vector(items.iter().skip(2).cloned().collect()))
        }
        _ => Ok(Value::nil()),
    }
}

pub(crate) fn op_nfirst(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    match args.first().and_then(first_of) {
        Some(inner) => Ok(next_of(&inner)),
        None => Ok(Value::nil()),
    }
}

pub(crate) fn op_ffirst(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let inner = args.first().and_then(first_of);
    Ok(inner
        .as_ref()
        .and_then(first_of)
        .unwrap_or_else(Value::nil))
}

pub(crate) fn op_count(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let count = match args.first() {
        Some(Value::List(l)) => l.size(),
        Some(Value::Vector(items)) => items.len(),
        Some(Value::Map(m)) => m.size(),
        Some(Value::String(s)) => s.chars().count(),
        _ => 0,
    };
    Ok(Value::int(count as i64))
}

/// (cons elem coll): prepend to a list or a vector.
pub(crate) fn op_cons(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("cons", 2, args.len()));
    }
    match &args[1] {
        Value::List(l) => Ok(Value::list(l.prepend(args[0].clone()))),
        Value::Vector(items) => Ok(Value::vector_cons_front(args[0].clone(), items)),
        other => Err(Error::type_error_in(
            "cons",
            "list or vector",
            other.type_name(),
        )),
    }
}

/// (conj coll elem …): append to a list or a vector.
pub(crate) fn op_conj(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("conj", 2, args.len()));
    }
    match &args[0] {
        Value::List(l) => Ok(Value::list(l.append_iter(args[1..].iter().cloned()))),
        Value::Vector(items) => {
            let mut out = items.clone();
            for v in &args[1..] {
                out.push_back(v.clone());
            }
            Ok(Value::Vector(out))
        }
        other => Err(Error::type_error_in(
            "conj",
            "list or vector",
            other.type_name(),
        )),
    }
}
