// tarn-core - Collection constructor built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Map and vector construction: `make-map make-vector insert remove keys
//! vals`.

use tarn_parser::Value;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

pub(crate) fn op_make_map(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(Error::eval("make-map: expects key value pairs"));
    }
    let pairs = args.chunks(2).map(|pair| (pair[0].clone(), pair[1].clone()));
    Ok(Value::map(rt.heap().map_from_iter(pairs)))
}

pub(crate) fn op_make_vector(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::vector_from_iter(args.iter().cloned()))
}

/// (insert map k v k v …).
pub(crate) fn op_insert(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() < 3 || (args.len() - 1) % 2 != 0 {
        return Err(Error::eval(
            "insert: expects a map followed by key value pairs",
        ));
    }
    let mut map = args[0]
        .as_map()
        .ok_or_else(|| Error::type_error_in("insert", "map", args[0].type_name()))?
        .clone();
    for pair in args[1..].chunks(2) {
        map = map.insert(pair[0].clone(), pair[1].clone());
    }
    Ok(Value::map(map))
}

/// (remove map k …).
pub(crate) fn op_remove(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::arity_at_least("remove", 2, args.len()));
    }
    let mut map = args[0]
        .as_map()
        .ok_or_else(|| Error::type_error_in("remove", "map", args[0].type_name()))?
        .clone();
    for key in &args[1..] {
        map = map.remove(key);
    }
    Ok(Value::map(map))
}

pub(crate) fn op_keys(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let map = single_map_arg("keys", args)?;
    let keys: Vec<Value> = map.iter().map(|(k, _)| k).collect();
    Ok(Value::list(rt.heap().list_from_iter(keys)))
}

pub(crate) fn op_vals(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let map = single_map_arg("vals", args)?;
    let vals: Vec<Value> = map.iter().map(|(_, v)| v).collect();
    Ok(Value::list(rt.heap().list_from_iter(vals)))
}

fn single_map_arg<'a>(
    op: &'static str,
    args: &'a [Value],
) -> Result<&'a tarn_parser::MapHandle> {
    if args.len() != 1 {
        return Err(Error::arity_named(op, 1, args.len()));
    }
    args[0]
        .as_map()
        .ok_or_else(|| Error::type_error_in(op, "map", args[0].type_name()))
}
