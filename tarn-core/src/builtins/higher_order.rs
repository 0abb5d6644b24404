// tarn-core - Traversal built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! `iter` and `map` over lists, vectors and maps.
//!
//! Both take the shape `(op SYM… coll fn)`. The leading symbols are
//! decomposition markers: with N of them the collection is fed to `fn` in
//! chunks of N elements, padded with nil; with none the chunk size is one.
//! Map traversal takes no markers and feeds `fn` each key and value.
//!
//! `iter` discards the results and returns nil. `map` collects them into
//! the same collection kind; over a map, `fn` must return a two-element
//! list or vector, or a map whose pairs are merged.

use tarn_parser::Value;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::{apply, is_callable};
use crate::runtime::Runtime;

fn traversal_parts<'a>(
    op: &'static str,
    args: &'a [Value],
) -> Result<(usize, &'a Value, &'a Value)> {
    if args.len() < 2 {
        return Err(Error::arity_at_least(op, 2, args.len()));
    }
    let symcount = args.len() - 2;
    for marker in &args[..symcount] {
        if !matches!(marker, Value::Symbol(_)) {
            return Err(Error::type_error_in(op, "symbol", marker.type_name()));
        }
    }
    let collection = &args[symcount];
    let fun = &args[symcount + 1];
    if !matches!(
        collection,
        Value::List(_) | Value::Vector(_) | Value::Map(_)
    ) {
        return Err(Error::type_error_in(
            op,
            "list, vector or map",
            collection.type_name(),
        ));
    }
    if !is_callable(fun) {
        return Err(Error::type_error_in(op, "fn", fun.type_name()));
    }
    Ok((symcount, collection, fun))
}

fn elements_of(collection: &Value) -> Vec<Value> {
    match collection {
        Value::List(l) => l.iter().collect(),
        Value::Vector(items) => items.iter().cloned().collect(),
        _ => Vec::new(),
    }
}

fn chunk_calls(
    rt: &Runtime,
    env: &Env,
    fun: &Value,
    elements: Vec<Value>,
    chunk: usize,
    mut sink: impl FnMut(Value),
) -> Result<()> {
    for group in elements.chunks(chunk) {
        let mut call_args = group.to_vec();
        while call_args.len() < chunk {
            call_args.push(Value::nil());
        }
        sink(apply(fun, call_args, env, rt)?);
    }
    Ok(())
}

pub(crate) fn op_iter(rt: &Runtime, args: &[Value], env: &Env) -> Result<Value> {
    let (symcount, collection, fun) = traversal_parts("iter", args)?;
    if let Value::Map(m) = collection {
        if symcount != 0 {
            return Err(Error::eval(
                "iter: map traversal takes no decomposition symbols",
            ));
        }
        for (key, value) in m.iter() {
            apply(fun, vec![key, value], env, rt)?;
        }
        return Ok(Value::nil());
    }
    let chunk = symcount.max(1);
    chunk_calls(rt, env, fun, elements_of(collection), chunk, |_| {})?;
    Ok(Value::nil())
}

pub(crate) fn op_map(rt: &Runtime, args: &[Value], env: &Env) -> Result<Value> {
    let (symcount, collection, fun) = traversal_parts("map", args)?;
    match collection {
        Value::Map(m) => {
            if symcount != 0 {
                return Err(Error::eval(
                    "map: map traversal takes no decomposition symbols",
                ));
            }
            let mut result = rt.heap().new_map();
            for (key, value) in m.iter() {
                let applied = apply(fun, vec![key, value], env, rt)?;
                match &applied {
                    Value::List(pair) => match (pair.first(), pair.second()) {
                        (Some(k), Some(v)) => result = result.insert(k, v),
                        _ => {
                            return Err(Error::eval(
                                "map: result list must hold a key and a value",
                            ));
                        }
                    },
                    Value::Vector(items) if items.len() == 2 => {
                        result = result.insert(items[0].clone(), items[1].clone());
                    }
                    Value::Vector(_) => {
                        return Err(Error::eval(
                            "map: result vector must hold exactly a key and a value",
                        ));
                    }
                    Value::Map(pairs) => {
                        for (k, v) in pairs.iter() {
                            result = result.insert(k, v);
                        }
                    }
                    other => {
                        return Err(Error::eval(format!(
                            "map: result is not a collection of pairs: {}",
                            other
                        )));
                    }
                }
            }
            Ok(Value::map(result))
        }
        _ => {
            let chunk = symcount.max(1);
            let mut results = Vec::new();
            chunk_calls(rt, env, fun, elements_of(collection), chunk, |v| {
                results.push(v);
            })?;
            match collection {
                Value::List(_) => Ok(Value::list(rt.heap().list_from_iter(results))),
                _ => Ok(Value::vector_from_iter(results)),
            }
        }
    }
}
