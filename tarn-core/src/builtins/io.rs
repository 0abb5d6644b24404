// tarn-core - Printing and file built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! `println printf str` route through the runtime's output sink; `read
//! write import` touch the filesystem and report failures with the path.

use std::fs;

use tarn_parser::Value;

use crate::env::Env;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

// Strings and symbols print raw here, everything else pretty-prints.
fn print_form(v: &Value) -> String {
    match v {
        Value::String(s) => s.to_string(),
        Value::Symbol(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn join_args(args: &[Value], separator: &str) -> String {
    args.iter()
        .map(print_form)
        .collect::<Vec<_>>()
        .join(separator)
}

pub(crate) fn op_str(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    Ok(Value::string(join_args(args, "")))
}

pub(crate) fn op_println(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let mut line = join_args(args, " ");
    line.push('\n');
    rt.write_output(&line)?;
    Ok(Value::nil())
}

pub(crate) fn op_printf(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    rt.write_output(&join_args(args, " "))?;
    Ok(Value::nil())
}

fn path_arg<'a>(op: &'static str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| match args.get(index) {
            Some(other) => Error::type_error_in(op, "string", other.type_name()),
            None => Error::arity_named(op, index + 1, args.len()),
        })
}

/// (read path) → the file's contents as a string.
pub(crate) fn op_read(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("read", 1, args.len()));
    }
    let path = path_arg("read", args, 0)?;
    fs::read_to_string(path)
        .map(Value::string)
        .map_err(|e| Error::io("read", Some(path.to_string()), e))
}

/// (write path text) → nil; the file is created or truncated.
pub(crate) fn op_write(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::arity_named("write", 2, args.len()));
    }
    let path = path_arg("write", args, 0)?;
    let text = args[1]
        .as_str()
        .ok_or_else(|| Error::type_error_in("write", "string", args[1].type_name()))?;
    fs::write(path, text).map_err(|e| Error::io("write", Some(path.to_string()), e))?;
    Ok(Value::nil())
}

/// (import path) → read the file and evaluate its contents against the
/// current root environment; definitions land in the importing scope.
pub(crate) fn op_import(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::arity_named("import", 1, args.len()));
    }
    let path = path_arg("import", args, 0)?;
    let contents =
        fs::read_to_string(path).map_err(|e| Error::io("import", Some(path.to_string()), e))?;
    rt.read_eval(&contents)
}
