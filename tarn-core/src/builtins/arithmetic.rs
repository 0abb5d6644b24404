// tarn-core - Arithmetic built-ins
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Arithmetic operations: `+ - * /` and `range`.
//!
//! All of them promote to float as soon as any operand is float. Integer
//! division by zero is an error; float division follows IEEE.

use tarn_parser::{Number, Value};

use crate::env::Env;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

fn number_arg(op: &'static str, v: &Value) -> Result<Number> {
    v.as_number()
        .ok_or_else(|| Error::type_error_in(op, "number", v.type_name()))
}

pub(crate) fn op_add(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let mut acc = Number::Int(0);
    for arg in args {
        acc = acc.add(number_arg("+", arg)?);
    }
    Ok(Value::number(acc))
}

pub(crate) fn op_sub(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::int(0));
    }
    let first = number_arg("-", &args[0])?;
    if args.len() == 1 {
        // Unary negation.
        return Ok(Value::number(Number::Int(0).sub(first)));
    }
    let mut acc = first;
    for arg in &args[1..] {
        acc = acc.sub(number_arg("-", arg)?);
    }
    Ok(Value::number(acc))
}

pub(crate) fn op_mul(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let mut acc = Number::Int(1);
    for arg in args {
        acc = acc.mul(number_arg("*", arg)?);
    }
    Ok(Value::number(acc))
}

pub(crate) fn op_div(_rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    if args.is_empty() {
        return Ok(Value::int(1));
    }
    let first = number_arg("/", &args[0])?;
    if args.len() == 1 {
        // Unary reciprocal.
        let out = Number::Int(1).div(first).ok_or(Error::DivisionByZero)?;
        return Ok(Value::number(out));
    }
    let mut acc = first;
    for arg in &args[1..] {
        acc = acc.div(number_arg("/", arg)?).ok_or(Error::DivisionByZero)?;
    }
    Ok(Value::number(acc))
}

/// (range end), (range start end), (range start increment end).
/// Inclusive-exclusive; any float operand makes the whole range float; a
/// zero increment is rejected.
pub(crate) fn op_range(rt: &Runtime, args: &[Value], _env: &Env) -> Result<Value> {
    let (start, increment, end) = match args.len() {
        1 => {
            let end = number_arg("range", &args[0])?;
            if end.is_float() {
                (Number::Float(0.0), Number::Float(1.0), end)
            } else {
                (Number::Int(0), Number::Int(1), end)
            }
        }
        2 => {
            let start = number_arg("range", &args[0])?;
            let end = number_arg("range", &args[1])?;
            if start.is_float() || end.is_float() {
                (
                    Number::Float(start.to_f64()),
                    Number::Float(1.0),
                    Number::Float(end.to_f64()),
                )
            } else {
                (start, Number::Int(1), end)
            }
        }
        3 => {
            let start = number_arg("range", &args[0])?;
            let increment = number_arg("range", &args[1])?;
            let end = number_arg("range", &args[2])?;
            if start.is_float() || increment.is_float() || end.is_float() {
                (
                    Number::Float(start.to_f64()),
                    Number::Float(increment.to_f64()),
                    Number::Float(end.to_f64()),
                )
            } else {
                (start, increment, end)
            }
        }
        n => return Err(Error::arity_range("range", 1, 3, n)),
    };

    if increment == Number::Int(0) || increment == Number::Float(0.0) {
        return Err(Error::eval("range: increment must not be zero"));
    }

    let ascending = Number::Int(0).lt(increment);
    let mut items = Vec::new();
    let mut cursor = start;
    loop {
        let within = if ascending {
            cursor.lt(end)
        } else {
            cursor.gt(end)
        };
        if !within {
            break;
        }
        items.push(Value::number(cursor));
        cursor = cursor.add(increment);
    }
    Ok(Value::list(rt.heap().list_from_iter(items)))
}
