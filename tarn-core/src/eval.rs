// tarn-core - Tree-walking evaluator
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Tree-walking evaluator for Tarn value trees.
//!
//! The shape follows the classic SICP core: dispatch on value shape and
//! head-symbol tagging, special forms first, then application. A user
//! function is not a distinct value variant; `fn` produces a tagged list
//! `(procedure PARAMS (BODY…) ENV-MAP)` and `apply` recognises the tag,
//! which keeps the hot dispatch path to a single head comparison.
//!
//! Errors propagate as `Result` values; nothing in here panics or throws.

use std::cell::Cell;
use std::rc::Rc;

use tarn_parser::{ListHandle, Value};

use crate::env::Env;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

// ============================================================================
// Recursion guard
// ============================================================================

const DEFAULT_MAX_EVAL_DEPTH: usize = 10_000;

thread_local! {
    static EVAL_DEPTH: Cell<usize> = const { Cell::new(0) };
    static MAX_EVAL_DEPTH: Cell<usize> = const { Cell::new(DEFAULT_MAX_EVAL_DEPTH) };
}

/// Set the maximum eval recursion depth. Returns the previous value.
pub fn set_max_eval_depth(depth: usize) -> usize {
    MAX_EVAL_DEPTH.with(|d| d.replace(depth))
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<Self> {
        let (current, max) = EVAL_DEPTH.with(|d| {
            let current = d.get() + 1;
            d.set(current);
            (current, MAX_EVAL_DEPTH.with(|m| m.get()))
        });
        if current > max {
            EVAL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
            Err(Error::eval(format!(
                "Stack overflow: maximum recursion depth ({}) exceeded",
                max
            )))
        } else {
            Ok(DepthGuard)
        }
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        EVAL_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

// ============================================================================
// Primitive procedures
// ============================================================================

/// Signature of a primitive procedure: runtime, evaluated arguments, and
/// the environment of the application site.
pub type PrimitiveFn = dyn Fn(&Runtime, &[Value], &Env) -> Result<Value>;

/// Wrap a Rust closure as a `Value::Function`. The callable crosses the
/// value model type-erased and is downcast back at application time.
pub fn make_primitive(
    name: &str,
    f: impl Fn(&Runtime, &[Value], &Env) -> Result<Value> + 'static,
) -> Value {
    let func: Rc<PrimitiveFn> = Rc::new(f);
    Value::function(name, Rc::new(func))
}

// ============================================================================
// Evaluation
// ============================================================================

fn is_self_evaluating(v: &Value) -> bool {
    matches!(
        v,
        Value::Number(_)
            | Value::String(_)
            | Value::Map(_)
            | Value::Nil
            | Value::Bool(_)
            | Value::NumberArray(_)
            | Value::Vector(_)
            | Value::Function(_)
    )
}

fn is_tagged_list(v: &Value, tag: &str) -> bool {
    v.as_list()
        .and_then(|l| l.first())
        .is_some_and(|head| head.is_symbol_named(tag))
}

/// True for anything `apply` accepts as a procedure.
pub fn is_callable(v: &Value) -> bool {
    matches!(v, Value::Function(_)) || is_tagged_list(v, "procedure")
}

/// Evaluate a value tree against an environment.
pub fn eval(v: &Value, env: &Env, rt: &Runtime) -> Result<Value> {
    let _guard = DepthGuard::enter()?;
    if is_self_evaluating(v) {
        return Ok(v.clone());
    }
    match v {
        Value::Symbol(name) => {
            // Keyword-style symbols evaluate to themselves, which is what
            // makes them usable as bare map keys.
            if name.starts_with(':') {
                return Ok(v.clone());
            }
            env.lookup(v)
                .ok_or_else(|| Error::undefined(name.to_string()))
        }
        Value::List(list) => eval_list(list, env, rt),
        other => Err(Error::eval(format!("cannot evaluate: {}", other))),
    }
}

fn eval_list(list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let head = match list.first() {
        Some(head) => head,
        None => return Err(Error::eval("cannot evaluate an empty list")),
    };
    if let Value::Symbol(name) = &head {
        match &**name {
            "quote" => {
                return list
                    .second()
                    .ok_or_else(|| Error::syntax("quote", "nothing to quote"));
            }
            "def" => return eval_def(list, env, rt),
            "set" => return eval_set(list, env, rt),
            "if" => return eval_if(list, env, rt),
            "fn" => return eval_fn(list, env, rt),
            "begin" => return eval_sequence(&list.rest(), env, rt),
            "cond" => {
                let expanded = expand_cond(&list.rest(), rt)?;
                return eval(&expanded, env, rt);
            }
            _ => {}
        }
    }
    eval_application(&head, list, env, rt)
}

// (def K V): K must be a symbol; V is evaluated unless self-evaluating.
fn eval_def(list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let (key, value) = assignment_parts("def", list, env, rt)?;
    env.define(key, value);
    Ok(Value::nil())
}

// (set K V): as def, but the binding must already exist; the shared cell
// is rewritten in place.
fn eval_set(list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let (key, value) = assignment_parts("set", list, env, rt)?;
    if env.set(&key, value) {
        Ok(Value::nil())
    } else {
        Err(Error::eval(format!("set: no binding for '{}'", key)))
    }
}

fn assignment_parts(
    form: &'static str,
    list: &ListHandle,
    env: &Env,
    rt: &Runtime,
) -> Result<(Value, Value)> {
    let key = list
        .second()
        .ok_or_else(|| Error::syntax(form, "missing binding name"))?;
    if !matches!(key, Value::Symbol(_)) {
        return Err(Error::syntax(form, "binding name must be a symbol"));
    }
    let raw = list
        .nth(2)
        .ok_or_else(|| Error::syntax(form, "missing value"))?;
    let value = if is_self_evaluating(&raw) {
        raw
    } else {
        eval(&raw, env, rt)?
    };
    Ok((key, value))
}

fn eval_if(list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let predicate = list
        .second()
        .ok_or_else(|| Error::syntax("if", "missing predicate"))?;
    if eval(&predicate, env, rt)?.is_truthy() {
        let consequent = list
            .nth(2)
            .ok_or_else(|| Error::syntax("if", "missing consequent"))?;
        eval(&consequent, env, rt)
    } else {
        match list.nth(3) {
            Some(alternative) => eval(&alternative, env, rt),
            None => Ok(Value::nil()),
        }
    }
}

// (fn PARAMS BODY…) → (procedure PARAMS (BODY…) ENV-MAP). The captured
// environment is the map version current right now.
fn eval_fn(list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let params = list
        .second()
        .ok_or_else(|| Error::syntax("fn", "missing parameter list"))?;
    let body = list.rest().rest();
    let tagged = rt.heap().list_from_iter(vec![
        Value::symbol("procedure"),
        params,
        Value::list(body),
        Value::map(env.snapshot()),
    ]);
    Ok(Value::list(tagged))
}

/// Evaluate each form in order and return the last result. An empty
/// sequence is an error.
pub fn eval_sequence(seq: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    if seq.is_empty() {
        return Err(Error::eval("begin: empty sequence"));
    }
    let mut result = Value::nil();
    for form in seq.iter() {
        result = eval(&form, env, rt)?;
    }
    Ok(result)
}

// cond expands into nested ifs at evaluation time.
fn expand_cond(clauses: &ListHandle, rt: &Runtime) -> Result<Value> {
    let first = match clauses.first() {
        Some(first) => first,
        None => return Ok(Value::nil()),
    };
    let rest = clauses.rest();
    if is_tagged_list(&first, "else") {
        if !rest.is_empty() {
            return Err(Error::syntax("cond", "else clause must be last"));
        }
        let actions = first
            .as_list()
            .map(|l| l.rest())
            .unwrap_or_else(|| rt.heap().new_list());
        return Ok(sequence_exp(&actions, rt));
    }
    let clause = first
        .as_list()
        .ok_or_else(|| Error::syntax("cond", format!("clause is not a list: {}", first)))?;
    if rest.is_empty() {
        return Err(Error::syntax("cond", "final clause must be else"));
    }
    let predicate = clause
        .first()
        .ok_or_else(|| Error::syntax("cond", "empty clause"))?;
    let consequent = sequence_exp(&clause.rest(), rt);
    let alternative = expand_cond(&rest, rt)?;
    let if_form = rt
        .heap()
        .new_list()
        .prepend(alternative)
        .prepend(consequent)
        .prepend(predicate)
        .prepend(Value::symbol("if"));
    Ok(Value::list(if_form))
}

// A clause body of one form stays bare; more get a begin wrapper.
fn sequence_exp(actions: &ListHandle, rt: &Runtime) -> Value {
    if actions.is_empty() {
        return Value::list(rt.heap().new_list());
    }
    if actions.rest().is_empty() {
        match actions.first() {
            Some(only) => only,
            None => Value::nil(),
        }
    } else {
        Value::list(actions.prepend(Value::symbol("begin")))
    }
}

fn eval_application(head: &Value, list: &ListHandle, env: &Env, rt: &Runtime) -> Result<Value> {
    let op = if is_self_evaluating(head) {
        head.clone()
    } else {
        eval(head, env, rt)?
    };
    let arg_forms: Vec<Value> = list.rest().iter().collect();
    // iter/map decomposition markers are binding-position names, not
    // expressions; leading symbol arguments pass through unevaluated.
    let passthrough = head.is_symbol_named("iter") || head.is_symbol_named("map");
    let mut args = Vec::with_capacity(arg_forms.len());
    for (i, form) in arg_forms.iter().enumerate() {
        let keep_raw = passthrough && i + 2 < arg_forms.len() && matches!(form, Value::Symbol(_));
        if keep_raw {
            args.push(form.clone());
        } else {
            args.push(eval(form, env, rt)?);
        }
    }
    apply(&op, args, env, rt)
}

/// Apply a procedure-shaped value to already-evaluated arguments.
pub fn apply(op: &Value, args: Vec<Value>, env: &Env, rt: &Runtime) -> Result<Value> {
    match op {
        Value::Function(nf) => {
            let callable = nf
                .func()
                .downcast_ref::<Rc<PrimitiveFn>>()
                .ok_or_else(|| {
                    Error::eval(format!(
                        "primitive '{}' has a foreign implementation",
                        nf.name()
                    ))
                })?
                .clone();
            callable(rt, &args, env)
        }
        Value::List(l) if is_tagged_list(op, "procedure") => apply_compound(l, args, rt),
        Value::Map(m) => {
            if args.len() != 1 {
                return Err(Error::arity_named("map lookup", 1, args.len()));
            }
            Ok(m.try_get(&args[0]).unwrap_or_else(Value::nil))
        }
        Value::Vector(items) => {
            if args.len() != 1 {
                return Err(Error::arity_named("vector lookup", 1, args.len()));
            }
            let index = match args[0].as_number() {
                Some(n) if !n.is_float() => n.to_i64(),
                _ => {
                    return Err(Error::type_error_in(
                        "vector lookup",
                        "integer",
                        args[0].type_name(),
                    ));
                }
            };
            if index < 0 || index as usize >= items.len() {
                return Err(Error::IndexOutOfBounds {
                    index,
                    length: items.len(),
                });
            }
            Ok(items[index as usize].clone())
        }
        other => Err(Error::NotCallable(other.to_string())),
    }
}

// (procedure PARAMS (BODY…) ENV-MAP): bind parameters positionally over
// the captured environment and evaluate the body as a sequence. The zip
// stops at the shorter side; unbound parameters surface on use.
fn apply_compound(proc_list: &ListHandle, args: Vec<Value>, rt: &Runtime) -> Result<Value> {
    let params = proc_list
        .nth(1)
        .ok_or_else(|| Error::eval("malformed procedure: missing parameters"))?;
    let body = proc_list
        .nth(2)
        .ok_or_else(|| Error::eval("malformed procedure: missing body"))?;
    let captured = proc_list
        .nth(3)
        .ok_or_else(|| Error::eval("malformed procedure: missing environment"))?;
    let params = params
        .as_list()
        .ok_or_else(|| Error::type_error_in("procedure parameters", "list", params.type_name()))?
        .clone();
    let body = body
        .as_list()
        .ok_or_else(|| Error::type_error_in("procedure body", "list", body.type_name()))?
        .clone();
    let captured = captured
        .as_map()
        .ok_or_else(|| Error::type_error_in("procedure environment", "map", captured.type_name()))?
        .clone();

    let mut bound = captured;
    for (param, arg) in params.iter().zip(args.into_iter()) {
        bound = bound.insert(param, arg);
    }
    let call_env = Env::from_map(bound);
    eval_sequence(&body, &call_env, rt)
}
