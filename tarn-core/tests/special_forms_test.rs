// tarn-core - Special form integration tests
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Integration tests for quote, def, set, if, fn, begin and cond.

mod common;

use common::{eval_str, eval_with};
use tarn_core::Runtime;
use tarn_parser::Value;

macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = eval_str($input);
        assert!(
            result.is_ok(),
            "Failed to evaluate '{}': {:?}",
            $input,
            result.err()
        );
        assert_eq!(
            result.unwrap(),
            $expected,
            "Evaluation of '{}' did not match expected",
            $input
        );
    };
}

macro_rules! assert_eval_err {
    ($input:expr) => {
        let result = eval_str($input);
        assert!(
            result.is_err(),
            "Expected error for '{}' but got {:?}",
            $input,
            result.ok()
        );
    };
}

// =============================================================================
// Self-evaluating values and symbols
// =============================================================================

#[test]
fn literals_evaluate_to_themselves() {
    assert_eval!("42", Value::int(42));
    assert_eval!("2.5", Value::float(2.5));
    assert_eval!("\"hi\"", Value::string("hi"));
    assert_eval!("true", Value::bool(true));
    assert_eval!("nil", Value::nil());
}

#[test]
fn unbound_symbol_is_an_error() {
    assert_eval_err!("no-such-thing");
}

// =============================================================================
// quote
// =============================================================================

#[test]
fn quote_returns_the_form_verbatim() {
    assert_eval!("'x", Value::symbol("x"));
    let result = eval_str("'(1 2)").unwrap();
    let items: Vec<Value> = result.as_list().expect("a list").iter().collect();
    assert_eq!(items, vec![Value::int(1), Value::int(2)]);
}

#[test]
fn quoted_forms_are_not_evaluated() {
    let result = eval_str("'(+ 1 2)").unwrap();
    let items: Vec<Value> = result.as_list().expect("a list").iter().collect();
    assert_eq!(items[0], Value::symbol("+"));
}

// =============================================================================
// def and set
// =============================================================================

#[test]
fn def_binds_and_returns_nil() {
    assert_eval!("(def x 5)", Value::nil());
    assert_eval!("(def x 5) x", Value::int(5));
    assert_eval!("(def x (+ 2 3)) x", Value::int(5));
}

#[test]
fn def_observes_previous_defs() {
    assert_eval!("(def x 2) (def y (* x 3)) y", Value::int(6));
}

#[test]
fn def_requires_a_symbol() {
    assert_eval_err!("(def 5 5)");
    assert_eval_err!("(def \"x\" 5)");
}

#[test]
fn set_replaces_an_existing_binding() {
    assert_eval!("(def x 1) (set x 2) x", Value::int(2));
}

#[test]
fn set_without_binding_is_an_error() {
    assert_eval_err!("(set x 2)");
}

// =============================================================================
// if
// =============================================================================

#[test]
fn if_selects_on_truthiness() {
    assert_eval!("(if true 1 2)", Value::int(1));
    assert_eval!("(if false 1 2)", Value::int(2));
    assert_eval!("(if nil 1 2)", Value::int(2));
    assert_eval!("(if 0 1 2)", Value::int(1));
    assert_eval!("(if \"\" 1 2)", Value::int(1));
}

#[test]
fn if_without_alternative_yields_nil() {
    assert_eval!("(if false 1)", Value::nil());
}

#[test]
fn if_evaluates_only_the_taken_branch() {
    // The untaken branch would fail on an unbound symbol.
    assert_eval!("(if true 1 kaboom)", Value::int(1));
    assert_eval!("(if false kaboom 2)", Value::int(2));
}

#[test]
fn if_needs_a_predicate_and_consequent() {
    assert_eval_err!("(if)");
    assert_eval_err!("(if true)");
}

// =============================================================================
// fn and application
// =============================================================================

#[test]
fn fn_applies_positionally() {
    assert_eval!("((fn (x y) (+ x y)) 3 4)", Value::int(7));
}

#[test]
fn fn_body_is_a_sequence() {
    assert_eval!("((fn (x) (def y 1) (+ x y)) 5)", Value::int(6));
}

#[test]
fn closures_capture_their_environment() {
    assert_eval!(
        "(def make-adder (fn (n) (fn (x) (+ x n)))) \
         (def add2 (make-adder 2)) \
         (add2 3)",
        Value::int(5)
    );
}

#[test]
fn closures_shadow_without_leaking() {
    assert_eval!("(def x 1) ((fn (x) x) 9)", Value::int(9));
    assert_eval!("(def x 1) ((fn (y) y) 9) x", Value::int(1));
}

#[test]
fn defn_defines_a_function() {
    assert_eval!("(defn square (x) (* x x)) (square 5)", Value::int(25));
}

#[test]
fn recursion_through_a_set_cell() {
    // A closure captures the environment map at creation time, so a
    // function cannot see its own def. Binding the name first and
    // rewriting the shared cell with set makes the closure reach itself.
    assert_eval!(
        "(def fact nil) \
         (set fact (fn (n) (if (< n 2) 1 (* n (fact (- n 1)))))) \
         (fact 6)",
        Value::int(720)
    );
}

#[test]
fn earlier_definitions_are_visible_to_later_functions() {
    assert_eval!(
        "(defn double (x) (* x 2)) (defn quad (x) (double (double x))) (quad 3)",
        Value::int(12)
    );
}

#[test]
fn applying_a_non_callable_is_an_error() {
    assert_eval_err!("(1 2 3)");
    assert_eval_err!("(\"f\" 1)");
}

// =============================================================================
// begin
// =============================================================================

#[test]
fn begin_returns_the_last_form() {
    assert_eval!("(begin 1 2 3)", Value::int(3));
}

#[test]
fn begin_evaluates_in_order() {
    assert_eval!("(begin (def x 1) (set x (+ x 1)) x)", Value::int(2));
}

#[test]
fn empty_begin_is_an_error() {
    assert_eval_err!("(begin)");
    // The whole program is wrapped in (begin …), so empty input errors too.
    assert_eval_err!("");
}

// =============================================================================
// cond
// =============================================================================

#[test]
fn cond_takes_the_first_true_clause() {
    assert_eval!("(cond (true 1) (else 2))", Value::int(1));
    assert_eval!("(cond (false 1) (else 2))", Value::int(2));
    assert_eval!(
        "(def x 7) (cond ((< x 5) \"small\") ((< x 10) \"mid\") (else \"big\"))",
        Value::string("mid")
    );
}

#[test]
fn cond_clause_bodies_are_sequences() {
    assert_eval!("(cond (true (def y 1) (+ y 1)) (else 0))", Value::int(2));
}

#[test]
fn cond_without_final_else_is_an_error() {
    assert_eval_err!("(cond (false 1) (true 2))");
}

#[test]
fn cond_with_else_not_last_is_an_error() {
    assert_eval_err!("(cond (else 1) (true 2))");
}

// =============================================================================
// Maps and vectors as callables
// =============================================================================

#[test]
fn map_applies_as_lookup() {
    assert_eval!("({\"a\" 1} \"a\")", Value::int(1));
    assert_eval!("({\"a\" 1} \"b\")", Value::nil());
}

#[test]
fn vector_applies_as_index() {
    assert_eval!("([10 20 30] 1)", Value::int(20));
    assert_eval_err!("([10 20] 5)");
    assert_eval_err!("([10 20] -1)");
    assert_eval_err!("([10 20] \"x\")");
    assert_eval_err!("([10 20] 1.0)");
}

// =============================================================================
// set reaches shared structure
// =============================================================================

#[test]
fn set_is_visible_through_captured_environments() {
    // The closure captured the environment before the set; the binding
    // cell is shared, so the rewrite is visible inside the closure.
    let rt = Runtime::new();
    eval_with(&rt, "(def x 1) (def get-x (fn () x))").unwrap();
    assert_eq!(eval_with(&rt, "(get-x)").unwrap(), Value::int(1));
    eval_with(&rt, "(set x 42)").unwrap();
    assert_eq!(eval_with(&rt, "(get-x)").unwrap(), Value::int(42));
}
