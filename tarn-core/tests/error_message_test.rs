// tarn-core - Error message tests
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Failures surface as single human-readable strings; these tests pin the
//! wording users actually see.

mod common;

use common::eval_str;

fn error_of(src: &str) -> String {
    eval_str(src).expect_err(&format!("expected '{}' to fail", src))
}

#[test]
fn unresolved_symbol_names_the_symbol() {
    assert_eq!(error_of("frobnicate"), "Unable to resolve symbol: frobnicate");
}

#[test]
fn set_without_binding_names_the_symbol() {
    assert!(error_of("(set ghost 1)").contains("ghost"));
}

#[test]
fn type_errors_name_the_operation() {
    let msg = error_of("(+ 1 \"x\")");
    assert!(msg.contains('+'), "{}", msg);
    assert!(msg.contains("number"), "{}", msg);
    assert!(msg.contains("string"), "{}", msg);
}

#[test]
fn arity_errors_report_expected_and_got() {
    let msg = error_of("(cons 1)");
    assert!(msg.contains("cons"), "{}", msg);
    assert!(msg.contains("expected 2"), "{}", msg);
    assert!(msg.contains("got 1"), "{}", msg);
}

#[test]
fn division_by_zero_message() {
    assert_eq!(error_of("(/ 5 0)"), "Division by zero");
}

#[test]
fn vector_index_errors() {
    let msg = error_of("([1 2] 9)");
    assert!(msg.contains("Index 9"), "{}", msg);
    assert!(msg.contains("length 2"), "{}", msg);
    let msg = error_of("([1 2] \"x\")");
    assert!(msg.contains("integer"), "{}", msg);
}

#[test]
fn applying_a_non_callable_shows_the_value() {
    let msg = error_of("(42 1)");
    assert!(msg.contains("Cannot apply"), "{}", msg);
    assert!(msg.contains("42"), "{}", msg);
}

#[test]
fn parse_errors_carry_line_and_column() {
    let msg = eval_str("(def x\n  (+ 1").expect_err("unbalanced input");
    assert!(msg.starts_with("Parse error at "), "{}", msg);
}

#[test]
fn malformed_special_forms_name_the_form() {
    let msg = error_of("(def)");
    assert!(msg.contains("def"), "{}", msg);
    let msg = error_of("(cond (false 1) (true 2))");
    assert!(msg.contains("cond"), "{}", msg);
}

#[test]
fn io_errors_name_operation_and_path() {
    let msg = error_of("(import \"/definitely/not/here.tn\")");
    assert!(msg.contains("import"), "{}", msg);
    assert!(msg.contains("/definitely/not/here.tn"), "{}", msg);
}

#[test]
fn deep_recursion_is_reported_not_aborted() {
    // Keep the guard small enough that the error fires long before the
    // test thread's stack does.
    let previous = tarn_core::set_max_eval_depth(200);
    let msg = error_of(
        "(def spin nil) (set spin (fn (n) (spin (+ n 1)))) (spin 0)",
    );
    tarn_core::set_max_eval_depth(previous);
    assert!(msg.contains("recursion depth"), "{}", msg);
}
