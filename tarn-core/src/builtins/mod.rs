// tarn-core - Built-in procedures
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Built-in procedures for Tarn.
//!
//! Each primitive validates its arguments eagerly and reports failures
//! with a prefix naming the operation.

mod arithmetic;
mod collections;
mod comparison;
mod higher_order;
mod io;
mod predicates;
mod sequences;

use crate::runtime::Runtime;

/// Bind the default procedure table into the runtime's root environment.
pub fn register_builtins(rt: &Runtime) {
    // Arithmetic
    rt.add_primitive("+", arithmetic::op_add);
    rt.add_primitive("-", arithmetic::op_sub);
    rt.add_primitive("*", arithmetic::op_mul);
    rt.add_primitive("/", arithmetic::op_div);
    rt.add_primitive("range", arithmetic::op_range);

    // Comparison
    rt.add_primitive("=", comparison::op_equal);
    rt.add_primitive("!=", comparison::op_not_equal);
    rt.add_primitive("<", comparison::op_less);
    rt.add_primitive(">", comparison::op_greater);
    rt.add_primitive("<=", comparison::op_less_or_equal);
    rt.add_primitive(">=", comparison::op_greater_or_equal);

    // Sequence access
    rt.add_primitive("first", sequences::op_first);
    rt.add_primitive("ffirst", sequences::op_ffirst);
    rt.add_primitive("next", sequences::op_next);
    rt.add_primitive("fnext", sequences::op_fnext);
    rt.add_primitive("nnext", sequences::op_nnext);
    rt.add_primitive("nfirst", sequences::op_nfirst);
    rt.add_primitive("count", sequences::op_count);
    rt.add_primitive("cons", sequences::op_cons);
    rt.add_primitive("conj", sequences::op_conj);

    // Type predicates
    rt.add_primitive("integer?", predicates::op_is_integer);
    rt.add_primitive("float?", predicates::op_is_float);
    rt.add_primitive("string?", predicates::op_is_string);
    rt.add_primitive("boolean?", predicates::op_is_boolean);
    rt.add_primitive("symbol?", predicates::op_is_symbol);
    rt.add_primitive("map?", predicates::op_is_map);
    rt.add_primitive("vector?", predicates::op_is_vector);
    rt.add_primitive("list?", predicates::op_is_list);
    rt.add_primitive("fn?", predicates::op_is_fn);
    rt.add_primitive("object?", predicates::op_is_object);

    // Collections
    rt.add_primitive("make-map", collections::op_make_map);
    rt.add_primitive("make-vector", collections::op_make_vector);
    rt.add_primitive("insert", collections::op_insert);
    rt.add_primitive("remove", collections::op_remove);
    rt.add_primitive("keys", collections::op_keys);
    rt.add_primitive("vals", collections::op_vals);

    // Traversal
    rt.add_primitive("iter", higher_order::op_iter);
    rt.add_primitive("map", higher_order::op_map);

    // Printing
    rt.add_primitive("println", io::op_println);
    rt.add_primitive("printf", io::op_printf);
    rt.add_primitive("str", io::op_str);

    // Files
    rt.add_primitive("read", io::op_read);
    rt.add_primitive("write", io::op_write);
    rt.add_primitive("import", io::op_import);
}
