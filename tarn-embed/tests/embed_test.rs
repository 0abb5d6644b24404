// tarn-embed - Embedding API tests
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Tests for the high-level Engine interface.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tarn_embed::{Engine, Value};

#[derive(Clone, Default)]
struct SharedBuffer {
    inner: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn eval_returns_the_last_form() {
    let engine = Engine::new();
    assert_eq!(engine.eval("(def x 42) (* x 2)").unwrap(), Value::int(84));
}

#[test]
fn state_persists_between_evals() {
    let engine = Engine::new();
    engine.eval("(def greeting \"hello\")").unwrap();
    assert_eq!(
        engine.eval("(str greeting \" world\")").unwrap(),
        Value::string("hello world")
    );
}

#[test]
fn get_and_get_as() {
    let engine = Engine::new();
    engine.eval("(def answer 42) (def ratio 1.5)").unwrap();
    assert_eq!(engine.get("answer"), Some(Value::int(42)));
    assert_eq!(engine.get_as::<i64>("answer"), Some(42));
    assert_eq!(engine.get_as::<f64>("ratio"), Some(1.5));
    assert_eq!(engine.get_as::<i64>("missing"), None);
    // Bound but wrong type: get_as hides it, try_get_as reports it.
    assert_eq!(engine.get_as::<bool>("answer"), None);
    assert!(engine.try_get_as::<bool>("answer").is_err());
    assert_eq!(engine.try_get_as::<bool>("missing").unwrap(), None);
}

#[test]
fn get_walks_paths() {
    let engine = Engine::new();
    engine
        .eval("(def conf (insert (make-map) \"retries\" 3))")
        .unwrap();
    assert_eq!(engine.get_as::<i64>("conf/retries"), Some(3));
}

#[test]
fn set_binds_rust_values() {
    let engine = Engine::new();
    engine.set("limit", 10i64);
    engine.set("label", "items");
    engine.set("batch", vec![1i64, 2, 3]);
    assert_eq!(engine.eval("(* limit 2)").unwrap(), Value::int(20));
    assert_eq!(
        engine.eval("(str label \"!\")").unwrap(),
        Value::string("items!")
    );
    assert_eq!(engine.eval("(count batch)").unwrap(), Value::int(3));
}

#[test]
fn call_invokes_script_functions() {
    let engine = Engine::new();
    engine.eval("(defn add3 (a b c) (+ a b c))").unwrap();
    let result = engine
        .call("add3", &[Value::int(1), Value::int(2), Value::int(3)])
        .unwrap();
    assert_eq!(result, Value::int(6));
    assert!(engine.call("no-such-fn", &[]).is_err());
}

#[test]
fn registered_natives_participate_fully() {
    let engine = Engine::new();
    engine.register_native("clamp", |_rt, args, _env| {
        let n: i64 = tarn_embed::FromValue::from_value(&args[0])?;
        Ok(Value::int(n.clamp(0, 100)))
    });
    assert_eq!(engine.eval("(clamp 250)").unwrap(), Value::int(100));
    assert_eq!(
        engine.eval("(map '(-5 50 500) (fn (x) (clamp x)))").unwrap(),
        engine.eval("'(0 50 100)").unwrap()
    );
}

#[test]
fn output_redirection() {
    let engine = Engine::new();
    let buffer = SharedBuffer::default();
    engine.set_output(Box::new(buffer.clone()));
    engine.eval("(println \"captured\")").unwrap();
    assert_eq!(buffer.contents(), "captured\n");
}

#[test]
fn args_are_visible_to_scripts() {
    let engine = Engine::new();
    engine.set_args(&["tool".to_string(), r"in\put.txt".to_string()]);
    // sys/args is a map from argument index to token.
    assert_eq!(
        engine.eval("(sys/args 1)").unwrap(),
        Value::string("in/put.txt")
    );
    assert_eq!(engine.eval("(count sys/args)").unwrap(), Value::int(2));
}

#[test]
fn gc_keeps_engine_state_intact() {
    let engine = Engine::new();
    engine.eval("(def data (range 0 1 100))").unwrap();
    engine.gc();
    engine.gc();
    assert_eq!(engine.eval("(count data)").unwrap(), Value::int(100));
    assert!(engine.reserved_bytes() >= engine.live_bytes());
}

#[test]
fn errors_are_values_not_panics() {
    let engine = Engine::new();
    assert!(engine.eval("(boom)").is_err());
    assert!(engine.eval("(+ 1").is_err());
    assert!(engine.eval("").is_err());
}
