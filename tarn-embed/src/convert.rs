// tarn-embed - Value conversions
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Conversions between Rust values and Tarn values.

use tarn_core::{Error, Result};
use tarn_parser::{Heap, Number, Value};

/// Convert a Tarn value into a Rust value.
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Result<Self>;
}

/// Convert a Rust value into a Tarn value. The heap is available for
/// conversions that allocate compound values.
pub trait IntoValue {
    fn into_value(self, heap: &Heap) -> Value;
}

impl FromValue for i64 {
    fn from_value(v: &Value) -> Result<i64> {
        match v {
            Value::Number(Number::Int(i)) => Ok(*i),
            other => Err(Error::type_error("integer", other.type_name())),
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: &Value) -> Result<f64> {
        match v {
            Value::Number(n) => Ok(n.to_f64()),
            other => Err(Error::type_error("number", other.type_name())),
        }
    }
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Result<bool> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(Error::type_error("boolean", other.type_name())),
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Result<String> {
        match v {
            Value::String(s) => Ok(s.to_string()),
            Value::Symbol(s) => Ok(s.to_string()),
            other => Err(Error::type_error("string", other.type_name())),
        }
    }
}

impl FromValue for Value {
    fn from_value(v: &Value) -> Result<Value> {
        Ok(v.clone())
    }
}

/// Lists and vectors both convert to a `Vec`.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(v: &Value) -> Result<Vec<T>> {
        match v {
            Value::List(l) => l.iter().map(|item| T::from_value(&item)).collect(),
            Value::Vector(items) => items.iter().map(T::from_value).collect(),
            other => Err(Error::type_error("list or vector", other.type_name())),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self, _heap: &Heap) -> Value {
        Value::int(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self, _heap: &Heap) -> Value {
        Value::float(self)
    }
}

impl IntoValue for bool {
    fn into_value(self, _heap: &Heap) -> Value {
        Value::bool(self)
    }
}

impl IntoValue for &str {
    fn into_value(self, _heap: &Heap) -> Value {
        Value::string(self)
    }
}

impl IntoValue for String {
    fn into_value(self, _heap: &Heap) -> Value {
        Value::string(self)
    }
}

impl IntoValue for Value {
    fn into_value(self, _heap: &Heap) -> Value {
        self
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self, heap: &Heap) -> Value {
        let items: Vec<Value> = self.into_iter().map(|v| v.into_value(heap)).collect();
        Value::list(heap.list_from_iter(items))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip() {
        let heap = Heap::new();
        assert_eq!(i64::from_value(&42i64.into_value(&heap)).unwrap(), 42);
        assert_eq!(f64::from_value(&1.5f64.into_value(&heap)).unwrap(), 1.5);
        assert!(bool::from_value(&true.into_value(&heap)).unwrap());
        assert_eq!(
            String::from_value(&"hi".into_value(&heap)).unwrap(),
            "hi".to_string()
        );
    }

    #[test]
    fn conversion_failures_are_type_errors() {
        assert!(i64::from_value(&Value::string("no")).is_err());
        assert!(bool::from_value(&Value::int(1)).is_err());
    }

    #[test]
    fn vecs_convert_both_ways() {
        let heap = Heap::new();
        let v = vec![1i64, 2, 3].into_value(&heap);
        assert_eq!(Vec::<i64>::from_value(&v).unwrap(), vec![1, 2, 3]);
        let vector = Value::vector_from_iter(vec![Value::int(4), Value::int(5)]);
        assert_eq!(Vec::<i64>::from_value(&vector).unwrap(), vec![4, 5]);
    }

    #[test]
    fn ints_do_not_silently_truncate() {
        assert!(i64::from_value(&Value::float(1.5)).is_err());
        // But f64 accepts integers.
        assert_eq!(f64::from_value(&Value::int(2)).unwrap(), 2.0);
    }
}
