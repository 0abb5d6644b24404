// tarn-core - Error types for the Tarn evaluator
// Copyright (c) 2025 the tarn authors. MIT licensed.

//! Error types for Tarn evaluation.
//!
//! Evaluation errors propagate as values up to the public entry points,
//! which hand the embedder a single human-readable message per failure.
//! There are no stack traces and no partial-success composites.

use std::fmt;

use tarn_parser::ParseError;

/// Result type for Tarn evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or evaluating Tarn code.
#[derive(Debug, Clone)]
pub enum Error {
    /// Undefined symbol reference
    UndefinedSymbol(String),
    /// Wrong number of arguments to a procedure
    ArityError {
        expected: AritySpec,
        got: usize,
        name: Option<String>,
    },
    /// Wrong type for an operation
    TypeError {
        expected: &'static str,
        got: &'static str,
        context: Option<String>,
    },
    /// Attempted to apply something that is not callable
    NotCallable(String),
    /// Integer division by zero
    DivisionByZero,
    /// Index out of bounds
    IndexOutOfBounds { index: i64, length: usize },
    /// Malformed special form
    InvalidSyntax { form: &'static str, message: String },
    /// I/O failure, reported with the path involved
    IoError {
        operation: &'static str,
        path: Option<String>,
        message: String,
    },
    /// General evaluation error
    EvalError(String),
    /// Reader failure carried across the parse boundary
    ParseError(String),
}

/// Specification for expected arity.
#[derive(Debug, Clone)]
pub enum AritySpec {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl fmt::Display for AritySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AritySpec::Exact(n) => write!(f, "{}", n),
            AritySpec::AtLeast(n) => write!(f, "at least {}", n),
            AritySpec::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UndefinedSymbol(sym) => {
                write!(f, "Unable to resolve symbol: {}", sym)
            }
            Error::ArityError {
                expected,
                got,
                name,
            } => {
                if let Some(name) = name {
                    write!(
                        f,
                        "Wrong number of arguments to '{}': expected {}, got {}",
                        name, expected, got
                    )
                } else {
                    write!(
                        f,
                        "Wrong number of arguments: expected {}, got {}",
                        expected, got
                    )
                }
            }
            Error::TypeError {
                expected,
                got,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(f, "{}: expected {}, got {}", ctx, expected, got)
                } else {
                    write!(f, "Type error: expected {}, got {}", expected, got)
                }
            }
            Error::NotCallable(val) => {
                write!(f, "Cannot apply value: {}", val)
            }
            Error::DivisionByZero => {
                write!(f, "Division by zero")
            }
            Error::IndexOutOfBounds { index, length } => {
                write!(
                    f,
                    "Index {} out of bounds for collection of length {}",
                    index, length
                )
            }
            Error::InvalidSyntax { form, message } => {
                write!(f, "Invalid '{}' form: {}", form, message)
            }
            Error::IoError {
                operation,
                path,
                message,
            } => {
                if let Some(path) = path {
                    write!(f, "{} '{}': {}", operation, path, message)
                } else {
                    write!(f, "{}: {}", operation, message)
                }
            }
            Error::EvalError(msg) => write!(f, "{}", msg),
            Error::ParseError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl Error {
    /// Create an arity error for exact arity with the operation name.
    pub fn arity_named(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Exact(expected),
            got,
            name: Some(name.into()),
        }
    }

    /// Create an arity error for minimum arity with the operation name.
    pub fn arity_at_least(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::AtLeast(expected),
            got,
            name: Some(name.into()),
        }
    }

    /// Create an arity error for a range of arities.
    pub fn arity_range(name: impl Into<String>, min: usize, max: usize, got: usize) -> Self {
        Error::ArityError {
            expected: AritySpec::Range(min, max),
            got,
            name: Some(name.into()),
        }
    }

    /// Create a type error.
    pub fn type_error(expected: &'static str, got: &'static str) -> Self {
        Error::TypeError {
            expected,
            got,
            context: None,
        }
    }

    /// Create a type error with the operation name as context.
    pub fn type_error_in(
        context: impl Into<String>,
        expected: &'static str,
        got: &'static str,
    ) -> Self {
        Error::TypeError {
            expected,
            got,
            context: Some(context.into()),
        }
    }

    /// Create an undefined-symbol error.
    pub fn undefined(name: impl Into<String>) -> Self {
        Error::UndefinedSymbol(name.into())
    }

    /// Create an invalid special form error.
    pub fn syntax(form: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidSyntax {
            form,
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    pub fn io(operation: &'static str, path: Option<String>, error: std::io::Error) -> Self {
        Error::IoError {
            operation,
            path,
            message: error.to_string(),
        }
    }

    /// Create a general evaluation error.
    pub fn eval(message: impl Into<String>) -> Self {
        Error::EvalError(message.into())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_error_names_the_operation() {
        let err = Error::arity_named("cons", 2, 3);
        assert_eq!(
            err.to_string(),
            "Wrong number of arguments to 'cons': expected 2, got 3"
        );
    }

    #[test]
    fn type_error_carries_context() {
        let err = Error::type_error_in("+", "number", "string");
        assert_eq!(err.to_string(), "+: expected number, got string");
        let bare = Error::type_error("number", "string");
        assert_eq!(bare.to_string(), "Type error: expected number, got string");
    }

    #[test]
    fn io_error_reports_the_path() {
        let err = Error::IoError {
            operation: "read",
            path: Some("missing.tarn".to_string()),
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "read 'missing.tarn': not found");
    }
}
