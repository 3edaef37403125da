//! Evaluation errors and their constructors.
//!
//! `EvalError` carries the message plus the call trace captured at the point
//! of failure; caching an error in a thunk therefore preserves the frames
//! that were live when the thunk first failed. Constructors are centralized
//! here and marked `#[cold]` so error paths stay out of the hot dispatch
//! code.

use std::fmt;

use crate::trace::TraceFrame;

/// Result of evaluation.
pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

/// Distinguishes user-visible runtime errors from invariant violations.
///
/// Internal errors are never expected for trees the static analyzer has
/// validated; they surface verbatim with an `INTERNAL ERROR` prefix.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Runtime,
    Internal,
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: ErrorKind,
    /// Error message, without the `RUNTIME ERROR:` prefix.
    pub message: String,
    /// Trace frames at the point of failure, oldest first.
    pub trace: Vec<TraceFrame>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            kind: ErrorKind::Runtime,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EvalError {
            kind: ErrorKind::Internal,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Attach a trace unless one was already captured.
    #[must_use]
    pub fn with_trace(mut self, frames: Vec<TraceFrame>) -> Self {
        if self.trace.is_empty() {
            self.trace = frames;
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ErrorKind::Runtime => "RUNTIME ERROR",
            ErrorKind::Internal => "INTERNAL ERROR",
        };
        write!(f, "{prefix}: {}", self.message)?;
        // Most recent frame last.
        for frame in &self.trace {
            write!(f, "\n\t{}", frame.loc)?;
            if !frame.context.is_empty() {
                write!(f, "\t{}", frame.context)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

// Numeric domain errors

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new("Division by zero.")
}

#[cold]
pub fn not_a_number() -> EvalError {
    EvalError::new("Not a number")
}

#[cold]
pub fn overflow() -> EvalError {
    EvalError::new("Overflow")
}

// Recursion and stack errors

#[cold]
pub fn infinite_recursion() -> EvalError {
    EvalError::new("Infinite recursion")
}

#[cold]
pub fn max_stack_exceeded() -> EvalError {
    EvalError::new("Max stack frames exceeded.")
}

// Type errors

/// Coercion failure: a value had the wrong runtime type.
#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::new(format!("Expected {expected}, got {got}"))
}

#[cold]
pub fn field_name_not_string(got: &str) -> EvalError {
    EvalError::new(format!("Field name must be string, got {got}"))
}

#[cold]
pub fn value_non_indexable(got: &str) -> EvalError {
    EvalError::new(format!("Value non indexable: {got}"))
}

#[cold]
pub fn binary_plus_unsupported(left: &str, right: &str) -> EvalError {
    EvalError::new(format!(
        "Binary operator + does not operate on {left} and {right}"
    ))
}

#[cold]
pub fn order_comparison_unsupported(got: &str) -> EvalError {
    EvalError::new(format!(
        "Order comparison operates on numbers and strings, got {got}"
    ))
}

#[cold]
pub fn length_unsupported(got: &str) -> EvalError {
    EvalError::new(format!(
        "length operates on strings, objects, arrays and functions, got {got}"
    ))
}

// Object errors

#[cold]
pub fn field_does_not_exist(name: &str) -> EvalError {
    EvalError::new(format!("Field does not exist: {name}"))
}

#[cold]
pub fn duplicate_field_name(name: &str) -> EvalError {
    EvalError::new(format!("Duplicate field name: {name:?}"))
}

// Call errors

#[cold]
pub fn too_many_args(params: usize) -> EvalError {
    EvalError::new(format!("Too many args, function has {params} parameter(s)"))
}

#[cold]
pub fn unknown_parameter(name: &str) -> EvalError {
    EvalError::new(format!("Function has no parameter {name}"))
}

#[cold]
pub fn duplicate_argument(name: &str) -> EvalError {
    EvalError::new(format!("Argument {name} already provided"))
}

#[cold]
pub fn missing_argument(name: &str) -> EvalError {
    EvalError::new(format!("Missing argument: {name}"))
}

// Equality errors

#[cold]
pub fn function_equality() -> EvalError {
    EvalError::new("Cannot test equality of functions")
}

#[cold]
pub fn primitive_equals_non_primitive(got: &str) -> EvalError {
    EvalError::new(format!(
        "primitiveEquals operates on primitive types, got {got}"
    ))
}

// Index errors

#[cold]
pub fn array_index_not_integer(got: f64) -> EvalError {
    EvalError::new(format!("Array index must be an integer, got {got}"))
}

#[cold]
pub fn array_index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(format!(
        "Array index {index} out of bounds, not within [0, {len})"
    ))
}

#[cold]
pub fn string_index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(format!(
        "String index {index} out of bounds, not within [0, {len})"
    ))
}

// Slice errors

#[cold]
pub fn slice_step_not_positive(step: f64) -> EvalError {
    EvalError::new(format!("Slice step must be greater than 0, got {step}"))
}

#[cold]
pub fn slice_bound_negative(bound: f64) -> EvalError {
    EvalError::new(format!("Slice component must be non-negative, got {bound}"))
}

#[cold]
pub fn slice_unsupported(got: &str) -> EvalError {
    EvalError::new(format!(
        "Slice target must be an array or a string, got {got}"
    ))
}

// Builtin errors

#[cold]
pub fn undefined_external_variable(name: &str) -> EvalError {
    EvalError::new(format!("Undefined external variable: {name}"))
}

#[cold]
pub fn invalid_codepoint(value: f64) -> EvalError {
    EvalError::new(format!("Invalid unicode codepoint, got {value}"))
}

#[cold]
pub fn negative_codepoint(value: f64) -> EvalError {
    EvalError::new(format!("Codepoints must be >= 0, got {value}"))
}

#[cold]
pub fn codepoint_wrong_length(len: usize) -> EvalError {
    EvalError::new(format!(
        "codepoint takes a string of length 1, got length {len}"
    ))
}

#[cold]
pub fn mod_unsupported(left: &str, right: &str) -> EvalError {
    EvalError::new(format!(
        "Operator % cannot be used on types {left} and {right}"
    ))
}

// Import errors

#[cold]
pub fn import_failed(path: &str, reason: &str) -> EvalError {
    EvalError::new(format!("Couldn't open import {path:?}: {reason}"))
}

// Manifestation errors

#[cold]
pub fn manifest_function() -> EvalError {
    EvalError::new("Couldn't manifest function")
}

// Internal errors

#[cold]
pub fn internal_error(message: impl Into<String>) -> EvalError {
    EvalError::internal(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonnet_ir::{Location, LocationRange};

    #[test]
    fn display_without_trace() {
        let err = EvalError::new("boom");
        assert_eq!(err.to_string(), "RUNTIME ERROR: boom");
    }

    #[test]
    fn display_with_trace_most_recent_last() {
        let err = EvalError::new("boom").with_trace(vec![
            TraceFrame {
                loc: LocationRange::new("a.jsonnet", Location::new(1, 1), Location::new(1, 4)),
                context: "thunk <x>".to_string(),
            },
            TraceFrame {
                loc: LocationRange::message("<builtin>"),
                context: "builtin function <operator+>".to_string(),
            },
        ]);
        let rendered = err.to_string();
        assert_eq!(
            rendered,
            "RUNTIME ERROR: boom\n\ta.jsonnet:1:1-4\tthunk <x>\n\t<builtin>\tbuiltin function <operator+>"
        );
    }

    #[test]
    fn with_trace_keeps_first_capture() {
        let first = vec![TraceFrame {
            loc: LocationRange::message("<first>"),
            context: String::new(),
        }];
        let err = EvalError::new("boom").with_trace(first.clone()).with_trace(vec![]);
        assert_eq!(err.trace, first);
        let err = err.with_trace(vec![TraceFrame {
            loc: LocationRange::message("<second>"),
            context: String::new(),
        }]);
        assert_eq!(err.trace, first);
    }

    #[test]
    fn internal_errors_render_with_their_own_prefix() {
        let err = internal_error("unexpected node kind");
        assert_eq!(err.to_string(), "INTERNAL ERROR: unexpected node kind");
    }
}
