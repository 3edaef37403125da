//! Runtime values.
//!
//! A single tagged enum with exhaustive dispatch everywhere; object
//! inheritance is data (`ObjectValue::Extended`), not a type hierarchy.
//! Values are immutable after construction and shared by reference; the
//! only interior mutability in the runtime lives in thunk cells and the
//! per-object caches.

use std::fmt;
use std::rc::Rc;

use jsonnet_ir::{ExprId, ParamRange, SharedArena};

use crate::builtins::Builtin;
use crate::environment::Environment;
use crate::object::ObjectValue;
use crate::thunk::Thunk;

/// Runtime value.
///
/// Numbers are finite IEEE-754 doubles: every producing operation rejects
/// NaN and ±∞ before a `Number` is constructed. Strings are Unicode
/// code-point sequences; length, indexing, and comparison all operate on
/// code points, never bytes.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// Elements stay lazy; forcing an array does not force its elements.
    Array(Rc<ArrayValue>),
    Function(Rc<FuncValue>),
    Object(ObjectValue),
}

/// Ordered sequence of element thunks.
pub struct ArrayValue {
    pub elements: Vec<Thunk>,
}

/// An invocable value: a user closure or a builtin dispatch tag.
pub enum FuncValue {
    User {
        /// Parameter spec (required + optional-with-default), resolved
        /// through `arena`.
        params: ParamRange,
        body: ExprId,
        /// Captured environment, including the object frame at the
        /// definition site.
        env: Environment,
        /// Arena the body and defaults live in.
        arena: SharedArena,
    },
    Builtin(Builtin),
}

impl FuncValue {
    /// Number of declared parameters (`std.length` on functions).
    pub fn param_count(&self) -> usize {
        match self {
            FuncValue::User { params, .. } => params.len(),
            FuncValue::Builtin(b) => b.params().len(),
        }
    }
}

impl Value {
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    #[inline]
    pub fn array(elements: Vec<Thunk>) -> Value {
        Value::Array(Rc::new(ArrayValue { elements }))
    }

    #[inline]
    pub fn builtin(b: Builtin) -> Value {
        Value::Function(Rc::new(FuncValue::Builtin(b)))
    }

    /// Typename used by error messages and `std.type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(a) => write!(f, "<array[{}]>", a.elements.len()),
            Value::Function(func) => write!(f, "<function/{}>", func.param_count()),
            Value::Object(_) => f.write_str("<object>"),
        }
    }
}
