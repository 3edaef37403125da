//! Jsonnet Eval - core evaluator for desugared Jsonnet programs.
//!
//! This crate turns a desugared tree (from `jsonnet_ir`) into a manifested
//! JSON string, enforcing call-by-need semantics throughout.
//!
//! # Architecture
//!
//! The evaluator uses:
//! - `Value`: a single tagged enum for every runtime value
//! - `Thunk`: memoized lazy cells with cycle detection and error caching
//! - `Environment`: immutable identifier→thunk frames plus the object frame
//! - `ObjectValue`: data-modeled inheritance (`Simple` / `Extended` pairs)
//! - `Interpreter`: exhaustive dispatch over the desugared node kinds
//! - `dispatch_builtin`: direct enum-based builtin dispatch
//! - `TraceStack`: call trace and the `max_stack` depth cap
//!
//! # Entry points
//!
//! [`evaluate`] covers the common case; [`InterpreterBuilder`] adds external
//! variables, an import resolver, the stack cap, and manifest formatting:
//!
//! ```text
//! let mut interp = InterpreterBuilder::new(interner.clone())
//!     .ext_var("env", "prod")
//!     .import_resolver(resolver)
//!     .build();
//! let json = interp.evaluate(&arena, root)?;
//! ```

mod builtins;
mod environment;
mod errors;
mod import;
mod interpreter;
mod manifest;
mod object;
mod operators;
mod stack;
mod thunk;
mod trace;
mod value;

#[cfg(test)]
mod tests;

pub use builtins::Builtin;
pub use environment::{BindingFrame, Environment, SelfBinding};
pub use errors::{ErrorKind, EvalError, EvalResult};
pub use import::{ImportResolver, ImportedProgram, NoImports};
pub use interpreter::{Interpreter, InterpreterBuilder, DEFAULT_MAX_STACK};
pub use object::{
    field_names, has_field, ObjectAssert, ObjectValue, SimpleField, SimpleObject, UnboundField,
};
pub use stack::ensure_sufficient_stack;
pub use thunk::{Thunk, ThunkState};
pub use trace::{TraceFrame, TraceStack};
pub use value::{ArrayValue, FuncValue, Value};

use jsonnet_ir::{ExprId, SharedArena, SharedInterner};

/// Evaluate a program with default settings: no external variables, no
/// imports, two-space manifest indent.
pub fn evaluate(
    interner: &SharedInterner,
    arena: &SharedArena,
    root: ExprId,
) -> Result<String, EvalError> {
    InterpreterBuilder::new(interner.clone())
        .build()
        .evaluate(arena, root)
}
