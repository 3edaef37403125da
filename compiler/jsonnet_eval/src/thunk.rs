//! Thunk machinery: memoized lazy computation cells.
//!
//! A thunk transitions exactly once from a pending state to `Done` or
//! `Failed` and stays there; re-entry while `InProgress` is a cycle and
//! forces fail with `Infinite recursion`. Both outcomes are cached, so a
//! failed thunk returns the same error, with the trace captured at first
//! failure, on every later force.
//!
//! Forcing itself lives on the interpreter (it needs the trace stack); this
//! module only owns the state machine.

use std::cell::RefCell;
use std::rc::Rc;

use jsonnet_ir::{ExprId, LocationRange, SharedArena};

use crate::environment::Environment;
use crate::errors::EvalError;
use crate::value::{FuncValue, Value};

/// Trace attribution for a thunk: the source range of its body and a
/// human-readable context such as `thunk <x>` or `object <f>`.
pub struct ThunkOrigin {
    pub context: String,
    pub loc: LocationRange,
}

/// Cell contents.
pub enum ThunkState {
    /// Unevaluated expression plus its captured environment.
    Pending {
        env: Environment,
        arena: SharedArena,
        expr: ExprId,
    },
    /// Deferred positional call; used for `makeArray`/`map` elements and
    /// the `super.f + body` half of plus-super fields.
    Call {
        func: Rc<FuncValue>,
        args: Vec<Thunk>,
    },
    /// Evaluation has started and not finished: the cycle marker.
    InProgress,
    Done(Value),
    Failed(EvalError),
}

/// Snapshot of a cell used by the interpreter's fast path.
pub(crate) enum ThunkStatus {
    Pending,
    InProgress,
    Done(Value),
    Failed(EvalError),
}

/// Shared handle to a lazy computation cell.
#[derive(Clone)]
pub struct Thunk {
    cell: Rc<RefCell<ThunkState>>,
    origin: Rc<ThunkOrigin>,
}

impl Thunk {
    /// Lazy expression under a captured environment.
    pub fn pending(
        env: Environment,
        arena: SharedArena,
        expr: ExprId,
        context: impl Into<String>,
        loc: LocationRange,
    ) -> Thunk {
        Thunk {
            cell: Rc::new(RefCell::new(ThunkState::Pending { env, arena, expr })),
            origin: Rc::new(ThunkOrigin {
                context: context.into(),
                loc,
            }),
        }
    }

    /// Deferred positional call of `func` on `args`.
    pub fn deferred_call(
        func: Rc<FuncValue>,
        args: Vec<Thunk>,
        context: impl Into<String>,
        loc: LocationRange,
    ) -> Thunk {
        Thunk {
            cell: Rc::new(RefCell::new(ThunkState::Call { func, args })),
            origin: Rc::new(ThunkOrigin {
                context: context.into(),
                loc,
            }),
        }
    }

    /// Already-computed value; forcing short-circuits and pushes no frame.
    pub fn ready(value: Value) -> Thunk {
        Thunk {
            cell: Rc::new(RefCell::new(ThunkState::Done(value))),
            origin: Rc::new(ThunkOrigin {
                context: String::new(),
                loc: LocationRange::default(),
            }),
        }
    }

    pub(crate) fn origin(&self) -> &ThunkOrigin {
        &self.origin
    }

    /// Peek at the cell without changing it.
    pub(crate) fn status(&self) -> ThunkStatus {
        match &*self.cell.borrow() {
            ThunkState::Done(v) => ThunkStatus::Done(v.clone()),
            ThunkState::Failed(e) => ThunkStatus::Failed(e.clone()),
            ThunkState::InProgress => ThunkStatus::InProgress,
            ThunkState::Pending { .. } | ThunkState::Call { .. } => ThunkStatus::Pending,
        }
    }

    /// Take the pending state, leaving the cycle marker behind.
    pub(crate) fn begin(&self) -> ThunkState {
        self.cell.replace(ThunkState::InProgress)
    }

    /// Record the outcome; the cell never changes again afterwards.
    pub(crate) fn finish(&self, outcome: &Result<Value, EvalError>) {
        let state = match outcome {
            Ok(v) => ThunkState::Done(v.clone()),
            Err(e) => ThunkState::Failed(e.clone()),
        };
        *self.cell.borrow_mut() = state;
    }

    /// Whether the thunk has reached a final state (test hook).
    pub fn is_settled(&self) -> bool {
        matches!(
            &*self.cell.borrow(),
            ThunkState::Done(_) | ThunkState::Failed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_thunks_are_settled() {
        let t = Thunk::ready(Value::Number(1.0));
        assert!(t.is_settled());
        match t.status() {
            ThunkStatus::Done(Value::Number(n)) => assert_eq!(n, 1.0),
            _ => panic!("expected Done"),
        }
    }

    #[test]
    fn begin_leaves_cycle_marker() {
        let t = Thunk::ready(Value::Null);
        let _prev = t.begin();
        assert!(matches!(t.status(), ThunkStatus::InProgress));
    }

    #[test]
    fn finish_caches_errors() {
        let t = Thunk::ready(Value::Null);
        let _ = t.begin();
        t.finish(&Err(EvalError::new("boom")));
        match t.status() {
            ThunkStatus::Failed(e) => assert_eq!(e.message, "boom"),
            _ => panic!("expected Failed"),
        }
        assert!(t.is_settled());
    }
}
