//! Host-stack safety for deep recursion.
//!
//! The evaluator is a recursive tree walk, so deeply nested programs nest
//! native stack frames. `stacker` grows the stack on demand; the logical
//! depth cap lives in [`TraceStack`](crate::trace::TraceStack), which fails
//! with `Max stack frames exceeded.` long before memory runs out.

/// Minimum stack space to keep available (128KB red zone).
const RED_ZONE: usize = 128 * 1024;

/// Stack space to allocate when growing (2MB).
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Ensure sufficient host stack space is available before executing `f`.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
