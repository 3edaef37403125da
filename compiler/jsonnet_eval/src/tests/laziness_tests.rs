//! Call-by-need guarantees: laziness, memoization, cycle detection,
//! error caching.

use std::cell::Cell;
use std::rc::Rc;

use jsonnet_ir::{BinaryOp, Hide};

use crate::import::{ImportResolver, ImportedProgram};
use crate::thunk::ThunkStatus;
use crate::{InterpreterBuilder, Value};

use super::helpers::{eval_compact, TestBuilder};

/// Resolver that counts how many times each entry point is hit.
struct CountingResolver {
    program: ImportedProgram,
    ast_calls: Rc<Cell<usize>>,
    str_calls: Rc<Cell<usize>>,
}

impl ImportResolver for CountingResolver {
    fn import_ast(&self, _here: Option<&str>, _path: &str) -> Result<ImportedProgram, String> {
        self.ast_calls.set(self.ast_calls.get() + 1);
        Ok(self.program.clone())
    }

    fn import_str(&self, _here: Option<&str>, _path: &str) -> Result<String, String> {
        self.str_calls.set(self.str_calls.get() + 1);
        Ok("hello".to_string())
    }
}

#[test]
fn unreferenced_array_elements_never_evaluate() {
    // [error "fail", 42][1]
    let mut b = TestBuilder::new();
    let bad = b.error_msg("fail");
    let good = b.num(42.0);
    let arr = b.array(&[bad, good]);
    let one = b.num(1.0);
    let root = b.index(arr, one);
    assert_eq!(eval_compact(b, root).unwrap(), "42");
}

#[test]
fn unreferenced_fields_never_evaluate() {
    // { ok: 1, bad:: error "boom" } manifests without touching bad.
    let mut b = TestBuilder::new();
    let one = b.num(1.0);
    let bad = b.error_msg("boom");
    let root = b.object(&[("ok", Hide::Inherit, false, one), ("bad", Hide::Hidden, false, bad)]);
    assert_eq!(eval_compact(b, root).unwrap(), "{\"ok\": 1}");
}

#[test]
fn unused_local_binds_never_evaluate() {
    // local unused = error "no"; 7
    let mut b = TestBuilder::new();
    let bad = b.error_msg("no");
    let seven = b.num(7.0);
    let root = b.local(&[("unused", bad)], seven);
    assert_eq!(eval_compact(b, root).unwrap(), "7");
}

#[test]
fn unused_function_arguments_never_evaluate() {
    // local f(a, b) = a; f(1, error "unused")
    let mut b = TestBuilder::new();
    let a_ref = b.var("a");
    let f = b.function(&[("a", None), ("b", None)], a_ref);
    let fref = b.var("f");
    let one = b.num(1.0);
    let bad = b.error_msg("unused");
    let call = b.call(fref, &[one, bad]);
    let root = b.local(&[("f", f)], call);
    assert_eq!(eval_compact(b, root).unwrap(), "1");
}

#[test]
fn and_short_circuits() {
    // false && error "right"
    let mut b = TestBuilder::new();
    let f = b.boolean(false);
    let bad = b.error_msg("right");
    let root = b.binary(BinaryOp::And, f, bad);
    assert_eq!(eval_compact(b, root).unwrap(), "false");
}

#[test]
fn or_short_circuits() {
    let mut b = TestBuilder::new();
    let t = b.boolean(true);
    let bad = b.error_msg("right");
    let root = b.binary(BinaryOp::Or, t, bad);
    assert_eq!(eval_compact(b, root).unwrap(), "true");
}

#[test]
fn thunks_evaluate_at_most_once() {
    // local x = import "seven"; x + x resolves the import a single time:
    // the second force of x returns the memoized value.
    let mut b = TestBuilder::new();
    let imported_root;
    let imported = {
        let mut ib = TestBuilder::with_interner(b.interner.clone());
        imported_root = ib.num(7.0);
        let (_, arena) = ib.finish(imported_root);
        ImportedProgram {
            arena,
            root: imported_root,
        }
    };
    let ast_calls = Rc::new(Cell::new(0));
    let str_calls = Rc::new(Cell::new(0));
    let resolver = CountingResolver {
        program: imported,
        ast_calls: ast_calls.clone(),
        str_calls: str_calls.clone(),
    };

    let imp = b.import("seven");
    let x1 = b.var("x");
    let x2 = b.var("x");
    let sum = b.binary(BinaryOp::Plus, x1, x2);
    let root = b.local(&[("x", imp)], sum);
    let (interner, arena) = b.finish(root);

    let mut interp = InterpreterBuilder::new(interner)
        .import_resolver(resolver)
        .manifest_indent("")
        .build();
    assert_eq!(interp.evaluate(&arena, root).unwrap(), "14");
    assert_eq!(ast_calls.get(), 1);
    assert_eq!(str_calls.get(), 0);
}

#[test]
fn importstr_is_cached_per_run() {
    // (importstr "s") + (importstr "s") hits the resolver once.
    let mut b = TestBuilder::new();
    let lhs = b.importstr("s");
    let rhs = b.importstr("s");
    let root = b.binary(BinaryOp::Plus, lhs, rhs);
    let (interner, arena) = b.finish(root);

    let str_calls = Rc::new(Cell::new(0));
    let dummy_program = {
        let mut ib = TestBuilder::with_interner(interner.clone());
        let r = ib.null();
        let (_, a) = ib.finish(r);
        ImportedProgram { arena: a, root: r }
    };
    let resolver = CountingResolver {
        program: dummy_program,
        ast_calls: Rc::new(Cell::new(0)),
        str_calls: str_calls.clone(),
    };
    let mut interp = InterpreterBuilder::new(interner)
        .import_resolver(resolver)
        .manifest_indent("")
        .build();
    assert_eq!(interp.evaluate(&arena, root).unwrap(), "\"hellohello\"");
    assert_eq!(str_calls.get(), 1);
}

#[test]
fn cycle_detection_reports_infinite_recursion() {
    // local x = x; x
    let mut b = TestBuilder::new();
    let x_ref = b.var("x");
    let x_use = b.var("x");
    let root = b.local(&[("x", x_ref)], x_use);
    let err = eval_compact(b, root).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("RUNTIME ERROR: Infinite recursion"));
}

#[test]
fn mutual_cycle_is_detected() {
    // local a = b, b = a; a
    let mut b = TestBuilder::new();
    let b_ref = b.var("b");
    let a_ref = b.var("a");
    let a_use = b.var("a");
    let root = b.local(&[("a", b_ref), ("b", a_ref)], a_use);
    let err = eval_compact(b, root).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("RUNTIME ERROR: Infinite recursion"));
}

#[test]
fn failed_thunks_cache_their_error_and_trace() {
    // local x = error "boom"; [x, x]: both elements surface the same
    // cached error, with the trace captured on first failure.
    let mut b = TestBuilder::new();
    let bad = b.error_msg("boom");
    let x1 = b.var("x");
    let x2 = b.var("x");
    let arr = b.array(&[x1, x2]);
    let root = b.local(&[("x", bad)], arr);
    let (interner, arena) = b.finish(root);

    let mut interp = InterpreterBuilder::new(interner).build();
    let value = interp.evaluate_value(&arena, root).unwrap();
    let elements = match &value {
        Value::Array(a) => a.elements.clone(),
        other => panic!("expected array, got {}", other.type_name()),
    };
    let first = interp.force(&elements[0]).unwrap_err();
    let second = interp.force(&elements[1]).unwrap_err();
    assert_eq!(first.to_string(), second.to_string());
    // The cached trace names the first force's frame even on the second
    // force.
    assert!(second.to_string().contains("array element 0"));
}

#[test]
fn forcing_settles_a_thunk_exactly_once() {
    let mut b = TestBuilder::new();
    let one = b.num(1.0);
    let two = b.num(2.0);
    let sum = b.binary(BinaryOp::Plus, one, two);
    let arr = b.array(&[sum]);
    let (interner, arena) = b.finish(arr);

    let mut interp = InterpreterBuilder::new(interner).build();
    let value = interp.evaluate_value(&arena, arr).unwrap();
    let elem = match &value {
        Value::Array(a) => a.elements[0].clone(),
        other => panic!("expected array, got {}", other.type_name()),
    };
    assert!(!elem.is_settled());
    let forced = interp.force(&elem).unwrap();
    assert!(matches!(forced, Value::Number(n) if n == 3.0));
    assert!(elem.is_settled());
    // Status is final; a second force returns the memoized value.
    assert!(matches!(elem.status(), ThunkStatus::Done(Value::Number(n)) if n == 3.0));
    let again = interp.force(&elem).unwrap();
    assert!(matches!(again, Value::Number(n) if n == 3.0));
}
