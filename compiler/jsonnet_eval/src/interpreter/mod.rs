//! Tree-walking evaluator for desugared Jsonnet.
//!
//! # Architecture
//!
//! The interpreter owns the pieces that are global to one evaluation run:
//! the trace stack (with its `max_stack` cap), the root environment holding
//! `std`, the external-variable table, and the import machinery. Everything
//! else is threaded through arguments: the current arena, the current
//! expression, the current environment.
//!
//! All laziness funnels through [`Interpreter::force`]: it drives the thunk
//! state machine, pushes the thunk's trace frame, memoizes the outcome, and
//! turns re-entry into `Infinite recursion`. Evaluation itself
//! (`eval_node`) is a straightforward exhaustive match over the desugared
//! node kinds.
//!
//! Call logic (argument binding, arity validation, builtin invocation)
//! lives in the sibling `call` module.

mod call;

use rustc_hash::FxHashMap;

use jsonnet_ir::{
    ExprId, ExprKind, LocationRange, Name, SharedArena, SharedInterner,
};

use crate::builtins::{dispatch_builtin, make_std_object, Builtin};
use crate::environment::{BindingFrame, Environment, SelfBinding};
use crate::errors::{
    array_index_not_integer, array_index_out_of_bounds, duplicate_field_name, field_does_not_exist,
    field_name_not_string, import_failed, infinite_recursion, internal_error,
    slice_bound_negative, slice_step_not_positive, slice_unsupported, string_index_out_of_bounds,
    type_mismatch, value_non_indexable, EvalError, EvalResult,
};
use crate::import::{ImportResolver, NoImports};
use crate::object::{
    find_field, try_object_index, AssertState, ObjectAssert, ObjectValue, SimpleField,
    SimpleObject, UnboundField,
};
use crate::operators::{binary_slot, unary_builtin, OpSlot};
use crate::stack::ensure_sufficient_stack;
use crate::thunk::{Thunk, ThunkState, ThunkStatus};
use crate::trace::{TraceFrame, TraceStack};
use crate::value::{ArrayValue, FuncValue, Value};

use std::rc::Rc;

/// Default `max_stack`: the evaluation-depth cap enforced by the trace
/// stack, independent of host stack growth.
pub const DEFAULT_MAX_STACK: usize = 500;

/// Builder for [`Interpreter`] instances.
pub struct InterpreterBuilder {
    interner: SharedInterner,
    resolver: Option<Box<dyn ImportResolver>>,
    ext_vars: Vec<(String, String)>,
    max_stack: usize,
    indent: String,
}

impl InterpreterBuilder {
    pub fn new(interner: SharedInterner) -> Self {
        InterpreterBuilder {
            interner,
            resolver: None,
            ext_vars: Vec::new(),
            max_stack: DEFAULT_MAX_STACK,
            indent: "  ".to_string(),
        }
    }

    /// Set the import resolver; the default rejects all imports.
    #[must_use]
    pub fn import_resolver(mut self, resolver: impl ImportResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Add an external variable visible through `std.extVar`.
    #[must_use]
    pub fn ext_var(mut self, name: &str, value: &str) -> Self {
        self.ext_vars.push((name.to_string(), value.to_string()));
        self
    }

    /// Cap on evaluation depth; exceeding it fails with
    /// `Max stack frames exceeded.`
    #[must_use]
    pub fn max_stack(mut self, max_stack: usize) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Indent string for multi-line manifestation; empty means compact
    /// single-line output.
    #[must_use]
    pub fn manifest_indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    pub fn build(self) -> Interpreter {
        let std_obj = make_std_object(&self.interner);
        let mut frame = BindingFrame::default();
        frame.insert(
            self.interner.intern("std"),
            Thunk::ready(Value::Object(std_obj)),
        );
        let root_env = Environment::root(frame);

        let mut ext_vars = FxHashMap::default();
        for (name, value) in self.ext_vars {
            ext_vars.insert(
                self.interner.intern(&name),
                Thunk::ready(Value::string(value)),
            );
        }

        Interpreter {
            interner: self.interner,
            trace: TraceStack::new(self.max_stack),
            root_env,
            ext_vars,
            resolver: self.resolver.unwrap_or_else(|| Box::new(NoImports)),
            import_cache: FxHashMap::default(),
            indent: self.indent,
        }
    }
}

/// The evaluator: turns a desugared tree into a manifested JSON string.
pub struct Interpreter {
    pub(crate) interner: SharedInterner,
    pub(crate) trace: TraceStack,
    /// Environment every program and import starts from; binds only `std`.
    pub(crate) root_env: Environment,
    pub(crate) ext_vars: FxHashMap<Name, Thunk>,
    pub(crate) resolver: Box<dyn ImportResolver>,
    /// Per-run cache keyed by (importing file, kind-tagged path).
    pub(crate) import_cache: FxHashMap<(String, String), Thunk>,
    pub(crate) indent: String,
}

impl Interpreter {
    /// Evaluate a program and manifest the result as JSON.
    pub fn evaluate(&mut self, arena: &SharedArena, root: ExprId) -> Result<String, EvalError> {
        tracing::debug!(exprs = arena.len(), "starting evaluation");
        let top = Thunk::pending(
            self.root_env.clone(),
            arena.clone(),
            root,
            "top-level",
            arena.loc(root).clone(),
        );
        let value = self.force(&top)?;
        let multiline = !self.indent.is_empty();
        let out = self.in_frame(
            LocationRange::message("During manifestation"),
            String::new(),
            |i| i.manifest_json(&value, multiline),
        )?;
        tracing::debug!(bytes = out.len(), "evaluation finished");
        Ok(out)
    }

    /// Evaluate a program to a runtime value without manifesting it.
    pub fn evaluate_value(&mut self, arena: &SharedArena, root: ExprId) -> EvalResult {
        let top = Thunk::pending(
            self.root_env.clone(),
            arena.clone(),
            root,
            "top-level",
            arena.loc(root).clone(),
        );
        self.force(&top)
    }

    // Thunk forcing

    /// Force a thunk: memoized, cycle-detecting, error-caching.
    pub(crate) fn force(&mut self, thunk: &Thunk) -> EvalResult {
        match thunk.status() {
            ThunkStatus::Done(v) => return Ok(v),
            ThunkStatus::Failed(e) => return Err(e),
            ThunkStatus::InProgress => return self.fail(infinite_recursion()),
            ThunkStatus::Pending => {}
        }
        let prev = thunk.begin();
        let loc = thunk.origin().loc.clone();
        let context = thunk.origin().context.clone();
        let result = match prev {
            ThunkState::Pending { env, arena, expr } => {
                self.in_frame(loc, context, |i| i.eval_in(&arena, expr, &env))
            }
            ThunkState::Call { func, args } => {
                self.in_frame(loc, context, |i| i.call_with_thunks(&func, args))
            }
            // begin() is only reached from the Pending fast path; anything
            // else means the cell was corrupted.
            ThunkState::Done(v) => {
                thunk.finish(&Ok(v.clone()));
                return Ok(v);
            }
            ThunkState::Failed(e) => {
                thunk.finish(&Err(e.clone()));
                return Err(e);
            }
            ThunkState::InProgress => return self.fail(infinite_recursion()),
        };
        thunk.finish(&result);
        result
    }

    /// Run `f` with a trace frame pushed; enforces the `max_stack` cap.
    pub(crate) fn in_frame<T>(
        &mut self,
        loc: LocationRange,
        context: String,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        self.trace.push(TraceFrame { loc, context })?;
        let result = f(self);
        self.trace.pop();
        result
    }

    // Error plumbing

    /// Attach the current trace to an error that has none.
    ///
    /// Errors propagated from a cached thunk already carry the trace from
    /// their first failure and pass through untouched.
    pub(crate) fn traced(&self, err: EvalError) -> EvalError {
        err.with_trace(self.trace.capture())
    }

    pub(crate) fn fail<T>(&self, err: EvalError) -> EvalResult<T> {
        Err(self.traced(err))
    }

    // Evaluation

    /// Evaluate an expression, growing the host stack when needed.
    pub(crate) fn eval_in(
        &mut self,
        arena: &SharedArena,
        id: ExprId,
        env: &Environment,
    ) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_node(arena, id, env))
    }

    fn eval_node(&mut self, arena: &SharedArena, id: ExprId, env: &Environment) -> EvalResult {
        let kind = arena.expr(id).kind;
        match kind {
            ExprKind::LiteralNull => Ok(Value::Null),
            ExprKind::LiteralBoolean(b) => Ok(Value::Bool(b)),
            ExprKind::LiteralNumber(n) => Ok(Value::Number(n)),
            ExprKind::LiteralString(s) => Ok(Value::string(self.interner.lookup(s))),

            ExprKind::Var(name) => match env.lookup(name) {
                Some(thunk) => self.force(&thunk),
                None => self.fail(internal_error(format!(
                    "unbound variable: {}",
                    self.interner.lookup(name)
                ))),
            },

            ExprKind::SelfExpr => match env.self_binding() {
                Some(sb) => Ok(Value::Object(sb.object)),
                None => self.fail(internal_error("self used outside of an object")),
            },

            ExprKind::Array(range) => {
                let elements = arena
                    .list(range)
                    .iter()
                    .enumerate()
                    .map(|(idx, &elem)| {
                        Thunk::pending(
                            env.clone(),
                            arena.clone(),
                            elem,
                            format!("array element {idx}"),
                            arena.loc(elem).clone(),
                        )
                    })
                    .collect();
                Ok(Value::array(elements))
            }

            ExprKind::Binary { op, left, right } => match binary_slot(op) {
                OpSlot::Builtin(b) => {
                    let lt = Thunk::pending(
                        env.clone(),
                        arena.clone(),
                        left,
                        format!("operand of operator{op}"),
                        arena.loc(left).clone(),
                    );
                    let rt = Thunk::pending(
                        env.clone(),
                        arena.clone(),
                        right,
                        format!("operand of operator{op}"),
                        arena.loc(right).clone(),
                    );
                    self.call_builtin(b, vec![lt, rt])
                }
                OpSlot::Desugared(helper) => self.fail(internal_error(format!(
                    "operator {op} should have been desugared to std.{helper}"
                ))),
            },

            ExprKind::Unary { op, operand } => {
                let b = unary_builtin(op);
                let t = Thunk::pending(
                    env.clone(),
                    arena.clone(),
                    operand,
                    format!("operand of operator{op}"),
                    arena.loc(operand).clone(),
                );
                self.call_builtin(b, vec![t])
            }

            ExprKind::Conditional {
                cond,
                branch_true,
                branch_false,
            } => {
                let c = self.eval_in(arena, cond, env)?;
                if self.as_boolean(c)? {
                    self.eval_in(arena, branch_true, env)
                } else {
                    self.eval_in(arena, branch_false, env)
                }
            }

            ExprKind::Local { binds, body } => {
                // Binds close over the extended environment, so `local`
                // definitions are mutually recursive.
                let inner = env.extend();
                for bind in arena.binds(binds) {
                    let thunk = Thunk::pending(
                        inner.clone(),
                        arena.clone(),
                        bind.body,
                        format!("thunk <{}>", self.interner.lookup(bind.name)),
                        arena.loc(bind.body).clone(),
                    );
                    inner.define(bind.name, thunk);
                }
                self.eval_in(arena, body, &inner)
            }

            ExprKind::Function { params, body } => {
                let free_vars = arena.expr(id).free_vars.clone();
                let captured = env.capture(&free_vars);
                let fenv = Environment::from_frame(captured, env.self_binding());
                Ok(Value::Function(Rc::new(FuncValue::User {
                    params,
                    body,
                    env: fenv,
                    arena: arena.clone(),
                })))
            }

            ExprKind::Apply {
                target,
                positional,
                named,
            } => {
                let loc = arena.loc(id).clone();
                self.eval_apply(arena, env, loc, target, positional, named)
            }

            ExprKind::Index { target, index } => self.eval_index(arena, env, target, index),

            ExprKind::Slice {
                target,
                begin,
                end,
                step,
            } => self.eval_slice(arena, env, target, begin, end, step),

            ExprKind::SuperIndex { index } => {
                let sb = self.object_frame(env)?;
                let iv = self.eval_in(arena, index, env)?;
                let name_str = self.as_string(iv)?;
                let name = self.interner.intern(&name_str);
                self.object_index(&sb.super_binding(), name)
            }

            ExprKind::InSuper { index } => {
                let sb = self.object_frame(env)?;
                let iv = self.eval_in(arena, index, env)?;
                let name_str = self.as_string(iv)?;
                let name = self.interner.intern(&name_str);
                let sup = sb.super_binding();
                Ok(Value::Bool(
                    find_field(&sup.object, sup.super_depth, name).is_some(),
                ))
            }

            ExprKind::DesugaredObject { asserts, fields } => {
                self.eval_object(arena, env, id, asserts, fields)
            }

            ExprKind::Error { expr } => {
                let v = self.eval_in(arena, expr, env)?;
                let message = match &v {
                    Value::Str(s) => s.to_string(),
                    other => self.to_display_string(other)?,
                };
                Err(self.traced(EvalError::new(message)))
            }

            ExprKind::Import { path } => self.eval_import(arena, id, path),
            ExprKind::ImportStr { path } => self.eval_import_str(arena, id, path),
        }
    }

    fn eval_object(
        &mut self,
        arena: &SharedArena,
        env: &Environment,
        id: ExprId,
        asserts: jsonnet_ir::ExprListRange,
        fields: jsonnet_ir::FieldRange,
    ) -> EvalResult {
        // Field names are evaluated in the outer environment, before any
        // self/super exists.
        let mut table: FxHashMap<Name, SimpleField> = FxHashMap::default();
        for field in arena.fields(fields) {
            let name_val = self.eval_in(arena, field.name, env)?;
            let name = match name_val {
                Value::Str(s) => self.interner.intern(&s),
                // A null field name drops the field.
                Value::Null => continue,
                other => return self.fail(field_name_not_string(other.type_name())),
            };
            if table.contains_key(&name) {
                return self.fail(duplicate_field_name(self.interner.lookup(name)));
            }
            let mut unbound = UnboundField::Code {
                arena: arena.clone(),
                body: field.body,
            };
            if field.plus_super {
                unbound = UnboundField::PlusSuper {
                    inner: Rc::new(unbound),
                };
            }
            table.insert(
                name,
                SimpleField {
                    hide: field.hide,
                    field: Rc::new(unbound),
                },
            );
        }

        let object_asserts = arena
            .list(asserts)
            .iter()
            .map(|&expr| ObjectAssert {
                arena: arena.clone(),
                expr,
            })
            .collect();

        let free_vars = arena.expr(id).free_vars.clone();
        let upvalues = env.capture(&free_vars);
        Ok(Value::Object(ObjectValue::simple(SimpleObject::new(
            upvalues,
            table,
            object_asserts,
        ))))
    }

    fn eval_index(
        &mut self,
        arena: &SharedArena,
        env: &Environment,
        target: ExprId,
        index: ExprId,
    ) -> EvalResult {
        let tv = self.eval_in(arena, target, env)?;
        match tv {
            Value::Object(obj) => {
                let iv = self.eval_in(arena, index, env)?;
                let name_str = self.as_string(iv)?;
                let name = self.interner.intern(&name_str);
                self.object_index(&SelfBinding::new(obj), name)
            }
            Value::Array(arr) => {
                let iv = self.eval_in(arena, index, env)?;
                let n = self.as_number(iv)?;
                if n.fract() != 0.0 {
                    return self.fail(array_index_not_integer(n));
                }
                let idx = n as i64;
                if idx < 0 || idx as usize >= arr.elements.len() {
                    return self.fail(array_index_out_of_bounds(idx, arr.elements.len()));
                }
                let elem = arr.elements[idx as usize].clone();
                self.force(&elem)
            }
            Value::Str(s) => {
                let iv = self.eval_in(arena, index, env)?;
                let n = self.as_number(iv)?;
                if n.fract() != 0.0 {
                    return self.fail(array_index_not_integer(n));
                }
                let idx = n as i64;
                let len = s.chars().count();
                if idx < 0 || idx as usize >= len {
                    return self.fail(string_index_out_of_bounds(idx, len));
                }
                match s.chars().nth(idx as usize) {
                    Some(c) => Ok(Value::string(c.to_string())),
                    None => self.fail(string_index_out_of_bounds(idx, len)),
                }
            }
            other => self.fail(value_non_indexable(other.type_name())),
        }
    }

    fn eval_slice(
        &mut self,
        arena: &SharedArena,
        env: &Environment,
        target: ExprId,
        begin: Option<ExprId>,
        end: Option<ExprId>,
        step: Option<ExprId>,
    ) -> EvalResult {
        let tv = self.eval_in(arena, target, env)?;
        let len = match &tv {
            Value::Array(arr) => arr.elements.len(),
            Value::Str(s) => s.chars().count(),
            other => return self.fail(slice_unsupported(other.type_name())),
        };

        let begin = match begin {
            Some(e) => {
                let v = self.eval_in(arena, e, env)?;
                let n = self.as_number(v)?;
                if n < 0.0 {
                    return self.fail(slice_bound_negative(n));
                }
                n as usize
            }
            None => 0,
        };
        let end = match end {
            Some(e) => {
                let v = self.eval_in(arena, e, env)?;
                let n = self.as_number(v)?;
                if n < 0.0 {
                    return self.fail(slice_bound_negative(n));
                }
                (n as usize).min(len)
            }
            None => len,
        };
        let step = match step {
            Some(e) => {
                let v = self.eval_in(arena, e, env)?;
                let n = self.as_number(v)?;
                if n < 1.0 {
                    return self.fail(slice_step_not_positive(n));
                }
                n as usize
            }
            None => 1,
        };

        match tv {
            Value::Array(arr) => {
                let mut elements = Vec::new();
                let mut idx = begin;
                while idx < end {
                    elements.push(arr.elements[idx].clone());
                    idx += step;
                }
                Ok(Value::array(elements))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let mut out = String::new();
                let mut idx = begin;
                while idx < end {
                    out.push(chars[idx]);
                    idx += step;
                }
                Ok(Value::string(out))
            }
            _ => self.fail(internal_error("slice target changed type")),
        }
    }

    // Objects

    /// Look up `name` through the given object frame, checking the root
    /// object's assertions first.
    pub(crate) fn object_index(&mut self, sb: &SelfBinding, name: Name) -> EvalResult {
        self.check_assertions(&sb.object)?;
        match try_object_index(sb, name, &self.interner) {
            Some(thunk) => self.force(&thunk),
            None => self.fail(field_does_not_exist(self.interner.lookup(name))),
        }
    }

    /// Run an object's assertions once per instance, caching the outcome.
    pub(crate) fn check_assertions(&mut self, obj: &ObjectValue) -> EvalResult<()> {
        {
            let state = obj.caches().asserts.borrow();
            match &*state {
                AssertState::Checked | AssertState::InProgress => return Ok(()),
                AssertState::Failed(e) => return Err(e.clone()),
                AssertState::Unchecked => {}
            }
        }
        let _ = obj.caches().asserts.replace(AssertState::InProgress);
        let result = self.run_asserts(obj, obj, 0);
        let new_state = match &result {
            Ok(()) => AssertState::Checked,
            Err(e) => AssertState::Failed(e.clone()),
        };
        let _ = obj.caches().asserts.replace(new_state);
        result
    }

    fn run_asserts(
        &mut self,
        root: &ObjectValue,
        curr: &ObjectValue,
        super_depth: usize,
    ) -> EvalResult<()> {
        match curr {
            ObjectValue::Extended(ext) => {
                self.run_asserts(root, &ext.right, super_depth)?;
                self.run_asserts(root, &ext.left, super_depth + ext.right.simple_count())
            }
            ObjectValue::Simple(simple) => {
                if simple.asserts.is_empty() {
                    return Ok(());
                }
                tracing::trace!(count = simple.asserts.len(), "running object assertions");
                for assert in &simple.asserts {
                    let sb = SelfBinding {
                        object: root.clone(),
                        super_depth,
                    };
                    let env = Environment::from_frame(simple.upvalues.clone(), Some(sb));
                    let thunk = Thunk::pending(
                        env,
                        assert.arena.clone(),
                        assert.expr,
                        "object assertion",
                        assert.arena.loc(assert.expr).clone(),
                    );
                    self.force(&thunk)?;
                }
                Ok(())
            }
        }
    }

    fn object_frame(&self, env: &Environment) -> EvalResult<SelfBinding> {
        match env.self_binding() {
            Some(sb) => Ok(sb),
            None => self.fail(internal_error("super used outside of an object")),
        }
    }

    // Imports

    fn eval_import(&mut self, arena: &SharedArena, id: ExprId, path: Name) -> EvalResult {
        let loc = arena.loc(id).clone();
        let path_str = self.interner.lookup(path);
        let here: Option<String> = loc.file.as_deref().map(str::to_owned);
        let key = (here.clone().unwrap_or_default(), format!("ast:{path_str}"));
        if let Some(thunk) = self.import_cache.get(&key).cloned() {
            tracing::debug!(path = path_str, "import cache hit");
            return self.force(&thunk);
        }
        tracing::debug!(path = path_str, "resolving import");
        let program = match self.resolver.import_ast(here.as_deref(), path_str) {
            Ok(p) => p,
            Err(reason) => return self.fail(import_failed(path_str, &reason)),
        };
        // Imports evaluate under a fresh environment containing only std.
        let thunk = Thunk::pending(
            self.root_env.clone(),
            program.arena.clone(),
            program.root,
            format!("import <{path_str}>"),
            loc,
        );
        self.import_cache.insert(key, thunk.clone());
        self.force(&thunk)
    }

    fn eval_import_str(&mut self, arena: &SharedArena, id: ExprId, path: Name) -> EvalResult {
        let loc = arena.loc(id).clone();
        let path_str = self.interner.lookup(path);
        let here: Option<String> = loc.file.as_deref().map(str::to_owned);
        let key = (here.clone().unwrap_or_default(), format!("str:{path_str}"));
        if let Some(thunk) = self.import_cache.get(&key).cloned() {
            tracing::debug!(path = path_str, "importstr cache hit");
            return self.force(&thunk);
        }
        let contents = match self.resolver.import_str(here.as_deref(), path_str) {
            Ok(s) => s,
            Err(reason) => return self.fail(import_failed(path_str, &reason)),
        };
        let thunk = Thunk::ready(Value::string(contents));
        self.import_cache.insert(key, thunk.clone());
        self.force(&thunk)
    }

    // Builtin invocation

    /// Invoke a builtin under its `<builtin>` trace frame.
    pub(crate) fn call_builtin(&mut self, b: Builtin, args: Vec<Thunk>) -> EvalResult {
        self.in_frame(
            LocationRange::message("<builtin>"),
            format!("builtin function <{}>", b.name()),
            |i| dispatch_builtin(i, b, &args),
        )
    }

    // Typed coercion helpers

    pub(crate) fn as_number(&self, v: Value) -> EvalResult<f64> {
        match v {
            Value::Number(n) => Ok(n),
            other => self.fail(type_mismatch("number", other.type_name())),
        }
    }

    pub(crate) fn as_string(&self, v: Value) -> EvalResult<Rc<str>> {
        match v {
            Value::Str(s) => Ok(s),
            other => self.fail(type_mismatch("string", other.type_name())),
        }
    }

    pub(crate) fn as_boolean(&self, v: Value) -> EvalResult<bool> {
        match v {
            Value::Bool(b) => Ok(b),
            other => self.fail(type_mismatch("boolean", other.type_name())),
        }
    }

    pub(crate) fn as_array(&self, v: Value) -> EvalResult<Rc<ArrayValue>> {
        match v {
            Value::Array(a) => Ok(a),
            other => self.fail(type_mismatch("array", other.type_name())),
        }
    }

    pub(crate) fn as_function(&self, v: Value) -> EvalResult<Rc<FuncValue>> {
        match v {
            Value::Function(f) => Ok(f),
            other => self.fail(type_mismatch("function", other.type_name())),
        }
    }

    pub(crate) fn as_object(&self, v: Value) -> EvalResult<ObjectValue> {
        match v {
            Value::Object(o) => Ok(o),
            other => self.fail(type_mismatch("object", other.type_name())),
        }
    }

    pub(crate) fn force_number(&mut self, t: &Thunk) -> EvalResult<f64> {
        let v = self.force(t)?;
        self.as_number(v)
    }

    pub(crate) fn force_string(&mut self, t: &Thunk) -> EvalResult<Rc<str>> {
        let v = self.force(t)?;
        self.as_string(v)
    }

    pub(crate) fn force_boolean(&mut self, t: &Thunk) -> EvalResult<bool> {
        let v = self.force(t)?;
        self.as_boolean(v)
    }

    pub(crate) fn force_array(&mut self, t: &Thunk) -> EvalResult<Rc<ArrayValue>> {
        let v = self.force(t)?;
        self.as_array(v)
    }

    pub(crate) fn force_function(&mut self, t: &Thunk) -> EvalResult<Rc<FuncValue>> {
        let v = self.force(t)?;
        self.as_function(v)
    }

    pub(crate) fn force_object(&mut self, t: &Thunk) -> EvalResult<ObjectValue> {
        let v = self.force(t)?;
        self.as_object(v)
    }

    // Shared helpers

    /// Reject NaN and ±∞ from a numeric operation.
    pub(crate) fn double_check(&self, x: f64) -> EvalResult<f64> {
        if x.is_nan() {
            return self.fail(crate::errors::not_a_number());
        }
        if x.is_infinite() {
            return self.fail(crate::errors::overflow());
        }
        Ok(x)
    }

    /// `toString` semantics: strings pass through, everything else is the
    /// compact JSON manifestation.
    pub(crate) fn to_display_string(&mut self, v: &Value) -> EvalResult<String> {
        match v {
            Value::Str(s) => Ok(s.to_string()),
            other => self.manifest_json(other, false),
        }
    }

    /// Field names sorted lexicographically by their string form.
    pub(crate) fn sorted_field_names(
        &self,
        obj: &ObjectValue,
        include_hidden: bool,
    ) -> Vec<Name> {
        let mut names = crate::object::field_names(obj, include_hidden);
        names.sort_by(|&a, &b| self.interner.lookup(a).cmp(self.interner.lookup(b)));
        names
    }
}
