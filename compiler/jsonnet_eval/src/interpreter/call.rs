//! Function application: argument binding, arity validation, invocation.
//!
//! Calls never evaluate eagerly: every argument becomes a thunk owned by
//! the call frame. Optional-parameter defaults are thunks over the call
//! frame itself, so a default can reference other parameters.

use std::rc::Rc;

use jsonnet_ir::{
    ExprId, ExprKind, ExprListRange, LocationRange, NamedArgRange, Param, SharedArena,
};

use crate::builtins::Builtin;
use crate::environment::Environment;
use crate::errors::{
    duplicate_argument, internal_error, missing_argument, too_many_args, unknown_parameter,
    EvalResult,
};
use crate::thunk::Thunk;
use crate::value::FuncValue;

use super::Interpreter;

impl Interpreter {
    /// Evaluate an `Apply` node.
    pub(crate) fn eval_apply(
        &mut self,
        arena: &SharedArena,
        env: &Environment,
        loc: LocationRange,
        target: ExprId,
        positional: ExprListRange,
        named: NamedArgRange,
    ) -> EvalResult {
        let tv = self.eval_in(arena, target, env)?;
        let func = self.as_function(tv)?;
        let fname = display_name(self, arena, target);
        match &*func {
            FuncValue::User {
                params,
                body,
                env: fenv,
                arena: farena,
            } => {
                let body = *body;
                let params = *params;
                let farena = farena.clone();
                let fenv = fenv.clone();
                let call_env = self.bind_user_args(
                    arena,
                    env,
                    &fname,
                    &farena,
                    &fenv,
                    farena.params(params),
                    arena.list(positional),
                    arena.named_args(named),
                )?;
                self.in_frame(loc, format!("function <{fname}>"), |i| {
                    i.eval_in(&farena, body, &call_env)
                })
            }
            FuncValue::Builtin(b) => {
                let b = *b;
                let args =
                    self.bind_builtin_args(arena, env, &fname, b, positional, named)?;
                self.call_builtin(b, args)
            }
        }
    }

    /// Bind AST arguments for a user function, producing the call frame.
    #[expect(clippy::too_many_arguments, reason = "one call site, all parts of one binding step")]
    fn bind_user_args(
        &mut self,
        caller_arena: &SharedArena,
        caller_env: &Environment,
        fname: &str,
        farena: &SharedArena,
        fenv: &Environment,
        params: &[Param],
        positional: &[ExprId],
        named: &[jsonnet_ir::NamedArg],
    ) -> EvalResult<Environment> {
        if positional.len() > params.len() {
            return self.fail(too_many_args(params.len()));
        }
        let call_env = fenv.extend();
        let mut bound = vec![false; params.len()];

        for (idx, &arg) in positional.iter().enumerate() {
            let param = &params[idx];
            call_env.define(
                param.name,
                self.arg_thunk(caller_arena, caller_env, fname, param.name, arg),
            );
            bound[idx] = true;
        }

        for narg in named {
            let Some(idx) = params.iter().position(|p| p.name == narg.name) else {
                return self.fail(unknown_parameter(self.interner.lookup(narg.name)));
            };
            if bound[idx] {
                return self.fail(duplicate_argument(self.interner.lookup(narg.name)));
            }
            call_env.define(
                narg.name,
                self.arg_thunk(caller_arena, caller_env, fname, narg.name, narg.arg),
            );
            bound[idx] = true;
        }

        for (idx, param) in params.iter().enumerate() {
            if bound[idx] {
                continue;
            }
            match param.default {
                // Defaults close over the call frame, not the call site.
                Some(default) => {
                    let thunk = Thunk::pending(
                        call_env.clone(),
                        farena.clone(),
                        default,
                        format!(
                            "function <{fname}> parameter {}",
                            self.interner.lookup(param.name)
                        ),
                        farena.loc(default).clone(),
                    );
                    call_env.define(param.name, thunk);
                }
                None => {
                    return self.fail(missing_argument(self.interner.lookup(param.name)));
                }
            }
        }
        Ok(call_env)
    }

    /// Bind AST arguments for a builtin into its positional slot order.
    fn bind_builtin_args(
        &mut self,
        caller_arena: &SharedArena,
        caller_env: &Environment,
        fname: &str,
        b: Builtin,
        positional: ExprListRange,
        named: NamedArgRange,
    ) -> EvalResult<Vec<Thunk>> {
        let params = b.params();
        let positional = caller_arena.list(positional);
        let named = caller_arena.named_args(named);
        if positional.len() > params.len() {
            return self.fail(too_many_args(params.len()));
        }
        let mut slots: Vec<Option<Thunk>> = vec![None; params.len()];

        for (idx, &arg) in positional.iter().enumerate() {
            let pname = self.interner.intern(params[idx]);
            slots[idx] = Some(self.arg_thunk(caller_arena, caller_env, fname, pname, arg));
        }
        for narg in named {
            let narg_str = self.interner.lookup(narg.name);
            let Some(idx) = params.iter().position(|&p| p == narg_str) else {
                return self.fail(unknown_parameter(narg_str));
            };
            if slots[idx].is_some() {
                return self.fail(duplicate_argument(narg_str));
            }
            slots[idx] = Some(self.arg_thunk(caller_arena, caller_env, fname, narg.name, narg.arg));
        }

        let mut args = Vec::with_capacity(params.len());
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(t) => args.push(t),
                None => return self.fail(missing_argument(params[idx])),
            }
        }
        Ok(args)
    }

    fn arg_thunk(
        &self,
        caller_arena: &SharedArena,
        caller_env: &Environment,
        fname: &str,
        param: jsonnet_ir::Name,
        arg: ExprId,
    ) -> Thunk {
        Thunk::pending(
            caller_env.clone(),
            caller_arena.clone(),
            arg,
            format!(
                "function <{fname}> argument {}",
                self.interner.lookup(param)
            ),
            caller_arena.loc(arg).clone(),
        )
    }

    /// Invoke a function on pre-built positional thunks.
    ///
    /// Used by deferred-call thunks (`makeArray`, `map`, plus-super) and by
    /// builtins that call user functions (`flatMap`, `filter`).
    pub(crate) fn call_with_thunks(
        &mut self,
        func: &Rc<FuncValue>,
        args: Vec<Thunk>,
    ) -> EvalResult {
        match &**func {
            FuncValue::User {
                params,
                body,
                env,
                arena,
            } => {
                let ps = arena.params(*params);
                if args.len() > ps.len() {
                    return self.fail(too_many_args(ps.len()));
                }
                let call_env = env.extend();
                for (idx, param) in ps.iter().enumerate() {
                    if idx < args.len() {
                        call_env.define(param.name, args[idx].clone());
                        continue;
                    }
                    match param.default {
                        Some(default) => {
                            let thunk = Thunk::pending(
                                call_env.clone(),
                                arena.clone(),
                                default,
                                format!(
                                    "function <anonymous> parameter {}",
                                    self.interner.lookup(param.name)
                                ),
                                arena.loc(default).clone(),
                            );
                            call_env.define(param.name, thunk);
                        }
                        None => {
                            return self.fail(missing_argument(
                                self.interner.lookup(param.name),
                            ))
                        }
                    }
                }
                let body = *body;
                let arena = arena.clone();
                let loc = arena.loc(body).clone();
                self.in_frame(loc, "function <anonymous>".to_string(), |i| {
                    i.eval_in(&arena, body, &call_env)
                })
            }
            FuncValue::Builtin(b) => {
                let b = *b;
                if args.len() != b.params().len() {
                    return self.fail(internal_error(format!(
                        "builtin {} invoked with {} argument(s), wants {}",
                        b.name(),
                        args.len(),
                        b.params().len()
                    )));
                }
                self.call_builtin(b, args)
            }
        }
    }
}

/// Best-effort display name for a call target, used in trace contexts:
/// `f(...)` and `o.f(...)` name `f`, anything else is anonymous.
fn display_name(i: &Interpreter, arena: &SharedArena, target: ExprId) -> String {
    match arena.expr(target).kind {
        ExprKind::Var(name) => i.interner.lookup(name).to_string(),
        ExprKind::Index { index, .. } => match arena.expr(index).kind {
            ExprKind::LiteralString(s) => i.interner.lookup(s).to_string(),
            _ => "anonymous".to_string(),
        },
        _ => "anonymous".to_string(),
    }
}
