//! Test program builder.
//!
//! `TestBuilder` assembles desugared trees the way the external
//! parser/desugarer would deliver them, including the analyzer's
//! free-variable annotation pass (`annotate_free_vars`), which the
//! evaluator's minimal-capture logic requires.

use std::collections::BTreeSet;
use std::sync::Arc;

use jsonnet_ir::{
    Bind, BinaryOp, ExprArena, ExprId, ExprKind, Hide, Location, LocationRange, Name, NamedArg,
    ObjectField, Param, SharedArena, SharedInterner, UnaryOp,
};

use crate::{EvalError, InterpreterBuilder};

pub(crate) struct TestBuilder {
    pub interner: SharedInterner,
    pub arena: ExprArena,
    next_line: u32,
}

impl TestBuilder {
    pub fn new() -> Self {
        Self::with_interner(SharedInterner::new())
    }

    /// Share an interner with another builder; required when one program
    /// imports another, so `Name`s agree.
    pub fn with_interner(interner: SharedInterner) -> Self {
        TestBuilder {
            interner,
            arena: ExprArena::new(),
            next_line: 1,
        }
    }

    /// Each node gets its own line so trace frames are distinguishable.
    fn loc(&mut self) -> LocationRange {
        let line = self.next_line;
        self.next_line += 1;
        LocationRange::new("test.jsonnet", Location::new(line, 1), Location::new(line, 2))
    }

    fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let loc = self.loc();
        self.arena.alloc(kind, loc)
    }

    pub fn null(&mut self) -> ExprId {
        self.alloc(ExprKind::LiteralNull)
    }

    pub fn boolean(&mut self, b: bool) -> ExprId {
        self.alloc(ExprKind::LiteralBoolean(b))
    }

    pub fn num(&mut self, n: f64) -> ExprId {
        self.alloc(ExprKind::LiteralNumber(n))
    }

    pub fn str_lit(&mut self, s: &str) -> ExprId {
        let name = self.interner.intern(s);
        self.alloc(ExprKind::LiteralString(name))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let name = self.interner.intern(name);
        self.alloc(ExprKind::Var(name))
    }

    pub fn self_ref(&mut self) -> ExprId {
        self.alloc(ExprKind::SelfExpr)
    }

    pub fn array(&mut self, elems: &[ExprId]) -> ExprId {
        let range = self.arena.alloc_list(elems);
        self.alloc(ExprKind::Array(range))
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.alloc(ExprKind::Unary { op, operand })
    }

    pub fn cond(&mut self, cond: ExprId, branch_true: ExprId, branch_false: ExprId) -> ExprId {
        self.alloc(ExprKind::Conditional {
            cond,
            branch_true,
            branch_false,
        })
    }

    pub fn local(&mut self, binds: &[(&str, ExprId)], body: ExprId) -> ExprId {
        let binds: Vec<Bind> = binds
            .iter()
            .map(|&(name, bind_body)| Bind {
                name: self.interner.intern(name),
                body: bind_body,
            })
            .collect();
        let range = self.arena.alloc_binds(&binds);
        self.alloc(ExprKind::Local { binds: range, body })
    }

    pub fn function(&mut self, params: &[(&str, Option<ExprId>)], body: ExprId) -> ExprId {
        let params: Vec<Param> = params
            .iter()
            .map(|&(name, default)| Param {
                name: self.interner.intern(name),
                default,
            })
            .collect();
        let range = self.arena.alloc_params(&params);
        self.alloc(ExprKind::Function {
            params: range,
            body,
        })
    }

    pub fn apply(
        &mut self,
        target: ExprId,
        positional: &[ExprId],
        named: &[(&str, ExprId)],
    ) -> ExprId {
        let positional = self.arena.alloc_list(positional);
        let named: Vec<NamedArg> = named
            .iter()
            .map(|&(name, arg)| NamedArg {
                name: self.interner.intern(name),
                arg,
            })
            .collect();
        let named = self.arena.alloc_named_args(&named);
        self.alloc(ExprKind::Apply {
            target,
            positional,
            named,
        })
    }

    pub fn call(&mut self, target: ExprId, positional: &[ExprId]) -> ExprId {
        self.apply(target, positional, &[])
    }

    pub fn index(&mut self, target: ExprId, index: ExprId) -> ExprId {
        self.alloc(ExprKind::Index { target, index })
    }

    /// `target.name`: index with a string-literal field name.
    pub fn field(&mut self, target: ExprId, name: &str) -> ExprId {
        let index = self.str_lit(name);
        self.index(target, index)
    }

    pub fn slice(
        &mut self,
        target: ExprId,
        begin: Option<ExprId>,
        end: Option<ExprId>,
        step: Option<ExprId>,
    ) -> ExprId {
        self.alloc(ExprKind::Slice {
            target,
            begin,
            end,
            step,
        })
    }

    pub fn super_field(&mut self, name: &str) -> ExprId {
        let index = self.str_lit(name);
        self.alloc(ExprKind::SuperIndex { index })
    }

    pub fn in_super(&mut self, name: &str) -> ExprId {
        let index = self.str_lit(name);
        self.alloc(ExprKind::InSuper { index })
    }

    /// Desugared object literal. Fields are (name, hide, plus_super, body).
    pub fn object(&mut self, fields: &[(&str, Hide, bool, ExprId)]) -> ExprId {
        self.object_with_asserts(fields, &[])
    }

    pub fn object_with_asserts(
        &mut self,
        fields: &[(&str, Hide, bool, ExprId)],
        asserts: &[ExprId],
    ) -> ExprId {
        let fields: Vec<ObjectField> = fields
            .iter()
            .map(|&(name, hide, plus_super, body)| {
                let name = self.str_lit(name);
                ObjectField {
                    hide,
                    name,
                    body,
                    plus_super,
                }
            })
            .collect();
        let fields = self.arena.alloc_fields(&fields);
        let asserts = self.arena.alloc_list(asserts);
        self.alloc(ExprKind::DesugaredObject { asserts, fields })
    }

    pub fn error_expr(&mut self, expr: ExprId) -> ExprId {
        self.alloc(ExprKind::Error { expr })
    }

    pub fn error_msg(&mut self, msg: &str) -> ExprId {
        let expr = self.str_lit(msg);
        self.error_expr(expr)
    }

    pub fn import(&mut self, path: &str) -> ExprId {
        let path = self.interner.intern(path);
        self.alloc(ExprKind::Import { path })
    }

    pub fn importstr(&mut self, path: &str) -> ExprId {
        let path = self.interner.intern(path);
        self.alloc(ExprKind::ImportStr { path })
    }

    /// `std.name`
    pub fn std_field(&mut self, name: &str) -> ExprId {
        let std = self.var("std");
        self.field(std, name)
    }

    /// `std.name(args...)`
    pub fn std_call(&mut self, name: &str, args: &[ExprId]) -> ExprId {
        let target = self.std_field(name);
        self.call(target, args)
    }

    /// Run the analyzer pass and freeze the arena.
    pub fn finish(mut self, root: ExprId) -> (SharedInterner, SharedArena) {
        annotate_free_vars(&mut self.arena, root);
        (self.interner, Arc::new(self.arena))
    }
}

/// Evaluate with the default two-space indent.
pub(crate) fn eval_pretty(builder: TestBuilder, root: ExprId) -> Result<String, EvalError> {
    let (interner, arena) = builder.finish(root);
    crate::evaluate(&interner, &arena, root)
}

/// Evaluate with compact (single-line) manifestation.
pub(crate) fn eval_compact(builder: TestBuilder, root: ExprId) -> Result<String, EvalError> {
    let (interner, arena) = builder.finish(root);
    InterpreterBuilder::new(interner)
        .manifest_indent("")
        .build()
        .evaluate(&arena, root)
}

/// Compute and attach free-variable sets bottom-up, the way the external
/// static analyzer does before handing a tree to the evaluator.
pub(crate) fn annotate_free_vars(arena: &mut ExprArena, id: ExprId) -> Vec<Name> {
    let kind = arena.expr(id).kind;
    let mut free: BTreeSet<Name> = BTreeSet::new();
    match kind {
        ExprKind::LiteralNull
        | ExprKind::LiteralBoolean(_)
        | ExprKind::LiteralNumber(_)
        | ExprKind::LiteralString(_)
        | ExprKind::SelfExpr
        | ExprKind::Import { .. }
        | ExprKind::ImportStr { .. } => {}

        ExprKind::Var(name) => {
            free.insert(name);
        }

        ExprKind::Array(range) => {
            for elem in arena.list(range).to_vec() {
                free.extend(annotate_free_vars(arena, elem));
            }
        }

        ExprKind::Binary { left, right, .. } => {
            free.extend(annotate_free_vars(arena, left));
            free.extend(annotate_free_vars(arena, right));
        }

        ExprKind::Unary { operand, .. } => {
            free.extend(annotate_free_vars(arena, operand));
        }

        ExprKind::Conditional {
            cond,
            branch_true,
            branch_false,
        } => {
            free.extend(annotate_free_vars(arena, cond));
            free.extend(annotate_free_vars(arena, branch_true));
            free.extend(annotate_free_vars(arena, branch_false));
        }

        ExprKind::Local { binds, body } => {
            let binds = arena.binds(binds).to_vec();
            for bind in &binds {
                free.extend(annotate_free_vars(arena, bind.body));
            }
            free.extend(annotate_free_vars(arena, body));
            for bind in &binds {
                free.remove(&bind.name);
            }
        }

        ExprKind::Function { params, body } => {
            let params = arena.params(params).to_vec();
            for param in &params {
                if let Some(default) = param.default {
                    free.extend(annotate_free_vars(arena, default));
                }
            }
            free.extend(annotate_free_vars(arena, body));
            for param in &params {
                free.remove(&param.name);
            }
        }

        ExprKind::Apply {
            target,
            positional,
            named,
        } => {
            free.extend(annotate_free_vars(arena, target));
            for arg in arena.list(positional).to_vec() {
                free.extend(annotate_free_vars(arena, arg));
            }
            for narg in arena.named_args(named).to_vec() {
                free.extend(annotate_free_vars(arena, narg.arg));
            }
        }

        ExprKind::Index { target, index } => {
            free.extend(annotate_free_vars(arena, target));
            free.extend(annotate_free_vars(arena, index));
        }

        ExprKind::Slice {
            target,
            begin,
            end,
            step,
        } => {
            free.extend(annotate_free_vars(arena, target));
            for part in [begin, end, step].into_iter().flatten() {
                free.extend(annotate_free_vars(arena, part));
            }
        }

        ExprKind::SuperIndex { index } | ExprKind::InSuper { index } => {
            free.extend(annotate_free_vars(arena, index));
        }

        ExprKind::DesugaredObject { asserts, fields } => {
            let fields = arena.fields(fields).to_vec();
            for field in &fields {
                free.extend(annotate_free_vars(arena, field.name));
                free.extend(annotate_free_vars(arena, field.body));
            }
            for assert in arena.list(asserts).to_vec() {
                free.extend(annotate_free_vars(arena, assert));
            }
        }

        ExprKind::Error { expr } => {
            free.extend(annotate_free_vars(arena, expr));
        }
    }
    let result: Vec<Name> = free.into_iter().collect();
    arena.set_free_vars(id, result.clone());
    result
}
