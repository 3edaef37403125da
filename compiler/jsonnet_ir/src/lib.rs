//! Jsonnet IR - desugared AST and shared infrastructure for the evaluator.
//!
//! This crate is the contract between the external parser/desugarer/analyzer
//! pipeline and the evaluator in `jsonnet_eval`:
//!
//! - `Name` + `StringInterner`: interned identifiers and field names
//! - `Location` / `LocationRange`: 1-based source positions for error traces
//! - `ExprArena` + `ExprKind`: the desugared node tree, stored as index-based
//!   arenas (children are `ExprId`s, never boxes)
//!
//! Only desugared forms exist here. Surface sugar (`Object`, `Dollar`,
//! `ApplyBrace`, comprehensions, `assert` expressions, field methods) must be
//! lowered by the producer before a tree reaches the evaluator.

mod ast;
mod interner;
mod location;
mod name;

pub use ast::{
    Bind, BindRange, BinaryOp, Expr, ExprArena, ExprId, ExprKind, ExprListRange, FieldRange, Hide,
    NamedArg, NamedArgRange, ObjectField, Param, ParamRange, SharedArena, UnaryOp,
};
pub use interner::{SharedInterner, StringInterner};
pub use location::{Location, LocationRange};
pub use name::Name;
