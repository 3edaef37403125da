//! Desugared expression nodes and the arena that stores them.
//!
//! Children are `ExprId(u32)` indices into an [`ExprArena`], never boxes;
//! variable-length children (array elements, binds, parameters, object
//! fields) live in side tables addressed by copyable index ranges. The
//! evaluator walks the arena read-only; producers build it once through the
//! `alloc_*` methods and never mutate allocated nodes apart from attaching
//! free-variable sets.

use std::fmt;
use std::sync::Arc;

use crate::{LocationRange, Name};

/// Binary operators as they appear in desugared trees.
///
/// `%`, `==`, `!=`, and `in` have table slots but are replaced by stdlib
/// calls (`mod`, `equals`, `notEquals`, `objectHasAll`) during desugaring;
/// the evaluator treats reaching those slots as an internal error.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    Mult,
    Div,
    Percent,
    Plus,
    Minus,
    ShiftL,
    ShiftR,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    In,
    ManifestEqual,
    ManifestUnequal,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Mult => "*",
            BinaryOp::Div => "/",
            BinaryOp::Percent => "%",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::ShiftL => "<<",
            BinaryOp::ShiftR => ">>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::In => "in",
            BinaryOp::ManifestEqual => "==",
            BinaryOp::ManifestUnequal => "!=",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

/// Unary operators.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
    Plus,
    Minus,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        };
        f.write_str(s)
    }
}

/// Field visibility marker.
///
/// `Inherit` (single colon) takes the visibility of the field it overrides,
/// if any; `Hidden` (`::`) and `Visible` (`:::`) are absolute.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Hide {
    Hidden,
    Inherit,
    Visible,
}

/// Index of an expression in an [`ExprArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

macro_rules! side_table_range {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
        pub struct $name {
            start: u32,
            len: u32,
        }

        impl $name {
            /// Empty range.
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            #[inline]
            pub const fn len(self) -> usize {
                self.len as usize
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.len == 0
            }

            #[inline]
            fn to_range(self) -> std::ops::Range<usize> {
                self.start as usize..(self.start + self.len) as usize
            }
        }
    };
}

side_table_range! {
    /// Range into the arena's expression-list table.
    ExprListRange
}
side_table_range! {
    /// Range into the arena's `local` bind table.
    BindRange
}
side_table_range! {
    /// Range into the arena's parameter table.
    ParamRange
}
side_table_range! {
    /// Range into the arena's named-argument table.
    NamedArgRange
}
side_table_range! {
    /// Range into the arena's object-field table.
    FieldRange
}

/// One `local` binding: `name = body`.
#[derive(Copy, Clone, Debug)]
pub struct Bind {
    pub name: Name,
    pub body: ExprId,
}

/// One function parameter; `default` is `None` for required parameters.
#[derive(Copy, Clone, Debug)]
pub struct Param {
    pub name: Name,
    pub default: Option<ExprId>,
}

/// One named call argument.
#[derive(Copy, Clone, Debug)]
pub struct NamedArg {
    pub name: Name,
    pub arg: ExprId,
}

/// One field of a desugared object.
///
/// `name` is an expression evaluated outside the object (string or null);
/// `body` is evaluated later, under a bound `self`/`super`.
#[derive(Copy, Clone, Debug)]
pub struct ObjectField {
    pub hide: Hide,
    pub name: ExprId,
    pub body: ExprId,
    pub plus_super: bool,
}

/// Desugared expression variants.
#[derive(Copy, Clone, Debug)]
pub enum ExprKind {
    LiteralNull,
    LiteralBoolean(bool),
    LiteralNumber(f64),
    /// String contents are interned; block/verbatim distinctions are gone
    /// after desugaring.
    LiteralString(Name),

    Var(Name),
    SelfExpr,

    Array(ExprListRange),

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },

    Conditional {
        cond: ExprId,
        branch_true: ExprId,
        branch_false: ExprId,
    },

    Local {
        binds: BindRange,
        body: ExprId,
    },

    Function {
        params: ParamRange,
        body: ExprId,
    },

    Apply {
        target: ExprId,
        positional: ExprListRange,
        named: NamedArgRange,
    },

    Index {
        target: ExprId,
        index: ExprId,
    },

    Slice {
        target: ExprId,
        begin: Option<ExprId>,
        end: Option<ExprId>,
        step: Option<ExprId>,
    },

    SuperIndex {
        index: ExprId,
    },
    InSuper {
        index: ExprId,
    },

    DesugaredObject {
        asserts: ExprListRange,
        fields: FieldRange,
    },

    Error {
        expr: ExprId,
    },

    Import {
        path: Name,
    },
    ImportStr {
        path: Name,
    },
}

/// Expression node: kind plus source range plus analyzer-attached free
/// variables (identifiers used but not bound inside the node).
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: LocationRange,
    pub free_vars: Vec<Name>,
}

/// Arena holding one desugared tree (one file's worth of expressions).
#[derive(Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    expr_lists: Vec<ExprId>,
    binds: Vec<Bind>,
    params: Vec<Param>,
    named_args: Vec<NamedArg>,
    fields: Vec<ObjectField>,
}

/// Shared handle to an arena.
///
/// Thunks and function values carry the arena their body lives in, because
/// imports bring their own arenas into one evaluation.
pub type SharedArena = Arc<ExprArena>;

impl ExprArena {
    pub fn new() -> Self {
        ExprArena::default()
    }

    /// Allocate a node with no free variables attached yet.
    pub fn alloc(&mut self, kind: ExprKind, loc: LocationRange) -> ExprId {
        let id = u32::try_from(self.exprs.len()).expect("arena overflow");
        self.exprs.push(Expr {
            kind,
            loc,
            free_vars: Vec::new(),
        });
        ExprId(id)
    }

    /// Attach the analyzer's free-variable set to a node.
    pub fn set_free_vars(&mut self, id: ExprId, free_vars: Vec<Name>) {
        self.exprs[id.index()].free_vars = free_vars;
    }

    pub fn alloc_list(&mut self, items: &[ExprId]) -> ExprListRange {
        let start = u32::try_from(self.expr_lists.len()).expect("arena overflow");
        self.expr_lists.extend_from_slice(items);
        ExprListRange {
            start,
            len: items.len() as u32,
        }
    }

    pub fn alloc_binds(&mut self, items: &[Bind]) -> BindRange {
        let start = u32::try_from(self.binds.len()).expect("arena overflow");
        self.binds.extend_from_slice(items);
        BindRange {
            start,
            len: items.len() as u32,
        }
    }

    pub fn alloc_params(&mut self, items: &[Param]) -> ParamRange {
        let start = u32::try_from(self.params.len()).expect("arena overflow");
        self.params.extend_from_slice(items);
        ParamRange {
            start,
            len: items.len() as u32,
        }
    }

    pub fn alloc_named_args(&mut self, items: &[NamedArg]) -> NamedArgRange {
        let start = u32::try_from(self.named_args.len()).expect("arena overflow");
        self.named_args.extend_from_slice(items);
        NamedArgRange {
            start,
            len: items.len() as u32,
        }
    }

    pub fn alloc_fields(&mut self, items: &[ObjectField]) -> FieldRange {
        let start = u32::try_from(self.fields.len()).expect("arena overflow");
        self.fields.extend_from_slice(items);
        FieldRange {
            start,
            len: items.len() as u32,
        }
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn loc(&self, id: ExprId) -> &LocationRange {
        &self.exprs[id.index()].loc
    }

    #[inline]
    pub fn list(&self, range: ExprListRange) -> &[ExprId] {
        &self.expr_lists[range.to_range()]
    }

    #[inline]
    pub fn binds(&self, range: BindRange) -> &[Bind] {
        &self.binds[range.to_range()]
    }

    #[inline]
    pub fn params(&self, range: ParamRange) -> &[Param] {
        &self.params[range.to_range()]
    }

    #[inline]
    pub fn named_args(&self, range: NamedArgRange) -> &[NamedArg] {
        &self.named_args[range.to_range()]
    }

    #[inline]
    pub fn fields(&self, range: FieldRange) -> &[ObjectField] {
        &self.fields[range.to_range()]
    }

    /// Number of allocated expressions.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Location, SharedInterner};

    fn loc() -> LocationRange {
        LocationRange::new("test.jsonnet", Location::new(1, 1), Location::new(1, 2))
    }

    #[test]
    fn alloc_and_read_back() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprKind::LiteralNumber(1.0), loc());
        let b = arena.alloc(ExprKind::LiteralNumber(2.0), loc());
        let sum = arena.alloc(
            ExprKind::Binary {
                op: BinaryOp::Plus,
                left: a,
                right: b,
            },
            loc(),
        );
        match arena.expr(sum).kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::Plus);
                assert_eq!(left, a);
                assert_eq!(right, b);
            }
            _ => panic!("expected binary node"),
        }
    }

    #[test]
    fn side_tables_round_trip() {
        let interner = SharedInterner::new();
        let x = interner.intern("x");
        let mut arena = ExprArena::new();
        let body = arena.alloc(ExprKind::Var(x), loc());
        let binds = arena.alloc_binds(&[Bind { name: x, body }]);
        assert_eq!(arena.binds(binds).len(), 1);
        assert_eq!(arena.binds(binds)[0].name, x);

        let empty = ExprListRange::EMPTY;
        assert!(empty.is_empty());
        assert!(arena.list(empty).is_empty());
    }

    #[test]
    fn operator_display_matches_surface_tokens() {
        assert_eq!(BinaryOp::ShiftL.to_string(), "<<");
        assert_eq!(BinaryOp::In.to_string(), "in");
        assert_eq!(UnaryOp::BitwiseNot.to_string(), "~");
    }
}
