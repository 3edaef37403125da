//! Operator tables: desugared binary/unary ops to builtin dispatch.
//!
//! The type set is fixed, so dispatch is enum-based pattern matching, not
//! trait objects. Four binary slots (`%`, `==`, `!=`, `in`) are replaced by
//! stdlib calls during desugaring; if one reaches the evaluator the
//! lowering is broken, and the slot reports which helper should have been
//! called instead of guessing a behavior.

use jsonnet_ir::{BinaryOp, UnaryOp};

use crate::builtins::Builtin;

/// Resolution of a binary operator slot.
pub(crate) enum OpSlot {
    /// Dispatches to a builtin; operands are passed lazily, which is how
    /// `&&` and `||` short-circuit.
    Builtin(Builtin),
    /// Eliminated by desugaring; the payload names the stdlib helper the
    /// desugarer emits instead.
    Desugared(&'static str),
}

pub(crate) fn binary_slot(op: BinaryOp) -> OpSlot {
    match op {
        BinaryOp::Mult => OpSlot::Builtin(Builtin::Mult),
        BinaryOp::Div => OpSlot::Builtin(Builtin::Div),
        BinaryOp::Plus => OpSlot::Builtin(Builtin::Plus),
        BinaryOp::Minus => OpSlot::Builtin(Builtin::Minus),
        BinaryOp::ShiftL => OpSlot::Builtin(Builtin::ShiftL),
        BinaryOp::ShiftR => OpSlot::Builtin(Builtin::ShiftR),
        BinaryOp::Greater => OpSlot::Builtin(Builtin::Greater),
        BinaryOp::GreaterEq => OpSlot::Builtin(Builtin::GreaterEq),
        BinaryOp::Less => OpSlot::Builtin(Builtin::Less),
        BinaryOp::LessEq => OpSlot::Builtin(Builtin::LessEq),
        BinaryOp::BitwiseAnd => OpSlot::Builtin(Builtin::BitAnd),
        BinaryOp::BitwiseXor => OpSlot::Builtin(Builtin::BitXor),
        BinaryOp::BitwiseOr => OpSlot::Builtin(Builtin::BitOr),
        BinaryOp::And => OpSlot::Builtin(Builtin::And),
        BinaryOp::Or => OpSlot::Builtin(Builtin::Or),
        BinaryOp::Percent => OpSlot::Desugared("mod"),
        BinaryOp::ManifestEqual => OpSlot::Desugared("equals"),
        BinaryOp::ManifestUnequal => OpSlot::Desugared("notEquals"),
        BinaryOp::In => OpSlot::Desugared("objectHasAll"),
    }
}

pub(crate) fn unary_builtin(op: UnaryOp) -> Builtin {
    match op {
        UnaryOp::Not => Builtin::Not,
        UnaryOp::BitwiseNot => Builtin::BitNeg,
        UnaryOp::Plus => Builtin::UnaryPlus,
        UnaryOp::Minus => Builtin::UnaryMinus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_surface_operator_has_a_builtin_slot() {
        for op in [
            BinaryOp::Mult,
            BinaryOp::Div,
            BinaryOp::Plus,
            BinaryOp::Minus,
            BinaryOp::ShiftL,
            BinaryOp::ShiftR,
            BinaryOp::Greater,
            BinaryOp::GreaterEq,
            BinaryOp::Less,
            BinaryOp::LessEq,
            BinaryOp::BitwiseAnd,
            BinaryOp::BitwiseXor,
            BinaryOp::BitwiseOr,
            BinaryOp::And,
            BinaryOp::Or,
        ] {
            assert!(matches!(binary_slot(op), OpSlot::Builtin(_)), "{op}");
        }
    }

    #[test]
    fn desugared_slots_name_their_helpers() {
        assert!(matches!(
            binary_slot(BinaryOp::Percent),
            OpSlot::Desugared("mod")
        ));
        assert!(matches!(
            binary_slot(BinaryOp::In),
            OpSlot::Desugared("objectHasAll")
        ));
        assert!(matches!(
            binary_slot(BinaryOp::ManifestEqual),
            OpSlot::Desugared("equals")
        ));
        assert!(matches!(
            binary_slot(BinaryOp::ManifestUnequal),
            OpSlot::Desugared("notEquals")
        ));
    }
}
