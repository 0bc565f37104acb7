//! IR (Intermediate Representation). Every function becomes a graph of basic
//! blocks holding three-address instructions over stack slots. Control flow
//! lives on the blocks' successor links, the only explicit transfer is
//! `jump` which `break` and `continue` use to escape structured nesting.

use crate::frontend::ast::{AssignmentOperatorKind, BinaryOperatorKind, UnaryOperatorKind};

pub mod ast_lowering;
pub mod cfg;
pub mod pretty_print;

pub use self::cfg::{BasicBlock, BlockId, ControlFlowGraph, Slot, SymbolEntry, Terminator};

/// Every function of a translation unit, lowered in source order
#[derive(Debug, Default)]
pub struct Module {
    pub functions: Vec<ControlFlowGraph>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Type {
    Int,
    /// Only valid as a function return type
    Void,
}

impl Type {
    pub fn size_bytes(self) -> i32 {
        match self {
            Type::Int => 4,
            Type::Void => panic!("internal compiler error: void has no size"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum Operation {
    /// dst, literal
    #[strum(serialize = "ldconst")]
    LoadConstant,
    /// dst, src
    #[strum(serialize = "copyvar")]
    CopyVariable,

    /* dst, lhs, rhs */
    #[strum(serialize = "add")]
    Add,
    #[strum(serialize = "sub")]
    Subtract,
    #[strum(serialize = "mul")]
    Multiply,
    #[strum(serialize = "divide")]
    Divide,
    #[strum(serialize = "modulo")]
    Modulo,
    #[strum(serialize = "bwand")]
    BitwiseAnd,
    #[strum(serialize = "bwor")]
    BitwiseOr,
    #[strum(serialize = "bwxor")]
    BitwiseXor,
    #[strum(serialize = "bwsl")]
    ShiftLeft,
    #[strum(serialize = "bwsr")]
    ShiftRight,

    /* operand, in place */
    #[strum(serialize = "neg")]
    Negate,
    #[strum(serialize = "bwnot")]
    BitwiseNot,
    #[strum(serialize = "lnot")]
    LogicalNot,
    #[strum(serialize = "incr")]
    Increment,
    #[strum(serialize = "decr")]
    Decrement,

    /* dst, lhs, rhs; dst receives 0 or 1 */
    #[strum(serialize = "cmp_eq")]
    CompareEqual,
    #[strum(serialize = "cmp_ne")]
    CompareNotEqual,
    #[strum(serialize = "cmp_gt")]
    CompareGreater,
    #[strum(serialize = "cmp_lt")]
    CompareLess,
    #[strum(serialize = "cmp_ge")]
    CompareGreaterOrEqual,
    #[strum(serialize = "cmp_le")]
    CompareLessOrEqual,

    /// dst, function, args...
    #[strum(serialize = "call")]
    Call,
    /// Optional return value
    #[strum(serialize = "ret")]
    Return,
    /// label
    #[strum(serialize = "jump")]
    Jump,
}

impl Operation {
    /// Binary operator to its instruction. The short-circuit operators have
    /// none since they lower to control flow.
    pub fn from_binary_operator(kind: BinaryOperatorKind) -> Option<Self> {
        Some(match kind {
            BinaryOperatorKind::Add => Self::Add,
            BinaryOperatorKind::Subtract => Self::Subtract,
            BinaryOperatorKind::Multiply => Self::Multiply,
            BinaryOperatorKind::Divide => Self::Divide,
            BinaryOperatorKind::Modulus => Self::Modulo,
            BinaryOperatorKind::Equals => Self::CompareEqual,
            BinaryOperatorKind::NotEquals => Self::CompareNotEqual,
            BinaryOperatorKind::LessThan => Self::CompareLess,
            BinaryOperatorKind::LessThanOrEqualTo => Self::CompareLessOrEqual,
            BinaryOperatorKind::GreaterThan => Self::CompareGreater,
            BinaryOperatorKind::GreaterThanOrEqualTo => Self::CompareGreaterOrEqual,
            BinaryOperatorKind::BitwiseAnd => Self::BitwiseAnd,
            BinaryOperatorKind::BitwiseOr => Self::BitwiseOr,
            BinaryOperatorKind::BitwiseXor => Self::BitwiseXor,
            BinaryOperatorKind::ShiftLeft => Self::ShiftLeft,
            BinaryOperatorKind::ShiftRight => Self::ShiftRight,
            BinaryOperatorKind::LogicalAnd | BinaryOperatorKind::LogicalOr => return None,
        })
    }

    pub fn from_assignment_operator(kind: AssignmentOperatorKind) -> Self {
        match kind {
            AssignmentOperatorKind::Add => Self::Add,
            AssignmentOperatorKind::Subtract => Self::Subtract,
            AssignmentOperatorKind::Multiply => Self::Multiply,
            AssignmentOperatorKind::Divide => Self::Divide,
            AssignmentOperatorKind::Modulus => Self::Modulo,
            AssignmentOperatorKind::BitwiseAnd => Self::BitwiseAnd,
            AssignmentOperatorKind::BitwiseOr => Self::BitwiseOr,
            AssignmentOperatorKind::BitwiseXor => Self::BitwiseXor,
            AssignmentOperatorKind::ShiftLeft => Self::ShiftLeft,
            AssignmentOperatorKind::ShiftRight => Self::ShiftRight,
        }
    }

    pub fn from_unary_operator(kind: UnaryOperatorKind) -> Self {
        match kind {
            UnaryOperatorKind::LogicalNot => Self::LogicalNot,
            UnaryOperatorKind::BitwiseNot => Self::BitwiseNot,
            UnaryOperatorKind::Negate => Self::Negate,
        }
    }

    fn accepts_operand_count(self, count: usize) -> bool {
        match self {
            Self::LoadConstant | Self::CopyVariable => count == 2,
            Self::Negate
            | Self::BitwiseNot
            | Self::LogicalNot
            | Self::Increment
            | Self::Decrement
            | Self::Jump => count == 1,
            Self::Return => count <= 1,
            Self::Call => count >= 2,
            _ => count == 3,
        }
    }
}

/// A single instruction operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Slot(Slot),
    Literal(i32),
    Label(BlockId),
    /// Call target, carrying `@PLT` when resolved outside this unit
    Function(String),
}

impl Operand {
    #[track_caller]
    pub fn as_slot(&self) -> Slot {
        match self {
            Operand::Slot(slot) => *slot,
            other => panic!("internal compiler error: expected a slot operand, got {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub operands: Vec<Operand>,
}

impl Instruction {
    #[track_caller]
    pub fn new(operation: Operation, operands: Vec<Operand>) -> Self {
        assert!(
            operation.accepts_operand_count(operands.len()),
            "internal compiler error: `{operation}` does not take {} operands",
            operands.len()
        );

        Self {
            operation,
            operands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_round_trip_through_strum() {
        assert_eq!(Operation::LoadConstant.to_string(), "ldconst");
        assert_eq!(Operation::CompareGreaterOrEqual.to_string(), "cmp_ge");
        assert_eq!("bwsr".parse::<Operation>().unwrap(), Operation::ShiftRight);
    }

    #[test]
    fn short_circuit_operators_have_no_instruction() {
        assert_eq!(
            Operation::from_binary_operator(BinaryOperatorKind::LogicalAnd),
            None
        );
        assert_eq!(
            Operation::from_binary_operator(BinaryOperatorKind::ShiftLeft),
            Some(Operation::ShiftLeft)
        );
    }

    #[test]
    #[should_panic(expected = "does not take")]
    fn rejects_wrong_arity() {
        Instruction::new(Operation::Add, vec![Operand::Literal(1)]);
    }
}
