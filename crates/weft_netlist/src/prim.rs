//! Built-in primitive module classes.
//!
//! Each primitive is a leaf [`Module`](crate::module::Module) whose body is
//! one [`PrimKind`] operation over its input ports. The propagation engine
//! evaluates primitives natively; emitters map them to target cells through
//! the descriptor tables in `weft_synth`.

use serde::{Deserialize, Serialize};
use weft_common::LogicValue;

/// The operation performed by a primitive module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimKind {
    /// Bitwise NOT.
    Not,
    /// Two-input bitwise AND.
    And2,
    /// Two-input bitwise OR.
    Or2,
    /// Two-input bitwise XOR.
    Xor2,
    /// Unary AND reduction to one bit.
    RedAnd,
    /// Unary OR reduction to one bit.
    RedOr,
    /// Unary XOR reduction to one bit.
    RedXor,
    /// Equality comparator (1-bit output).
    Eq,
    /// Inequality comparator (1-bit output).
    Neq,
    /// Unsigned less-than comparator (1-bit output).
    Lt,
    /// Unsigned less-or-equal comparator (1-bit output).
    Lte,
    /// Unsigned greater-than comparator (1-bit output).
    Gt,
    /// Unsigned greater-or-equal comparator (1-bit output).
    Gte,
    /// Logical left shift by the second input.
    Shl,
    /// Logical right shift by the second input.
    Srl,
    /// Arithmetic right shift by the second input.
    Sra,
    /// Modular adder.
    Add,
    /// Modular subtracter.
    Sub,
    /// Modular multiplier.
    Mul,
    /// Two-way multiplexer selected by a 1-bit condition.
    Mux,
    /// Inclusive bit slice of the input.
    Slice {
        /// High bit index (inclusive).
        hi: u32,
        /// Low bit index (inclusive).
        lo: u32,
    },
    /// Concatenation of two inputs, first input in the low bits.
    Concat,
    /// Replication of the input.
    Replicate {
        /// Number of copies.
        count: u32,
    },
    /// Constant value source.
    Const {
        /// The emitted constant.
        value: LogicValue,
    },
}

impl PrimKind {
    /// The definition name used for the primitive's module type.
    pub fn definition_name(&self) -> &'static str {
        match self {
            PrimKind::Not => "Not",
            PrimKind::And2 => "And2",
            PrimKind::Or2 => "Or2",
            PrimKind::Xor2 => "Xor2",
            PrimKind::RedAnd => "ReductionAnd",
            PrimKind::RedOr => "ReductionOr",
            PrimKind::RedXor => "ReductionXor",
            PrimKind::Eq => "Equals",
            PrimKind::Neq => "NotEquals",
            PrimKind::Lt => "LessThan",
            PrimKind::Lte => "LessOrEqual",
            PrimKind::Gt => "GreaterThan",
            PrimKind::Gte => "GreaterOrEqual",
            PrimKind::Shl => "ShiftLeft",
            PrimKind::Srl => "ShiftRightLogical",
            PrimKind::Sra => "ShiftRightArith",
            PrimKind::Add => "Add",
            PrimKind::Sub => "Subtract",
            PrimKind::Mul => "Multiply",
            PrimKind::Mux => "Mux",
            PrimKind::Slice { .. } => "Slice",
            PrimKind::Concat => "Concat",
            PrimKind::Replicate { .. } => "Replicate",
            PrimKind::Const { .. } => "Const",
        }
    }

    /// The output port name, condition-bearing for comparators.
    pub fn output_port_name(&self) -> &'static str {
        match self {
            PrimKind::Eq => "equal",
            PrimKind::Neq => "notEqual",
            PrimKind::Lt => "lessThan",
            PrimKind::Lte => "lessOrEqual",
            PrimKind::Gt => "greaterThan",
            PrimKind::Gte => "greaterOrEqual",
            _ => "_out",
        }
    }
}
