//! Opcode selection: `(JitTypeTag, operation) -> native opcode`.
//!
//! Pure functions with no wildcard arms over [`JitTypeTag`]. `None` means the
//! operation is undefined for the tag; callers turn that into
//! `UnsupportedOperationForType`.

use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};

use crate::types::JitTypeTag;

/// Binary arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
            ArithOp::Mod => "mod",
        }
    }
}

/// Binary boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn name(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// Comparison operations. All produce BOOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "lt",
            CmpOp::Le => "le",
            CmpOp::Gt => "gt",
            CmpOp::Ge => "ge",
        }
    }

    /// Signed integer predicate.
    pub fn int_cc(self) -> IntCC {
        match self {
            CmpOp::Eq => IntCC::Equal,
            CmpOp::Ne => IntCC::NotEqual,
            CmpOp::Lt => IntCC::SignedLessThan,
            CmpOp::Le => IntCC::SignedLessThanOrEqual,
            CmpOp::Gt => IntCC::SignedGreaterThan,
            CmpOp::Ge => IntCC::SignedGreaterThanOrEqual,
        }
    }

    /// Float predicate. Ordered for everything except `Ne`, which is true
    /// when either side is NaN.
    pub fn float_cc(self) -> FloatCC {
        match self {
            CmpOp::Eq => FloatCC::Equal,
            CmpOp::Ne => FloatCC::NotEqual,
            CmpOp::Lt => FloatCC::LessThan,
            CmpOp::Le => FloatCC::LessThanOrEqual,
            CmpOp::Gt => FloatCC::GreaterThan,
            CmpOp::Ge => FloatCC::GreaterThanOrEqual,
        }
    }
}

/// Native two-operand instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpcode {
    Iadd,
    Isub,
    Imul,
    Sdiv,
    Srem,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    /// C `fmod` semantics; lowered to a runtime helper call.
    Frem,
    Band,
    Bor,
}

/// Native one-operand instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpcode {
    /// Flips a 0/1 boolean.
    BoolNot,
}

/// Comparison predicate family chosen by type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPredicate {
    Int(IntCC),
    Float(FloatCC),
}

pub fn arith_opcode(tag: JitTypeTag, op: ArithOp) -> Option<BinaryOpcode> {
    match tag {
        JitTypeTag::Int8 | JitTypeTag::Int16 | JitTypeTag::Int32 | JitTypeTag::Int64 => {
            Some(match op {
                ArithOp::Add => BinaryOpcode::Iadd,
                ArithOp::Sub => BinaryOpcode::Isub,
                ArithOp::Mul => BinaryOpcode::Imul,
                ArithOp::Div => BinaryOpcode::Sdiv,
                ArithOp::Mod => BinaryOpcode::Srem,
            })
        }
        JitTypeTag::Float | JitTypeTag::Double => Some(match op {
            ArithOp::Add => BinaryOpcode::Fadd,
            ArithOp::Sub => BinaryOpcode::Fsub,
            ArithOp::Mul => BinaryOpcode::Fmul,
            ArithOp::Div => BinaryOpcode::Fdiv,
            ArithOp::Mod => BinaryOpcode::Frem,
        }),
        JitTypeTag::Void | JitTypeTag::Bool | JitTypeTag::Pointer => None,
    }
}

pub fn logical_opcode(tag: JitTypeTag, op: LogicalOp) -> Option<BinaryOpcode> {
    match tag {
        JitTypeTag::Bool => Some(match op {
            LogicalOp::And => BinaryOpcode::Band,
            LogicalOp::Or => BinaryOpcode::Bor,
        }),
        JitTypeTag::Void
        | JitTypeTag::Int8
        | JitTypeTag::Int16
        | JitTypeTag::Int32
        | JitTypeTag::Int64
        | JitTypeTag::Float
        | JitTypeTag::Double
        | JitTypeTag::Pointer => None,
    }
}

pub fn not_opcode(tag: JitTypeTag) -> Option<UnaryOpcode> {
    match tag {
        JitTypeTag::Bool => Some(UnaryOpcode::BoolNot),
        JitTypeTag::Void
        | JitTypeTag::Int8
        | JitTypeTag::Int16
        | JitTypeTag::Int32
        | JitTypeTag::Int64
        | JitTypeTag::Float
        | JitTypeTag::Double
        | JitTypeTag::Pointer => None,
    }
}

pub fn cmp_predicate(tag: JitTypeTag, op: CmpOp) -> Option<CmpPredicate> {
    match tag {
        JitTypeTag::Int8 | JitTypeTag::Int16 | JitTypeTag::Int32 | JitTypeTag::Int64 => {
            Some(CmpPredicate::Int(op.int_cc()))
        }
        JitTypeTag::Float | JitTypeTag::Double => Some(CmpPredicate::Float(op.float_cc())),
        JitTypeTag::Void | JitTypeTag::Bool | JitTypeTag::Pointer => None,
    }
}
