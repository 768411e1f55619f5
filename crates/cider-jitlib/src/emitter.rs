//! Instruction emission service consumed by values.

use cranelift_codegen::ir::{Inst, StackSlot, Type, Value};

use crate::error::JitResult;
use crate::opcode::{BinaryOpcode, CmpPredicate, UnaryOpcode};

/// Per-function instruction builder.
///
/// Every method appends exactly one instruction to the current block and
/// returns its result handle. Operand types are assumed checked by the
/// caller. Emission fails only once the function has been terminated.
pub trait InstructionEmitter {
    /// Native width used for `POINTER` values.
    fn pointer_type(&self) -> Type;

    fn emit_binary(&self, opcode: BinaryOpcode, lhs: Value, rhs: Value) -> JitResult<Value>;

    fn emit_unary(&self, opcode: UnaryOpcode, value: Value) -> JitResult<Value>;

    /// Emits a comparison producing an `i8` holding 0 or 1.
    fn emit_compare(&self, predicate: CmpPredicate, lhs: Value, rhs: Value) -> JitResult<Value>;

    fn emit_load(&self, ty: Type, slot: StackSlot) -> JitResult<Value>;

    fn emit_store(&self, value: Value, slot: StackSlot) -> JitResult<Inst>;
}
