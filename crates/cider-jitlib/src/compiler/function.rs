//! Function-building context: owns the Cranelift builder for one function
//! and serves as the instruction emission service for its values.

use std::cell::{Cell, RefCell};

use cranelift_codegen::ir::types::{F32, I16, I32, I64, I8};
use cranelift_codegen::ir::{
    Inst, InstBuilder, StackSlot, StackSlotData, StackSlotKind, Type, Value,
};
use cranelift_frontend::FunctionBuilder;
use tracing::{debug, trace};

use super::helpers::MathHelpers;
use crate::cranelift_value::{CraneliftValue, JitHandle};
use crate::emitter::InstructionEmitter;
use crate::error::{JitError, JitResult};
use crate::opcode::{BinaryOpcode, CmpPredicate, UnaryOpcode};
use crate::types::JitTypeTag;
use crate::value::JitValue;

/// A literal constant with its type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JitLiteral {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
}

impl JitLiteral {
    pub fn type_tag(&self) -> JitTypeTag {
        match self {
            JitLiteral::Bool(_) => JitTypeTag::Bool,
            JitLiteral::Int8(_) => JitTypeTag::Int8,
            JitLiteral::Int16(_) => JitTypeTag::Int16,
            JitLiteral::Int32(_) => JitTypeTag::Int32,
            JitLiteral::Int64(_) => JitTypeTag::Int64,
            JitLiteral::Float(_) => JitTypeTag::Float,
            JitLiteral::Double(_) => JitTypeTag::Double,
        }
    }
}

macro_rules! literal_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for JitLiteral {
                fn from(v: $ty) -> Self {
                    JitLiteral::$variant(v)
                }
            }
        )*
    };
}

literal_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
}

/// The function under construction.
///
/// Values created here borrow the context, so none of them can be used
/// after the body closure handed to [`compile_function`](super::compile_function)
/// returns. Single-threaded: emission goes through a `RefCell`.
pub struct JitFunction<'b> {
    name: String,
    builder: RefCell<FunctionBuilder<'b>>,
    helpers: MathHelpers,
    pointer_type: Type,
    param_types: Vec<JitTypeTag>,
    params: Vec<Value>,
    return_type: JitTypeTag,
    terminated: Cell<bool>,
    emitted: Cell<usize>,
}

impl<'b> JitFunction<'b> {
    pub(crate) fn new(
        name: &str,
        builder: FunctionBuilder<'b>,
        helpers: MathHelpers,
        pointer_type: Type,
        param_types: Vec<JitTypeTag>,
        params: Vec<Value>,
        return_type: JitTypeTag,
    ) -> Self {
        Self {
            name: name.to_string(),
            builder: RefCell::new(builder),
            helpers,
            pointer_type,
            param_types,
            params,
            return_type,
            terminated: Cell::new(false),
            emitted: Cell::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_types(&self) -> &[JitTypeTag] {
        &self.param_types
    }

    pub fn return_type(&self) -> JitTypeTag {
        self.return_type
    }

    /// Number of instructions emitted through the emission service.
    pub fn emitted_instructions(&self) -> usize {
        self.emitted.get()
    }

    /// The `index`-th parameter as an immediate value.
    pub fn param(&self, index: usize) -> JitResult<CraneliftValue<'_>> {
        let (Some(&tag), Some(&value)) = (self.param_types.get(index), self.params.get(index))
        else {
            return Err(JitError::ParamOutOfRange {
                function: self.name.clone(),
                index,
                count: self.params.len(),
            });
        };
        Ok(CraneliftValue::new(
            tag,
            self,
            JitHandle::Immediate(value),
            format!("arg{index}"),
        ))
    }

    pub fn create_literal(
        &self,
        name: &str,
        literal: impl Into<JitLiteral>,
    ) -> JitResult<CraneliftValue<'_>> {
        self.ensure_open()?;
        let literal = literal.into();
        let value = {
            let mut b = self.builder.borrow_mut();
            // Narrow immediates are stored zero-extended to their width.
            match literal {
                JitLiteral::Bool(v) => b.ins().iconst(I8, i64::from(v)),
                JitLiteral::Int8(v) => b.ins().iconst(I8, i64::from(v as u8)),
                JitLiteral::Int16(v) => b.ins().iconst(I16, i64::from(v as u16)),
                JitLiteral::Int32(v) => b.ins().iconst(I32, i64::from(v as u32)),
                JitLiteral::Int64(v) => b.ins().iconst(I64, v),
                JitLiteral::Float(v) => b.ins().f32const(v),
                JitLiteral::Double(v) => b.ins().f64const(v),
            }
        };
        Ok(CraneliftValue::new(
            literal.type_tag(),
            self,
            JitHandle::Immediate(value),
            name,
        ))
    }

    /// Allocates a stack slot for a mutable variable. The slot is
    /// uninitialised until the first `assign`.
    pub fn declare_variable(&self, tag: JitTypeTag, name: &str) -> JitResult<CraneliftValue<'_>> {
        self.ensure_open()?;
        let size = tag
            .byte_size(self.pointer_type)
            .ok_or_else(|| JitError::UnsizedType {
                name: name.to_string(),
                tag,
            })?;
        let align_shift = size.trailing_zeros() as u8;
        let slot = self
            .builder
            .borrow_mut()
            .create_sized_stack_slot(StackSlotData::new(
                StackSlotKind::ExplicitSlot,
                size,
                align_shift,
            ));
        debug!(function = %self.name, variable = name, tag = %tag, "declare variable");
        Ok(CraneliftValue::new(tag, self, JitHandle::Slot(slot), name))
    }

    /// Declares a variable and assigns `init` to it.
    pub fn create_variable(
        &self,
        tag: JitTypeTag,
        name: &str,
        init: &CraneliftValue<'_>,
    ) -> JitResult<CraneliftValue<'_>> {
        let variable = self.declare_variable(tag, name)?;
        variable.assign(init)?;
        Ok(variable)
    }

    /// Terminates the function. `None` returns from a VOID function.
    ///
    /// No value of this function may be operated on afterwards.
    pub fn create_return(&self, value: Option<&CraneliftValue<'_>>) -> JitResult<()> {
        self.ensure_open()?;
        let found = value.map_or(JitTypeTag::Void, |v| v.type_tag());
        if found != self.return_type {
            return Err(JitError::ReturnTypeMismatch {
                function: self.name.clone(),
                expected: self.return_type,
                found,
            });
        }
        match value {
            Some(v) if found != JitTypeTag::Void => {
                let ret = v.load()?;
                self.builder.borrow_mut().ins().return_(&[ret]);
            }
            _ => {
                self.builder.borrow_mut().ins().return_(&[]);
            }
        }
        self.terminated.set(true);
        Ok(())
    }

    /// Finalises the builder. Fails when the body never returned.
    pub(crate) fn finish(self) -> JitResult<usize> {
        if !self.terminated.get() {
            return Err(JitError::MissingReturn {
                function: self.name,
            });
        }
        let emitted = self.emitted.get();
        self.builder.into_inner().finalize();
        Ok(emitted)
    }

    /// The entry block is filled once the function returns; nothing more
    /// may be appended to it.
    fn ensure_open(&self) -> JitResult<()> {
        if self.terminated.get() {
            return Err(JitError::AlreadyTerminated {
                function: self.name.clone(),
            });
        }
        Ok(())
    }

    fn note_emit(&self) {
        self.emitted.set(self.emitted.get() + 1);
    }
}

impl InstructionEmitter for JitFunction<'_> {
    fn pointer_type(&self) -> Type {
        self.pointer_type
    }

    fn emit_binary(&self, opcode: BinaryOpcode, lhs: Value, rhs: Value) -> JitResult<Value> {
        self.ensure_open()?;
        let mut b = self.builder.borrow_mut();
        let ans = match opcode {
            BinaryOpcode::Iadd => b.ins().iadd(lhs, rhs),
            BinaryOpcode::Isub => b.ins().isub(lhs, rhs),
            BinaryOpcode::Imul => b.ins().imul(lhs, rhs),
            BinaryOpcode::Sdiv => b.ins().sdiv(lhs, rhs),
            BinaryOpcode::Srem => b.ins().srem(lhs, rhs),
            BinaryOpcode::Fadd => b.ins().fadd(lhs, rhs),
            BinaryOpcode::Fsub => b.ins().fsub(lhs, rhs),
            BinaryOpcode::Fmul => b.ins().fmul(lhs, rhs),
            BinaryOpcode::Fdiv => b.ins().fdiv(lhs, rhs),
            BinaryOpcode::Frem => {
                let callee = if b.func.dfg.value_type(lhs) == F32 {
                    self.helpers.fmodf
                } else {
                    self.helpers.fmod
                };
                let call = b.ins().call(callee, &[lhs, rhs]);
                b.inst_results(call)[0]
            }
            BinaryOpcode::Band => b.ins().band(lhs, rhs),
            BinaryOpcode::Bor => b.ins().bor(lhs, rhs),
        };
        self.note_emit();
        trace!(function = %self.name, ?opcode, "emit binary");
        Ok(ans)
    }

    fn emit_unary(&self, opcode: UnaryOpcode, value: Value) -> JitResult<Value> {
        self.ensure_open()?;
        let mut b = self.builder.borrow_mut();
        let ans = match opcode {
            UnaryOpcode::BoolNot => b.ins().bxor_imm(value, 1),
        };
        self.note_emit();
        trace!(function = %self.name, ?opcode, "emit unary");
        Ok(ans)
    }

    fn emit_compare(&self, predicate: CmpPredicate, lhs: Value, rhs: Value) -> JitResult<Value> {
        self.ensure_open()?;
        let mut b = self.builder.borrow_mut();
        let ans = match predicate {
            CmpPredicate::Int(cc) => b.ins().icmp(cc, lhs, rhs),
            CmpPredicate::Float(cc) => b.ins().fcmp(cc, lhs, rhs),
        };
        self.note_emit();
        trace!(function = %self.name, ?predicate, "emit compare");
        Ok(ans)
    }

    fn emit_load(&self, ty: Type, slot: StackSlot) -> JitResult<Value> {
        self.ensure_open()?;
        let ans = self.builder.borrow_mut().ins().stack_load(ty, slot, 0);
        self.note_emit();
        trace!(function = %self.name, %slot, "emit load");
        Ok(ans)
    }

    fn emit_store(&self, value: Value, slot: StackSlot) -> JitResult<Inst> {
        self.ensure_open()?;
        let inst = self.builder.borrow_mut().ins().stack_store(value, slot, 0);
        self.note_emit();
        trace!(function = %self.name, %slot, "emit store");
        Ok(inst)
    }
}
