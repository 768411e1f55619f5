//! Test helpers: an emitter that records instead of generating code.

use std::cell::{Cell, RefCell};

use cranelift_codegen::entity::EntityRef;
use cranelift_codegen::ir::types::I64;
use cranelift_codegen::ir::{Inst, StackSlot, Type, Value};

use crate::cranelift_value::{CraneliftValue, JitHandle};
use crate::emitter::InstructionEmitter;
use crate::error::JitResult;
use crate::opcode::{BinaryOpcode, CmpPredicate, UnaryOpcode};
use crate::types::JitTypeTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
    Binary(BinaryOpcode),
    Unary(UnaryOpcode),
    Compare(CmpPredicate),
    Load(StackSlot),
    Store(StackSlot),
}

/// Hands out fresh handles and records every emission request.
#[derive(Default)]
pub struct RecordingEmitter {
    log: RefCell<Vec<Emitted>>,
    next_value: Cell<usize>,
    next_slot: Cell<usize>,
    next_inst: Cell<usize>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<Emitted> {
        self.log.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn immediate(&self, tag: JitTypeTag, name: &str) -> CraneliftValue<'_> {
        CraneliftValue::new(tag, self, JitHandle::Immediate(self.fresh_value()), name)
    }

    pub fn variable(&self, tag: JitTypeTag, name: &str) -> CraneliftValue<'_> {
        let n = self.next_slot.get();
        self.next_slot.set(n + 1);
        CraneliftValue::new(tag, self, JitHandle::Slot(StackSlot::new(n)), name)
    }

    fn fresh_value(&self) -> Value {
        let n = self.next_value.get();
        self.next_value.set(n + 1);
        Value::new(n)
    }

    fn record(&self, e: Emitted) {
        self.log.borrow_mut().push(e);
    }
}

impl InstructionEmitter for RecordingEmitter {
    fn pointer_type(&self) -> Type {
        I64
    }

    fn emit_binary(&self, opcode: BinaryOpcode, _lhs: Value, _rhs: Value) -> JitResult<Value> {
        self.record(Emitted::Binary(opcode));
        Ok(self.fresh_value())
    }

    fn emit_unary(&self, opcode: UnaryOpcode, _value: Value) -> JitResult<Value> {
        self.record(Emitted::Unary(opcode));
        Ok(self.fresh_value())
    }

    fn emit_compare(&self, predicate: CmpPredicate, _lhs: Value, _rhs: Value) -> JitResult<Value> {
        self.record(Emitted::Compare(predicate));
        Ok(self.fresh_value())
    }

    fn emit_load(&self, _ty: Type, slot: StackSlot) -> JitResult<Value> {
        self.record(Emitted::Load(slot));
        Ok(self.fresh_value())
    }

    fn emit_store(&self, _value: Value, slot: StackSlot) -> JitResult<Inst> {
        self.record(Emitted::Store(slot));
        let n = self.next_inst.get();
        self.next_inst.set(n + 1);
        Ok(Inst::new(n))
    }
}
