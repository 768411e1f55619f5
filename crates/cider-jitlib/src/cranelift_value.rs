//! [`JitValue`] bound to Cranelift IR handles.
//!
//! Cranelift values are SSA: a handle can be defined once and never written.
//! Mutable variables therefore live in explicit stack slots. Reading a
//! variable re-issues a `stack_load` every time and writing it issues a
//! `stack_store`; immediates are used as-is.

use std::fmt;

use cranelift_codegen::ir::{Inst, StackSlot, Value};

use crate::emitter::InstructionEmitter;
use crate::error::{JitError, JitResult};
use crate::opcode::{
    arith_opcode, cmp_predicate, logical_opcode, not_opcode, ArithOp, CmpOp, LogicalOp,
};
use crate::types::{check_operands_type, JitTypeTag};
use crate::value::JitValue;

/// Native handle behind a value. The variant fixes `is_variable` for the
/// value's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitHandle {
    /// Already computed, read-only SSA value.
    Immediate(Value),
    /// Addressable storage slot.
    Slot(StackSlot),
}

/// A typed value inside the function that created it.
///
/// Borrows the emission service of its owning function, so it cannot
/// outlive the function context.
#[derive(Clone)]
pub struct CraneliftValue<'f> {
    tag: JitTypeTag,
    emitter: &'f dyn InstructionEmitter,
    handle: JitHandle,
    name: String,
}

impl<'f> CraneliftValue<'f> {
    pub fn new(
        tag: JitTypeTag,
        emitter: &'f dyn InstructionEmitter,
        handle: JitHandle,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tag,
            emitter,
            handle,
            name: name.into(),
        }
    }

    pub fn handle(&self) -> JitHandle {
        self.handle
    }

    /// Readable form of this value. Loads from the slot for variables.
    pub fn load(&self) -> JitResult<Value> {
        match self.handle {
            JitHandle::Immediate(value) => Ok(value),
            JitHandle::Slot(slot) => {
                let ty = self
                    .tag
                    .ir_type(self.emitter.pointer_type())
                    .ok_or_else(|| JitError::UnsizedType {
                        name: self.name.clone(),
                        tag: self.tag,
                    })?;
                self.emitter.emit_load(ty, slot)
            }
        }
    }

    /// Stores the readable form of `rhs` into this variable's slot.
    ///
    /// Returns `None` without emitting anything when `self` is not a variable.
    pub fn store(&self, rhs: &Self) -> JitResult<Option<Inst>> {
        match self.handle {
            JitHandle::Immediate(_) => Ok(None),
            JitHandle::Slot(slot) => {
                let value = rhs.load()?;
                self.emitter.emit_store(value, slot).map(Some)
            }
        }
    }

    fn unsupported(&self, op: &'static str) -> JitError {
        JitError::UnsupportedOperationForType {
            op,
            name: self.name.clone(),
            tag: self.tag,
        }
    }

    fn derive(&self, tag: JitTypeTag, value: Value, name: &'static str) -> Self {
        Self::new(tag, self.emitter, JitHandle::Immediate(value), name)
    }

    fn arith(&self, rhs: &Self, op: ArithOp) -> JitResult<Self> {
        check_operands_type(self.tag, rhs.tag, op.name())?;
        let opcode = arith_opcode(self.tag, op).ok_or_else(|| self.unsupported(op.name()))?;
        let (lhs_value, rhs_value) = (self.load()?, rhs.load()?);
        let ans = self.emitter.emit_binary(opcode, lhs_value, rhs_value)?;
        Ok(self.derive(self.tag, ans, op.name()))
    }

    fn logical(&self, rhs: &Self, op: LogicalOp) -> JitResult<Self> {
        check_operands_type(self.tag, rhs.tag, op.name())?;
        let opcode = logical_opcode(self.tag, op).ok_or_else(|| self.unsupported(op.name()))?;
        let (lhs_value, rhs_value) = (self.load()?, rhs.load()?);
        let ans = self.emitter.emit_binary(opcode, lhs_value, rhs_value)?;
        Ok(self.derive(JitTypeTag::Bool, ans, op.name()))
    }

    // Shared by all six comparisons; they differ only in the predicate pair.
    fn compare(&self, rhs: &Self, op: CmpOp) -> JitResult<Self> {
        check_operands_type(self.tag, rhs.tag, op.name())?;
        let predicate = cmp_predicate(self.tag, op).ok_or_else(|| self.unsupported(op.name()))?;
        let (lhs_value, rhs_value) = (self.load()?, rhs.load()?);
        let ans = self.emitter.emit_compare(predicate, lhs_value, rhs_value)?;
        Ok(self.derive(JitTypeTag::Bool, ans, op.name()))
    }
}

impl fmt::Debug for CraneliftValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CraneliftValue")
            .field("tag", &self.tag)
            .field("handle", &self.handle)
            .field("name", &self.name)
            .finish()
    }
}

impl JitValue for CraneliftValue<'_> {
    fn type_tag(&self) -> JitTypeTag {
        self.tag
    }

    fn is_variable(&self) -> bool {
        matches!(self.handle, JitHandle::Slot(_))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, rhs: &Self) -> JitResult<Self> {
        self.arith(rhs, ArithOp::Add)
    }

    fn sub(&self, rhs: &Self) -> JitResult<Self> {
        self.arith(rhs, ArithOp::Sub)
    }

    fn mul(&self, rhs: &Self) -> JitResult<Self> {
        self.arith(rhs, ArithOp::Mul)
    }

    fn div(&self, rhs: &Self) -> JitResult<Self> {
        self.arith(rhs, ArithOp::Div)
    }

    fn rem(&self, rhs: &Self) -> JitResult<Self> {
        self.arith(rhs, ArithOp::Mod)
    }

    fn logical_and(&self, rhs: &Self) -> JitResult<Self> {
        self.logical(rhs, LogicalOp::And)
    }

    fn logical_or(&self, rhs: &Self) -> JitResult<Self> {
        self.logical(rhs, LogicalOp::Or)
    }

    fn logical_not(&self) -> JitResult<Self> {
        let opcode = not_opcode(self.tag).ok_or_else(|| self.unsupported("not"))?;
        let value = self.load()?;
        let ans = self.emitter.emit_unary(opcode, value)?;
        Ok(self.derive(JitTypeTag::Bool, ans, "not"))
    }

    fn eq(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Eq)
    }

    fn ne(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Ne)
    }

    fn lt(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Lt)
    }

    fn le(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Le)
    }

    fn gt(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Gt)
    }

    fn ge(&self, rhs: &Self) -> JitResult<Self> {
        self.compare(rhs, CmpOp::Ge)
    }

    fn assign(&self, value: &Self) -> JitResult<&Self> {
        if !self.is_variable() {
            return Err(JitError::InvalidAssignmentTarget {
                name: self.name.clone(),
            });
        }
        check_operands_type(self.tag, value.tag, "assign")?;
        self.store(value)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use cranelift_codegen::ir::condcodes::{FloatCC, IntCC};

    use super::*;
    use crate::opcode::{BinaryOpcode, CmpPredicate, UnaryOpcode};
    use crate::test_utils::{Emitted, RecordingEmitter};

    #[test]
    fn test_add_immediates_emits_one_instruction() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Int32, "a");
        let b = rec.immediate(JitTypeTag::Int32, "b");

        let sum = a.add(&b).unwrap();

        assert_eq!(sum.type_tag(), JitTypeTag::Int32);
        assert!(!sum.is_variable());
        assert_eq!(sum.name(), "add");
        assert_eq!(rec.emitted(), vec![Emitted::Binary(BinaryOpcode::Iadd)]);
    }

    #[test]
    fn test_numeric_add_keeps_tag() {
        for tag in [
            JitTypeTag::Int8,
            JitTypeTag::Int16,
            JitTypeTag::Int32,
            JitTypeTag::Int64,
            JitTypeTag::Float,
            JitTypeTag::Double,
        ] {
            let rec = RecordingEmitter::new();
            let a = rec.immediate(tag, "a");
            let b = rec.immediate(tag, "b");
            let sum = a.add(&b).unwrap();
            assert_eq!(sum.type_tag(), tag);
            assert!(!sum.is_variable());
        }
    }

    #[test]
    fn test_variable_operands_are_loaded() {
        let rec = RecordingEmitter::new();
        let x = rec.variable(JitTypeTag::Int64, "x");
        let y = rec.variable(JitTypeTag::Int64, "y");
        let (JitHandle::Slot(xs), JitHandle::Slot(ys)) = (x.handle(), y.handle()) else {
            panic!("expected slots");
        };

        x.mul(&y).unwrap();

        assert_eq!(
            rec.emitted(),
            vec![
                Emitted::Load(xs),
                Emitted::Load(ys),
                Emitted::Binary(BinaryOpcode::Imul),
            ]
        );
    }

    #[test]
    fn test_reads_are_not_cached() {
        let rec = RecordingEmitter::new();
        let x = rec.variable(JitTypeTag::Int32, "x");
        let first = x.load().unwrap();
        let second = x.load().unwrap();
        assert_ne!(first, second);
        assert_eq!(rec.count(), 2);
    }

    #[test]
    fn test_float_ops_select_float_opcodes() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Double, "a");
        let b = rec.immediate(JitTypeTag::Double, "b");

        a.div(&b).unwrap();
        a.rem(&b).unwrap();
        a.lt(&b).unwrap();

        assert_eq!(
            rec.emitted(),
            vec![
                Emitted::Binary(BinaryOpcode::Fdiv),
                Emitted::Binary(BinaryOpcode::Frem),
                Emitted::Compare(CmpPredicate::Float(FloatCC::LessThan)),
            ]
        );
    }

    #[test]
    fn test_mismatch_emits_nothing() {
        let rec = RecordingEmitter::new();
        let a = rec.variable(JitTypeTag::Int32, "a");
        let b = rec.immediate(JitTypeTag::Int64, "b");

        let err = a.add(&b).unwrap_err();

        assert!(matches!(
            err,
            JitError::TypeMismatch {
                op: "add",
                lhs: JitTypeTag::Int32,
                rhs: JitTypeTag::Int64,
            }
        ));
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn test_mismatch_in_every_binary_operator() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Float, "a");
        let b = rec.immediate(JitTypeTag::Double, "b");

        let results = [
            a.add(&b),
            a.sub(&b),
            a.mul(&b),
            a.div(&b),
            a.rem(&b),
            a.eq(&b),
            a.ne(&b),
            a.lt(&b),
            a.le(&b),
            a.gt(&b),
            a.ge(&b),
        ];
        for result in results {
            assert!(matches!(result, Err(JitError::TypeMismatch { .. })));
        }
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn test_bool_add_unsupported() {
        let rec = RecordingEmitter::new();
        let p = rec.immediate(JitTypeTag::Bool, "p");
        let q = rec.immediate(JitTypeTag::Bool, "q");

        let err = p.add(&q).unwrap_err();
        let msg = err.to_string();

        assert!(matches!(err, JitError::UnsupportedOperationForType { .. }));
        assert!(msg.contains("add"), "{msg}");
        assert!(msg.contains("BOOL"), "{msg}");
        assert!(msg.contains("name=p"), "{msg}");
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn test_logical_ops_on_bool() {
        let rec = RecordingEmitter::new();
        let p = rec.variable(JitTypeTag::Bool, "p");
        let q = rec.immediate(JitTypeTag::Bool, "q");

        let and = p.logical_and(&q).unwrap();
        let or = p.logical_or(&q).unwrap();
        let not = p.logical_not().unwrap();

        for v in [&and, &or, &not] {
            assert_eq!(v.type_tag(), JitTypeTag::Bool);
            assert!(!v.is_variable());
        }
        let ops: Vec<_> = rec
            .emitted()
            .into_iter()
            .filter(|e| !matches!(e, Emitted::Load(_)))
            .collect();
        assert_eq!(
            ops,
            vec![
                Emitted::Binary(BinaryOpcode::Band),
                Emitted::Binary(BinaryOpcode::Bor),
                Emitted::Unary(UnaryOpcode::BoolNot),
            ]
        );
    }

    #[test]
    fn test_logical_ops_reject_non_bool() {
        for tag in [
            JitTypeTag::Int8,
            JitTypeTag::Int32,
            JitTypeTag::Int64,
            JitTypeTag::Float,
            JitTypeTag::Double,
        ] {
            let rec = RecordingEmitter::new();
            let a = rec.immediate(tag, "a");
            let b = rec.immediate(tag, "b");
            for result in [a.logical_and(&b), a.logical_or(&b), a.logical_not()] {
                assert!(
                    matches!(result, Err(JitError::UnsupportedOperationForType { .. })),
                    "{tag}"
                );
            }
        }
    }

    #[test]
    fn test_comparison_produces_bool() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Int16, "a");
        let b = rec.immediate(JitTypeTag::Int16, "b");

        let ge = a.ge(&b).unwrap();

        assert_eq!(ge.type_tag(), JitTypeTag::Bool);
        assert_eq!(ge.name(), "ge");
        assert_eq!(
            rec.emitted(),
            vec![Emitted::Compare(CmpPredicate::Int(
                IntCC::SignedGreaterThanOrEqual
            ))]
        );
    }

    #[test]
    fn test_bool_comparison_unsupported() {
        let rec = RecordingEmitter::new();
        let p = rec.immediate(JitTypeTag::Bool, "p");
        let err = p.lt(&p).unwrap_err();
        assert!(matches!(
            err,
            JitError::UnsupportedOperationForType { op: "lt", .. }
        ));
    }

    #[test]
    fn test_assign_stores_into_slot() {
        let rec = RecordingEmitter::new();
        let v = rec.variable(JitTypeTag::Int32, "v");
        let seven = rec.immediate(JitTypeTag::Int32, "seven");
        let JitHandle::Slot(slot) = v.handle() else {
            panic!("expected slot");
        };

        let same = v.assign(&seven).unwrap();

        assert_eq!(same.name(), "v");
        assert!(same.is_variable());
        assert_eq!(same.type_tag(), JitTypeTag::Int32);
        assert_eq!(rec.emitted(), vec![Emitted::Store(slot)]);
    }

    #[test]
    fn test_assign_variable_to_variable_loads_source() {
        let rec = RecordingEmitter::new();
        let dst = rec.variable(JitTypeTag::Double, "dst");
        let src = rec.variable(JitTypeTag::Double, "src");
        let (JitHandle::Slot(d), JitHandle::Slot(s)) = (dst.handle(), src.handle()) else {
            panic!("expected slots");
        };

        dst.assign(&src).unwrap();

        assert_eq!(rec.emitted(), vec![Emitted::Load(s), Emitted::Store(d)]);
    }

    #[test]
    fn test_assign_to_immediate_fails() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Int32, "a");
        let b = rec.immediate(JitTypeTag::Int32, "b");
        let r = a.add(&b).unwrap();
        let before = rec.count();

        let err = r.assign(&a).unwrap_err();

        assert!(matches!(err, JitError::InvalidAssignmentTarget { ref name } if name == "add"));
        assert!(err.is_invariant_violation());
        assert_eq!(rec.count(), before);
    }

    #[test]
    fn test_assign_type_mismatch() {
        let rec = RecordingEmitter::new();
        let v = rec.variable(JitTypeTag::Int32, "v");
        let d = rec.immediate(JitTypeTag::Double, "d");
        let err = v.assign(&d).unwrap_err();
        assert!(matches!(err, JitError::TypeMismatch { op: "assign", .. }));
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn test_store_on_immediate_is_noop() {
        let rec = RecordingEmitter::new();
        let a = rec.immediate(JitTypeTag::Int8, "a");
        let b = rec.immediate(JitTypeTag::Int8, "b");
        assert_eq!(a.store(&b).unwrap(), None);
        assert_eq!(rec.count(), 0);
    }

    #[test]
    fn test_void_slot_cannot_be_read() {
        let rec = RecordingEmitter::new();
        let v = rec.variable(JitTypeTag::Void, "nothing");
        assert!(matches!(v.load(), Err(JitError::UnsizedType { .. })));
    }
}
