//! The typed value abstraction of the expression algebra.

use crate::error::JitResult;
use crate::types::JitTypeTag;

/// A typed result or storage slot inside a function under construction.
///
/// Every operation returns a freshly produced, non-variable value and leaves
/// its operands untouched. Binary operations take an operand of the same
/// implementation, so a backend never sees a foreign handle.
///
/// # Errors
///
/// - `TypeMismatch` when binary operand tags differ.
/// - `UnsupportedOperationForType` when the tag does not define the operation.
/// - `InvalidAssignmentTarget` when assigning to a non-variable.
///
/// A failed operation emits no instruction.
pub trait JitValue: Sized {
    fn type_tag(&self) -> JitTypeTag;

    /// True when the value denotes an addressable slot that needs an explicit
    /// load to read and store to write.
    fn is_variable(&self) -> bool;

    /// Diagnostic label.
    fn name(&self) -> &str;

    fn add(&self, rhs: &Self) -> JitResult<Self>;
    fn sub(&self, rhs: &Self) -> JitResult<Self>;
    fn mul(&self, rhs: &Self) -> JitResult<Self>;
    /// Signed division for integers.
    fn div(&self, rhs: &Self) -> JitResult<Self>;
    /// Signed remainder for integers, `fmod` for floats.
    fn rem(&self, rhs: &Self) -> JitResult<Self>;

    fn logical_and(&self, rhs: &Self) -> JitResult<Self>;
    fn logical_or(&self, rhs: &Self) -> JitResult<Self>;
    fn logical_not(&self) -> JitResult<Self>;

    fn eq(&self, rhs: &Self) -> JitResult<Self>;
    fn ne(&self, rhs: &Self) -> JitResult<Self>;
    fn lt(&self, rhs: &Self) -> JitResult<Self>;
    fn le(&self, rhs: &Self) -> JitResult<Self>;
    fn gt(&self, rhs: &Self) -> JitResult<Self>;
    fn ge(&self, rhs: &Self) -> JitResult<Self>;

    /// Stores `value` into this variable's slot and returns `self`.
    fn assign(&self, value: &Self) -> JitResult<&Self>;
}
