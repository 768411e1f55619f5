//! Primitive type tags driving instruction selection.

use std::fmt;

use cranelift_codegen::ir::types::{F32, F64, I16, I32, I64, I8};
use cranelift_codegen::ir::Type;

use crate::error::{JitError, JitResult};

/// Runtime discriminant of a value's primitive type.
///
/// Closed set. Every operation site matches on it exhaustively, so adding a
/// tag forces opcode selection to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JitTypeTag {
    /// No value. Only valid as a return type.
    Void,
    /// Boolean stored as an `i8` holding 0 or 1.
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
    /// Target-width address.
    Pointer,
}

impl JitTypeTag {
    /// Stable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            JitTypeTag::Void => "VOID",
            JitTypeTag::Bool => "BOOL",
            JitTypeTag::Int8 => "INT8",
            JitTypeTag::Int16 => "INT16",
            JitTypeTag::Int32 => "INT32",
            JitTypeTag::Int64 => "INT64",
            JitTypeTag::Float => "FLOAT",
            JitTypeTag::Double => "DOUBLE",
            JitTypeTag::Pointer => "POINTER",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            JitTypeTag::Int8 | JitTypeTag::Int16 | JitTypeTag::Int32 | JitTypeTag::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, JitTypeTag::Float | JitTypeTag::Double)
    }

    /// Cranelift type carrying values of this tag, or `None` for `Void`.
    pub fn ir_type(self, pointer_type: Type) -> Option<Type> {
        match self {
            JitTypeTag::Void => None,
            JitTypeTag::Bool | JitTypeTag::Int8 => Some(I8),
            JitTypeTag::Int16 => Some(I16),
            JitTypeTag::Int32 => Some(I32),
            JitTypeTag::Int64 => Some(I64),
            JitTypeTag::Float => Some(F32),
            JitTypeTag::Double => Some(F64),
            JitTypeTag::Pointer => Some(pointer_type),
        }
    }

    /// Storage size in bytes, or `None` for `Void`.
    pub fn byte_size(self, pointer_type: Type) -> Option<u32> {
        self.ir_type(pointer_type).map(|ty| ty.bytes())
    }
}

impl fmt::Display for JitTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fails unless both operand tags are identical.
///
/// There is no implicit widening: an instruction emitted over mismatched
/// operands would expect a homogeneous representation it does not get.
pub fn check_operands_type(lhs: JitTypeTag, rhs: JitTypeTag, op: &'static str) -> JitResult<()> {
    if lhs != rhs {
        return Err(JitError::TypeMismatch { op, lhs, rhs });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JitTypeTag; 9] = [
        JitTypeTag::Void,
        JitTypeTag::Bool,
        JitTypeTag::Int8,
        JitTypeTag::Int16,
        JitTypeTag::Int32,
        JitTypeTag::Int64,
        JitTypeTag::Float,
        JitTypeTag::Double,
        JitTypeTag::Pointer,
    ];

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
        assert_eq!(JitTypeTag::Bool.to_string(), "BOOL");
        assert_eq!(JitTypeTag::Double.to_string(), "DOUBLE");
    }

    #[test]
    fn test_byte_sizes() {
        assert_eq!(JitTypeTag::Void.byte_size(I64), None);
        assert_eq!(JitTypeTag::Bool.byte_size(I64), Some(1));
        assert_eq!(JitTypeTag::Int16.byte_size(I64), Some(2));
        assert_eq!(JitTypeTag::Float.byte_size(I64), Some(4));
        assert_eq!(JitTypeTag::Int64.byte_size(I64), Some(8));
        assert_eq!(JitTypeTag::Pointer.byte_size(I32), Some(4));
    }

    #[test]
    fn test_check_operands_type() {
        for &tag in &ALL {
            assert!(check_operands_type(tag, tag, "add").is_ok());
        }
        let err = check_operands_type(JitTypeTag::Int32, JitTypeTag::Double, "sub").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sub"), "{msg}");
        assert!(msg.contains("INT32"), "{msg}");
        assert!(msg.contains("DOUBLE"), "{msg}");
    }

    #[test]
    fn test_integer_and_float_classes_disjoint() {
        for &tag in &ALL {
            assert!(!(tag.is_integer() && tag.is_float()), "{tag}");
        }
        assert!(!JitTypeTag::Bool.is_integer());
        assert!(!JitTypeTag::Pointer.is_integer());
    }
}
