//! Error types for the cider JIT library

use thiserror::Error;

use crate::types::JitTypeTag;

/// Main error type for code generation.
///
/// The first three variants are invariant violations in the caller's
/// lowering logic. The driver aborts the compilation unit on any of them and
/// no native code is produced.
#[derive(Debug, Error)]
pub enum JitError {
    /// Two operands of a binary operation carry different type tags.
    #[error("operand types don't match in operator {op}: lh={lhs}, rh={rhs}")]
    TypeMismatch {
        op: &'static str,
        lhs: JitTypeTag,
        rhs: JitTypeTag,
    },

    /// The operation is not defined for the operand's type tag.
    #[error("invalid value type for {op} operation: name={name}, type={tag}")]
    UnsupportedOperationForType {
        op: &'static str,
        name: String,
        tag: JitTypeTag,
    },

    /// `assign` was invoked on a value that is not a variable.
    #[error("value {name} is not a variable and cannot be the target of assign")]
    InvalidAssignmentTarget { name: String },

    /// The type has no native representation (e.g. VOID variables).
    #[error("type {tag} has no storage representation for {name}")]
    UnsizedType { name: String, tag: JitTypeTag },

    #[error("parameter index {index} out of range for function {function} with {count} parameters")]
    ParamOutOfRange {
        function: String,
        index: usize,
        count: usize,
    },

    #[error("return type mismatch in function {function}: expected {expected}, found {found}")]
    ReturnTypeMismatch {
        function: String,
        expected: JitTypeTag,
        found: JitTypeTag,
    },

    #[error("function {function} already returned")]
    AlreadyTerminated { function: String },

    #[error("function {function} body finished without a return")]
    MissingReturn { function: String },

    #[error("configuration: {0}")]
    Config(#[from] cider_config::ConfigError),

    /// Host ISA could not be configured.
    #[error("isa: {0}")]
    Isa(String),

    #[error("module: {0}")]
    Module(#[from] cranelift_module::ModuleError),

    #[error("codegen: {0}")]
    Codegen(String),
}

impl JitError {
    /// True for errors caused by ill-typed lowering rather than the backend.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            JitError::TypeMismatch { .. }
                | JitError::UnsupportedOperationForType { .. }
                | JitError::InvalidAssignmentTarget { .. }
        )
    }
}

/// Result type alias for code generation.
pub type JitResult<T> = std::result::Result<T, JitError>;
