//! Typed value-and-operator layer of the cider query-expression JIT.
//!
//! Lowers a small strongly-typed algebra (arithmetic, logical, comparison,
//! assignment) into Cranelift IR for one function under construction. Every
//! operation checks operand type tags, selects the native opcode from the
//! tag and emits exactly one instruction, wrapping its result in a new
//! immediate value.
//!
//! # Example
//!
//! ```
//! use cider_jitlib::{compile_function, JitConfig, JitTypeTag, JitValue};
//!
//! let f = compile_function(&JitConfig::default(), "ten_mod_three", &[], JitTypeTag::Int32, |func| {
//!     let ten = func.create_literal("ten", 10i32)?;
//!     let x = func.create_variable(JitTypeTag::Int32, "x", &ten)?;
//!     let y = func.create_literal("y", 3i32)?;
//!     let r = x.rem(&y)?;
//!     func.create_return(Some(&r))
//! })?;
//!
//! let call: extern "C" fn() -> i32 = unsafe { f.as_fn() };
//! assert_eq!(call(), 1);
//! # Ok::<(), cider_jitlib::JitError>(())
//! ```

mod compiler;
mod cranelift_value;
mod emitter;
mod error;
pub mod opcode;
mod types;
mod value;

#[cfg(test)]
mod test_utils;

pub use cider_config::{JitConfig, OptLevel};
pub use compiler::{compile_function, JitFn, JitFunction, JitLiteral};
pub use cranelift_value::{CraneliftValue, JitHandle};
pub use emitter::InstructionEmitter;
pub use error::{JitError, JitResult};
pub use types::{check_operands_type, JitTypeTag};
pub use value::JitValue;
